//! CLI session endpoints
//!
//! Thin client over the session service: create a session for a browser
//! login and look up its current state. Neither call retries; retry policy
//! belongs to the poller.

use crate::error::{AuthError, Result};
use crate::types::{Session, SessionRequest};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use core_runtime::LoginConfig;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use url::Url;

/// Header marking requests as coming from a staging client
pub const STAGING_HEADER: &str = "x-staging";

const SESSIONS_PATH: &str = "/api/v1/cli_sessions";

/// Client for the `/api/v1/cli_sessions` endpoints.
#[derive(Clone)]
pub struct CliSessionClient {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    staging: bool,
}

impl CliSessionClient {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        staging: bool,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            staging,
        }
    }

    pub fn from_config(config: &LoginConfig) -> Self {
        Self::new(
            config.http_client.clone(),
            config.base_url.clone(),
            config.staging,
        )
    }

    /// Create a new session.
    ///
    /// `name` is sent alongside `extra_args` and overrides any `name` they
    /// carry. Only `201 Created` counts as success; every other status is
    /// [`AuthError::Unknown`] with the error body decoded when possible.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidInput`] if `name` is empty
    /// - [`AuthError::Transport`] if the request could not be sent
    /// - [`AuthError::Unknown`] for a non-201 status
    /// - [`AuthError::Decode`] if the 201 body is not a session
    #[instrument(skip(self, extra_args))]
    pub async fn create_session(
        &self,
        name: &str,
        extra_args: Map<String, Value>,
    ) -> Result<Session> {
        ensure_name(name)?;
        self.post_session(SessionRequest::new(name, extra_args)).await
    }

    /// Create a session for a browser login (`{signup, target: "auth", name}`).
    pub async fn start_web_auth(&self, name: &str, signup: bool) -> Result<Session> {
        ensure_name(name)?;
        self.post_session(SessionRequest::web_auth(name, signup)).await
    }

    /// Look up the current state of a session.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotFound`] for 404
    /// - [`AuthError::Unknown`] for any status other than 200 or 404
    /// - [`AuthError::Transport`] / [`AuthError::Decode`] as for creation
    pub async fn fetch_session_state(&self, id: &str) -> Result<Session> {
        let url = self.session_url(id)?;
        let response = self.send(self.request(HttpMethod::Get, &url)).await?;

        match response.status {
            200 => decode_session(&response),
            404 => Err(AuthError::NotFound(id.to_string())),
            status => Err(AuthError::Unknown {
                status,
                payload: error_payload(&response),
            }),
        }
    }

    async fn post_session(&self, body: SessionRequest) -> Result<Session> {
        let url = format!("{}{}", self.base_url, SESSIONS_PATH);
        let request = json_body(self.request(HttpMethod::Post, &url), &body, "session request")?;

        let response = self.send(request).await?;

        if response.status != 201 {
            let payload = error_payload(&response);
            warn!(status = response.status, "Session creation rejected");
            return Err(AuthError::Unknown {
                status: response.status,
                payload,
            });
        }

        let session = decode_session(&response)?;
        debug!(session_id = %session.id, "CLI session created");
        Ok(session)
    }

    /// `{base}/api/v1/cli_sessions/{id}` with `id` escaped as one path segment
    fn session_url(&self, id: &str) -> Result<String> {
        let base = format!("{}{}", self.base_url, SESSIONS_PATH);
        let mut url = Url::parse(&base).map_err(|e| {
            AuthError::InvalidInput(format!("invalid session URL {}: {}", base, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| AuthError::InvalidInput(format!("{} cannot take a path", base)))?
            .push(id);
        Ok(url.into())
    }

    fn request(&self, method: HttpMethod, url: &str) -> HttpRequest {
        let request = HttpRequest::new(method, url);
        if self.staging {
            request.header(STAGING_HEADER, "1")
        } else {
            request
        }
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.clone();
        self.http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::Transport {
                url,
                reason: e.to_string(),
            })
    }
}

/// Attach `body` as JSON; a body that cannot be serialized is the caller's input error.
pub(crate) fn json_body<T: Serialize>(
    request: HttpRequest,
    body: &T,
    context: &str,
) -> Result<HttpRequest> {
    request
        .json(body)
        .map_err(|e| AuthError::InvalidInput(format!("cannot encode {}: {}", context, e)))
}

fn ensure_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AuthError::InvalidInput(
            "session name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn decode_session(response: &HttpResponse) -> Result<Session> {
    response.json::<Session>().map_err(|e| AuthError::Decode {
        context: "session".to_string(),
        reason: e.to_string(),
    })
}

fn error_payload(response: &HttpResponse) -> Option<Value> {
    serde_json::from_slice(&response.body).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use mockall::mock;
    use serde_json::json;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn client(mock: MockHttpClient) -> CliSessionClient {
        CliSessionClient::new(Arc::new(mock), "https://auth.example.com/", true)
    }

    fn session_body(token: Option<&str>) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "id": "sess_1",
            "url": "https://auth.example.com/cli/sess_1",
            "access_token": token,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_session_success() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute().times(1).returning(|req| {
            assert_eq!(req.method, HttpMethod::Post);
            assert_eq!(req.url, "https://auth.example.com/api/v1/cli_sessions");
            assert_eq!(req.header_value("x-staging"), Some("1"));
            assert_eq!(req.header_value("content-type"), Some("application/json"));

            let body: Value = serde_json::from_slice(req.body.as_ref().unwrap()).unwrap();
            assert_eq!(body["name"], "my-laptop");
            assert_eq!(body["region"], "eu");

            Ok(HttpResponse::new(201, session_body(None)))
        });

        let mut extra = Map::new();
        extra.insert("region".to_string(), json!("eu"));
        extra.insert("name".to_string(), json!("overridden"));

        let session = client(mock).create_session("my-laptop", extra).await.unwrap();
        assert_eq!(session.id, "sess_1");
        assert_eq!(session.url, "https://auth.example.com/cli/sess_1");
        assert!(!session.is_authorized());
    }

    #[tokio::test]
    async fn test_create_session_rejects_empty_name() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute().never();

        let result = client(mock).create_session("", Map::new()).await;
        assert!(matches!(result, Err(AuthError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_create_session_non_created_status() {
        for status in [200u16, 400, 401, 404, 500, 503] {
            let mut mock = MockHttpClient::new();
            mock.expect_execute().times(1).returning(move |_| {
                Ok(HttpResponse::new(
                    status,
                    br#"{"error":"nope"}"#.to_vec(),
                ))
            });

            match client(mock).create_session("host", Map::new()).await {
                Err(AuthError::Unknown {
                    status: got,
                    payload,
                }) => {
                    assert_eq!(got, status);
                    assert_eq!(payload, Some(json!({"error": "nope"})));
                }
                other => panic!("expected Unknown for {}, got {:?}", status, other),
            }
        }
    }

    #[tokio::test]
    async fn test_create_session_undecodable_error_body() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .returning(|_| Ok(HttpResponse::new(502, b"<html>bad gateway</html>".to_vec())));

        match client(mock).create_session("host", Map::new()).await {
            Err(AuthError::Unknown { status, payload }) => {
                assert_eq!(status, 502);
                assert!(payload.is_none());
            }
            other => panic!("expected Unknown, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_session_malformed_body() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .returning(|_| Ok(HttpResponse::new(201, b"{\"id\":".to_vec())));

        let result = client(mock).create_session("host", Map::new()).await;
        assert!(matches!(result, Err(AuthError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_create_session_transport_error() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute().returning(|_| {
            Err(BridgeError::Transport {
                url: "https://auth.example.com/api/v1/cli_sessions".to_string(),
                reason: "connection refused".to_string(),
            })
        });

        let result = client(mock).create_session("host", Map::new()).await;
        assert!(matches!(result, Err(AuthError::Transport { .. })));
    }

    #[tokio::test]
    async fn test_start_web_auth_body() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute().times(1).returning(|req| {
            let body: Value = serde_json::from_slice(req.body.as_ref().unwrap()).unwrap();
            assert_eq!(
                body,
                json!({"signup": false, "target": "auth", "name": "my-laptop"})
            );
            Ok(HttpResponse::new(201, session_body(None)))
        });

        client(mock).start_web_auth("my-laptop", false).await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_session_state() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute().times(1).returning(|req| {
            assert_eq!(req.method, HttpMethod::Get);
            assert_eq!(
                req.url,
                "https://auth.example.com/api/v1/cli_sessions/sess_1"
            );
            Ok(HttpResponse::new(200, session_body(Some("tok_xyz"))))
        });

        let session = client(mock).fetch_session_state("sess_1").await.unwrap();
        assert_eq!(session.access_token, "tok_xyz");
    }

    #[tokio::test]
    async fn test_fetch_session_state_statuses() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(404, Vec::new())));
        let result = client(mock).fetch_session_state("sess_1").await;
        assert!(matches!(result, Err(AuthError::NotFound(id)) if id == "sess_1"));

        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(500, Vec::new())));
        let result = client(mock).fetch_session_state("sess_1").await;
        assert!(matches!(result, Err(AuthError::Unknown { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_fetch_session_state_escapes_id() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute().times(1).returning(|req| {
            assert_eq!(
                req.url,
                "https://auth.example.com/api/v1/cli_sessions/a%2Fb%3Fc%23d"
            );
            Ok(HttpResponse::new(404, Vec::new()))
        });

        let result = client(mock).fetch_session_state("a/b?c#d").await;
        assert!(matches!(result, Err(AuthError::NotFound(id)) if id == "a/b?c#d"));
    }

    #[test]
    fn test_unencodable_body_is_invalid_input() {
        struct Unencodable;

        impl Serialize for Unencodable {
            fn serialize<S>(&self, _: S) -> std::result::Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                Err(serde::ser::Error::custom("not representable"))
            }
        }

        let request = HttpRequest::new(HttpMethod::Post, "https://auth.example.com");
        match json_body(request, &Unencodable, "session request") {
            Err(AuthError::InvalidInput(msg)) => {
                assert!(msg.contains("session request"));
                assert!(msg.contains("not representable"));
            }
            other => panic!("expected InvalidInput, got {:?}", other.map(|r| r.url)),
        }
    }

    #[tokio::test]
    async fn test_staging_header_can_be_disabled() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute().times(1).returning(|req| {
            assert!(req.header_value(STAGING_HEADER).is_none());
            Ok(HttpResponse::new(200, session_body(None)))
        });

        let client = CliSessionClient::new(Arc::new(mock), "https://auth.example.com", false);
        client.fetch_session_state("sess_1").await.unwrap();
    }
}

//! Identity resolution
//!
//! Turns an access token into the account it belongs to. Saving a token uses
//! this as its verification step.

use crate::error::{AuthError, Result};
use crate::session::{json_body, STAGING_HEADER};
use crate::types::Identity;
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use core_runtime::LoginConfig;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

const GRAPHQL_PATH: &str = "/graphql";
const VIEWER_QUERY: &str = "query { viewer { id email } }";

/// Resolves the identity behind an access token.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Identity>;
}

/// Asks the service's GraphQL endpoint for the current viewer.
pub struct GraphQlIdentityResolver {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    staging: bool,
}

#[derive(Deserialize)]
struct ViewerResponse {
    data: Option<ViewerData>,
    #[serde(default)]
    errors: Vec<Value>,
}

#[derive(Deserialize)]
struct ViewerData {
    viewer: Option<Identity>,
}

impl GraphQlIdentityResolver {
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
}

#[async_trait]
impl IdentityResolver for GraphQlIdentityResolver {
    async fn resolve(&self, token: &str) -> Result<Identity> {
        let url = format!("{}{}", self.base_url, GRAPHQL_PATH);
        let mut request = json_body(
            HttpRequest::new(HttpMethod::Post, url.clone()).bearer_token(token),
            &json!({ "query": VIEWER_QUERY }),
            "viewer query",
        )?;
        if self.staging {
            request = request.header(STAGING_HEADER, "1");
        }

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::Transport {
                url,
                reason: e.to_string(),
            })?;

        if !response.is_success() {
            return Err(AuthError::Unknown {
                status: response.status,
                payload: serde_json::from_slice(&response.body).ok(),
            });
        }

        let body: ViewerResponse = response.json().map_err(|e| AuthError::Decode {
            context: "viewer response".to_string(),
            reason: e.to_string(),
        })?;

        if !body.errors.is_empty() {
            return Err(AuthError::Unknown {
                status: response.status,
                payload: Some(Value::Array(body.errors)),
            });
        }

        let identity = body
            .data
            .and_then(|data| data.viewer)
            .ok_or_else(|| AuthError::Decode {
                context: "viewer response".to_string(),
                reason: "no viewer in response".to_string(),
            })?;

        debug!(user_id = %identity.id, "Resolved identity");
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::HttpResponse;
    use mockall::mock;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn resolver(mock: MockHttpClient) -> GraphQlIdentityResolver {
        GraphQlIdentityResolver::new(Arc::new(mock), "https://auth.example.com", true)
    }

    fn reply(status: u16, body: Value) -> HttpResponse {
        HttpResponse::new(status, serde_json::to_vec(&body).unwrap())
    }

    #[tokio::test]
    async fn test_resolve_viewer() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute().times(1).returning(|req| {
            assert_eq!(req.url, "https://auth.example.com/graphql");
            assert_eq!(req.header_value("authorization"), Some("Bearer tok_xyz"));
            assert_eq!(req.header_value("x-staging"), Some("1"));
            let body: Value = serde_json::from_slice(req.body.as_ref().unwrap()).unwrap();
            assert_eq!(body["query"], VIEWER_QUERY);

            Ok(reply(
                200,
                json!({"data": {"viewer": {"id": "USER1", "email": "a@b.com"}}}),
            ))
        });

        let identity = resolver(mock).resolve("tok_xyz").await.unwrap();
        assert_eq!(
            identity,
            Identity {
                id: "USER1".to_string(),
                email: "a@b.com".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_graphql_errors_are_rejected() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute().returning(|_| {
            Ok(reply(
                200,
                json!({"data": null, "errors": [{"message": "unauthorized"}]}),
            ))
        });

        let result = resolver(mock).resolve("tok_bad").await;
        assert!(matches!(result, Err(AuthError::Unknown { status: 200, .. })));
    }

    #[tokio::test]
    async fn test_missing_viewer_is_decode_error() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .returning(|_| Ok(reply(200, json!({"data": {"viewer": null}}))));

        let result = resolver(mock).resolve("tok_xyz").await;
        assert!(matches!(result, Err(AuthError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let mut mock = MockHttpClient::new();
        mock.expect_execute()
            .returning(|_| Ok(reply(401, json!({"error": "invalid token"}))));

        let result = resolver(mock).resolve("tok_xyz").await;
        assert!(matches!(result, Err(AuthError::Unknown { status: 401, .. })));
    }
}

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Key under which the access token is persisted in the config store
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// A login session as reported by the session service.
///
/// `access_token` stays empty until the user finishes the browser step.
/// Sessions are never mutated locally; every poll fetches a fresh copy.
///
/// # Examples
///
/// ```
/// use core_auth::Session;
///
/// let session: Session = serde_json::from_str(
///     r#"{"id":"sess_1","url":"https://example.com/cli/sess_1","access_token":null}"#,
/// ).unwrap();
/// assert!(!session.is_authorized());
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub access_token: String,
}

impl Session {
    /// Whether the user has completed authorization
    pub fn is_authorized(&self) -> bool {
        !self.access_token.is_empty()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.access_token.is_empty() {
            ""
        } else {
            "[REDACTED]"
        };
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("access_token", &token)
            .finish()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of a session creation request.
///
/// An arbitrary JSON object plus the mandatory `name`, which is always
/// inserted last and wins over any `name` in the extra arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SessionRequest(Map<String, Value>);

impl SessionRequest {
    pub fn new(name: &str, extra_args: Map<String, Value>) -> Self {
        let mut args = extra_args;
        args.insert("name".to_string(), Value::String(name.to_string()));
        Self(args)
    }

    /// Arguments for a browser login: `{signup, target: "auth", name}`
    pub fn web_auth(name: &str, signup: bool) -> Self {
        let mut args = Map::new();
        args.insert("signup".to_string(), Value::Bool(signup));
        args.insert("target".to_string(), Value::String("auth".to_string()));
        Self::new(name, args)
    }
}

/// The account an access token belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
}

/// Where a credential lives: the store location plus the key inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialLocation {
    pub path: String,
    pub key: String,
}

impl fmt::Display for CredentialLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.key, self.path)
    }
}

/// A persisted access token
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    access_token: String,
    location: CredentialLocation,
}

impl Credential {
    pub fn new(access_token: String, location: CredentialLocation) -> Self {
        Self {
            access_token,
            location,
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn location(&self) -> &CredentialLocation {
        &self.location
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field("location", &self.location)
            .finish()
    }
}

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("Failed to decode {context}: {reason}")]
    Decode { context: String, reason: String },

    #[error("Session {0} not found")]
    NotFound(String),

    #[error("Unexpected response status {status}")]
    Unknown { status: u16, payload: Option<Value> },

    #[error("Login expired, please try again")]
    Timeout,

    #[error("Login cancelled")]
    Cancelled,

    #[error("failed persisting {key} in {path}: {source}")]
    Persistence {
        key: String,
        path: String,
        #[source]
        source: bridge_traits::BridgeError,
    },

    #[error("failed reading {key} from {path}: {source}")]
    Storage {
        key: String,
        path: String,
        #[source]
        source: bridge_traits::BridgeError,
    },

    #[error("failed retrieving current user: {source}")]
    Verification {
        #[source]
        source: Box<AuthError>,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to log in, please try again")]
    LoginFailed,
}

pub type Result<T> = std::result::Result<T, AuthError>;

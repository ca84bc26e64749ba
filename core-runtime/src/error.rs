//! Errors raised while assembling the login runtime

use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A [`LoginConfig`](crate::LoginConfig) setting failed validation
    #[error("Invalid {field}: {reason}")]
    InvalidSetting { field: &'static str, reason: String },

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    /// A desktop default bridge could not be constructed
    #[error("Failed to set up default {capability}: {source}")]
    DefaultBridge {
        capability: &'static str,
        #[source]
        source: BridgeError,
    },

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, Error>;

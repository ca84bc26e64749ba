//! # Authentication Module
//!
//! Browser-delegated login for command-line tools.
//!
//! ## Overview
//!
//! The CLI asks the service for a login session, sends the user to the
//! session's URL, and polls until the browser step hands back an access
//! token. The token is then written to the local config store and checked
//! by resolving the identity it belongs to.
//!
//! ## Features
//!
//! - Session creation and lookup (`session`)
//! - Deadline-bounded, cancellable polling (`poller`)
//! - Token persistence with agent invalidation (`credentials`)
//! - Identity resolution over GraphQL (`identity`)
//! - End-to-end orchestration (`manager`)

pub mod credentials;
pub mod error;
pub mod identity;
pub mod manager;
pub mod poller;
pub mod session;
pub mod types;

pub use credentials::CredentialStore;
pub use error::{AuthError, Result};
pub use identity::{GraphQlIdentityResolver, IdentityResolver};
pub use manager::{LoginManager, LoginOutcome};
pub use poller::{PollSettings, TokenPoller};
pub use session::{CliSessionClient, STAGING_HEADER};
pub use types::{
    Credential, CredentialLocation, Identity, Session, SessionRequest, ACCESS_TOKEN_KEY,
};

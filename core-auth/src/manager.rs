//! Login orchestration
//!
//! [`LoginManager`] runs the whole browser login: create a session, send the
//! user to its URL, poll until the token shows up, then persist and verify
//! the token.
//!
//! ## Example
//!
//! ```ignore
//! use core_auth::LoginManager;
//! use core_runtime::LoginConfig;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = LoginConfig::builder().build()?;
//! let manager = LoginManager::from_config(&config);
//!
//! let outcome = manager.login(false, &CancellationToken::new()).await?;
//! println!("logged in as {}", outcome.identity.email);
//! ```

use crate::credentials::CredentialStore;
use crate::error::{AuthError, Result};
use crate::identity::{GraphQlIdentityResolver, IdentityResolver};
use crate::poller::{PollSettings, TokenPoller};
use crate::session::CliSessionClient;
use crate::types::{Identity, Session};
use bridge_traits::interaction::{ProgressReporter, UrlNotifier};
use core_runtime::LoginConfig;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

const WAITING_MESSAGE: &str = "Waiting for session...";

/// Result of a completed login
#[derive(Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub identity: Identity,
}

impl fmt::Debug for LoginOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginOutcome")
            .field("token", &"[REDACTED]")
            .field("identity", &self.identity)
            .finish()
    }
}

/// Drives a browser-delegated login from session creation to saved token.
pub struct LoginManager {
    sessions: CliSessionClient,
    poller: TokenPoller,
    credentials: CredentialStore,
    settings: PollSettings,
    session_name: String,
    url_notifier: Option<Arc<dyn UrlNotifier>>,
    progress: Arc<dyn ProgressReporter>,
}

impl LoginManager {
    /// Build a manager that verifies tokens against the service's GraphQL
    /// endpoint.
    pub fn from_config(config: &LoginConfig) -> Self {
        let resolver = Arc::new(GraphQlIdentityResolver::from_config(config));
        Self::with_identity_resolver(config, resolver)
    }

    pub fn with_identity_resolver(
        config: &LoginConfig,
        resolver: Arc<dyn IdentityResolver>,
    ) -> Self {
        let sessions = CliSessionClient::from_config(config);
        let poller = TokenPoller::new(sessions.clone(), config.clock.clone());
        let credentials = CredentialStore::new(
            config.config_store.clone(),
            resolver,
            config.agent_control.clone(),
        );

        Self {
            sessions,
            poller,
            credentials,
            settings: PollSettings::from_config(config),
            session_name: config.session_name.clone(),
            url_notifier: config.url_notifier.clone(),
            progress: config.progress.clone(),
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Run the full login and persist the resulting token.
    ///
    /// # Errors
    ///
    /// Anything [`acquire_token`](Self::acquire_token) returns, plus
    /// [`AuthError::Persistence`] and [`AuthError::Verification`] from saving.
    #[instrument(skip(self, cancel))]
    pub async fn login(&self, signup: bool, cancel: &CancellationToken) -> Result<LoginOutcome> {
        let token = self.acquire_token(signup, cancel).await?;
        let identity = self.credentials.save_token(&token).await?;

        self.progress
            .message(&format!("successfully logged in as {}", identity.email));

        Ok(LoginOutcome { token, identity })
    }

    /// Create a session, direct the user to it and wait for the token.
    ///
    /// Nothing is persisted.
    ///
    /// # Errors
    ///
    /// - errors from session creation, unchanged
    /// - [`AuthError::Timeout`] when the user did not finish in time
    /// - [`AuthError::Cancelled`] when `cancel` fired
    /// - [`AuthError::LoginFailed`] if the service handed back an empty token
    #[instrument(skip(self, cancel))]
    pub async fn acquire_token(&self, signup: bool, cancel: &CancellationToken) -> Result<String> {
        let session = self
            .sessions
            .start_web_auth(&self.session_name, signup)
            .await?;
        info!(session_id = %session.id, "Login session started");

        self.direct_user(&session).await;

        self.progress.start(WAITING_MESSAGE);
        let token = match self
            .poller
            .wait_for_token(&session.id, self.settings, cancel)
            .await
        {
            Ok(token) => {
                self.progress.finish(&format!("{} Done", WAITING_MESSAGE));
                token
            }
            Err(e) => {
                self.progress.finish(&format!("{} Failed", WAITING_MESSAGE));
                warn!(session_id = %session.id, error = %e, "Login did not complete");
                return Err(e);
            }
        };

        if token.is_empty() {
            return Err(AuthError::LoginFailed);
        }

        Ok(token)
    }

    async fn direct_user(&self, session: &Session) {
        let opened = match &self.url_notifier {
            Some(notifier) => notifier.notify_url(&session.url).await.is_ok(),
            None => false,
        };

        if !opened {
            self.progress.message(&format!(
                "failed opening browser. Copy the url ({}) into a browser and continue",
                session.url
            ));
        }

        self.progress
            .message(&format!("Opening {} ...", session.url));
    }
}

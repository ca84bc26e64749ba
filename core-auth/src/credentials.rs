//! Credential persistence
//!
//! Saves the access token obtained from a login and verifies it by resolving
//! the identity it belongs to.
//!
//! ## Ordering
//!
//! 1. Tell the background agent to drop its cached session (best effort)
//! 2. Clear the config store (best effort)
//! 3. Write the token under [`ACCESS_TOKEN_KEY`]
//! 4. Resolve the identity behind the token
//!
//! The token is written before it is verified. If verification fails the
//! token stays in the store and the caller gets [`AuthError::Verification`].
//!
//! The store is not locked; concurrent saves race and the last write wins.

use crate::error::{AuthError, Result};
use crate::identity::IdentityResolver;
use crate::types::{Credential, CredentialLocation, Identity, ACCESS_TOKEN_KEY};
use bridge_traits::interaction::AgentControl;
use bridge_traits::storage::ConfigStore;
use core_runtime::logging::redact_if_sensitive;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Persists access tokens in the local config store.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn ConfigStore>,
    resolver: Arc<dyn IdentityResolver>,
    agent: Option<Arc<dyn AgentControl>>,
}

impl CredentialStore {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        resolver: Arc<dyn IdentityResolver>,
        agent: Option<Arc<dyn AgentControl>>,
    ) -> Self {
        Self {
            store,
            resolver,
            agent,
        }
    }

    /// Where the token is (or would be) stored
    pub fn location(&self) -> CredentialLocation {
        CredentialLocation {
            path: self.store.location(),
            key: ACCESS_TOKEN_KEY.to_string(),
        }
    }

    /// Persist `token` and return the identity it belongs to.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidInput`] if `token` is empty
    /// - [`AuthError::Persistence`] if the token could not be written
    /// - [`AuthError::Verification`] if the identity lookup failed; the
    ///   token has already been written at that point
    #[instrument(skip(self, token))]
    pub async fn save_token(&self, token: &str) -> Result<Identity> {
        if token.is_empty() {
            return Err(AuthError::InvalidInput(
                "refusing to persist an empty token".to_string(),
            ));
        }

        if let Some(agent) = &self.agent {
            if let Err(e) = agent.invalidate().await {
                debug!(error = %e, "Agent did not acknowledge invalidation");
            }
        }

        if let Err(e) = self.store.clear_all().await {
            warn!(
                path = %self.store.location(),
                error = %e,
                "Failed to clear config store"
            );
        }

        self.store
            .set_string(ACCESS_TOKEN_KEY, token)
            .await
            .map_err(|e| {
                warn!(path = %self.store.location(), error = %e, "Failed to persist token");
                AuthError::Persistence {
                    key: ACCESS_TOKEN_KEY.to_string(),
                    path: self.store.location(),
                    source: e,
                }
            })?;

        debug!(path = %self.store.location(), "Token persisted");

        let identity = self.resolver.resolve(token).await.map_err(|e| {
            warn!(error = %e, "Persisted token could not be verified");
            AuthError::Verification {
                source: Box::new(e),
            }
        })?;

        info!(
            user_id = %identity.id,
            email = %redact_if_sensitive("email", &identity.email),
            "Token saved"
        );

        Ok(identity)
    }

    /// Read the stored token, if any.
    pub async fn load_token(&self) -> Result<Option<Credential>> {
        let value = self
            .store
            .get_string(ACCESS_TOKEN_KEY)
            .await
            .map_err(|e| AuthError::Storage {
                key: ACCESS_TOKEN_KEY.to_string(),
                path: self.store.location(),
                source: e,
            })?;

        Ok(value
            .filter(|token| !token.is_empty())
            .map(|token| Credential::new(token, self.location())))
    }
}

//! Token polling
//!
//! Waits for the user to finish the browser step by polling the session
//! until it carries an access token.
//!
//! ## Retry policy
//!
//! The service answers "not yet" in several ways (404, an empty token,
//! sometimes an error status while the session is being set up), so every
//! query failure is treated like an empty token: log it at debug level and
//! try again after the poll interval. Only the deadline and cancellation
//! end the wait without a token.
//!
//! ```text
//! Waiting --token--> Authorized
//!    |  \
//!    |   `--deadline--> TimedOut
//!    `--cancel--> Cancelled
//! ```

use crate::error::{AuthError, Result};
use crate::session::CliSessionClient;
use bridge_traits::time::Clock;
use core_runtime::config::{LoginConfig, DEFAULT_DEADLINE, DEFAULT_POLL_INTERVAL};
use core_runtime::logging::redact_token;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Timing of a polling run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Give up once this much time has passed since the first attempt
    pub deadline: Duration,
    /// Pause between attempts
    pub poll_interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            deadline: DEFAULT_DEADLINE,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PollSettings {
    pub fn from_config(config: &LoginConfig) -> Self {
        Self {
            deadline: config.deadline,
            poll_interval: config.poll_interval,
        }
    }
}

/// Polls a CLI session until it is authorized.
#[derive(Clone)]
pub struct TokenPoller {
    sessions: CliSessionClient,
    clock: Arc<dyn Clock>,
}

impl TokenPoller {
    pub fn new(sessions: CliSessionClient, clock: Arc<dyn Clock>) -> Self {
        Self { sessions, clock }
    }

    /// Wait until `session_id` carries a non-empty access token.
    ///
    /// The pause before each retry is clipped to the time left before the
    /// deadline, so a timed-out run ends within one poll interval of it.
    /// Cancellation is observed between attempts and interrupts the pause;
    /// a request already in flight is allowed to finish. The deadline is
    /// measured on the clock's monotonic instant, so wall-clock steps do not
    /// move it.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Timeout`] once `settings.deadline` has elapsed
    /// - [`AuthError::Cancelled`] when `cancel` fires
    #[instrument(skip(self, settings, cancel))]
    pub async fn wait_for_token(
        &self,
        session_id: &str,
        settings: PollSettings,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let started = self.clock.instant();
        let mut attempts: u32 = 0;

        if let Ok(deadline) = chrono::TimeDelta::from_std(settings.deadline) {
            if let Some(expires_at) = self.clock.now().checked_add_signed(deadline) {
                debug!(expires_at = %expires_at.to_rfc3339(), "Waiting for session");
            }
        }

        loop {
            if cancel.is_cancelled() {
                debug!(attempts, "Polling cancelled");
                return Err(AuthError::Cancelled);
            }

            let elapsed = self.clock.elapsed_since(started);
            if elapsed >= settings.deadline {
                debug!(
                    attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Polling deadline reached"
                );
                return Err(AuthError::Timeout);
            }

            attempts += 1;
            match self.sessions.fetch_session_state(session_id).await {
                Ok(session) if session.is_authorized() => {
                    info!(
                        attempts,
                        token = %redact_token(&session.access_token),
                        "Session authorized"
                    );
                    return Ok(session.access_token);
                }
                Ok(_) => debug!(attempts, "Session not authorized yet"),
                Err(e) => debug!(attempts, error = %e, "failed retrieving token"),
            }

            let remaining = settings
                .deadline
                .saturating_sub(self.clock.elapsed_since(started));
            if remaining.is_zero() {
                continue;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(attempts, "Polling cancelled");
                    return Err(AuthError::Cancelled);
                }
                _ = self.clock.sleep(settings.poll_interval.min(remaining)) => {}
            }
        }
    }
}

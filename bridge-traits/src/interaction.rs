//! Host Interaction Abstractions
//!
//! Side-effecting collaborators the login flow needs but must not implement
//! itself: showing the authorization URL to a human, rendering progress, and
//! telling a background agent process to drop cached credentials.

use async_trait::async_trait;

use crate::error::Result;

/// Presents the human-facing authorization URL.
///
/// # Platform Support
///
/// - **Desktop**: open the system browser, or print the link
/// - **Headless**: print the link for the user to copy
///
/// Returning an error means the URL could not be presented automatically;
/// the caller falls back to asking the user to copy it by hand.
#[async_trait]
pub trait UrlNotifier: Send + Sync {
    async fn notify_url(&self, url: &str) -> Result<()>;
}

/// Renders progress and status lines for the user.
///
/// Implementations must not block; they are called from async context.
pub trait ProgressReporter: Send + Sync {
    /// Begin a long-running step (e.g. start a spinner)
    fn start(&self, message: &str);

    /// End the current step with a final line
    fn finish(&self, message: &str);

    /// Print a one-off status line
    fn message(&self, message: &str);
}

/// Control channel to a locally running background agent.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::interaction::AgentControl;
///
/// async fn forget(agent: &dyn AgentControl) {
///     // failures are not fatal, the agent may simply not be running
///     let _ = agent.invalidate().await;
/// }
/// ```
#[async_trait]
pub trait AgentControl: Send + Sync {
    /// Ask the agent to discard any cached session state
    async fn invalidate(&self) -> Result<()>;
}

/// Progress reporter that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn start(&self, _message: &str) {}

    fn finish(&self, _message: &str) {}

    fn message(&self, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_progress_is_object_safe() {
        let reporter: Box<dyn ProgressReporter> = Box::new(SilentProgress);
        reporter.start("Waiting for session...");
        reporter.message("Opening https://example.com ...");
        reporter.finish("Waiting for session... Done");
    }
}

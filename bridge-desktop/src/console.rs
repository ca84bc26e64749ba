//! Browser and terminal implementations of the host interaction traits

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    interaction::{ProgressReporter, UrlNotifier},
};
use std::io::Write;
use tracing::debug;

type Launcher = fn(&str) -> std::io::Result<()>;

/// Opens the URL in the system's default browser.
///
/// Uses the platform launcher (`open`, `xdg-open`, `start`) through the
/// `open` crate. A launcher failure is reported as an error so the login
/// flow falls back to printing the URL.
#[derive(Clone, Copy)]
pub struct BrowserUrlNotifier {
    launcher: Launcher,
}

fn system_browser(url: &str) -> std::io::Result<()> {
    open::that(url)
}

impl Default for BrowserUrlNotifier {
    fn default() -> Self {
        Self {
            launcher: system_browser,
        }
    }
}

impl BrowserUrlNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom launcher instead of the system browser.
    pub fn with_launcher(launcher: Launcher) -> Self {
        Self { launcher }
    }
}

impl std::fmt::Debug for BrowserUrlNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserUrlNotifier").finish_non_exhaustive()
    }
}

#[async_trait]
impl UrlNotifier for BrowserUrlNotifier {
    async fn notify_url(&self, url: &str) -> Result<()> {
        let launcher = self.launcher;
        let target = url.to_string();
        tokio::task::spawn_blocking(move || launcher(&target))
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Browser launch aborted: {}", e)))?
            .map_err(|e| {
                debug!(error = %e, "Failed to open browser");
                BridgeError::OperationFailed(format!("Failed to open browser: {}", e))
            })
    }
}

/// URL notifier for environments without a browser launcher.
///
/// Always reports that the URL could not be opened, so the login flow prints
/// the copy-by-hand instructions instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessUrlNotifier;

#[async_trait]
impl UrlNotifier for HeadlessUrlNotifier {
    async fn notify_url(&self, _url: &str) -> Result<()> {
        Err(BridgeError::NotAvailable(
            "No browser launcher configured".to_string(),
        ))
    }
}

/// Line-based progress output.
///
/// Status messages go to stdout; progress lines go to stderr so they do not
/// pollute piped output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleProgress;

impl ProgressReporter for ConsoleProgress {
    fn start(&self, message: &str) {
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{}", message);
    }

    fn finish(&self, message: &str) {
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{}", message);
    }

    fn message(&self, message: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", message);
    }
}

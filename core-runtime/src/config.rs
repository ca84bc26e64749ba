//! # Login Configuration
//!
//! Holds every setting and host bridge the login handshake needs.
//!
//! ## Overview
//!
//! [`LoginConfig`] is built through [`LoginConfigBuilder`], which validates
//! settings and fails fast when a required bridge is missing.
//!
//! ## Required Dependencies
//!
//! - `HttpClient` - talks to the session service (desktop default: reqwest)
//! - `ConfigStore` - persists the access token (desktop default: JSON file)
//!
//! ## Optional Dependencies
//!
//! - `Clock` - defaults to [`SystemClock`]
//! - `AgentControl` - when absent the agent signal is skipped
//!   (desktop default: Unix control socket)
//! - `UrlNotifier` - when absent the user is asked to copy the URL
//!   (desktop default: `BrowserUrlNotifier`)
//! - `ProgressReporter` - defaults to console output on desktop,
//!   `SilentProgress` otherwise
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::LoginConfig;
//! use std::time::Duration;
//!
//! let config = LoginConfig::builder()
//!     .base_url("https://auth.example.com")
//!     .staging(false)
//!     .deadline(Duration::from_secs(300))
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{
    AgentControl, Clock, ConfigStore, HttpClient, ProgressReporter, SystemClock, UrlNotifier,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default session service endpoint
pub const DEFAULT_BASE_URL: &str = "http://localhost:4000";

/// Default pause between two polls of the session state
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default time the user has to finish the browser step
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(15 * 60);

const FALLBACK_SESSION_NAME: &str = "unknown-host";

/// Configuration for a login handshake.
///
/// Use [`LoginConfig::builder`] to construct instances.
#[derive(Clone)]
pub struct LoginConfig {
    /// Session service base URL, without a trailing slash
    pub base_url: String,

    /// Send the `x-staging: 1` marker header on every request
    pub staging: bool,

    /// Pause between two polls
    pub poll_interval: Duration,

    /// Overall time limit for the polling phase
    pub deadline: Duration,

    /// Name reported to the service when creating a session
    pub session_name: String,

    /// Location of the default config file, if one was chosen
    pub config_path: Option<PathBuf>,

    /// Location of the agent control socket, if one was chosen
    pub agent_socket: Option<PathBuf>,

    pub http_client: Arc<dyn HttpClient>,
    pub config_store: Arc<dyn ConfigStore>,
    pub clock: Arc<dyn Clock>,
    pub agent_control: Option<Arc<dyn AgentControl>>,
    pub url_notifier: Option<Arc<dyn UrlNotifier>>,
    pub progress: Arc<dyn ProgressReporter>,
}

impl std::fmt::Debug for LoginConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginConfig")
            .field("base_url", &self.base_url)
            .field("staging", &self.staging)
            .field("poll_interval", &self.poll_interval)
            .field("deadline", &self.deadline)
            .field("session_name", &self.session_name)
            .field("config_path", &self.config_path)
            .field("agent_socket", &self.agent_socket)
            .field("http_client", &"HttpClient { ... }")
            .field("config_store", &self.config_store.location())
            .field("clock", &"Clock { ... }")
            .field(
                "agent_control",
                &self.agent_control.as_ref().map(|_| "AgentControl { ... }"),
            )
            .field(
                "url_notifier",
                &self.url_notifier.as_ref().map(|_| "UrlNotifier { ... }"),
            )
            .field("progress", &"ProgressReporter { ... }")
            .finish()
    }
}

impl LoginConfig {
    pub fn builder() -> LoginConfigBuilder {
        LoginConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The base URL is an absolute http(s) URL
    /// - Poll interval and deadline are non-zero
    /// - The poll interval does not exceed the deadline
    /// - The session name is not blank
    pub fn validate(&self) -> Result<()> {
        validate_base_url(&self.base_url)?;

        if self.poll_interval.is_zero() {
            return Err(invalid("poll_interval", "must be greater than zero"));
        }

        if self.deadline.is_zero() {
            return Err(invalid("deadline", "must be greater than zero"));
        }

        if self.poll_interval > self.deadline {
            return Err(invalid(
                "poll_interval",
                format!(
                    "{:?} exceeds the deadline of {:?}",
                    self.poll_interval, self.deadline
                ),
            ));
        }

        if self.session_name.trim().is_empty() {
            return Err(invalid("session_name", "cannot be blank"));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> Error {
    Error::InvalidSetting {
        field,
        reason: reason.into(),
    }
}

fn validate_base_url(base_url: &str) -> Result<()> {
    let parsed = Url::parse(base_url)
        .map_err(|e| invalid("base_url", format!("'{}' is not a URL: {}", base_url, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(
            "base_url",
            format!("must use http or https, got '{}'", other),
        )),
    }
}

/// Name announced to the service, normally the machine's hostname.
///
/// Falls back to `unknown-host` when the hostname cannot be read.
pub fn default_session_name() -> String {
    session_name_or_fallback(hostname::get().map(|h| h.to_string_lossy().into_owned()))
}

fn session_name_or_fallback(lookup: std::io::Result<String>) -> String {
    lookup
        .ok()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_SESSION_NAME.to_string())
}

#[cfg(not(feature = "desktop-shims"))]
fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required to reach the session service. \
                 Desktop: enable the 'desktop-shims' feature to use the default ReqwestHttpClient. \
                 Other hosts: inject an HttpClient bridge."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn config_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "ConfigStore".to_string(),
        message: "ConfigStore implementation is required to persist the access token. \
                 Desktop: enable the 'desktop-shims' feature to use the default JsonConfigFile. \
                 Other hosts: inject a ConfigStore bridge."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    let client =
        bridge_desktop::ReqwestHttpClient::new().map_err(|source| Error::DefaultBridge {
            capability: "HttpClient",
            source,
        })?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(http_client_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn default_config_path() -> Result<PathBuf> {
    bridge_desktop::JsonConfigFile::default_path().map_err(|source| Error::DefaultBridge {
        capability: "ConfigStore",
        source,
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_config_store(path: &std::path::Path) -> Result<Arc<dyn ConfigStore>> {
    Ok(Arc::new(bridge_desktop::JsonConfigFile::new(path)))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_config_store(_path: &std::path::Path) -> Result<Arc<dyn ConfigStore>> {
    Err(config_store_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_progress() -> Arc<dyn ProgressReporter> {
    Arc::new(bridge_desktop::ConsoleProgress)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_progress() -> Arc<dyn ProgressReporter> {
    Arc::new(bridge_traits::SilentProgress)
}

/// Builder for [`LoginConfig`].
#[derive(Default)]
pub struct LoginConfigBuilder {
    base_url: Option<String>,
    staging: Option<bool>,
    poll_interval: Option<Duration>,
    deadline: Option<Duration>,
    session_name: Option<String>,
    config_path: Option<PathBuf>,
    agent_socket: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    config_store: Option<Arc<dyn ConfigStore>>,
    clock: Option<Arc<dyn Clock>>,
    agent_control: Option<Arc<dyn AgentControl>>,
    url_notifier: Option<Arc<dyn UrlNotifier>>,
    progress: Option<Arc<dyn ProgressReporter>>,
}

impl LoginConfigBuilder {
    /// Sets the session service base URL.
    ///
    /// Default: [`DEFAULT_BASE_URL`]. A trailing slash is dropped.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Enables or disables the staging marker header. Default: enabled.
    pub fn staging(mut self, staging: bool) -> Self {
        self.staging = Some(staging);
        self
    }

    /// Sets the pause between polls. Default: 1 second.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Sets the polling deadline. Default: 15 minutes.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the name announced when creating a session.
    ///
    /// Default: the machine's hostname.
    pub fn session_name(mut self, name: impl Into<String>) -> Self {
        self.session_name = Some(name.into());
        self
    }

    /// Sets the path of the default JSON config file.
    ///
    /// Ignored when a `ConfigStore` is injected.
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Sets the path of the agent control socket.
    ///
    /// Ignored when an `AgentControl` is injected. Default: `agent.sock`
    /// next to the config file.
    pub fn agent_socket(mut self, path: impl Into<PathBuf>) -> Self {
        self.agent_socket = Some(path.into());
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn config_store(mut self, store: Arc<dyn ConfigStore>) -> Self {
        self.config_store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn agent_control(mut self, agent: Arc<dyn AgentControl>) -> Self {
        self.agent_control = Some(agent);
        self
    }

    pub fn url_notifier(mut self, notifier: Arc<dyn UrlNotifier>) -> Self {
        self.url_notifier = Some(notifier);
        self
    }

    pub fn progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidSetting`] naming the first setting that failed validation
    /// - [`Error::DefaultBridge`] when a desktop default cannot be constructed
    /// - [`Error::CapabilityMissing`] when a required bridge is absent and no
    ///   desktop default is available
    pub fn build(self) -> Result<LoginConfig> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let session_name = self.session_name.unwrap_or_else(default_session_name);

        #[cfg(feature = "desktop-shims")]
        let config_path = match self.config_path {
            Some(path) => Some(path),
            None if self.config_store.is_none() => Some(default_config_path()?),
            None => None,
        };

        #[cfg(not(feature = "desktop-shims"))]
        let config_path = self.config_path;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let config_store = match (self.config_store, config_path.as_deref()) {
            (Some(store), _) => store,
            (None, Some(path)) => provide_default_config_store(path)?,
            (None, None) => provide_default_config_store(std::path::Path::new(""))?,
        };

        #[cfg(feature = "desktop-shims")]
        let agent_socket = self.agent_socket.or_else(|| {
            config_path
                .as_ref()
                .and_then(|p| p.parent())
                .map(|dir| dir.join(bridge_desktop::DEFAULT_AGENT_SOCKET))
        });

        #[cfg(not(feature = "desktop-shims"))]
        let agent_socket = self.agent_socket;

        #[cfg(feature = "desktop-shims")]
        let agent_control = self.agent_control.or_else(|| {
            agent_socket.as_ref().map(|path| {
                Arc::new(bridge_desktop::SocketAgentControl::new(path)) as Arc<dyn AgentControl>
            })
        });

        #[cfg(not(feature = "desktop-shims"))]
        let agent_control = self.agent_control;

        #[cfg(feature = "desktop-shims")]
        let url_notifier = self.url_notifier.or_else(|| {
            Some(Arc::new(bridge_desktop::BrowserUrlNotifier::new()) as Arc<dyn UrlNotifier>)
        });

        #[cfg(not(feature = "desktop-shims"))]
        let url_notifier = self.url_notifier;

        let config = LoginConfig {
            base_url,
            staging: self.staging.unwrap_or(true),
            poll_interval: self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            deadline: self.deadline.unwrap_or(DEFAULT_DEADLINE),
            session_name,
            config_path,
            agent_socket,
            http_client,
            config_store,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            agent_control,
            url_notifier,
            progress: self.progress.unwrap_or_else(provide_default_progress),
        };

        config.validate()?;
        Ok(config)
    }
}

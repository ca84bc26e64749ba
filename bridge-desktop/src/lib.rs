//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` (rustls)
//! - `ConfigStore` using a JSON file under `~/.weblogin`
//! - `AgentControl` using the agent's Unix control socket
//! - `UrlNotifier` opening the system browser (or a headless variant)
//! - `ProgressReporter` writing to the terminal
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{JsonConfigFile, ReqwestHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let config = JsonConfigFile::new(JsonConfigFile::default_path()?);
//!     // Use in LoginConfig
//!     Ok(())
//! }
//! ```

mod agent;
mod config_file;
mod console;
mod http;

pub use agent::{SocketAgentControl, DEFAULT_AGENT_SOCKET};
pub use config_file::{JsonConfigFile, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILE};
pub use console::{BrowserUrlNotifier, ConsoleProgress, HeadlessUrlNotifier};
pub use http::ReqwestHttpClient;

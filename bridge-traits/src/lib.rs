//! # Host Bridge Traits
//!
//! Platform abstraction traits that the login core depends on but never
//! implements itself.
//!
//! ## Overview
//!
//! This crate defines the contract between the login handshake and whatever
//! host runs it. Each trait represents a capability that the core requires
//! but that differs between a desktop CLI, a test harness, or an embedding
//! application.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Single-attempt async HTTP
//!
//! ### Storage
//! - [`ConfigStore`](storage::ConfigStore) - Key-value record holding the access token
//!
//! ### Host Interaction
//! - [`UrlNotifier`](interaction::UrlNotifier) - Show/open the authorization URL
//! - [`ProgressReporter`](interaction::ProgressReporter) - Progress and status lines
//! - [`AgentControl`](interaction::AgentControl) - Invalidate a background agent's cache
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source and scheduler for deterministic testing
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Implementations should convert platform errors into it and keep the
//! context (URL, path) in the message.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! as `Arc<dyn Trait>` across async tasks.

pub mod error;
pub mod http;
pub mod interaction;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use interaction::{AgentControl, ProgressReporter, SilentProgress, UrlNotifier};
pub use storage::ConfigStore;
pub use time::{Clock, ManualClock, SystemClock};

//! # Core Runtime Module
//!
//! Provides the runtime infrastructure the login handshake is built on:
//! - Logging and tracing setup
//! - Configuration management with bridge injection
//!
//! ## Overview
//!
//! Hosts build a [`LoginConfig`](config::LoginConfig) once, optionally call
//! [`init_logging`](logging::init_logging), and hand the config to
//! `core-auth`.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{LoginConfig, LoginConfigBuilder};
pub use error::{Error, Result};

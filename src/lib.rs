//! Workspace entry crate.
//!
//! Re-exports the login handshake (`core-auth`) together with the runtime
//! configuration it is built from (`core-runtime`). Hosts can depend on
//! `weblogin-workspace` and toggle `desktop-shims` without wiring each crate
//! individually.

pub use core_auth as auth;
pub use core_runtime as runtime;

//! # Infrastructure Layer
//!
//! Startup-time concerns that sit outside the domain/application layers:
//! layered configuration loading (§6.5) and `tracing`-based structured
//! logging. Contains no knowledge-base or crawl business logic; the
//! `kbmcp` binary crate is the only consumer that wires this layer
//! together with `kbmcp-application` and `kbmcp-providers`.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | `Settings` tree, `ConfigLoader`, startup validation |
//! | [`logging`] | `tracing` subscriber initialization |

/// Layered configuration loading and validation.
pub mod config;
/// Structured logging setup.
pub mod logging;

pub use config::{ConfigLoader, Settings};
pub use logging::LoggingConfig;

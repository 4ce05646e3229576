//! Port Traits
//!
//! Capability interfaces the application layer programs against. Each
//! trait corresponds to one of the consumer contracts in §6 of the
//! system specification; concrete adapters live in `kbmcp-providers` and
//! are wired in by `kbmcp-infrastructure`.
//!
//! | Port | Consumer contract |
//! |------|--------------------|
//! | [`BackendPort`] | §6.2 document/vector store |
//! | [`ContainerPort`] | §6.3 container runtime |
//! | [`WebProbePort`] | robots/link extraction |

/// Document/vector store consumer contract.
pub mod backend;
/// Container runtime consumer contract.
pub mod container;
/// Web probe consumer contract.
pub mod web_probe;

pub use backend::BackendPort;
pub use container::ContainerPort;
pub use web_probe::WebProbePort;

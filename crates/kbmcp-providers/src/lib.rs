//! # Providers
//!
//! Concrete adapters over the port traits declared in `kbmcp-domain`: an
//! Elasticsearch-flavored document/vector store, a Docker Engine-flavored
//! container runtime, and an HTML/robots web probe. Every adapter talks
//! HTTP via a shared `reqwest::Client` style and translates transport and
//! protocol failures into `kbmcp_domain::error::Error`.
//!
//! | Module | Port | Wire protocol |
//! |--------|------|----------------|
//! | [`elasticsearch`] | `BackendPort` | Elasticsearch REST API over HTTP |
//! | [`docker`] | `ContainerPort` | Docker Engine API over HTTP |
//! | [`web_probe`] | `WebProbePort` | Plain HTTP GET + HTML parsing |

/// Elasticsearch-flavored `BackendPort` adapter.
pub mod elasticsearch;
/// Docker Engine-flavored `ContainerPort` adapter.
pub mod docker;
/// HTML/robots `WebProbePort` adapter.
pub mod web_probe;

pub use docker::DockerContainerRuntime;
pub use elasticsearch::ElasticsearchBackend;
pub use web_probe::HttpWebProbe;

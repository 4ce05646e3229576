//! Value objects exchanged with the Container Adapter (§6.3).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entities::crawl_job::CrawlJobState;

/// Parameters for creating a new container, mirroring the contract in
/// §6.3: `create(image, command, labels, autoremove, memory_reservation)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// The worker image to run.
    pub image: String,
    /// The entrypoint command, e.g. `["ruby", "bin/crawler", "crawl", "/config/crawl.yml"]`.
    pub command: Vec<String>,
    /// Labels attached at creation; used for fleet enumeration and cleanup.
    pub labels: HashMap<String, String>,
    /// Whether the runtime should remove the container automatically on
    /// exit. Always `false` for crawl workers so logs remain retrievable.
    pub autoremove: bool,
    /// Minimum memory reservation in bytes.
    pub memory_reservation_bytes: u64,
}

/// One container as reported by the runtime's `list` operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerInfo {
    /// The runtime's opaque container id.
    pub id: String,
    /// Labels attached at creation.
    pub labels: HashMap<String, String>,
    /// Observed lifecycle state.
    pub state: CrawlJobState,
}

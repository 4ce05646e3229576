//! Crawl job entity tracked by the Crawl Orchestrator.

use serde::{Deserialize, Serialize};

/// The fixed label value every crawl container carries, identifying the
/// owning process class so `list_crawls`/`remove_completed_crawls` can
/// enumerate exactly the containers this service launched.
pub const MANAGED_BY_LABEL: &str = "kbmcp";

/// Observed lifecycle state of a [`CrawlJob`], as reported by the
/// container runtime's `list` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlJobState {
    /// The container is running.
    Running,
    /// The container terminated, successfully or not.
    Exited,
    /// Any other state the runtime reports (e.g. `created`, `paused`).
    Other,
}

/// An in-flight or terminated crawl worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlJob {
    /// The container adapter's opaque id.
    pub id: String,
    /// The origin domain this job crawls, carried as the `crawl-domain`
    /// label at launch.
    pub domain: String,
    /// Observed lifecycle state.
    pub state: CrawlJobState,
}

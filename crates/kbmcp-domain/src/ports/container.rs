use async_trait::async_trait;

use crate::error::Result;
use crate::value_objects::ContainerInfo;

/// The container runtime consumer contract (§6.3).
///
/// Implementations must be safe for concurrent use; operations on
/// distinct containers commute and operations on the same container are
/// serialized by the adapter.
#[async_trait]
pub trait ContainerPort: Send + Sync {
    /// Pull a worker image, if not already present locally.
    async fn pull(&self, image: &str) -> Result<()>;

    /// Create a container from a spec, returning the runtime's opaque id.
    /// Does not start it.
    async fn create(
        &self,
        image: &str,
        command: &[String],
        labels: &std::collections::HashMap<String, String>,
        autoremove: bool,
        memory_reservation_bytes: u64,
    ) -> Result<String>;

    /// Inject a tar archive's contents at `path` inside the container.
    async fn put_archive(&self, container_id: &str, path: &str, tar_bytes: Vec<u8>) -> Result<()>;

    /// Start a previously created container.
    async fn start(&self, container_id: &str) -> Result<()>;

    /// List containers whose labels match every entry in `filters`.
    async fn list(
        &self,
        filters: &std::collections::HashMap<String, String>,
    ) -> Result<Vec<ContainerInfo>>;

    /// Collect a container's combined stdout/stderr log stream.
    async fn logs(&self, container_id: &str) -> Result<String>;

    /// Remove a container, optionally forcing removal of a running one.
    async fn remove(&self, container_id: &str, force: bool) -> Result<()>;
}

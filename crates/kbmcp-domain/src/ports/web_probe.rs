use async_trait::async_trait;

use crate::error::Result;
use crate::value_objects::WebProbeResult;

/// Fetches a URL and reports robots directives and partitioned link sets.
#[async_trait]
pub trait WebProbePort: Send + Sync {
    /// Fetch `url`, restricting the reported `urls_to_crawl` to links
    /// whose domain equals `domain_filter` and whose path begins with
    /// `path_filter`.
    async fn probe(&self, url: &str, domain_filter: &str, path_filter: &str) -> Result<WebProbeResult>;
}

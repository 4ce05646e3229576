//! Value objects exchanged with the Web Probe.

use serde::{Deserialize, Serialize};

/// The outcome of fetching one URL and reading its robots directives and
/// link set, per the `extract_urls(url, domain_filter, path_filter)`
/// contract named in the overview's "Explicitly out of scope" section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebProbeResult {
    /// Whether the page's `<meta name="robots">` reports `noindex`.
    pub noindex: bool,
    /// Whether the page's `<meta name="robots">` reports `nofollow`.
    pub nofollow: bool,
    /// Links that pass the domain/path filter and are not marked
    /// `nofollow`; these are the crawl candidates.
    pub urls_to_crawl: Vec<String>,
    /// Links that were excluded because they (or their containing
    /// anchor) are marked `nofollow`. Never counted toward the
    /// `max_child_limit` check.
    pub skipped_urls: Vec<String>,
}

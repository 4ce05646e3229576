//! Value objects for crawl-parameter derivation and config generation (§4.2).

use serde::{Deserialize, Serialize};

/// Parameters derived, purely, from a seed URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlParams {
    /// The original URL the crawl was requested for.
    pub seed_url: String,
    /// `scheme://authority` of `seed_url`.
    pub domain: String,
    /// The path prefix crawled links must fall under.
    pub filter_pattern: String,
}

/// A single crawl-rule entry in the generated config document, matching
/// the worker's `{policy, type, pattern}` rule shape (§4.2, §6.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlRule {
    /// `"allow"` or `"deny"`.
    pub policy: &'static str,
    /// `"begins"` or `"regex"`.
    #[serde(rename = "type")]
    pub rule_type: &'static str,
    /// The path prefix or regular expression this rule matches.
    pub pattern: String,
}

impl CrawlRule {
    /// `{policy: "deny", type: "begins", pattern}`.
    pub fn deny_begins(pattern: impl Into<String>) -> Self {
        Self { policy: "deny", rule_type: "begins", pattern: pattern.into() }
    }

    /// `{policy: "allow", type: "begins", pattern}`.
    pub fn allow_begins(pattern: impl Into<String>) -> Self {
        Self { policy: "allow", rule_type: "begins", pattern: pattern.into() }
    }

    /// `{policy: "deny", type: "regex", pattern}`.
    pub fn deny_regex(pattern: impl Into<String>) -> Self {
        Self { policy: "deny", rule_type: "regex", pattern: pattern.into() }
    }
}

/// One crawl domain entry in the generated config document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfigDomain {
    /// The domain this entry governs.
    pub url: String,
    /// The seed URLs to start crawling from within this domain.
    pub seed_urls: Vec<String>,
    /// Crawl rules applied in order.
    pub crawl_rules: Vec<CrawlRule>,
}

/// The structured config document handed to the crawl worker at
/// `/config/crawl.yml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Domains this crawl should visit.
    pub domains: Vec<CrawlConfigDomain>,
    /// The sink the worker writes results into; always `"elasticsearch"`
    /// or a functional equivalent.
    pub output_sink: String,
    /// The backend collection id results are written into.
    pub output_index: String,
    /// Backend-connection configuration, composed verbatim from the
    /// wiring layer; its schema is opaque to this layer. Emitted under
    /// the worker's `elasticsearch:` top-level key.
    pub elasticsearch: serde_json::Value,
}

//! Search result types produced by the search fan-out engine.

use serde::{Deserialize, Serialize};

use super::document::Document;

/// Per-knowledge-base match-count summary for a single phrase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KnowledgeBaseSummary {
    /// The knowledge base's display name.
    pub knowledge_base_name: String,
    /// The number of matches attributed to that knowledge base, computed
    /// over the matched set, not just the returned hits.
    pub matches: u64,
}

/// The outcome of running one phrase against the search engine.
///
/// The discriminator between the success and failure shape is the presence
/// of `error`; callers should treat this as a tagged union
/// (`SearchResultTypes = SearchResult | SearchResultError`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchOutcome {
    /// At least one hit scored above the relevance floor.
    Hit(SearchResult),
    /// No hits cleared the relevance floor, or the backend reported a
    /// phrase-local error. Never aborts the containing batch.
    Error(SearchResultError),
}

impl SearchOutcome {
    /// The phrase this outcome answers, regardless of variant.
    pub fn phrase(&self) -> &str {
        match self {
            Self::Hit(r) => &r.phrase,
            Self::Error(e) => &e.phrase,
        }
    }
}

/// A successful phrase search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The phrase this result answers.
    pub phrase: String,
    /// Top-N highest-scoring hits across all selected knowledge bases,
    /// sorted by non-increasing score.
    pub results: Vec<Document>,
    /// Per-knowledge-base match-count aggregation over the matched set.
    pub summaries: Vec<KnowledgeBaseSummary>,
}

/// A failed phrase search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultError {
    /// The phrase this result answers.
    pub phrase: String,
    /// Human-readable explanation.
    pub error: String,
}

/// Selects both `n_hits` and `n_fragments` for a question-answering call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuestionAnswerStyle {
    /// One hit, one fragment.
    Concise,
    /// Three hits, three fragments.
    Normal,
    /// Six hits, six fragments.
    Comprehensive,
    /// Nine hits, nine fragments.
    Exhaustive,
}

impl QuestionAnswerStyle {
    /// The `n_hits` value this style selects.
    pub fn n_hits(self) -> u32 {
        match self {
            Self::Concise => 1,
            Self::Normal => 3,
            Self::Comprehensive => 6,
            Self::Exhaustive => 9,
        }
    }

    /// The `n_fragments` value this style selects.
    ///
    /// Identical to [`Self::n_hits`] by contract: one style picks both.
    pub fn n_fragments(self) -> u32 {
        self.n_hits()
    }
}

impl Default for QuestionAnswerStyle {
    fn default() -> Self {
        Self::Normal
    }
}

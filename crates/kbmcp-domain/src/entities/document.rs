//! Document entity stored within a knowledge base.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single indexed item within one knowledge base.
///
/// `knowledge_base_name` is a runtime projection: it is never stored on the
/// document itself, only recomputed from the owning knowledge base's
/// metadata at query time (see the `knowledge_base_name` runtime field in
/// the Backend Adapter's mapping). `score` is only populated when this
/// `Document` was produced by the hit-projection step of a search (§4.3.1);
/// it is absent for documents read via `get_recent_documents` or returned
/// from insert/update calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Backend-assigned identifier.
    pub id: String,
    /// The owning knowledge base's name, projected at query time.
    pub knowledge_base_name: String,
    /// Document title.
    pub title: String,
    /// Document body, or the matched highlight fragments when this
    /// document came from a search hit.
    pub content: String,
    /// Origin URL, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Insertion timestamp, when known.
    #[serde(rename = "@timestamp", skip_serializing_if = "Option::is_none")]
    pub indexed_at: Option<DateTime<Utc>>,
    /// Relevance score, present only on documents produced by a search hit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// The caller-supplied shape for a new document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentWrite {
    /// Document title.
    pub title: String,
    /// Document body.
    pub content: String,
}

/// Fields accepted by a single-document update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentUpdate {
    /// New title, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New body, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A free-form memory recorded by the Remember sub-server.
///
/// A thin alias over [`DocumentWrite`]: memories are documents whose title
/// and content carry no additional structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    /// Short label for the memory.
    pub title: String,
    /// The remembered content.
    pub content: String,
}

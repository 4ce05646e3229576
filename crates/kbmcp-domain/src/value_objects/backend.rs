//! Value objects exchanged with the Backend Adapter (§6.2).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::knowledge_base::KnowledgeBase;

/// The standard document mapping plus the `_meta.knowledge_base` block and
/// the `knowledge_base_name` runtime field a new collection is created with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionMapping {
    /// The `_meta.knowledge_base` block: the four proto fields that make up
    /// a [`KnowledgeBase`]'s identity, minus `backend_id` and `doc_count`.
    pub meta: CollectionMeta,
    /// The runtime field emitting the owning knowledge base's `name`, with
    /// embedded `"` escaped.
    pub knowledge_base_name_runtime_script: String,
}

/// The persisted `_meta.knowledge_base` block for one collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionMeta {
    /// The knowledge base's display name.
    pub name: String,
    /// The knowledge base's type.
    #[serde(rename = "type")]
    pub kb_type: String,
    /// The knowledge base's description.
    pub description: String,
    /// The knowledge base's data source descriptor.
    pub data_source: String,
}

impl CollectionMeta {
    /// Build a runtime-field script emitting this meta's `name`, with
    /// embedded `"` escaped, as required by the Knowledge Base Manager's
    /// `create` contract.
    pub fn runtime_name_script(&self) -> String {
        format!("emit('{}');", self.name.replace('"', "\\\""))
    }
}

/// One backend collection's observed statistics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct CollectionStats {
    /// Observed document count.
    pub doc_count: u64,
}

/// A `get_mapping` response entry: the collection's meta block alongside
/// its runtime field definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionDescriptor {
    /// Collection id as reported by the backend.
    pub id: String,
    /// The `_meta.knowledge_base` block.
    pub meta: CollectionMeta,
}

impl CollectionDescriptor {
    /// Project this descriptor into a [`KnowledgeBase`], pairing it with a
    /// separately-fetched document count.
    pub fn into_knowledge_base(self, doc_count: u64) -> KnowledgeBase {
        KnowledgeBase {
            name: self.meta.name,
            kb_type: self.meta.kb_type,
            description: self.meta.description,
            data_source: self.meta.data_source,
            backend_id: self.id,
            doc_count,
        }
    }
}

/// One document to be bulk-inserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkDocument {
    /// Document title.
    pub title: String,
    /// Document body.
    pub content: String,
}

/// The outcome of a single item within a bulk insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkItemResult {
    /// Backend-assigned id for the inserted item.
    pub id: String,
    /// Failure reason, if this item failed. The batch is atomic per
    /// document, non-atomic across the batch: other items may still have
    /// succeeded.
    pub error: Option<String>,
}

/// A field-level partial update to a single document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocFieldUpdate {
    /// New title, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New body, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A backend query, shaped per §4.3 "Phrase → query".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Restricts candidate documents to those whose `knowledge_base_name`
    /// is in this set. Empty means no restriction (match all).
    pub knowledge_base_names: Vec<String>,
    /// The phrase to match against `headings` (lexical) and `body`
    /// (semantic).
    pub phrase: String,
    /// Relevance floor; hits scoring below this are dropped.
    pub min_score: f64,
    /// Maximum hits to return, sorted by non-increasing score.
    pub size: u32,
    /// Number of highlight fragments to request on `body`.
    pub n_fragments: u32,
    /// Highlight fragment length in characters.
    pub fragment_size: u32,
}

/// One hit within a [`SearchResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Backend-assigned document id.
    pub id: String,
    /// Relevance score assigned by the backend.
    pub score: f64,
    /// The `knowledge_base_name` field of the owning document, if present.
    pub knowledge_base_name: Option<String>,
    /// The `title` field, if present.
    pub title: Option<String>,
    /// The `url` field, if present.
    pub url: Option<String>,
    /// The raw `body` field, used when no highlight fragment exists.
    pub body: Option<String>,
    /// Highlighted fragments of `body`, when the query requested them and
    /// the backend found a match span.
    pub highlight_body: Vec<String>,
}

/// One backend response to a single query, whether issued alone via
/// `search` or as part of a `multi_search` batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Matching hits, already sorted by non-increasing score.
    pub hits: Vec<SearchHit>,
    /// Per-knowledge-base match counts from the `terms` aggregation.
    pub aggregations: HashMap<String, u64>,
}

/// Arbitrary backend-connection configuration handed verbatim to the
/// Crawl Orchestrator's config generation step; its schema is opaque to
/// the domain layer (§4.2 "Config generation").
pub type BackendConnectionConfig = Value;

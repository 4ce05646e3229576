//! Knowledge base entity and the prototypes used to create/update it.

use serde::{Deserialize, Serialize};

/// A named collection of documents.
///
/// `name` is unique (case-sensitive) across every knowledge base managed by
/// this process. `backend_id` is the opaque storage-level collection
/// identifier derived once at creation time and never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KnowledgeBase {
    /// Unique, case-sensitive display name.
    pub name: String,
    /// The kind of collection, e.g. `"docs"` or `"memory"`.
    #[serde(rename = "type")]
    pub kb_type: String,
    /// Free-form human description.
    pub description: String,
    /// Opaque origin descriptor: a URL, a workspace name, etc.
    pub data_source: String,
    /// Storage-level collection id, opaque to callers.
    pub backend_id: String,
    /// Observed document count, not authoritative.
    pub doc_count: u64,
}

/// The well-known knowledge base type used by the Learn sub-server.
pub const KB_TYPE_DOCS: &str = "docs";
/// The well-known knowledge base type used by the Remember sub-server.
pub const KB_TYPE_MEMORY: &str = "memory";

/// Fields required to create a new [`KnowledgeBase`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseCreateProto {
    /// The unique display name for the new knowledge base.
    pub name: String,
    /// The kind of collection, e.g. `"docs"` or `"memory"`.
    #[serde(rename = "type")]
    pub kb_type: String,
    /// Free-form human description.
    pub description: String,
    /// Opaque origin descriptor, sanitized into part of `backend_id`.
    pub data_source: String,
}

/// Fields accepted by [`KnowledgeBase`] metadata updates.
///
/// Only `name` and `description` are updatable; `type`, `data_source` and
/// `backend_id` are fixed at creation time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeBaseUpdate {
    /// New display name, if renaming.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

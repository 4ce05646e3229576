use async_trait::async_trait;

use crate::error::Result;
use crate::value_objects::{
    BulkDocument, BulkItemResult, CollectionDescriptor, CollectionMapping, DocFieldUpdate,
    SearchQuery, SearchResponse,
};

/// The document/vector store consumer contract (§6.2).
///
/// Implementations translate a concrete backend's errors into
/// [`crate::error::Error`] and must be safe for concurrent use: the
/// connection is shared across every task the process serves.
#[async_trait]
pub trait BackendPort: Send + Sync {
    /// Create a new collection with the standard document mapping, the
    /// `_meta.knowledge_base` block and the `knowledge_base_name` runtime
    /// field.
    async fn create_collection(&self, id: &str, mapping: &CollectionMapping) -> Result<()>;

    /// Destroy a collection and every document in it.
    async fn delete_collection(&self, id: &str) -> Result<()>;

    /// Overwrite a collection's `_meta`/runtime field definitions without
    /// touching its data mapping.
    async fn put_mapping(&self, id: &str, mapping: &CollectionMapping) -> Result<()>;

    /// Fetch meta/runtime descriptors for every collection matching a
    /// glob-style pattern (e.g. `"kbmcp-*"`).
    async fn get_mapping(&self, pattern: &str) -> Result<Vec<CollectionDescriptor>>;

    /// Fetch observed document counts for every collection matching
    /// `pattern`, keyed by collection id.
    async fn stats(&self, pattern: &str) -> Result<std::collections::HashMap<String, u64>>;

    /// Bulk-insert documents into one collection. Atomic per document,
    /// non-atomic across the batch.
    async fn bulk_index(&self, id: &str, docs: &[BulkDocument]) -> Result<Vec<BulkItemResult>>;

    /// Apply a partial update to a single document by id.
    async fn update_doc(&self, id: &str, doc_id: &str, fields: &DocFieldUpdate) -> Result<()>;

    /// Delete a single document by id.
    async fn delete_doc(&self, id: &str, doc_id: &str) -> Result<()>;

    /// Fetch up to `n` documents from a collection, ordered by
    /// `@timestamp` descending.
    async fn recent_documents(
        &self,
        id: &str,
        n: u32,
    ) -> Result<Vec<crate::entities::Document>>;

    /// Run one query against every collection matching `pattern`.
    async fn search(&self, pattern: &str, query: &SearchQuery) -> Result<SearchResponse>;

    /// Run a batch of independent `(pattern, query)` pairs in a single
    /// backend round trip, returning responses positionally.
    async fn multi_search(&self, queries: &[(String, SearchQuery)]) -> Result<Vec<SearchResponse>>;

    /// A liveness check with a short timeout, used at startup.
    async fn ping(&self) -> Result<()>;
}

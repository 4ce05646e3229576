//! The Knowledge Base Manager (§4.1): collection lifecycle, document CRUD
//! and the entry points to the search fan-out engine.

use std::sync::Arc;

use kbmcp_domain::entities::{
    Document, DocumentUpdate, DocumentWrite, KnowledgeBase, KnowledgeBaseCreateProto,
    KnowledgeBaseUpdate, SearchOutcome,
};
use kbmcp_domain::error::{Error, Result};
use kbmcp_domain::ports::BackendPort;
use kbmcp_domain::value_objects::{
    BulkDocument, CollectionMapping, CollectionMeta, DocFieldUpdate,
};

use crate::sanitize::derive_backend_id;
use crate::search::{assemble_outcome, build_query};

/// Collection lifecycle, document CRUD and multi-phrase search over every
/// knowledge base whose `backend_id` matches this manager's index prefix.
pub struct KnowledgeBaseManager {
    backend: Arc<dyn BackendPort>,
    index_prefix: String,
}

impl KnowledgeBaseManager {
    /// Construct a manager bound to one backend connection and index
    /// prefix (the `base_index_prefix` configuration value, §6.5).
    pub fn new(backend: Arc<dyn BackendPort>, index_prefix: impl Into<String>) -> Self {
        Self { backend, index_prefix: index_prefix.into() }
    }

    fn pattern(&self) -> String {
        format!("{}-*", self.index_prefix)
    }

    /// Enumerate every knowledge base matching this manager's prefix,
    /// sorted by name, case-insensitive.
    pub async fn list(&self) -> Result<Vec<KnowledgeBase>> {
        let descriptors = self.backend.get_mapping(&self.pattern()).await?;
        let stats = self.backend.stats(&self.pattern()).await?;

        let mut kbs: Vec<KnowledgeBase> = descriptors
            .into_iter()
            .map(|descriptor| {
                let doc_count = stats.get(&descriptor.id).copied().unwrap_or(0);
                descriptor.into_knowledge_base(doc_count)
            })
            .collect();

        kbs.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(kbs)
    }

    /// Create a new knowledge base. Fails [`Error::AlreadyExists`] if a
    /// knowledge base with `proto.name` already exists.
    pub async fn create(&self, proto: KnowledgeBaseCreateProto) -> Result<KnowledgeBase> {
        if self.try_get_by_name(&proto.name).await?.is_some() {
            return Err(Error::already_exists(proto.name));
        }

        let backend_id = derive_backend_id(&self.index_prefix, &proto.kb_type, &proto.data_source);
        let meta = CollectionMeta {
            name: proto.name.clone(),
            kb_type: proto.kb_type.clone(),
            description: proto.description.clone(),
            data_source: proto.data_source.clone(),
        };
        let mapping = CollectionMapping {
            knowledge_base_name_runtime_script: meta.runtime_name_script(),
            meta,
        };

        self.backend.create_collection(&backend_id, &mapping).await?;

        Ok(KnowledgeBase {
            name: proto.name,
            kb_type: proto.kb_type,
            description: proto.description,
            data_source: proto.data_source,
            backend_id,
            doc_count: 0,
        })
    }

    /// Look up a knowledge base by name. Raises [`Error::NotFound`] if
    /// none matches, [`Error::NonUnique`] if more than one does.
    pub async fn get_by_name(&self, name: &str) -> Result<KnowledgeBase> {
        let mut matches: Vec<KnowledgeBase> =
            self.list().await?.into_iter().filter(|kb| kb.name == name).collect();

        match matches.len() {
            0 => Err(Error::not_found(format!("knowledge base '{name}'"))),
            1 => Ok(matches.remove(0)),
            _ => Err(Error::non_unique(format!("knowledge base '{name}'"))),
        }
    }

    /// Look up a knowledge base by name, returning `None` instead of
    /// raising [`Error::NotFound`] or [`Error::NonUnique`].
    pub async fn try_get_by_name(&self, name: &str) -> Result<Option<KnowledgeBase>> {
        match self.get_by_name(name).await {
            Ok(kb) => Ok(Some(kb)),
            Err(Error::NotFound { .. } | Error::NonUnique { .. }) => Ok(None),
            Err(other) => Err(other),
        }
    }

    /// Merge `update` into `kb`'s metadata and persist it. Does not touch
    /// the collection's data mapping.
    pub async fn update(&self, kb: &KnowledgeBase, update: KnowledgeBaseUpdate) -> Result<()> {
        let meta = CollectionMeta {
            name: update.name.unwrap_or_else(|| kb.name.clone()),
            kb_type: kb.kb_type.clone(),
            description: update.description.unwrap_or_else(|| kb.description.clone()),
            data_source: kb.data_source.clone(),
        };
        let mapping = CollectionMapping {
            knowledge_base_name_runtime_script: meta.runtime_name_script(),
            meta,
        };
        self.backend.put_mapping(&kb.backend_id, &mapping).await
    }

    /// Destroy a knowledge base and every document in it.
    pub async fn delete(&self, kb: &KnowledgeBase) -> Result<()> {
        self.backend.delete_collection(&kb.backend_id).await
    }

    /// Bulk-insert documents into `kb`. A zero-document call is a no-op.
    /// Fails if the backend reports any item failure.
    pub async fn insert_documents(&self, kb: &KnowledgeBase, docs: Vec<DocumentWrite>) -> Result<()> {
        if docs.is_empty() {
            return Ok(());
        }

        let bulk_docs: Vec<BulkDocument> =
            docs.into_iter().map(|d| BulkDocument { title: d.title, content: d.content }).collect();

        let results = self.backend.bulk_index(&kb.backend_id, &bulk_docs).await?;
        let failures: Vec<String> = results.into_iter().filter_map(|r| r.error).collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::creation(format!(
                "{} of the batch failed to index: {}",
                failures.len(),
                failures.join("; ")
            )))
        }
    }

    /// Update a single document by id.
    pub async fn update_document(&self, kb: &KnowledgeBase, id: &str, update: DocumentUpdate) -> Result<()> {
        let fields = DocFieldUpdate { title: update.title, content: update.content };
        self.backend.update_doc(&kb.backend_id, id, &fields).await
    }

    /// Delete a single document by id.
    pub async fn delete_document(&self, kb: &KnowledgeBase, id: &str) -> Result<()> {
        self.backend.delete_doc(&kb.backend_id, id).await
    }

    /// Fetch up to `n` most recently inserted documents from `kb`.
    pub async fn get_recent_documents(&self, kb: &KnowledgeBase, n: u32) -> Result<Vec<Document>> {
        self.backend.recent_documents(&kb.backend_id, n).await
    }

    /// Search every knowledge base matching this manager's prefix.
    pub async fn search(&self, phrases: Vec<String>, n_hits: u32, n_fragments: u32) -> Result<Vec<SearchOutcome>> {
        self.search_by_name(Vec::new(), phrases, n_hits, n_fragments).await
    }

    /// Search, restricted to knowledge bases whose name is in `names`. An
    /// empty `names` means no restriction.
    pub async fn search_by_name(
        &self,
        names: Vec<String>,
        phrases: Vec<String>,
        n_hits: u32,
        n_fragments: u32,
    ) -> Result<Vec<SearchOutcome>> {
        if phrases.is_empty() {
            return Ok(Vec::new());
        }

        let pattern = self.pattern();
        let queries: Vec<(String, kbmcp_domain::value_objects::SearchQuery)> = phrases
            .iter()
            .map(|phrase| (pattern.clone(), build_query(&names, phrase, n_hits, n_fragments)))
            .collect();

        let responses = self.backend.multi_search(&queries).await?;

        Ok(phrases
            .into_iter()
            .zip(responses)
            .map(|(phrase, response)| assemble_outcome(&phrase, response))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kbmcp_domain::value_objects::{
        BulkItemResult, CollectionDescriptor, SearchHit, SearchQuery, SearchResponse,
    };
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::sync::Mutex as AsyncMutex;

    #[derive(Default)]
    struct FakeBackend {
        collections: AsyncMutex<HashMap<String, CollectionMapping>>,
        docs: AsyncMutex<HashMap<String, Vec<Document>>>,
        next_search_response: Mutex<Vec<SearchResponse>>,
    }

    #[async_trait]
    impl BackendPort for FakeBackend {
        async fn create_collection(&self, id: &str, mapping: &CollectionMapping) -> Result<()> {
            let mut collections = self.collections.lock().await;
            if collections.contains_key(id) {
                return Err(Error::already_exists(id));
            }
            collections.insert(id.to_string(), mapping.clone());
            self.docs.lock().await.insert(id.to_string(), Vec::new());
            Ok(())
        }

        async fn delete_collection(&self, id: &str) -> Result<()> {
            self.collections.lock().await.remove(id);
            self.docs.lock().await.remove(id);
            Ok(())
        }

        async fn put_mapping(&self, id: &str, mapping: &CollectionMapping) -> Result<()> {
            self.collections.lock().await.insert(id.to_string(), mapping.clone());
            Ok(())
        }

        async fn get_mapping(&self, _pattern: &str) -> Result<Vec<CollectionDescriptor>> {
            Ok(self
                .collections
                .lock()
                .await
                .iter()
                .map(|(id, mapping)| CollectionDescriptor { id: id.clone(), meta: mapping.meta.clone() })
                .collect())
        }

        async fn stats(&self, _pattern: &str) -> Result<HashMap<String, u64>> {
            let docs = self.docs.lock().await;
            Ok(docs.iter().map(|(id, d)| (id.clone(), d.len() as u64)).collect())
        }

        async fn bulk_index(&self, id: &str, docs: &[BulkDocument]) -> Result<Vec<BulkItemResult>> {
            let mut store = self.docs.lock().await;
            let entry = store.entry(id.to_string()).or_default();
            let mut results = Vec::new();
            for (i, doc) in docs.iter().enumerate() {
                let new_id = format!("{id}-{}", entry.len() + i);
                entry.push(Document {
                    id: new_id.clone(),
                    knowledge_base_name: String::new(),
                    title: doc.title.clone(),
                    content: doc.content.clone(),
                    url: None,
                    indexed_at: Some(chrono::Utc::now()),
                    score: None,
                });
                results.push(BulkItemResult { id: new_id, error: None });
            }
            Ok(results)
        }

        async fn update_doc(&self, _id: &str, _doc_id: &str, _fields: &DocFieldUpdate) -> Result<()> {
            Ok(())
        }

        async fn delete_doc(&self, _id: &str, _doc_id: &str) -> Result<()> {
            Ok(())
        }

        async fn recent_documents(&self, id: &str, n: u32) -> Result<Vec<Document>> {
            let store = self.docs.lock().await;
            let mut docs = store.get(id).cloned().unwrap_or_default();
            docs.reverse();
            docs.truncate(n as usize);
            Ok(docs)
        }

        async fn search(&self, _pattern: &str, _query: &SearchQuery) -> Result<SearchResponse> {
            Ok(SearchResponse::default())
        }

        async fn multi_search(&self, queries: &[(String, SearchQuery)]) -> Result<Vec<SearchResponse>> {
            let mut queued = self.next_search_response.lock().unwrap();
            if queued.is_empty() {
                return Ok(vec![SearchResponse::default(); queries.len()]);
            }
            Ok(std::mem::take(&mut queued))
        }

        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    fn manager() -> (KnowledgeBaseManager, Arc<FakeBackend>) {
        let backend = Arc::new(FakeBackend::default());
        (KnowledgeBaseManager::new(backend.clone(), "kbmcp"), backend)
    }

    #[tokio::test]
    async fn create_then_get_by_name_round_trips() {
        let (mgr, _backend) = manager();
        let proto = KnowledgeBaseCreateProto {
            name: "py-docs".into(),
            kb_type: "docs".into(),
            description: "Py".into(),
            data_source: "https://docs.python.org/3/".into(),
        };
        let created = mgr.create(proto).await.unwrap();
        assert!(created.backend_id.starts_with("kbmcp-docs.docs_python_org"));

        let fetched = mgr.get_by_name("py-docs").await.unwrap();
        assert_eq!(fetched.name, "py-docs");
    }

    #[tokio::test]
    async fn create_twice_fails_already_exists_and_backend_has_one_collection() {
        let (mgr, backend) = manager();
        let proto = |name: &str| KnowledgeBaseCreateProto {
            name: name.into(),
            kb_type: "docs".into(),
            description: "d".into(),
            data_source: "https://ex.com".into(),
        };
        mgr.create(proto("dup")).await.unwrap();
        let err = mgr.create(proto("dup")).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));
        assert_eq!(backend.collections.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn delete_then_get_by_name_raises_not_found() {
        let (mgr, _backend) = manager();
        let proto = KnowledgeBaseCreateProto {
            name: "temp".into(),
            kb_type: "docs".into(),
            description: "d".into(),
            data_source: "https://ex.com".into(),
        };
        let kb = mgr.create(proto).await.unwrap();
        mgr.delete(&kb).await.unwrap();
        let err = mgr.get_by_name("temp").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn insert_documents_is_a_no_op_for_an_empty_batch() {
        let (mgr, backend) = manager();
        let kb = mgr
            .create(KnowledgeBaseCreateProto {
                name: "k".into(),
                kb_type: "docs".into(),
                description: "d".into(),
                data_source: "https://ex.com".into(),
            })
            .await
            .unwrap();
        mgr.insert_documents(&kb, Vec::new()).await.unwrap();
        assert_eq!(backend.docs.lock().await.get(&kb.backend_id).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn search_with_empty_phrases_returns_empty() {
        let (mgr, _backend) = manager();
        let results = mgr.search(Vec::new(), 3, 3).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn search_by_name_preserves_phrase_order() {
        let (mgr, backend) = manager();
        *backend.next_search_response.lock().unwrap() = vec![
            SearchResponse {
                hits: vec![SearchHit {
                    id: "1".into(),
                    score: 20.0,
                    knowledge_base_name: Some("k".into()),
                    title: Some("t".into()),
                    url: None,
                    body: Some("b".into()),
                    highlight_body: vec![],
                }],
                aggregations: HashMap::from([("k".to_string(), 1)]),
            },
            SearchResponse::default(),
        ];

        let results = mgr
            .search_by_name(vec!["k".into()], vec!["foo".into(), "bar".into()], 3, 3)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].phrase(), "foo");
        assert_eq!(results[1].phrase(), "bar");
    }
}

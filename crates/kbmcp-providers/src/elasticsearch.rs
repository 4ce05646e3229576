//! Elasticsearch-flavored `BackendPort` adapter.
//!
//! Collections are Elasticsearch indices named after their `backend_id`.
//! The standard document mapping keeps `headings` as a lexical `text`
//! field and `body` as a `semantic_text` field (the lexical/semantic
//! halves of the fan-out query in §4.3), `url` as a `keyword`, and
//! `title` as `text` with a `keyword` sub-field for exact display.
//! `knowledge_base_name` is never stored: it is a `runtime` field whose
//! script is rewritten on every `put_mapping` call.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use kbmcp_domain::entities::Document;
use kbmcp_domain::error::{Error, Result};
use kbmcp_domain::value_objects::{
    BulkDocument, BulkItemResult, CollectionDescriptor, CollectionMapping, CollectionMeta,
    DocFieldUpdate, SearchHit, SearchQuery, SearchResponse,
};
use kbmcp_domain::BackendPort;
use serde_json::{json, Value};

/// The ELSER inference endpoint `body` is mapped against, matching the
/// original's `SEMANTIC_TEXT_MAPPING`.
const SEMANTIC_INFERENCE_ID: &str = ".elser-2-elasticsearch";

fn conn_err(err: reqwest::Error) -> Error {
    Error::backend_connection(err.to_string())
}

/// Authentication presented to the backend. Exactly one of these is
/// configured, per §6.5's "exactly one authentication method."
#[derive(Debug, Clone)]
pub enum BackendAuth {
    /// `Authorization: ApiKey <key>`.
    ApiKey(String),
    /// HTTP basic authentication.
    Basic {
        /// Basic auth username.
        username: String,
        /// Basic auth password.
        password: String,
    },
}

/// The Elasticsearch-flavored backend adapter.
#[derive(Debug)]
pub struct ElasticsearchBackend {
    client: reqwest::Client,
    host: String,
    auth: BackendAuth,
}

impl ElasticsearchBackend {
    /// Build a new adapter. `host` is the cluster root URL, e.g.
    /// `http://localhost:9200`. `request_timeout` bounds every call this
    /// adapter makes except [`Self::ping`], which uses a short fixed
    /// timeout independent of the configured one.
    pub fn new(host: impl Into<String>, auth: BackendAuth, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| Error::generic(format!("failed to build backend HTTP client: {e}")))?;
        Ok(Self {
            client,
            host: host.into().trim_end_matches('/').to_string(),
            auth,
        })
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            BackendAuth::ApiKey(key) => builder.header("Authorization", format!("ApiKey {key}")),
            BackendAuth::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.host, path.trim_start_matches('/'))
    }

    /// Classify a non-2xx response into the taxonomy, consuming the body
    /// for the error message.
    async fn status_error(response: reqwest::Response, what: &str) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Error::backend_auth(format!("{what}: {status} {body}"));
        }
        Error::generic(format!("{what}: {status} {body}"))
    }

    fn mapping_body(mapping: &CollectionMapping) -> Value {
        json!({
            "_meta": {
                "knowledge_base": mapping.meta,
            },
            "runtime": {
                "knowledge_base_name": {
                    "type": "keyword",
                    "script": {
                        "source": mapping.meta.runtime_name_script(),
                    },
                },
            },
        })
    }

    fn build_search_body(query: &SearchQuery) -> Value {
        let filter = if query.knowledge_base_names.is_empty() {
            json!({ "match_all": {} })
        } else {
            json!({ "terms": { "knowledge_base_name": query.knowledge_base_names } })
        };

        json!({
            "size": query.size,
            "min_score": query.min_score,
            "query": {
                "bool": {
                    "filter": [filter],
                    "should": [
                        { "match": { "headings": { "query": query.phrase, "boost": 1 } } },
                        { "semantic": { "field": "body", "query": query.phrase, "boost": 5 } },
                    ],
                    "minimum_should_match": 1,
                }
            },
            "highlight": {
                "fields": {
                    "body": {
                        "number_of_fragments": query.n_fragments,
                        "fragment_size": query.fragment_size,
                    }
                }
            },
            "fields": ["title", "url", "body", "knowledge_base_name"],
            "_source": false,
            "aggs": {
                "by_knowledge_base": {
                    "terms": { "field": "knowledge_base_name" }
                }
            },
        })
    }

    fn parse_search_response(body: &Value) -> SearchResponse {
        let hits = body
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let hits = hits
            .iter()
            .map(|hit| {
                let id = hit.get("_id").and_then(Value::as_str).unwrap_or_default().to_string();
                let score = hit.get("_score").and_then(Value::as_f64).unwrap_or(0.0);
                let field = |name: &str| -> Option<String> {
                    hit.pointer(&format!("/fields/{name}/0"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                };
                let highlight_body = hit
                    .pointer("/highlight/body")
                    .and_then(Value::as_array)
                    .map(|frags| {
                        frags
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();

                SearchHit {
                    id,
                    score,
                    knowledge_base_name: field("knowledge_base_name"),
                    title: field("title"),
                    url: field("url"),
                    body: field("body"),
                    highlight_body,
                }
            })
            .collect();

        let aggregations = body
            .pointer("/aggregations/by_knowledge_base/buckets")
            .and_then(Value::as_array)
            .map(|buckets| {
                buckets
                    .iter()
                    .filter_map(|bucket| {
                        let key = bucket.get("key")?.as_str()?.to_string();
                        let count = bucket.get("doc_count")?.as_u64()?;
                        Some((key, count))
                    })
                    .collect()
            })
            .unwrap_or_default();

        SearchResponse { hits, aggregations }
    }
}

#[async_trait::async_trait]
impl BackendPort for ElasticsearchBackend {
    #[tracing::instrument(skip(self))]
    async fn create_collection(&self, id: &str, mapping: &CollectionMapping) -> Result<()> {
        let runtime_mapping = Self::mapping_body(mapping);
        let body = json!({
            "mappings": {
                "_meta": runtime_mapping["_meta"],
                "runtime": runtime_mapping["runtime"],
                "properties": {
                    "title": { "type": "text", "fields": { "keyword": { "type": "keyword" } } },
                    "body": { "type": "semantic_text", "inference_id": SEMANTIC_INFERENCE_ID },
                    "headings": { "type": "text" },
                    "url": { "type": "keyword" },
                    "@timestamp": { "type": "date", "format": "epoch_millis" },
                }
            }
        });

        let response = self
            .authorize(self.client.put(self.url(id)))
            .json(&body)
            .send()
            .await
            .map_err(conn_err)?;

        if response.status().as_u16() == 400 {
            return Err(Error::already_exists(format!("collection {id}")));
        }
        if !response.status().is_success() {
            return Err(Self::status_error(response, "create_collection").await);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_collection(&self, id: &str) -> Result<()> {
        let response = self
            .authorize(self.client.delete(self.url(id)))
            .send()
            .await
            .map_err(conn_err)?;
        if !response.status().is_success() && response.status().as_u16() != 404 {
            return Err(Self::status_error(response, "delete_collection").await);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn put_mapping(&self, id: &str, mapping: &CollectionMapping) -> Result<()> {
        let body = Self::mapping_body(mapping);
        let response = self
            .authorize(self.client.put(self.url(&format!("{id}/_mapping"))))
            .json(&body)
            .send()
            .await
            .map_err(conn_err)?;
        if !response.status().is_success() {
            return Err(Self::status_error(response, "put_mapping").await);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get_mapping(&self, pattern: &str) -> Result<Vec<CollectionDescriptor>> {
        let response = self
            .authorize(self.client.get(self.url(&format!("{pattern}/_mapping"))))
            .send()
            .await
            .map_err(conn_err)?;
        if response.status().as_u16() == 404 {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(Self::status_error(response, "get_mapping").await);
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::retrieval(format!("malformed mapping response: {e}")))?;

        let Value::Object(indices) = body else {
            return Ok(Vec::new());
        };

        let mut descriptors = Vec::with_capacity(indices.len());
        for (id, entry) in indices {
            let Some(meta) = entry.pointer("/mappings/_meta/knowledge_base") else {
                continue;
            };
            let meta: CollectionMeta = serde_json::from_value(meta.clone())
                .map_err(|e| Error::retrieval(format!("malformed collection meta for {id}: {e}")))?;
            descriptors.push(CollectionDescriptor { id, meta });
        }
        Ok(descriptors)
    }

    #[tracing::instrument(skip(self))]
    async fn stats(&self, pattern: &str) -> Result<HashMap<String, u64>> {
        let response = self
            .authorize(self.client.get(self.url(&format!("{pattern}/_stats/docs"))))
            .send()
            .await
            .map_err(conn_err)?;
        if response.status().as_u16() == 404 {
            return Ok(HashMap::new());
        }
        if !response.status().is_success() {
            return Err(Self::status_error(response, "stats").await);
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::retrieval(format!("malformed stats response: {e}")))?;

        let indices = body.get("indices").and_then(Value::as_object);
        let mut result = HashMap::new();
        if let Some(indices) = indices {
            for (id, entry) in indices {
                let count = entry
                    .pointer("/primaries/docs/count")
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                result.insert(id.clone(), count);
            }
        }
        Ok(result)
    }

    #[tracing::instrument(skip(self))]
    async fn bulk_index(&self, id: &str, docs: &[BulkDocument]) -> Result<Vec<BulkItemResult>> {
        if docs.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now().timestamp_millis();
        let mut ndjson = String::new();
        for doc in docs {
            ndjson.push_str(&json!({ "index": { "_index": id } }).to_string());
            ndjson.push('\n');
            ndjson.push_str(
                &json!({
                    "title": doc.title,
                    "body": doc.content,
                    "headings": doc.title,
                    "@timestamp": now,
                })
                .to_string(),
            );
            ndjson.push('\n');
        }

        let response = self
            .authorize(self.client.post(self.url("_bulk")))
            .header("Content-Type", "application/x-ndjson")
            .body(ndjson)
            .send()
            .await
            .map_err(conn_err)?;

        if !response.status().is_success() {
            return Err(Self::status_error(response, "bulk_index").await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::creation(format!("malformed bulk response: {e}")))?;

        let items = body.get("items").and_then(Value::as_array).cloned().unwrap_or_default();
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            let Some(index_result) = item.get("index") else { continue };
            let item_id = index_result.get("_id").and_then(Value::as_str).unwrap_or_default().to_string();
            let error = index_result
                .get("error")
                .and_then(|e| e.get("reason"))
                .and_then(Value::as_str)
                .map(str::to_string);
            results.push(BulkItemResult { id: item_id, error });
        }
        Ok(results)
    }

    #[tracing::instrument(skip(self))]
    async fn update_doc(&self, id: &str, doc_id: &str, fields: &DocFieldUpdate) -> Result<()> {
        let mut doc = serde_json::Map::new();
        if let Some(title) = &fields.title {
            doc.insert("title".into(), json!(title));
            doc.insert("headings".into(), json!(title));
        }
        if let Some(content) = &fields.content {
            doc.insert("body".into(), json!(content));
        }

        let response = self
            .authorize(self.client.post(self.url(&format!("{id}/_update/{doc_id}"))))
            .json(&json!({ "doc": Value::Object(doc) }))
            .send()
            .await
            .map_err(conn_err)?;

        if response.status().as_u16() == 404 {
            return Err(Error::not_found(format!("document {doc_id} in collection {id}")));
        }
        if !response.status().is_success() {
            return Err(Self::status_error(response, "update_doc").await);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_doc(&self, id: &str, doc_id: &str) -> Result<()> {
        let response = self
            .authorize(self.client.delete(self.url(&format!("{id}/_doc/{doc_id}"))))
            .send()
            .await
            .map_err(conn_err)?;

        if response.status().as_u16() == 404 {
            return Err(Error::not_found(format!("document {doc_id} in collection {id}")));
        }
        if !response.status().is_success() {
            return Err(Self::status_error(response, "delete_doc").await);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn recent_documents(&self, id: &str, n: u32) -> Result<Vec<Document>> {
        let body = json!({
            "size": n,
            "sort": [{ "@timestamp": "desc" }],
        });

        let response = self
            .authorize(self.client.post(self.url(&format!("{id}/_search"))))
            .json(&body)
            .send()
            .await
            .map_err(conn_err)?;

        if !response.status().is_success() {
            return Err(Self::status_error(response, "recent_documents").await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::retrieval(format!("malformed search response: {e}")))?;

        let hits = body.pointer("/hits/hits").and_then(Value::as_array).cloned().unwrap_or_default();
        let mut docs = Vec::with_capacity(hits.len());
        for hit in hits {
            let doc_id = hit.get("_id").and_then(Value::as_str).unwrap_or_default().to_string();
            let source = hit.get("_source").cloned().unwrap_or(Value::Null);
            let title = source.get("title").and_then(Value::as_str).unwrap_or_default().to_string();
            let content = source.get("body").and_then(Value::as_str).unwrap_or_default().to_string();
            let url = source.get("url").and_then(Value::as_str).map(str::to_string);
            let indexed_at = source
                .get("@timestamp")
                .and_then(Value::as_i64)
                .and_then(|ms| DateTime::<Utc>::from_timestamp_millis(ms));
            docs.push(Document {
                id: doc_id,
                knowledge_base_name: String::new(),
                title,
                content,
                url,
                indexed_at,
                score: None,
            });
        }
        Ok(docs)
    }

    #[tracing::instrument(skip(self))]
    async fn search(&self, pattern: &str, query: &SearchQuery) -> Result<SearchResponse> {
        let body = Self::build_search_body(query);
        let response = self
            .authorize(self.client.post(self.url(&format!("{pattern}/_search"))))
            .json(&body)
            .send()
            .await
            .map_err(conn_err)?;

        if !response.status().is_success() {
            return Err(Self::status_error(response, "search").await);
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::search(format!("malformed search response: {e}")))?;
        Ok(Self::parse_search_response(&body))
    }

    #[tracing::instrument(skip(self))]
    async fn multi_search(&self, queries: &[(String, SearchQuery)]) -> Result<Vec<SearchResponse>> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let mut ndjson = String::new();
        for (pattern, query) in queries {
            ndjson.push_str(&json!({ "index": pattern }).to_string());
            ndjson.push('\n');
            ndjson.push_str(&Self::build_search_body(query).to_string());
            ndjson.push('\n');
        }

        let response = self
            .authorize(self.client.post(self.url("_msearch")))
            .header("Content-Type", "application/x-ndjson")
            .body(ndjson)
            .send()
            .await
            .map_err(conn_err)?;

        if !response.status().is_success() {
            return Err(Self::status_error(response, "multi_search").await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::search(format!("malformed multi-search response: {e}")))?;

        let responses = body.get("responses").and_then(Value::as_array).cloned().unwrap_or_default();
        Ok(responses.iter().map(Self::parse_search_response).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn ping(&self) -> Result<()> {
        let response = self
            .authorize(self.client.get(self.host.as_str()))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(conn_err)?;
        if !response.status().is_success() {
            return Err(Self::status_error(response, "ping").await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_query() -> SearchQuery {
        SearchQuery {
            knowledge_base_names: vec!["rust-book".to_string()],
            phrase: "ownership".to_string(),
            min_score: 10.0,
            size: 5,
            n_fragments: 3,
            fragment_size: 500,
        }
    }

    #[test]
    fn build_search_body_uses_terms_filter_when_names_given() {
        let body = ElasticsearchBackend::build_search_body(&sample_query());
        assert_eq!(
            body["query"]["bool"]["filter"][0]["terms"]["knowledge_base_name"][0],
            json!("rust-book")
        );
        assert_eq!(body["min_score"], json!(10.0));
        assert_eq!(body["highlight"]["fields"]["body"]["number_of_fragments"], json!(3));
    }

    #[test]
    fn build_search_body_uses_match_all_when_names_empty() {
        let mut query = sample_query();
        query.knowledge_base_names.clear();
        let body = ElasticsearchBackend::build_search_body(&query);
        assert_eq!(body["query"]["bool"]["filter"][0], json!({ "match_all": {} }));
    }

    #[test]
    fn mapping_body_embeds_escaped_runtime_script() {
        let mapping = CollectionMapping {
            meta: CollectionMeta {
                name: "Has \"Quotes\"".to_string(),
                kb_type: "docs".to_string(),
                description: "desc".to_string(),
                data_source: "src".to_string(),
            },
            knowledge_base_name_runtime_script: String::new(),
        };
        let body = ElasticsearchBackend::mapping_body(&mapping);
        let script = body["runtime"]["knowledge_base_name"]["script"]["source"]
            .as_str()
            .unwrap();
        assert!(script.contains("Has \\\"Quotes\\\""));
    }

    #[test]
    fn parse_search_response_prefers_highlight_over_raw_body() {
        let raw = json!({
            "hits": {
                "hits": [{
                    "_id": "doc-1",
                    "_score": 12.5,
                    "fields": {
                        "title": ["Intro"],
                        "url": ["https://example.com"],
                        "knowledge_base_name": ["rust-book"],
                    },
                    "highlight": { "body": ["a <em>fragment</em>"] },
                }]
            },
            "aggregations": {
                "by_knowledge_base": {
                    "buckets": [{ "key": "rust-book", "doc_count": 1 }]
                }
            }
        });
        let response = ElasticsearchBackend::parse_search_response(&raw);
        assert_eq!(response.hits.len(), 1);
        assert_eq!(response.hits[0].highlight_body, vec!["a <em>fragment</em>".to_string()]);
        assert_eq!(response.aggregations.get("rust-book"), Some(&1));
    }

    #[test]
    fn parse_search_response_handles_missing_hits() {
        let response = ElasticsearchBackend::parse_search_response(&json!({}));
        assert!(response.hits.is_empty());
        assert!(response.aggregations.is_empty());
    }
}

//! Tool registry and bulk dispatch (§4.5).
//!
//! [`ToolRegistry`] is the name-indexed table the bulk-dispatch tools
//! invoke arbitrary tools through; it deserializes each call's raw JSON
//! arguments into the tool's schema type and routes to the owning
//! sub-server handler, exactly mirroring the static dispatch
//! [`crate::mcp_server::KbmcpServer`]'s `#[tool_router]` methods perform.

use std::sync::Arc;

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::args::{BulkToolCall, CallToolBulkArgs, CallToolsBulkArgs};
use crate::formatting;
use crate::handlers::{AskHandler, LearnHandler, ManageHandler, RememberHandler};

/// One invocation's rendered outcome within a bulk-dispatch response.
struct BulkCallOutcome {
    tool: String,
    arguments: Map<String, Value>,
    result: CallToolResult,
}

/// Name-indexed table of every tool this server exposes, used by the
/// bulk-dispatch tools to invoke a tool by its string name (§4.5).
pub struct ToolRegistry {
    manage: Arc<ManageHandler>,
    ask: Arc<AskHandler>,
    learn: Arc<LearnHandler>,
    remember: Arc<RememberHandler>,
}

impl ToolRegistry {
    /// Build a registry over the same sub-server handlers the static
    /// `#[tool_router]` dispatch uses.
    pub fn new(
        manage: Arc<ManageHandler>,
        ask: Arc<AskHandler>,
        learn: Arc<LearnHandler>,
        remember: Arc<RememberHandler>,
    ) -> Self {
        Self { manage, ask, learn, remember }
    }

    /// Invoke the tool named `name` with raw JSON `arguments`.
    ///
    /// Unknown tool names and argument-schema mismatches are reported as
    /// an error [`CallToolResult`], not an `Err`: per §4.5, bulk dispatch
    /// always produces one result per call and only the caller's
    /// `continue_on_error` flag decides whether that halts the batch.
    pub async fn invoke(&self, name: &str, arguments: Map<String, Value>) -> CallToolResult {
        match self.dispatch(name, arguments).await {
            Ok(result) => result,
            Err(message) => formatting::error(message),
        }
    }

    async fn dispatch(&self, name: &str, arguments: Map<String, Value>) -> Result<CallToolResult, String> {
        let outcome: Result<CallToolResult, McpError> = match name {
            "manage_create" => self.manage.create(parse(arguments)?).await,
            "manage_get_by_backend_id" => self.manage.get_by_backend_id(parse(arguments)?).await,
            "manage_get_by_name" => self.manage.get_by_name(parse(arguments)?).await,
            "manage_delete_by_backend_id" => self.manage.delete_by_backend_id(parse(arguments)?).await,
            "manage_delete_by_name" => self.manage.delete_by_name(parse(arguments)?).await,
            "manage_update_by_backend_id" => self.manage.update_by_backend_id(parse(arguments)?).await,
            "manage_update_by_name" => self.manage.update_by_name(parse(arguments)?).await,
            "ask_documentation_available" => self.ask.documentation_available(parse(arguments)?).await,
            "ask_questions" => self.ask.questions(parse(arguments)?).await,
            "ask_questions_for_kb" => self.ask.questions_for_kb(parse(arguments)?).await,
            "learn_urls_from_webpage" => self.learn.urls_from_webpage(parse(arguments)?).await,
            "learn_from_web_documentation" => self.learn.from_web_documentation(parse(arguments)?).await,
            "learn_active_documentation_requests" => {
                self.learn.active_documentation_requests(parse(arguments)?).await
            }
            "memory_set_project" => self.remember.set_project(parse(arguments)?).await,
            "memory_get_project_name" => self.remember.get_project_name(parse(arguments)?).await,
            "memory_encoding" => self.remember.encoding(parse(arguments)?).await,
            "memory_encodings" => self.remember.encodings(parse(arguments)?).await,
            "memory_recall" => self.remember.recall(parse(arguments)?).await,
            "memory_recall_last" => self.remember.recall_last(parse(arguments)?).await,
            "memory_update_encoding" => self.remember.update_encoding(parse(arguments)?).await,
            "memory_delete_encoding" => self.remember.delete_encoding(parse(arguments)?).await,
            other => return Err(format!("unknown tool: {other}")),
        };
        outcome.map_err(|e| e.to_string())
    }

    /// `call_tools_bulk([{tool, arguments}], continue_on_error) -> [Result]`.
    pub async fn call_tools_bulk(&self, args: CallToolsBulkArgs) -> CallToolResult {
        let calls: Vec<(String, Map<String, Value>)> =
            args.tool_calls.into_iter().map(BulkToolCall::into_parts).collect();
        formatting::success(self.run_bulk(calls, args.continue_on_error).await)
    }

    /// `call_tool_bulk(tool, [arguments], continue_on_error) -> [Result]`.
    pub async fn call_tool_bulk(&self, args: CallToolBulkArgs) -> CallToolResult {
        let calls: Vec<(String, Map<String, Value>)> =
            args.tool_arguments.into_iter().map(|a| (args.tool.clone(), a)).collect();
        formatting::success(self.run_bulk(calls, args.continue_on_error).await)
    }

    /// Execute `calls` strictly in order, halting after the first
    /// error when `continue_on_error` is `false` (§4.5, §5 "Ordering
    /// guarantees"). Bulk calls never parallelize: this is a plain
    /// sequential loop, not a `parallel`/`join` combinator.
    async fn run_bulk(&self, calls: Vec<(String, Map<String, Value>)>, continue_on_error: bool) -> String {
        let mut outcomes = Vec::with_capacity(calls.len());

        for (tool, arguments) in calls {
            let result = self.invoke(&tool, arguments.clone()).await;
            let is_error = result.is_error.unwrap_or(false);
            outcomes.push(BulkCallOutcome { tool, arguments, result });
            if is_error && !continue_on_error {
                break;
            }
        }

        render_bulk_outcomes(&outcomes)
    }
}

impl BulkToolCall {
    fn into_parts(self) -> (String, Map<String, Value>) {
        (self.tool, self.arguments)
    }
}

fn parse<T: DeserializeOwned>(arguments: Map<String, Value>) -> Result<Parameters<T>, String> {
    serde_json::from_value(Value::Object(arguments))
        .map(Parameters)
        .map_err(|e| format!("invalid arguments: {e}"))
}

fn render_bulk_outcomes(outcomes: &[BulkCallOutcome]) -> String {
    if outcomes.is_empty() {
        return "(no tool calls)".to_string();
    }
    outcomes
        .iter()
        .map(|o| {
            let is_error = o.result.is_error.unwrap_or(false);
            let content = formatting::render_call_tool_result(&o.result);
            format!(
                "tool: {}\narguments: {}\nisError: {}\ncontent:\n{}",
                o.tool,
                Value::Object(o.arguments.clone()),
                is_error,
                indent(&content, "  ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines().map(|line| format!("{prefix}{line}")).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::ManageCreateArgs;
    use kbmcp_application::{CrawlOrchestrator, KnowledgeBaseManager};
    use kbmcp_domain::entities::KnowledgeBaseCreateProto;
    use kbmcp_domain::error::Result;
    use kbmcp_domain::ports::{BackendPort, ContainerPort, WebProbePort};
    use kbmcp_domain::value_objects::{
        BulkDocument, BulkItemResult, CollectionDescriptor, CollectionMapping, ContainerInfo,
        DocFieldUpdate, SearchQuery, SearchResponse, WebProbeResult,
    };
    use std::collections::HashMap;
    use tokio::sync::Mutex as AsyncMutex;

    #[derive(Default)]
    struct FakeBackend {
        collections: AsyncMutex<HashMap<String, CollectionMapping>>,
    }

    #[async_trait::async_trait]
    impl BackendPort for FakeBackend {
        async fn create_collection(&self, id: &str, mapping: &CollectionMapping) -> Result<()> {
            let mut collections = self.collections.lock().await;
            if collections.contains_key(id) {
                return Err(kbmcp_domain::error::Error::already_exists(id));
            }
            collections.insert(id.to_string(), mapping.clone());
            Ok(())
        }
        async fn delete_collection(&self, id: &str) -> Result<()> {
            self.collections.lock().await.remove(id);
            Ok(())
        }
        async fn put_mapping(&self, _id: &str, _mapping: &CollectionMapping) -> Result<()> {
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
            Ok(HashMap::new())
        }
        async fn bulk_index(&self, _id: &str, _docs: &[BulkDocument]) -> Result<Vec<BulkItemResult>> {
            Ok(Vec::new())
        }
        async fn update_doc(&self, _id: &str, _doc_id: &str, _fields: &DocFieldUpdate) -> Result<()> {
            Ok(())
        }
        async fn delete_doc(&self, _id: &str, _doc_id: &str) -> Result<()> {
            Ok(())
        }
        async fn recent_documents(&self, _id: &str, _n: u32) -> Result<Vec<kbmcp_domain::entities::Document>> {
            Ok(Vec::new())
        }
        async fn search(&self, _pattern: &str, _query: &SearchQuery) -> Result<SearchResponse> {
            Ok(SearchResponse::default())
        }
        async fn multi_search(&self, queries: &[(String, SearchQuery)]) -> Result<Vec<SearchResponse>> {
            Ok(vec![SearchResponse::default(); queries.len()])
        }
        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    struct FakeContainer;
    #[async_trait::async_trait]
    impl ContainerPort for FakeContainer {
        async fn pull(&self, _image: &str) -> Result<()> {
            Ok(())
        }
        async fn create(
            &self,
            _image: &str,
            _command: &[String],
            _labels: &HashMap<String, String>,
            _autoremove: bool,
            _memory_reservation_bytes: u64,
        ) -> Result<String> {
            Ok("c".to_string())
        }
        async fn put_archive(&self, _container_id: &str, _path: &str, _tar_bytes: Vec<u8>) -> Result<()> {
            Ok(())
        }
        async fn start(&self, _container_id: &str) -> Result<()> {
            Ok(())
        }
        async fn list(&self, _filters: &HashMap<String, String>) -> Result<Vec<ContainerInfo>> {
            Ok(Vec::new())
        }
        async fn logs(&self, _container_id: &str) -> Result<String> {
            Ok(String::new())
        }
        async fn remove(&self, _container_id: &str, _force: bool) -> Result<()> {
            Ok(())
        }
    }

    struct FakeProbe;
    #[async_trait::async_trait]
    impl WebProbePort for FakeProbe {
        async fn probe(&self, _url: &str, _domain_filter: &str, _path_filter: &str) -> Result<WebProbeResult> {
            Ok(WebProbeResult::default())
        }
    }

    fn registry() -> ToolRegistry {
        let backend = Arc::new(FakeBackend::default());
        let manager = Arc::new(KnowledgeBaseManager::new(backend, "kbmcp"));
        let orchestrator = Arc::new(CrawlOrchestrator::new(
            Arc::new(FakeContainer),
            Arc::new(FakeProbe),
            "elastic/crawler:latest",
            serde_json::json!({}),
            1,
        ));
        let project = crate::project_context::ProjectSlot::new();
        ToolRegistry::new(
            Arc::new(ManageHandler::new(manager.clone())),
            Arc::new(AskHandler::new(manager.clone())),
            Arc::new(LearnHandler::new(manager.clone(), orchestrator, Arc::new(FakeProbe))),
            Arc::new(RememberHandler::new(manager, project)),
        )
    }

    fn args(json: serde_json::Value) -> Map<String, Value> {
        match json {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn invoke_unknown_tool_reports_error_without_panicking() {
        let registry = registry();
        let result = registry.invoke("no_such_tool", Map::new()).await;
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn call_tool_bulk_stops_on_first_error_when_continue_on_error_is_false() {
        let registry = registry();
        let calls = CallToolBulkArgs {
            tool: "manage_delete_by_name".to_string(),
            tool_arguments: vec![
                args(serde_json::json!({"name": "exists"})),
                args(serde_json::json!({"name": "missing"})),
                args(serde_json::json!({"name": "also-exists"})),
            ],
            continue_on_error: false,
        };
        let result = registry.call_tool_bulk(calls).await;
        let text = formatting::render_call_tool_result(&result);
        assert_eq!(text.matches("tool: manage_delete_by_name").count(), 2);
    }

    #[tokio::test]
    async fn call_tools_bulk_continues_past_errors_by_default() {
        let registry = registry();
        let proto = KnowledgeBaseCreateProto {
            name: "dup".to_string(),
            kb_type: "docs".to_string(),
            description: "d".to_string(),
            data_source: "https://ex.com".to_string(),
        };
        registry.manage.create(Parameters(ManageCreateArgs {
            name: proto.name.clone(),
            kb_type: proto.kb_type.clone(),
            description: proto.description.clone(),
            data_source: proto.data_source.clone(),
        })).await.unwrap();

        let calls = CallToolsBulkArgs {
            tool_calls: vec![
                BulkToolCall {
                    tool: "manage_create".to_string(),
                    arguments: args(serde_json::json!({
                        "name": "dup", "type": "docs", "description": "d", "data_source": "https://ex.com"
                    })),
                },
                BulkToolCall {
                    tool: "manage_get_by_name".to_string(),
                    arguments: args(serde_json::json!({"name": "dup"})),
                },
            ],
            continue_on_error: true,
        };
        let result = registry.call_tools_bulk(calls).await;
        let text = formatting::render_call_tool_result(&result);
        assert_eq!(text.matches("tool:").count(), 2);
    }
}

//! The `KbmcpServer` `ServerHandler` implementation (§6.1).
//!
//! One `#[tool]` method per fully-qualified tool name, each a one-line
//! delegation to the owning sub-server handler. The two bulk-dispatch
//! tools instead delegate to [`crate::tools::ToolRegistry`], which knows
//! how to invoke any of the other tools by name.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Implementation, ServerCapabilities, ServerInfo};
use rmcp::ErrorData as McpError;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};

use kbmcp_application::{CrawlOrchestrator, KnowledgeBaseManager};
use kbmcp_domain::ports::WebProbePort;

use crate::args::{
    AskDocumentationAvailableArgs, AskQuestionsArgs, AskQuestionsForKbArgs, ByBackendIdArgs,
    ByNameArgs, CallToolBulkArgs, CallToolsBulkArgs, LearnActiveDocumentationRequestsArgs,
    LearnFromWebDocumentationArgs, LearnUrlsFromWebpageArgs, ManageCreateArgs,
    ManageUpdateByBackendIdArgs, ManageUpdateByNameArgs, MemoryDeleteEncodingArgs,
    MemoryEncodingArgs, MemoryEncodingsArgs, MemoryGetProjectNameArgs, MemoryRecallArgs,
    MemoryRecallLastArgs, MemorySetProjectArgs, MemoryUpdateEncodingArgs,
};
use crate::handlers::{AskHandler, LearnHandler, ManageHandler, RememberHandler};
use crate::project_context::ProjectSlot;
use crate::tools::ToolRegistry;

/// Server instructions text presented to connecting clients.
const INSTRUCTIONS: &str = "kbmcp serves curated knowledge base ingestion and search. \
Use manage_* tools to administer knowledge bases, learn_* to crawl web documentation \
into one, ask_* to search across knowledge bases, and memory_* to record and recall \
project-scoped memories after calling memory_set_project. call_tools_bulk and \
call_tool_bulk invoke a batch of tools in one request.";

/// The MCP server: wires the Manage/Ask/Learn/Remember sub-servers (§4.4)
/// and the bulk-dispatch tools (§4.5) into one `rmcp` tool surface.
#[derive(Clone)]
pub struct KbmcpServer {
    manage: Arc<ManageHandler>,
    ask: Arc<AskHandler>,
    learn: Arc<LearnHandler>,
    remember: Arc<RememberHandler>,
    registry: Arc<ToolRegistry>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl KbmcpServer {
    /// Build the server over one Knowledge Base Manager, one Crawl
    /// Orchestrator and the Web Probe `learn_urls_from_webpage` needs
    /// directly, plus a fresh, unbound [`ProjectSlot`].
    pub fn new(
        manager: Arc<KnowledgeBaseManager>,
        orchestrator: Arc<CrawlOrchestrator>,
        web_probe: Arc<dyn WebProbePort>,
    ) -> Self {
        let project = ProjectSlot::new();
        let manage = Arc::new(ManageHandler::new(manager.clone()));
        let ask = Arc::new(AskHandler::new(manager.clone()));
        let learn = Arc::new(LearnHandler::new(manager.clone(), orchestrator, web_probe));
        let remember = Arc::new(RememberHandler::new(manager, project));
        let registry =
            Arc::new(ToolRegistry::new(manage.clone(), ask.clone(), learn.clone(), remember.clone()));

        Self { manage, ask, learn, remember, registry, tool_router: Self::tool_router() }
    }

    // ─── Manage ────────────────────────────────────────────────────────

    #[tool(description = "Create a new knowledge base")]
    async fn manage_create(&self, params: Parameters<ManageCreateArgs>) -> Result<CallToolResult, McpError> {
        self.manage.create(params).await
    }

    #[tool(description = "Look up a knowledge base by its backend-level collection id")]
    async fn manage_get_by_backend_id(
        &self,
        params: Parameters<ByBackendIdArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.manage.get_by_backend_id(params).await
    }

    #[tool(description = "Look up a knowledge base by its display name")]
    async fn manage_get_by_name(&self, params: Parameters<ByNameArgs>) -> Result<CallToolResult, McpError> {
        self.manage.get_by_name(params).await
    }

    #[tool(description = "Delete a knowledge base by its backend-level collection id")]
    async fn manage_delete_by_backend_id(
        &self,
        params: Parameters<ByBackendIdArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.manage.delete_by_backend_id(params).await
    }

    #[tool(description = "Delete a knowledge base by its display name")]
    async fn manage_delete_by_name(&self, params: Parameters<ByNameArgs>) -> Result<CallToolResult, McpError> {
        self.manage.delete_by_name(params).await
    }

    #[tool(description = "Update a knowledge base's name/description by its backend-level collection id")]
    async fn manage_update_by_backend_id(
        &self,
        params: Parameters<ManageUpdateByBackendIdArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.manage.update_by_backend_id(params).await
    }

    #[tool(description = "Update a knowledge base's name/description by its display name")]
    async fn manage_update_by_name(
        &self,
        params: Parameters<ManageUpdateByNameArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.manage.update_by_name(params).await
    }

    // ─── Ask ───────────────────────────────────────────────────────────

    #[tool(description = "List knowledge bases of type docs")]
    async fn ask_documentation_available(
        &self,
        params: Parameters<AskDocumentationAvailableArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.ask.documentation_available(params).await
    }

    #[tool(description = "Search across every knowledge base for a batch of natural-language phrases")]
    async fn ask_questions(&self, params: Parameters<AskQuestionsArgs>) -> Result<CallToolResult, McpError> {
        self.ask.questions(params).await
    }

    #[tool(description = "Search, restricted to the named knowledge bases, for a batch of phrases")]
    async fn ask_questions_for_kb(
        &self,
        params: Parameters<AskQuestionsForKbArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.ask.questions_for_kb(params).await
    }

    // ─── Learn ─────────────────────────────────────────────────────────

    #[tool(description = "Fetch a page and list the crawlable URLs a crawl of it would visit")]
    async fn learn_urls_from_webpage(
        &self,
        params: Parameters<LearnUrlsFromWebpageArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.learn.urls_from_webpage(params).await
    }

    #[tool(description = "Validate a crawl target and launch a crawl worker into a docs knowledge base")]
    async fn learn_from_web_documentation(
        &self,
        params: Parameters<LearnFromWebDocumentationArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.learn.from_web_documentation(params).await
    }

    #[tool(description = "List crawl jobs this server has launched")]
    async fn learn_active_documentation_requests(
        &self,
        params: Parameters<LearnActiveDocumentationRequestsArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.learn.active_documentation_requests(params).await
    }

    // ─── Remember ──────────────────────────────────────────────────────

    #[tool(description = "Bind this session to a project's memory knowledge base, creating it if absent")]
    async fn memory_set_project(
        &self,
        params: Parameters<MemorySetProjectArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.remember.set_project(params).await
    }

    #[tool(description = "Return the currently bound project's name")]
    async fn memory_get_project_name(
        &self,
        params: Parameters<MemoryGetProjectNameArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.remember.get_project_name(params).await
    }

    #[tool(description = "Record one free-form memory in the bound project")]
    async fn memory_encoding(&self, params: Parameters<MemoryEncodingArgs>) -> Result<CallToolResult, McpError> {
        self.remember.encoding(params).await
    }

    #[tool(description = "Record a batch of free-form memories in the bound project")]
    async fn memory_encodings(
        &self,
        params: Parameters<MemoryEncodingsArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.remember.encodings(params).await
    }

    #[tool(description = "Search the bound project's memories for a batch of natural-language questions")]
    async fn memory_recall(&self, params: Parameters<MemoryRecallArgs>) -> Result<CallToolResult, McpError> {
        self.remember.recall(params).await
    }

    #[tool(description = "Return the bound project's most recently recorded memories")]
    async fn memory_recall_last(
        &self,
        params: Parameters<MemoryRecallLastArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.remember.recall_last(params).await
    }

    #[tool(description = "Update one of the bound project's memories by id")]
    async fn memory_update_encoding(
        &self,
        params: Parameters<MemoryUpdateEncodingArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.remember.update_encoding(params).await
    }

    #[tool(description = "Delete one of the bound project's memories by id")]
    async fn memory_delete_encoding(
        &self,
        params: Parameters<MemoryDeleteEncodingArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.remember.delete_encoding(params).await
    }

    // ─── Bulk dispatch ─────────────────────────────────────────────────

    #[tool(description = "Invoke a batch of differently-named tools in order, in one request")]
    async fn call_tools_bulk(&self, params: Parameters<CallToolsBulkArgs>) -> Result<CallToolResult, McpError> {
        Ok(self.registry.call_tools_bulk(params.0).await)
    }

    #[tool(description = "Invoke one tool repeatedly with a batch of argument sets, in order, in one request")]
    async fn call_tool_bulk(&self, params: Parameters<CallToolBulkArgs>) -> Result<CallToolResult, McpError> {
        Ok(self.registry.call_tool_bulk(params.0).await)
    }
}

#[tool_handler]
impl ServerHandler for KbmcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "kbmcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

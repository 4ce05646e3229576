//! Tool argument types for the MCP server (§6.1).
//!
//! One `schemars::JsonSchema`-deriving struct per tool's parameter set.
//! Doc comments on each field become that field's schema description, per
//! the convention the macro-based `#[tool]` surface would otherwise infer
//! automatically.

use schemars::JsonSchema;
use serde::Deserialize;

use kbmcp_domain::entities::QuestionAnswerStyle;

fn default_true() -> bool {
    true
}

fn default_answer_style() -> QuestionAnswerStyle {
    QuestionAnswerStyle::Normal
}

fn default_max_child_page_limit() -> u32 {
    500
}

fn default_recall_last_count() -> u32 {
    10
}

// ─── Manage ──────────────────────────────────────────────────────────────

/// Arguments for `manage_create`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ManageCreateArgs {
    /// Unique, case-sensitive display name for the new knowledge base.
    pub name: String,
    /// The kind of collection, e.g. `"docs"` or `"memory"`.
    #[serde(rename = "type")]
    pub kb_type: String,
    /// Free-form human description.
    pub description: String,
    /// Opaque origin descriptor: a URL, a workspace name, etc.
    pub data_source: String,
}

/// Arguments for `manage_get_by_backend_id` and `manage_delete_by_backend_id`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ByBackendIdArgs {
    /// The storage-level collection identifier.
    pub backend_id: String,
}

/// Arguments for `manage_get_by_name` and `manage_delete_by_name`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ByNameArgs {
    /// The knowledge base's unique display name.
    pub name: String,
}

/// Arguments for `manage_update_by_backend_id`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ManageUpdateByBackendIdArgs {
    /// The storage-level collection identifier to update.
    pub backend_id: String,
    /// New display name, if renaming.
    #[serde(default)]
    pub name: Option<String>,
    /// New description, if changing.
    #[serde(default)]
    pub description: Option<String>,
}

/// Arguments for `manage_update_by_name`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ManageUpdateByNameArgs {
    /// The knowledge base's current display name.
    pub name: String,
    /// New display name, if renaming.
    #[serde(default)]
    pub new_name: Option<String>,
    /// New description, if changing.
    #[serde(default)]
    pub description: Option<String>,
}

// ─── Ask ─────────────────────────────────────────────────────────────────

/// Arguments for `ask_documentation_available`.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct AskDocumentationAvailableArgs {}

/// Arguments for `ask_questions`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct AskQuestionsArgs {
    /// Natural-language phrases to search for, one result per phrase.
    pub questions: Vec<String>,
    /// Selects both the hit count and fragment count per phrase.
    #[serde(default = "default_answer_style")]
    pub answer_style: QuestionAnswerStyle,
}

/// Arguments for `ask_questions_for_kb`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct AskQuestionsForKbArgs {
    /// Restrict candidate knowledge bases to these display names.
    pub knowledge_base_names: Vec<String>,
    /// Natural-language phrases to search for, one result per phrase.
    pub questions: Vec<String>,
    /// Selects both the hit count and fragment count per phrase.
    #[serde(default = "default_answer_style")]
    pub answer_style: QuestionAnswerStyle,
}

// ─── Learn ───────────────────────────────────────────────────────────────

/// Arguments for `learn_urls_from_webpage`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct LearnUrlsFromWebpageArgs {
    /// The page to fetch and extract crawlable links from.
    pub url: String,
}

/// Arguments for `learn_from_web_documentation`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct LearnFromWebDocumentationArgs {
    /// Display name for the documentation knowledge base.
    pub name: String,
    /// Free-form human description.
    pub description: String,
    /// The seed URL to crawl.
    pub data_source: String,
    /// When `false` (the default) and a knowledge base named `name`
    /// already exists, the call fails instead of launching a crawl.
    #[serde(default)]
    pub overwrite: bool,
    /// Maximum number of crawlable child URLs this target may have.
    #[serde(default = "default_max_child_page_limit")]
    pub max_child_page_limit: u32,
}

/// Arguments for `learn_active_documentation_requests`.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct LearnActiveDocumentationRequestsArgs {}

// ─── Remember ────────────────────────────────────────────────────────────

/// Arguments for `memory_set_project`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct MemorySetProjectArgs {
    /// The project name this session's memories are scoped to.
    pub project_name: String,
    /// Whether to include the project's existing memories in the response.
    #[serde(default = "default_true")]
    pub return_memories: bool,
}

/// Arguments for `memory_get_project_name`.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct MemoryGetProjectNameArgs {}

/// Arguments for `memory_encoding`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct MemoryEncodingArgs {
    /// Short label for the memory.
    pub title: String,
    /// The content to remember.
    pub content: String,
}

/// Arguments for `memory_encodings`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct MemoryEncodingsArgs {
    /// The memories to record, in order.
    pub memories: Vec<MemoryArg>,
}

/// One memory within a `memory_encodings` batch.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct MemoryArg {
    /// Short label for the memory.
    pub title: String,
    /// The content to remember.
    pub content: String,
}

/// Arguments for `memory_recall`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct MemoryRecallArgs {
    /// Natural-language phrases to recall memories for.
    pub questions: Vec<String>,
}

/// Arguments for `memory_recall_last`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct MemoryRecallLastArgs {
    /// Maximum number of memories to return, most recent first.
    #[serde(default = "default_recall_last_count")]
    pub count: u32,
}

/// Arguments for `memory_update_encoding`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct MemoryUpdateEncodingArgs {
    /// The memory's backend-assigned id.
    pub document_id: String,
    /// New title, if changing.
    #[serde(default)]
    pub title: Option<String>,
    /// New content, if changing.
    #[serde(default)]
    pub content: Option<String>,
}

/// Arguments for `memory_delete_encoding`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct MemoryDeleteEncodingArgs {
    /// The memory's backend-assigned id.
    pub document_id: String,
}

// ─── Bulk dispatch ───────────────────────────────────────────────────────

/// One invocation within a `call_tools_bulk` batch.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct BulkToolCall {
    /// The fully-qualified tool name to invoke.
    pub tool: String,
    /// The arguments to invoke it with.
    #[serde(default)]
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

/// Arguments for `call_tools_bulk`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CallToolsBulkArgs {
    /// The tool invocations to perform, in order.
    pub tool_calls: Vec<BulkToolCall>,
    /// When `false`, dispatch halts at the first invocation that reports
    /// an error, returning the accumulated prefix.
    #[serde(default = "default_true")]
    pub continue_on_error: bool,
}

/// Arguments for `call_tool_bulk`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CallToolBulkArgs {
    /// The fully-qualified tool name to invoke repeatedly.
    pub tool: String,
    /// One argument set per invocation, in order.
    pub tool_arguments: Vec<serde_json::Map<String, serde_json::Value>>,
    /// When `false`, dispatch halts at the first invocation that reports
    /// an error, returning the accumulated prefix.
    #[serde(default = "default_true")]
    pub continue_on_error: bool,
}

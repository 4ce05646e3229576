//! The Remember sub-server (§4.4): project-scoped free-form memories.
//!
//! Every tool but `set_project` reads the active knowledge base from the
//! request-scoped [`ProjectSlot`] and raises if it is unset (§3
//! `ProjectContext`, §7 ordinary propagation).

use std::sync::Arc;

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;
use serde::Serialize;

use kbmcp_application::KnowledgeBaseManager;
use kbmcp_domain::entities::{
    DocumentUpdate, DocumentWrite, KnowledgeBaseCreateProto, ProjectContext, KB_TYPE_MEMORY,
};

use crate::args::{
    MemoryDeleteEncodingArgs, MemoryEncodingArgs, MemoryEncodingsArgs, MemoryGetProjectNameArgs,
    MemoryRecallArgs, MemoryRecallLastArgs, MemorySetProjectArgs, MemoryUpdateEncodingArgs,
};
use crate::formatting;
use crate::project_context::ProjectSlot;

/// Fixed answer shape for `memory_recall`: one hit, one fragment, so the
/// returned document's `content` is the whole matched memory rather than
/// a 500-character highlight slice.
const RECALL_N_HITS: u32 = 1;
const RECALL_N_FRAGMENTS: u32 = 1;

#[derive(Debug, Serialize)]
struct MemoryInitResponse {
    memory_count: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    memories: Vec<String>,
}

/// Handler for the Remember sub-server's tools.
pub struct RememberHandler {
    manager: Arc<KnowledgeBaseManager>,
    project: ProjectSlot,
}

impl RememberHandler {
    /// Build a handler bound to a Knowledge Base Manager and the
    /// server's request-scoped project slot.
    pub fn new(manager: Arc<KnowledgeBaseManager>, project: ProjectSlot) -> Self {
        Self { manager, project }
    }

    /// `memory_set_project(project_name, return_memories) -> MemoryInitResponse`.
    ///
    /// Establishes or creates a knowledge base named exactly
    /// `project_name`, `type="memory"`, `data_source="Workspace-\`<name>\`"`,
    /// and binds it in the project slot.
    #[tracing::instrument(skip(self))]
    pub async fn set_project(
        &self,
        Parameters(args): Parameters<MemorySetProjectArgs>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = async {
            let kb = match self.manager.try_get_by_name(&args.project_name).await? {
                Some(kb) => kb,
                None => {
                    let proto = KnowledgeBaseCreateProto {
                        name: args.project_name.clone(),
                        kb_type: KB_TYPE_MEMORY.to_string(),
                        description: format!("Project memory for {}", args.project_name),
                        data_source: format!("Workspace-`{}`", args.project_name),
                    };
                    self.manager.create(proto).await?
                }
            };

            self.project.set(ProjectContext { project_name: args.project_name.clone(), knowledge_base: kb.clone() });

            let memories = if args.return_memories {
                self.manager
                    .get_recent_documents(&kb, u32::MAX)
                    .await?
                    .into_iter()
                    .map(|d| formatting::render_document(&d))
                    .collect()
            } else {
                Vec::new()
            };

            Ok::<_, kbmcp_domain::error::Error>(MemoryInitResponse { memory_count: kb.doc_count, memories })
        }
        .await;

        match outcome {
            Ok(response) => Ok(formatting::success(render_memory_init_response(&response))),
            Err(e) => Ok(formatting::error(e.to_string())),
        }
    }

    /// `memory_get_project_name() -> string`.
    #[tracing::instrument(skip(self))]
    pub async fn get_project_name(
        &self,
        Parameters(_args): Parameters<MemoryGetProjectNameArgs>,
    ) -> Result<CallToolResult, McpError> {
        match self.project.require() {
            Ok(ctx) => Ok(formatting::success(ctx.project_name)),
            Err(e) => Ok(formatting::error(e.to_string())),
        }
    }

    /// `memory_encoding(title, content) -> ∅`.
    #[tracing::instrument(skip(self))]
    pub async fn encoding(
        &self,
        Parameters(args): Parameters<MemoryEncodingArgs>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = async {
            let ctx = self.project.require()?;
            self.manager
                .insert_documents(&ctx.knowledge_base, vec![DocumentWrite { title: args.title, content: args.content }])
                .await
        }
        .await;
        Ok(respond(outcome.map(|()| "encoded".to_string())))
    }

    /// `memory_encodings(memories) -> ∅`. A zero-memory batch is a no-op,
    /// inherited from [`KnowledgeBaseManager::insert_documents`].
    #[tracing::instrument(skip(self))]
    pub async fn encodings(
        &self,
        Parameters(args): Parameters<MemoryEncodingsArgs>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = async {
            let ctx = self.project.require()?;
            let docs = args
                .memories
                .into_iter()
                .map(|m| DocumentWrite { title: m.title, content: m.content })
                .collect();
            self.manager.insert_documents(&ctx.knowledge_base, docs).await
        }
        .await;
        Ok(respond(outcome.map(|()| "encoded".to_string())))
    }

    /// `memory_recall(questions) -> [SearchResult|Error]`.
    #[tracing::instrument(skip(self))]
    pub async fn recall(
        &self,
        Parameters(args): Parameters<MemoryRecallArgs>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = async {
            let ctx = self.project.require()?;
            self.manager
                .search_by_name(vec![ctx.project_name], args.questions, RECALL_N_HITS, RECALL_N_FRAGMENTS)
                .await
        }
        .await;

        match outcome {
            Ok(outcomes) => Ok(formatting::success(formatting::render_search_outcomes(&outcomes))),
            Err(e) => Ok(formatting::error(e.to_string())),
        }
    }

    /// `memory_recall_last(count) -> [Document]`.
    #[tracing::instrument(skip(self))]
    pub async fn recall_last(
        &self,
        Parameters(args): Parameters<MemoryRecallLastArgs>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = async {
            let ctx = self.project.require()?;
            self.manager.get_recent_documents(&ctx.knowledge_base, args.count).await
        }
        .await;

        match outcome {
            Ok(docs) => Ok(formatting::success(formatting::render_document_list(&docs))),
            Err(e) => Ok(formatting::error(e.to_string())),
        }
    }

    /// `memory_update_encoding(document_id, title, content) -> ∅`.
    #[tracing::instrument(skip(self))]
    pub async fn update_encoding(
        &self,
        Parameters(args): Parameters<MemoryUpdateEncodingArgs>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = async {
            let ctx = self.project.require()?;
            let update = DocumentUpdate { title: args.title, content: args.content };
            self.manager.update_document(&ctx.knowledge_base, &args.document_id, update).await
        }
        .await;
        Ok(respond(outcome.map(|()| "updated".to_string())))
    }

    /// `memory_delete_encoding(document_id) -> ∅`.
    #[tracing::instrument(skip(self))]
    pub async fn delete_encoding(
        &self,
        Parameters(args): Parameters<MemoryDeleteEncodingArgs>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = async {
            let ctx = self.project.require()?;
            self.manager.delete_document(&ctx.knowledge_base, &args.document_id).await
        }
        .await;
        Ok(respond(outcome.map(|()| "deleted".to_string())))
    }
}

fn render_memory_init_response(response: &MemoryInitResponse) -> String {
    let mut out = format!("memory_count: {}", response.memory_count);
    if !response.memories.is_empty() {
        let rendered = response.memories.iter().map(|m| indent(m, "  ")).collect::<Vec<_>>().join("\n\n");
        out.push_str(&format!("\nmemories:\n{rendered}"));
    }
    out
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines().map(|line| format!("{prefix}{line}")).collect::<Vec<_>>().join("\n")
}

fn respond(outcome: kbmcp_domain::error::Result<String>) -> CallToolResult {
    match outcome {
        Ok(text) => formatting::success(text),
        Err(e) => formatting::error(e.to_string()),
    }
}

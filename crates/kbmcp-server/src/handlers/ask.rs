//! The Ask sub-server (§4.4): documentation discovery and question answering.

use std::sync::Arc;

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;

use kbmcp_application::KnowledgeBaseManager;
use kbmcp_domain::entities::KB_TYPE_DOCS;

use crate::args::{AskDocumentationAvailableArgs, AskQuestionsArgs, AskQuestionsForKbArgs};
use crate::formatting;

/// Handler for the Ask sub-server's tools.
pub struct AskHandler {
    manager: Arc<KnowledgeBaseManager>,
}

impl AskHandler {
    /// Build a handler bound to a Knowledge Base Manager.
    pub fn new(manager: Arc<KnowledgeBaseManager>) -> Self {
        Self { manager }
    }

    /// `ask_documentation_available() -> [KB]`: knowledge bases with
    /// `type == "docs"`.
    #[tracing::instrument(skip(self))]
    pub async fn documentation_available(
        &self,
        Parameters(_args): Parameters<AskDocumentationAvailableArgs>,
    ) -> Result<CallToolResult, McpError> {
        match self.manager.list().await {
            Ok(kbs) => {
                let docs: Vec<_> = kbs.into_iter().filter(|kb| kb.kb_type == KB_TYPE_DOCS).collect();
                Ok(formatting::success(formatting::render_knowledge_base_list(&docs)))
            }
            Err(e) => Ok(formatting::error(e.to_string())),
        }
    }

    /// `ask_questions(questions, answer_style) -> [SearchResult|Error]`.
    #[tracing::instrument(skip(self))]
    pub async fn questions(
        &self,
        Parameters(args): Parameters<AskQuestionsArgs>,
    ) -> Result<CallToolResult, McpError> {
        let n_hits = args.answer_style.n_hits();
        let n_fragments = args.answer_style.n_fragments();
        match self.manager.search(args.questions, n_hits, n_fragments).await {
            Ok(outcomes) => Ok(formatting::success(formatting::render_search_outcomes(&outcomes))),
            Err(e) => Ok(formatting::error(e.to_string())),
        }
    }

    /// `ask_questions_for_kb(knowledge_base_names, questions, answer_style) -> […]`.
    #[tracing::instrument(skip(self))]
    pub async fn questions_for_kb(
        &self,
        Parameters(args): Parameters<AskQuestionsForKbArgs>,
    ) -> Result<CallToolResult, McpError> {
        let n_hits = args.answer_style.n_hits();
        let n_fragments = args.answer_style.n_fragments();
        match self
            .manager
            .search_by_name(args.knowledge_base_names, args.questions, n_hits, n_fragments)
            .await
        {
            Ok(outcomes) => Ok(formatting::success(formatting::render_search_outcomes(&outcomes))),
            Err(e) => Ok(formatting::error(e.to_string())),
        }
    }
}

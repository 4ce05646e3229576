//! The Manage sub-server (§4.4): knowledge base CRUD.

use std::sync::Arc;

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;

use kbmcp_application::KnowledgeBaseManager;
use kbmcp_domain::entities::{KnowledgeBase, KnowledgeBaseCreateProto, KnowledgeBaseUpdate};
use kbmcp_domain::error::{Error, Result};

use crate::args::{
    ByBackendIdArgs, ByNameArgs, ManageCreateArgs, ManageUpdateByBackendIdArgs, ManageUpdateByNameArgs,
};
use crate::formatting;

/// Handler for the Manage sub-server's tools.
pub struct ManageHandler {
    manager: Arc<KnowledgeBaseManager>,
}

impl ManageHandler {
    /// Build a handler bound to a Knowledge Base Manager.
    pub fn new(manager: Arc<KnowledgeBaseManager>) -> Self {
        Self { manager }
    }

    /// `manage_create(knowledge_base_create_proto) -> KB`.
    #[tracing::instrument(skip(self))]
    pub async fn create(
        &self,
        Parameters(args): Parameters<ManageCreateArgs>,
    ) -> Result<CallToolResult, McpError> {
        let proto = KnowledgeBaseCreateProto {
            name: args.name,
            kb_type: args.kb_type,
            description: args.description,
            data_source: args.data_source,
        };
        Ok(respond(self.manager.create(proto).await.map(|kb| formatting::render_knowledge_base(&kb))))
    }

    /// `manage_get_by_backend_id(backend_id) -> KB`.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_backend_id(
        &self,
        Parameters(args): Parameters<ByBackendIdArgs>,
    ) -> Result<CallToolResult, McpError> {
        Ok(respond(self.find_by_backend_id(&args.backend_id).await.map(|kb| formatting::render_knowledge_base(&kb))))
    }

    /// `manage_get_by_name(name) -> KB`.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_name(
        &self,
        Parameters(args): Parameters<ByNameArgs>,
    ) -> Result<CallToolResult, McpError> {
        Ok(respond(self.manager.get_by_name(&args.name).await.map(|kb| formatting::render_knowledge_base(&kb))))
    }

    /// `manage_delete_by_backend_id(backend_id) -> ∅`.
    #[tracing::instrument(skip(self))]
    pub async fn delete_by_backend_id(
        &self,
        Parameters(args): Parameters<ByBackendIdArgs>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = async {
            let kb = self.find_by_backend_id(&args.backend_id).await?;
            self.manager.delete(&kb).await
        }
        .await;
        Ok(respond(outcome.map(|()| "deleted".to_string())))
    }

    /// `manage_delete_by_name(name) -> ∅`.
    #[tracing::instrument(skip(self))]
    pub async fn delete_by_name(
        &self,
        Parameters(args): Parameters<ByNameArgs>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = async {
            let kb = self.manager.get_by_name(&args.name).await?;
            self.manager.delete(&kb).await
        }
        .await;
        Ok(respond(outcome.map(|()| "deleted".to_string())))
    }

    /// `manage_update_by_backend_id(backend_id, knowledge_base_update) -> ∅`.
    #[tracing::instrument(skip(self))]
    pub async fn update_by_backend_id(
        &self,
        Parameters(args): Parameters<ManageUpdateByBackendIdArgs>,
    ) -> Result<CallToolResult, McpError> {
        let update = KnowledgeBaseUpdate { name: args.name, description: args.description };
        let outcome = async {
            let kb = self.find_by_backend_id(&args.backend_id).await?;
            self.manager.update(&kb, update).await
        }
        .await;
        Ok(respond(outcome.map(|()| "updated".to_string())))
    }

    /// `manage_update_by_name(name, knowledge_base_update) -> ∅`.
    #[tracing::instrument(skip(self))]
    pub async fn update_by_name(
        &self,
        Parameters(args): Parameters<ManageUpdateByNameArgs>,
    ) -> Result<CallToolResult, McpError> {
        let update = KnowledgeBaseUpdate { name: args.new_name, description: args.description };
        let outcome = async {
            let kb = self.manager.get_by_name(&args.name).await?;
            self.manager.update(&kb, update).await
        }
        .await;
        Ok(respond(outcome.map(|()| "updated".to_string())))
    }

    /// Look up a knowledge base by its opaque storage-level id. Not a
    /// primitive the Manager exposes directly (its indexed lookup is by
    /// `name`); scans `list()` instead, matching `get_by_name`'s own
    /// linear-scan strategy.
    async fn find_by_backend_id(&self, backend_id: &str) -> Result<KnowledgeBase> {
        self.manager
            .list()
            .await?
            .into_iter()
            .find(|kb| kb.backend_id == backend_id)
            .ok_or_else(|| Error::not_found(format!("knowledge base with backend_id {backend_id}")))
    }
}

fn respond(outcome: Result<String>) -> CallToolResult {
    match outcome {
        Ok(text) => formatting::success(text),
        Err(e) => formatting::error(e.to_string()),
    }
}

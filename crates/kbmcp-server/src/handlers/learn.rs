//! The Learn sub-server (§4.4): crawl-target discovery and web-documentation ingestion.

use std::sync::Arc;

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;
use serde::Serialize;

use kbmcp_application::crawl_orchestrator::CrawlOrchestrator;
use kbmcp_application::crawl_params::derive_crawl_params;
use kbmcp_application::KnowledgeBaseManager;
use kbmcp_domain::entities::{KnowledgeBaseCreateProto, KB_TYPE_DOCS};
use kbmcp_domain::ports::WebProbePort;

use crate::args::{
    LearnActiveDocumentationRequestsArgs, LearnFromWebDocumentationArgs, LearnUrlsFromWebpageArgs,
};
use crate::formatting;

/// The tool-level result of a `learn_from_web_documentation` call. Never
/// surfaces as a tool error (§7): validation and creation failures are
/// caught and returned as a typed [`CrawlStartFailure`] so partial fleet
/// launches stay observable to the caller.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum CrawlStartOutcome {
    Success(CrawlStartSuccess),
    Failure(CrawlStartFailure),
}

#[derive(Debug, Serialize)]
struct CrawlStartSuccess {
    url: String,
    knowledge_base_id: String,
    container_id: String,
}

#[derive(Debug, Serialize)]
struct CrawlStartFailure {
    url: String,
    reason: String,
}

impl CrawlStartOutcome {
    fn render(&self) -> String {
        match self {
            Self::Success(s) => format!(
                "url: {}\nknowledge_base_id: {}\ncontainer_id: {}",
                s.url, s.knowledge_base_id, s.container_id
            ),
            Self::Failure(f) => format!("url: {}\nreason: {}", f.url, f.reason),
        }
    }
}

/// Handler for the Learn sub-server's tools.
pub struct LearnHandler {
    manager: Arc<KnowledgeBaseManager>,
    orchestrator: Arc<CrawlOrchestrator>,
    web_probe: Arc<dyn WebProbePort>,
}

impl LearnHandler {
    /// Build a handler bound to a Knowledge Base Manager, Crawl
    /// Orchestrator and a Web Probe (needed directly for
    /// `urls_from_webpage`, which bypasses the Orchestrator's fuller
    /// `validate_crawl` pre-flight).
    pub fn new(
        manager: Arc<KnowledgeBaseManager>,
        orchestrator: Arc<CrawlOrchestrator>,
        web_probe: Arc<dyn WebProbePort>,
    ) -> Self {
        Self { manager, orchestrator, web_probe }
    }

    /// `learn_urls_from_webpage(url) -> [string]`: wraps the Web Probe's
    /// `urls_to_crawl`.
    #[tracing::instrument(skip(self))]
    pub async fn urls_from_webpage(
        &self,
        Parameters(args): Parameters<LearnUrlsFromWebpageArgs>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = async {
            let params = derive_crawl_params(&args.url)?;
            self.web_probe.probe(&args.url, &params.domain, &params.filter_pattern).await
        }
        .await;

        match outcome {
            Ok(result) => {
                let text = if result.urls_to_crawl.is_empty() {
                    "(no crawlable URLs)".to_string()
                } else {
                    result.urls_to_crawl.join("\n")
                };
                Ok(formatting::success(text))
            }
            Err(e) => Ok(formatting::error(e.to_string())),
        }
    }

    /// `learn_from_web_documentation(proto, max_child_page_limit) -> CrawlStartSuccess|CrawlStartFailure`.
    #[tracing::instrument(skip(self))]
    pub async fn from_web_documentation(
        &self,
        Parameters(args): Parameters<LearnFromWebDocumentationArgs>,
    ) -> Result<CallToolResult, McpError> {
        let url = args.data_source.clone();
        let outcome = self.start_crawl(args).await.unwrap_or_else(|reason| CrawlStartOutcome::Failure(CrawlStartFailure { url, reason }));
        Ok(formatting::success(outcome.render()))
    }

    async fn start_crawl(&self, args: LearnFromWebDocumentationArgs) -> Result<CrawlStartOutcome, String> {
        let params = self
            .orchestrator
            .validate_crawl(&args.data_source, args.max_child_page_limit as usize)
            .await
            .map_err(|e| e.to_string())?;

        let existing = self.manager.try_get_by_name(&args.name).await.map_err(|e| e.to_string())?;

        let kb = match existing {
            Some(kb) if !args.overwrite => {
                return Ok(CrawlStartOutcome::Failure(CrawlStartFailure {
                    url: args.data_source.clone(),
                    reason: format!("knowledge base {} already exists", args.name),
                }));
            }
            Some(kb) => kb,
            None => {
                let proto = KnowledgeBaseCreateProto {
                    name: args.name.clone(),
                    kb_type: KB_TYPE_DOCS.to_string(),
                    description: args.description.clone(),
                    data_source: args.data_source.clone(),
                };
                self.manager.create(proto).await.map_err(|e| e.to_string())?
            }
        };

        let container_id = self
            .orchestrator
            .crawl_domain(&params.domain, &params.seed_url, &params.filter_pattern, &kb.backend_id, &[])
            .await
            .map_err(|e| e.to_string())?;

        Ok(CrawlStartOutcome::Success(CrawlStartSuccess {
            url: args.data_source,
            knowledge_base_id: kb.backend_id,
            container_id,
        }))
    }

    /// `learn_active_documentation_requests() -> [job]`.
    #[tracing::instrument(skip(self))]
    pub async fn active_documentation_requests(
        &self,
        Parameters(_args): Parameters<LearnActiveDocumentationRequestsArgs>,
    ) -> Result<CallToolResult, McpError> {
        match self.orchestrator.list_crawls().await {
            Ok(jobs) => Ok(formatting::success(formatting::render_crawl_job_list(&jobs))),
            Err(e) => Ok(formatting::error(e.to_string())),
        }
    }
}

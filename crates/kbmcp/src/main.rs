//! kbmcp — a Model Context Protocol server for curated knowledge base
//! ingestion and search.
//!
//! Startup order follows §6.5: load and validate configuration, ping the
//! backend with a short timeout (fatal on failure), construct every
//! component, then accept tool calls.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use kbmcp_application::{CrawlOrchestrator, KnowledgeBaseManager};
use kbmcp_domain::error::{Error, Result};
use kbmcp_domain::ports::{BackendPort, WebProbePort};
use kbmcp_infrastructure::config::{ConfigLoader, TransportKind};
use kbmcp_infrastructure::logging::{self, LoggingConfig};
use kbmcp_providers::{DockerContainerRuntime, ElasticsearchBackend, HttpWebProbe};
use kbmcp_providers::elasticsearch::BackendAuth;
use kbmcp_server::KbmcpServer;

/// Startup liveness probe timeout (§6.5: "5 s for the startup liveness probe").
const STARTUP_PING_TIMEOUT: Duration = Duration::from_secs(5);

/// kbmcp: curated knowledge base ingestion and search over MCP.
#[derive(Debug, Parser)]
#[command(name = "kbmcp", version, about)]
struct Cli {
    /// Path to a `kbmcp.toml` configuration file. Defaults to the usual
    /// search locations (see `ConfigLoader`).
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Log level: trace, debug, info, warn, or error.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit structured JSON log lines instead of human-readable text.
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init_logging(LoggingConfig {
        level: cli.log_level.clone(),
        json_format: cli.log_json,
        file_output: None,
    })?;

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "kbmcp exited with a fatal error");
        return Err(e.into());
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_path(path);
    }
    let settings = loader.load()?;

    let auth = backend_auth(&settings.backend)?;
    let backend: Arc<dyn BackendPort> = Arc::new(ElasticsearchBackend::new(
        settings.backend.host.clone(),
        auth,
        Duration::from_secs(settings.backend.request_timeout_secs),
    )?);

    tokio::time::timeout(STARTUP_PING_TIMEOUT, backend.ping())
        .await
        .map_err(|_| Error::backend_connection("startup ping timed out"))??;

    let container = Arc::new(DockerContainerRuntime::new(
        settings.crawler.docker_socket.clone().unwrap_or_else(|| "http://localhost:2375".to_string()),
    )?);
    let web_probe: Arc<dyn WebProbePort> = Arc::new(HttpWebProbe::new()?);

    let manager = Arc::new(KnowledgeBaseManager::new(backend, settings.knowledge_base.base_index_prefix.clone()));

    let backend_connection = serde_json::json!({
        "host": settings.backend.host,
        "pipeline": settings.crawler.es_pipeline,
    });
    let orchestrator = Arc::new(CrawlOrchestrator::new(
        container,
        web_probe.clone(),
        settings.crawler.docker_image.clone(),
        backend_connection,
        settings.crawler.memory_reservation_bytes,
    ));

    let server = KbmcpServer::new(manager, orchestrator, web_probe);

    match settings.transport.kind {
        TransportKind::Stdio => kbmcp_server::transport::serve_stdio(server).await,
        TransportKind::Sse => kbmcp_server::transport::serve_sse(server, &settings.transport.sse_bind_addr).await,
    }
}

fn backend_auth(settings: &kbmcp_infrastructure::config::BackendSettings) -> Result<BackendAuth> {
    if let Some(api_key) = &settings.api_key {
        return Ok(BackendAuth::ApiKey(api_key.clone()));
    }
    match (&settings.username, &settings.password) {
        (Some(username), Some(password)) => {
            Ok(BackendAuth::Basic { username: username.clone(), password: password.clone() })
        }
        _ => Err(Error::generic(
            "backend configuration must set exactly one authentication method: api_key or username+password",
        )),
    }
}

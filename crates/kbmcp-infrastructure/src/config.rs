//! Layered configuration loading (§6.5).
//!
//! `Settings` is assembled by [`figment`] from three layers, later ones
//! winning: built-in defaults, an optional `kbmcp.toml` file, then
//! environment variables under the `KBMCP_`, `ES_` and `CRAWLER_`
//! prefixes. [`load`] validates the result before handing it to the
//! wiring layer — in particular §6.5's "exactly one backend auth method."

use std::env;
use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use kbmcp_domain::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// The default config filename searched for when no explicit path is given.
pub const DEFAULT_CONFIG_FILENAME: &str = "kbmcp.toml";
/// The default config directory name under XDG/home search paths.
pub const DEFAULT_CONFIG_DIR: &str = "kbmcp";

/// The fully assembled configuration tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Backend adapter connection and credentials.
    #[serde(default)]
    pub backend: BackendSettings,
    /// Crawl worker image and container runtime connection.
    #[serde(default)]
    pub crawler: CrawlerSettings,
    /// Knowledge base index prefix.
    #[serde(default)]
    pub knowledge_base: KnowledgeBaseSettings,
    /// MCP transport selection.
    #[serde(default)]
    pub transport: TransportSettings,
    /// Remember sub-server defaults.
    #[serde(default)]
    pub memory: MemorySettings,
}

/// Backend adapter settings (§6.2, §6.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// The backend cluster's root URL.
    pub host: String,
    /// Per-request timeout, in seconds.
    pub request_timeout_secs: u64,
    /// Maximum items per bulk-insert batch.
    pub bulk_max_items: u32,
    /// Maximum bytes per bulk-insert batch.
    pub bulk_max_bytes: u64,
    /// API key credential. Mutually exclusive with `username`/`password`.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Basic-auth username. Mutually exclusive with `api_key`.
    #[serde(default)]
    pub username: Option<String>,
    /// Basic-auth password.
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            host: "http://localhost:9200".to_string(),
            request_timeout_secs: 600,
            bulk_max_items: 500,
            bulk_max_bytes: 10 * 1024 * 1024,
            api_key: None,
            username: None,
            password: None,
        }
    }
}

/// Crawl worker and container runtime settings (§6.3, §6.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerSettings {
    /// The crawl worker image to launch.
    pub docker_image: String,
    /// TCP-reachable Docker Engine API endpoint. See the container-runtime
    /// transport note in the design ledger: no Unix-socket transport.
    #[serde(default)]
    pub docker_socket: Option<String>,
    /// The Elasticsearch ingest pipeline name composed into generated
    /// crawl configs' `elasticsearch` connection block.
    pub es_pipeline: String,
    /// Minimum memory reservation for crawl containers, in bytes.
    pub memory_reservation_bytes: u64,
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self {
            docker_image: "elastic/crawler:latest".to_string(),
            docker_socket: Some("http://localhost:2375".to_string()),
            es_pipeline: "kbmcp-crawler".to_string(),
            memory_reservation_bytes: 1_073_741_824,
        }
    }
}

/// Knowledge base index-prefix settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseSettings {
    /// The prefix every managed collection's `backend_id` begins with.
    pub base_index_prefix: String,
}

impl KnowledgeBaseSettings {
    /// The glob pattern matching every collection this process manages.
    pub fn index_pattern(&self) -> String {
        format!("{}-*", self.base_index_prefix)
    }
}

impl Default for KnowledgeBaseSettings {
    fn default() -> Self {
        Self { base_index_prefix: "kbmcp".to_string() }
    }
}

/// The MCP transport kind a running server binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Standard input/output JSON-RPC framing.
    Stdio,
    /// Server-sent events over HTTP.
    Sse,
}

/// Transport selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportSettings {
    /// Which transport to bind.
    pub kind: TransportKind,
    /// Bind address for the SSE transport; unused for `stdio`.
    pub sse_bind_addr: String,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self { kind: TransportKind::Stdio, sse_bind_addr: "127.0.0.1:8787".to_string() }
    }
}

/// Remember sub-server defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemorySettings {
    /// A default project name supplied by configuration. Per the
    /// supplemented CWD-basename fallback behavior, this only seeds the
    /// server's startup banner text — the request-scoped `ProjectContext`
    /// itself starts empty regardless of this setting.
    #[serde(default)]
    pub project_name: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: BackendSettings::default(),
            crawler: CrawlerSettings::default(),
            knowledge_base: KnowledgeBaseSettings::default(),
            transport: TransportSettings::default(),
            memory: MemorySettings::default(),
        }
    }
}

/// Loads [`Settings`] from defaults, an optional file, then environment
/// variables, validating the result.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// A loader with no explicit config path; [`Self::load`] searches the
    /// default candidate locations instead.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from this explicit path rather than searching for one.
    pub fn with_config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration from all sources and validate it.
    ///
    /// Layering, later wins: [`Settings::default`] → `kbmcp.toml` (explicit
    /// path, or the first of the default search candidates that exists) →
    /// `KBMCP_*`/`ES_*`/`CRAWLER_*` environment variables.
    pub fn load(&self) -> Result<Settings> {
        let mut figment = Figment::new().merge(Serialized::defaults(Settings::default()));

        let file_path = self.config_path.clone().or_else(Self::find_default_config_path);
        if let Some(path) = file_path {
            if path.exists() {
                figment = figment.merge(Toml::file(&path));
            }
        }

        figment = figment
            .merge(Env::prefixed("KBMCP_").split("_"))
            .merge(Env::prefixed("ES_").map(|key| format!("backend.{key}").into()))
            .merge(Env::prefixed("CRAWLER_").map(|key| format!("crawler.{key}").into()));

        let settings: Settings = figment
            .extract()
            .map_err(|e| Error::generic(format!("failed to load configuration: {e}")))?;

        validate(&settings)?;
        Ok(settings)
    }

    fn find_default_config_path() -> Option<PathBuf> {
        let cwd = env::current_dir().ok()?;
        let candidates = [
            cwd.join(DEFAULT_CONFIG_FILENAME),
            cwd.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILENAME),
            dirs::config_dir().map(|d| d.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILENAME))?,
            dirs::home_dir()
                .map(|d| d.join(format!(".{DEFAULT_CONFIG_DIR}")).join(DEFAULT_CONFIG_FILENAME))?,
        ];
        candidates.into_iter().find(|path| path.exists())
    }
}

/// Validate a loaded [`Settings`] tree. Currently enforces §6.5's
/// "exactly one backend auth method."
fn validate(settings: &Settings) -> Result<()> {
    let has_api_key = settings.backend.api_key.is_some();
    let has_basic = settings.backend.username.is_some() || settings.backend.password.is_some();

    if has_api_key && has_basic {
        return Err(Error::generic(
            "backend configuration must set exactly one authentication method: api_key or username+password, not both",
        ));
    }
    if !has_api_key && !has_basic {
        return Err(Error::generic(
            "backend configuration must set exactly one authentication method: api_key or username+password",
        ));
    }
    if settings.backend.username.is_some() != settings.backend.password.is_some() {
        return Err(Error::generic(
            "backend basic auth requires both username and password",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with(api_key: Option<&str>, username: Option<&str>, password: Option<&str>) -> Settings {
        let mut settings = Settings::default();
        settings.backend.api_key = api_key.map(str::to_string);
        settings.backend.username = username.map(str::to_string);
        settings.backend.password = password.map(str::to_string);
        settings
    }

    #[test]
    fn validate_accepts_api_key_alone() {
        assert!(validate(&settings_with(Some("k"), None, None)).is_ok());
    }

    #[test]
    fn validate_accepts_basic_auth_alone() {
        assert!(validate(&settings_with(None, Some("u"), Some("p"))).is_ok());
    }

    #[test]
    fn validate_rejects_no_auth_method() {
        assert!(validate(&settings_with(None, None, None)).is_err());
    }

    #[test]
    fn validate_rejects_both_auth_methods() {
        assert!(validate(&settings_with(Some("k"), Some("u"), Some("p"))).is_err());
    }

    #[test]
    fn validate_rejects_username_without_password() {
        assert!(validate(&settings_with(None, Some("u"), None)).is_err());
    }

    #[test]
    fn index_pattern_appends_wildcard() {
        let settings = KnowledgeBaseSettings { base_index_prefix: "kbmcp".to_string() };
        assert_eq!(settings.index_pattern(), "kbmcp-*");
    }
}

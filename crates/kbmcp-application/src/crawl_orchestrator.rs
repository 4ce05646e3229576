//! The Crawl Orchestrator (§4.2): crawl-target validation, per-job config
//! generation, worker launch and fleet management.

use std::collections::HashMap;
use std::sync::Arc;

use kbmcp_domain::entities::{CrawlJob, CrawlJobState, MANAGED_BY_LABEL};
use kbmcp_domain::error::{Error, Result};
use kbmcp_domain::ports::{ContainerPort, WebProbePort};
use kbmcp_domain::value_objects::{
    BackendConnectionConfig, ContainerSpec, CrawlConfig, CrawlConfigDomain, CrawlParams, CrawlRule,
};

use crate::crawl_params::derive_crawl_params;

/// Label key recording the owning process class on every crawl container.
pub const LABEL_MANAGED_BY: &str = "managed-by";
/// Label key recording the origin domain on every crawl container.
pub const LABEL_CRAWL_DOMAIN: &str = "crawl-domain";
/// Default ceiling on crawlable child URLs a single crawl target may have.
pub const DEFAULT_MAX_CHILD_LIMIT: usize = 500;
/// The path, inside the container, the config archive is injected at.
const CONFIG_ARCHIVE_PATH: &str = "/";
/// The config file's path within the injected archive.
const CONFIG_FILE_NAME: &str = "config/crawl.yml";
/// The fixed `output_sink` every generated config carries.
const OUTPUT_SINK: &str = "elasticsearch";

/// Derives crawl parameters, launches crawl workers as containers and
/// tracks/terminates them by label.
pub struct CrawlOrchestrator {
    container: Arc<dyn ContainerPort>,
    web_probe: Arc<dyn WebProbePort>,
    /// The crawl worker image to launch.
    docker_image: String,
    /// Backend-connection configuration composed verbatim into every
    /// generated config document; opaque to this layer.
    backend_connection: BackendConnectionConfig,
    /// Minimum memory reservation every crawl container is created with.
    memory_reservation_bytes: u64,
}

impl CrawlOrchestrator {
    /// Construct an orchestrator bound to a container runtime, a web probe
    /// and the worker image/backend-connection configuration supplied by
    /// the wiring layer.
    pub fn new(
        container: Arc<dyn ContainerPort>,
        web_probe: Arc<dyn WebProbePort>,
        docker_image: impl Into<String>,
        backend_connection: BackendConnectionConfig,
        memory_reservation_bytes: u64,
    ) -> Self {
        Self {
            container,
            web_probe,
            docker_image: docker_image.into(),
            backend_connection,
            memory_reservation_bytes,
        }
    }

    /// Validate a crawl target, returning the derived parameters on
    /// success.
    ///
    /// Fails [`Error::CrawlerValidationHttp`] if the probe raises a
    /// transport error, [`Error::CrawlerValidationNoIndexNofollow`] if the
    /// page reports both `noindex` and `nofollow`, and
    /// [`Error::CrawlerValidationTooManyUrls`] if the probe's
    /// `urls_to_crawl` exceeds `max_child_limit`. `skipped_urls`
    /// (`nofollow` links) never contribute to that count.
    pub async fn validate_crawl(&self, url: &str, max_child_limit: usize) -> Result<CrawlParams> {
        let params = derive_crawl_params(url)?;

        let probe = self
            .web_probe
            .probe(url, &params.domain, &params.filter_pattern)
            .await
            .map_err(|e| Error::CrawlerValidationHttp { message: e.to_string() })?;

        if probe.noindex && probe.nofollow {
            return Err(Error::CrawlerValidationNoIndexNofollow);
        }

        if probe.urls_to_crawl.len() > max_child_limit {
            return Err(Error::CrawlerValidationTooManyUrls {
                found: probe.urls_to_crawl.len(),
                limit: max_child_limit,
            });
        }

        Ok(params)
    }

    /// Build the structured config document a crawl worker reads at
    /// `/config/crawl.yml`.
    fn build_config(
        &self,
        domain: &str,
        seed_url: &str,
        filter_pattern: &str,
        backend_id: &str,
        exclude_paths: &[String],
    ) -> CrawlConfig {
        let mut crawl_rules: Vec<CrawlRule> =
            exclude_paths.iter().map(|p| CrawlRule::deny_begins(p.clone())).collect();
        crawl_rules.push(CrawlRule::allow_begins(filter_pattern));
        crawl_rules.push(CrawlRule::deny_regex(".*"));

        CrawlConfig {
            domains: vec![CrawlConfigDomain {
                url: domain.to_string(),
                seed_urls: vec![seed_url.to_string()],
                crawl_rules,
            }],
            output_sink: OUTPUT_SINK.to_string(),
            output_index: backend_id.to_string(),
            elasticsearch: self.backend_connection.clone(),
        }
    }

    /// Wrap a YAML-serialized config document as a single-file in-memory
    /// tar archive at `config/crawl.yml`.
    fn archive_config(config: &CrawlConfig) -> Result<Vec<u8>> {
        let yaml = serde_yaml::to_string(config)
            .map_err(|e| Error::container_start_failed(format!("failed to render crawl config: {e}")))?;

        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_size(yaml.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, CONFIG_FILE_NAME, yaml.as_bytes())
            .map_err(|e| Error::container_start_failed(format!("failed to build config archive: {e}")))?;

        builder
            .into_inner()
            .map_err(|e| Error::container_start_failed(format!("failed to finalize config archive: {e}")))
    }

    /// Launch a crawl worker targeting `backend_id`, returning the
    /// container's opaque id.
    ///
    /// On any failure after container creation, best-effort force-removes
    /// the half-created container before propagating
    /// [`Error::ContainerStartFailed`].
    pub async fn crawl_domain(
        &self,
        domain: &str,
        seed_url: &str,
        filter_pattern: &str,
        backend_id: &str,
        exclude_paths: &[String],
    ) -> Result<String> {
        let config = self.build_config(domain, seed_url, filter_pattern, backend_id, exclude_paths);
        let archive = Self::archive_config(&config)?;

        self.container.pull(&self.docker_image).await?;

        let mut labels = HashMap::new();
        labels.insert(LABEL_MANAGED_BY.to_string(), MANAGED_BY_LABEL.to_string());
        labels.insert(LABEL_CRAWL_DOMAIN.to_string(), domain.to_string());

        let spec = ContainerSpec {
            image: self.docker_image.clone(),
            command: vec![
                "ruby".to_string(),
                "bin/crawler".to_string(),
                "crawl".to_string(),
                "/config/crawl.yml".to_string(),
            ],
            labels,
            autoremove: false,
            memory_reservation_bytes: self.memory_reservation_bytes,
        };

        let container_id = self
            .container
            .create(&spec.image, &spec.command, &spec.labels, spec.autoremove, spec.memory_reservation_bytes)
            .await?;

        match self.launch(&container_id, archive).await {
            Ok(()) => Ok(container_id),
            Err(e) => {
                let _ = self.container.remove(&container_id, true).await;
                Err(Error::container_start_failed(e.to_string()))
            }
        }
    }

    async fn launch(&self, container_id: &str, archive: Vec<u8>) -> Result<()> {
        self.container.put_archive(container_id, CONFIG_ARCHIVE_PATH, archive).await?;
        self.container.start(container_id).await?;
        Ok(())
    }

    /// Enumerate every container carrying the `managed-by` label.
    pub async fn list_crawls(&self) -> Result<Vec<CrawlJob>> {
        let mut filters = HashMap::new();
        filters.insert(LABEL_MANAGED_BY.to_string(), MANAGED_BY_LABEL.to_string());

        let containers = self.container.list(&filters).await?;
        Ok(containers
            .into_iter()
            .map(|c| CrawlJob {
                domain: c.labels.get(LABEL_CRAWL_DOMAIN).cloned().unwrap_or_default(),
                id: c.id,
                state: c.state,
            })
            .collect())
    }

    /// Collect a crawl job's combined stdout/stderr log stream.
    pub async fn get_crawl_logs(&self, id: &str) -> Result<String> {
        self.container.logs(id).await.map_err(|e| match e {
            Error::ContainerNotFound { .. } => e,
            other => Error::ContainerNotFound { id: format!("{id} ({other})") },
        })
    }

    /// Force-remove a crawl job.
    pub async fn stop_crawl(&self, id: &str) -> Result<()> {
        self.container.remove(id, true).await
    }

    /// Remove every `exited` crawl job. Individual removal failures are
    /// collected, not raised.
    pub async fn remove_completed_crawls(&self) -> Result<(usize, usize)> {
        let jobs = self.list_crawls().await?;
        let total = jobs.len();

        let mut removed = 0usize;
        for job in jobs.into_iter().filter(|j| j.state == CrawlJobState::Exited) {
            if self.container.remove(&job.id, true).await.is_ok() {
                removed += 1;
            }
        }

        Ok((removed, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kbmcp_domain::value_objects::{ContainerInfo, WebProbeResult};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct FakeContainer {
        created: Mutex<Vec<(String, HashMap<String, String>)>>,
        removed: Mutex<Vec<String>>,
        fail_start: bool,
        containers: Vec<ContainerInfo>,
    }

    #[async_trait]
    impl ContainerPort for FakeContainer {
        async fn pull(&self, _image: &str) -> Result<()> {
            Ok(())
        }

        async fn create(
            &self,
            _image: &str,
            _command: &[String],
            labels: &HashMap<String, String>,
            _autoremove: bool,
            _memory_reservation_bytes: u64,
        ) -> Result<String> {
            let id = format!("container-{}", self.created.lock().await.len());
            self.created.lock().await.push((id.clone(), labels.clone()));
            Ok(id)
        }

        async fn put_archive(&self, _container_id: &str, _path: &str, _tar_bytes: Vec<u8>) -> Result<()> {
            Ok(())
        }

        async fn start(&self, _container_id: &str) -> Result<()> {
            if self.fail_start {
                return Err(Error::container_start_failed("boom"));
            }
            Ok(())
        }

        async fn list(&self, _filters: &HashMap<String, String>) -> Result<Vec<ContainerInfo>> {
            Ok(self.containers.clone())
        }

        async fn logs(&self, container_id: &str) -> Result<String> {
            if self.containers.iter().any(|c| c.id == container_id) {
                Ok("log output".to_string())
            } else {
                Err(Error::container_not_found(container_id))
            }
        }

        async fn remove(&self, container_id: &str, _force: bool) -> Result<()> {
            self.removed.lock().await.push(container_id.to_string());
            Ok(())
        }
    }

    struct FakeProbe(WebProbeResult);

    #[async_trait]
    impl WebProbePort for FakeProbe {
        async fn probe(&self, _url: &str, _domain_filter: &str, _path_filter: &str) -> Result<WebProbeResult> {
            Ok(self.0.clone())
        }
    }

    fn orchestrator(container: Arc<FakeContainer>, probe: WebProbeResult) -> CrawlOrchestrator {
        CrawlOrchestrator::new(
            container,
            Arc::new(FakeProbe(probe)),
            "elastic/crawler:latest",
            serde_json::json!({"host": "https://es.example.com"}),
            1_073_741_824,
        )
    }

    #[tokio::test]
    async fn validate_crawl_rejects_noindex_and_nofollow() {
        let container = Arc::new(FakeContainer::default());
        let orch = orchestrator(
            container,
            WebProbeResult { noindex: true, nofollow: true, ..Default::default() },
        );
        let err = orch.validate_crawl("https://ex.com/docs/", 500).await.unwrap_err();
        assert!(matches!(err, Error::CrawlerValidationNoIndexNofollow));
    }

    #[tokio::test]
    async fn validate_crawl_rejects_too_many_urls_but_ignores_skipped() {
        let container = Arc::new(FakeContainer::default());
        let urls_to_crawl: Vec<String> = (0..3).map(|i| format!("/p{i}")).collect();
        let orch = orchestrator(
            container,
            WebProbeResult {
                noindex: false,
                nofollow: false,
                urls_to_crawl,
                skipped_urls: vec!["/nofollow-1".to_string(), "/nofollow-2".to_string()],
            },
        );
        let err = orch.validate_crawl("https://ex.com/docs/", 2).await.unwrap_err();
        assert!(matches!(err, Error::CrawlerValidationTooManyUrls { found: 3, limit: 2 }));
    }

    #[tokio::test]
    async fn validate_crawl_at_exactly_the_limit_succeeds() {
        let container = Arc::new(FakeContainer::default());
        let urls_to_crawl: Vec<String> = (0..2).map(|i| format!("/p{i}")).collect();
        let orch = orchestrator(
            container,
            WebProbeResult { noindex: false, nofollow: false, urls_to_crawl, skipped_urls: vec![] },
        );
        let params = orch.validate_crawl("https://ex.com/docs/", 2).await.unwrap();
        assert_eq!(params.domain, "https://ex.com");
    }

    #[tokio::test]
    async fn crawl_domain_launches_a_labeled_container() {
        let container = Arc::new(FakeContainer::default());
        let orch = orchestrator(container.clone(), WebProbeResult::default());
        let id = orch
            .crawl_domain("https://ex.com", "https://ex.com/docs/", "/docs/", "kbmcp-docs.ex_com-aaaa1111", &[])
            .await
            .unwrap();

        let created = container.created.lock().await;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].0, id);
        assert_eq!(created[0].1.get(LABEL_MANAGED_BY).unwrap(), MANAGED_BY_LABEL);
        assert_eq!(created[0].1.get(LABEL_CRAWL_DOMAIN).unwrap(), "https://ex.com");
    }

    #[tokio::test]
    async fn crawl_domain_cleans_up_on_start_failure() {
        let container = Arc::new(FakeContainer { fail_start: true, ..Default::default() });
        let orch = orchestrator(container.clone(), WebProbeResult::default());
        let err = orch
            .crawl_domain("https://ex.com", "https://ex.com/docs/", "/docs/", "kbmcp-docs.ex_com-aaaa1111", &[])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ContainerStartFailed { .. }));
        assert_eq!(container.removed.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn remove_completed_crawls_only_removes_exited_jobs() {
        let containers = vec![
            ContainerInfo { id: "running-1".into(), labels: HashMap::new(), state: CrawlJobState::Running },
            ContainerInfo { id: "exited-1".into(), labels: HashMap::new(), state: CrawlJobState::Exited },
            ContainerInfo { id: "exited-2".into(), labels: HashMap::new(), state: CrawlJobState::Exited },
        ];
        let container = Arc::new(FakeContainer { containers, ..Default::default() });
        let orch = orchestrator(container.clone(), WebProbeResult::default());

        let (removed, total) = orch.remove_completed_crawls().await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(removed, 2);
        assert_eq!(container.removed.lock().await.len(), 2);
    }
}

//! Docker Engine-flavored `ContainerPort` adapter.
//!
//! Talks to the Engine API's HTTP surface directly over `reqwest` rather
//! than through a Unix socket: per the resolved Open Question in §6.3,
//! the daemon is assumed reachable at an `http://host:port` address (for
//! example via `socat` or a TCP-exposed `dockerd -H`), matching this
//! adapter's sibling `elasticsearch.rs` and `web_probe.rs`, which make the
//! same assumption about their own endpoints. No Unix-socket transport is
//! implemented.

use std::collections::HashMap;

use kbmcp_domain::entities::crawl_job::CrawlJobState;
use kbmcp_domain::error::{Error, Result};
use kbmcp_domain::value_objects::ContainerInfo;
use kbmcp_domain::ContainerPort;
use serde_json::{json, Value};

fn conn_err(err: reqwest::Error) -> Error {
    Error::backend_connection(err.to_string())
}

/// The Docker Engine-flavored container runtime adapter.
#[derive(Debug)]
pub struct DockerContainerRuntime {
    client: reqwest::Client,
    host: String,
}

impl DockerContainerRuntime {
    /// Build a new adapter against a TCP-reachable Engine API endpoint,
    /// e.g. `http://localhost:2375`.
    pub fn new(host: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::generic(format!("failed to build container runtime HTTP client: {e}")))?;
        Ok(Self { client, host: host.into().trim_end_matches('/').to_string() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.host, path.trim_start_matches('/'))
    }

    fn state_from(raw: &str) -> CrawlJobState {
        match raw {
            "running" | "restarting" => CrawlJobState::Running,
            "exited" | "dead" => CrawlJobState::Exited,
            _ => CrawlJobState::Other,
        }
    }

    /// Split Docker's multiplexed log stream into plain text. Each frame
    /// is an 8-byte header (stream type, 3 reserved bytes, big-endian
    /// u32 payload length) followed by the payload. Frames with a header
    /// that doesn't parse (a tty-attached container, whose logs are a
    /// raw byte stream with no framing) fall back to the original bytes
    /// decoded as UTF-8 lossily.
    fn demux_logs(bytes: &[u8]) -> String {
        let mut out = String::new();
        let mut cursor = 0usize;
        while cursor + 8 <= bytes.len() {
            let header = &bytes[cursor..cursor + 8];
            let stream_type = header[0];
            if stream_type > 2 {
                return String::from_utf8_lossy(bytes).into_owned();
            }
            let len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;
            let start = cursor + 8;
            let end = start + len;
            if end > bytes.len() {
                break;
            }
            out.push_str(&String::from_utf8_lossy(&bytes[start..end]));
            cursor = end;
        }
        if cursor == 0 && !bytes.is_empty() {
            return String::from_utf8_lossy(bytes).into_owned();
        }
        out
    }
}

#[async_trait::async_trait]
impl ContainerPort for DockerContainerRuntime {
    #[tracing::instrument(skip(self))]
    async fn pull(&self, image: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url("images/create"))
            .query(&[("fromImage", image)])
            .send()
            .await
            .map_err(conn_err)?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::container_start_failed(format!("image pull failed: {status} {body}")));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn create(
        &self,
        image: &str,
        command: &[String],
        labels: &HashMap<String, String>,
        autoremove: bool,
        memory_reservation_bytes: u64,
    ) -> Result<String> {
        let body = json!({
            "Image": image,
            "Cmd": command,
            "Labels": labels,
            "HostConfig": {
                "AutoRemove": autoremove,
                "MemoryReservation": memory_reservation_bytes,
            },
        });

        let response = self
            .client
            .post(self.url("containers/create"))
            .json(&body)
            .send()
            .await
            .map_err(conn_err)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::container_start_failed(format!("container create failed: {status} {body}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::container_start_failed(format!("malformed create response: {e}")))?;
        body.get("Id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::container_start_failed("create response missing container id"))
    }

    #[tracing::instrument(skip(self))]
    async fn put_archive(&self, container_id: &str, path: &str, tar_bytes: Vec<u8>) -> Result<()> {
        let response = self
            .client
            .put(self.url(&format!("containers/{container_id}/archive")))
            .query(&[("path", path)])
            .header("Content-Type", "application/x-tar")
            .body(tar_bytes)
            .send()
            .await
            .map_err(conn_err)?;

        if response.status().as_u16() == 404 {
            return Err(Error::container_not_found(container_id));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::container_start_failed(format!("archive injection failed: {status} {body}")));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn start(&self, container_id: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url(&format!("containers/{container_id}/start")))
            .send()
            .await
            .map_err(conn_err)?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(Error::container_not_found(container_id));
        }
        // 304 Not Modified: the container was already started. Treated as success.
        if !status.is_success() && status.as_u16() != 304 {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::container_start_failed(format!("container start failed: {status} {body}")));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list(&self, filters: &HashMap<String, String>) -> Result<Vec<ContainerInfo>> {
        let label_filters: Vec<String> = filters
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        let filters_json = json!({ "label": label_filters }).to_string();

        let response = self
            .client
            .get(self.url("containers/json"))
            .query(&[("all", "true"), ("filters", filters_json.as_str())])
            .send()
            .await
            .map_err(conn_err)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::retrieval(format!("container list failed: {status} {body}")));
        }

        let body: Vec<Value> = response
            .json()
            .await
            .map_err(|e| Error::retrieval(format!("malformed container list response: {e}")))?;

        Ok(body
            .iter()
            .filter_map(|entry| {
                let id = entry.get("Id").and_then(Value::as_str)?.to_string();
                let raw_state = entry.get("State").and_then(Value::as_str).unwrap_or_default();
                let labels: HashMap<String, String> = entry
                    .get("Labels")
                    .and_then(Value::as_object)
                    .map(|obj| {
                        obj.iter()
                            .filter_map(|(k, v)| Some((k.clone(), v.as_str()?.to_string())))
                            .collect()
                    })
                    .unwrap_or_default();
                Some(ContainerInfo { id, labels, state: Self::state_from(raw_state) })
            })
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn logs(&self, container_id: &str) -> Result<String> {
        let response = self
            .client
            .get(self.url(&format!("containers/{container_id}/logs")))
            .query(&[("stdout", "true"), ("stderr", "true"), ("timestamps", "false")])
            .send()
            .await
            .map_err(conn_err)?;

        if response.status().as_u16() == 404 {
            return Err(Error::container_not_found(container_id));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::retrieval(format!("container logs failed: {status} {body}")));
        }

        let bytes = response.bytes().await.map_err(conn_err)?;
        Ok(Self::demux_logs(&bytes))
    }

    #[tracing::instrument(skip(self))]
    async fn remove(&self, container_id: &str, force: bool) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("containers/{container_id}")))
            .query(&[("force", force.to_string().as_str())])
            .send()
            .await
            .map_err(conn_err)?;

        if response.status().as_u16() == 404 {
            return Err(Error::container_not_found(container_id));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::deletion(format!("container remove failed: {status} {body}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_from_maps_docker_states_to_crawl_job_states() {
        assert_eq!(DockerContainerRuntime::state_from("running"), CrawlJobState::Running);
        assert_eq!(DockerContainerRuntime::state_from("exited"), CrawlJobState::Exited);
        assert_eq!(DockerContainerRuntime::state_from("paused"), CrawlJobState::Other);
    }

    #[test]
    fn demux_logs_strips_stream_headers() {
        let mut bytes = Vec::new();
        let payload = b"hello\n";
        bytes.push(1u8);
        bytes.extend_from_slice(&[0, 0, 0]);
        bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        bytes.extend_from_slice(payload);

        assert_eq!(DockerContainerRuntime::demux_logs(&bytes), "hello\n");
    }

    #[test]
    fn demux_logs_falls_back_to_raw_text_for_unframed_input() {
        let bytes = b"plain tty output".to_vec();
        assert_eq!(DockerContainerRuntime::demux_logs(&bytes), "plain tty output");
    }
}

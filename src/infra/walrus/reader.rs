use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::uploader::{transport_failure, truncate_body};
use crate::error::{EndpointFailure, FailureReason, Phase, RegistryError};
use crate::infra::config::StorageConfig;

/// Reads blobs back from aggregators.
pub struct BlobReader {
    client: reqwest::Client,
    aggregators: Vec<String>,
    read_path: String,
    attempt_timeout: Duration,
}

impl BlobReader {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            aggregators: config.aggregators.clone(),
            read_path: config.read_path.clone(),
            attempt_timeout: config.attempt_timeout,
        }
    }

    fn url_on(&self, aggregator: &str, blob_id: &str) -> String {
        format!(
            "{}{}/{}",
            aggregator.trim_end_matches('/'),
            self.read_path,
            blob_id
        )
    }

    /// Public URL of a blob on the preferred aggregator.
    pub fn blob_url(&self, blob_id: &str) -> Result<String, RegistryError> {
        if blob_id.trim().is_empty() {
            return Err(RegistryError::invalid(Phase::Read, "blob id is empty"));
        }
        let aggregator = self
            .aggregators
            .first()
            .ok_or_else(|| RegistryError::invalid(Phase::Read, "no aggregators configured"))?;
        Ok(self.url_on(aggregator, blob_id))
    }

    /// Fetches a blob's bytes. `Ok(None)` when aggregators answer 404 and none has it.
    pub async fn fetch(&self, blob_id: &str) -> Result<Option<Vec<u8>>, RegistryError> {
        if blob_id.trim().is_empty() {
            return Err(RegistryError::invalid(Phase::Read, "blob id is empty"));
        }

        let mut failures = Vec::new();
        let mut saw_not_found = false;

        for aggregator in &self.aggregators {
            let url = self.url_on(aggregator, blob_id);
            info!("Reading blob {} from {}", blob_id, aggregator);
            let start = Instant::now();

            let response = match self
                .client
                .get(&url)
                .timeout(self.attempt_timeout)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    let reason = transport_failure(e);
                    warn!("Aggregator {} failed: {}", aggregator, reason);
                    failures.push(EndpointFailure {
                        endpoint: aggregator.clone(),
                        reason,
                    });
                    continue;
                }
            };

            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                info!("Aggregator {} does not know blob {}", aggregator, blob_id);
                saw_not_found = true;
                continue;
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                failures.push(EndpointFailure {
                    endpoint: aggregator.clone(),
                    reason: FailureReason::Status {
                        code: status.as_u16(),
                        body: truncate_body(&body),
                    },
                });
                continue;
            }

            match response.bytes().await {
                Ok(bytes) => {
                    info!("Read {} bytes in {:?}", bytes.len(), start.elapsed());
                    return Ok(Some(bytes.to_vec()));
                }
                Err(e) => failures.push(EndpointFailure {
                    endpoint: aggregator.clone(),
                    reason: transport_failure(e),
                }),
            }
        }

        if saw_not_found {
            Ok(None)
        } else {
            Err(RegistryError::AllEndpointsFailed {
                phase: Phase::Read,
                failures,
            })
        }
    }
}

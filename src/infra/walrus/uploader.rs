//! Ordered, first-success-wins upload across independent publishers.

use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::response::StoreResponse;
use crate::domain::model::BlobReference;
use crate::error::{EndpointFailure, FailureReason, Phase, RegistryError};
use crate::infra::cancel::CancelSignal;
use crate::infra::config::StorageConfig;

/// Longest slice of an error body kept in a failure record.
const MAX_BODY_IN_FAILURE: usize = 512;

pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_BODY_IN_FAILURE {
        return body.to_string();
    }
    let mut end = MAX_BODY_IN_FAILURE;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

pub struct BlobUploader {
    client: reqwest::Client,
    attempt_timeout: Duration,
    store_path: String,
}

impl BlobUploader {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            attempt_timeout: config.attempt_timeout,
            store_path: config.store_path.clone(),
        }
    }

    /// Tries each endpoint once, in order, and returns the first success.
    ///
    /// Every failure is recorded and the next endpoint tried; the list is returned
    /// verbatim if none succeeds. Cancellation aborts the in-flight attempt and skips
    /// the rest.
    pub async fn upload(
        &self,
        payload: &[u8],
        endpoints: &[String],
        epochs: u32,
        cancel: &CancelSignal,
    ) -> Result<BlobReference, RegistryError> {
        if payload.is_empty() {
            return Err(RegistryError::invalid(
                Phase::Upload,
                "refusing to upload an empty payload",
            ));
        }

        let mut failures = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            info!("Uploading {} bytes to publisher {}", payload.len(), endpoint);
            let start = Instant::now();

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!("Upload cancelled while trying {}", endpoint);
                    return Err(RegistryError::Cancelled { phase: Phase::Upload });
                }
                outcome = self.attempt(endpoint, payload, epochs) => outcome,
            };

            match outcome {
                Ok(response) => {
                    info!(
                        "Stored blob {} via {} in {:?} (already existed: {})",
                        response.blob_id(),
                        endpoint,
                        start.elapsed(),
                        response.already_existed()
                    );
                    return Ok(BlobReference::stored(
                        response.blob_id().to_string(),
                        endpoint.clone(),
                        response.already_existed(),
                    ));
                }
                Err(reason) => {
                    warn!("Publisher {} failed after {:?}: {}", endpoint, start.elapsed(), reason);
                    failures.push(EndpointFailure {
                        endpoint: endpoint.clone(),
                        reason,
                    });
                }
            }
        }

        Err(RegistryError::AllEndpointsFailed {
            phase: Phase::Upload,
            failures,
        })
    }

    /// Serializes `value` as JSON and uploads it.
    pub async fn upload_json<T: Serialize>(
        &self,
        value: &T,
        endpoints: &[String],
        epochs: u32,
        cancel: &CancelSignal,
    ) -> Result<BlobReference, RegistryError> {
        let payload = serde_json::to_vec(value)
            .map_err(|e| {
            RegistryError::invalid(Phase::Upload, format!("value is not serializable: {}", e))
        })?;
        self.upload(&payload, endpoints, epochs, cancel).await
    }

    async fn attempt(
        &self,
        endpoint: &str,
        payload: &[u8],
        epochs: u32,
    ) -> Result<StoreResponse, FailureReason> {
        let url = format!(
            "{}{}?epochs={}",
            endpoint.trim_end_matches('/'),
            self.store_path,
            epochs
        );

        let response = self
            .client
            .put(&url)
            .timeout(self.attempt_timeout)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(payload.to_vec())
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_failure)?;

        if !status.is_success() {
            return Err(FailureReason::Status {
                code: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        StoreResponse::parse(&body).ok_or_else(|| FailureReason::UnrecognizedResponse {
            body: truncate_body(&body),
        })
    }
}

pub(crate) fn transport_failure(e: reqwest::Error) -> FailureReason {
    if e.is_timeout() {
        FailureReason::Timeout
    } else {
        FailureReason::Transport {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_bodies_are_truncated_on_char_boundaries() {
        let body = "é".repeat(400);
        let t = truncate_body(&body);
        assert!(t.ends_with("..."));
        assert!(t.len() <= MAX_BODY_IN_FAILURE + 3);
        assert_eq!(truncate_body("short"), "short");
    }
}

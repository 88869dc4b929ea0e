// HTTP adapter for CometBFT RPC + Cosmos SDK REST
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use super::wire::{BlockResult, RpcEnvelope, StatusResult, ValidatorsResponse};
use super::ChainReader;
use crate::config::{ChainConfig, HttpConfig};
use crate::error::UptimeError;
use crate::types::{BlockSignature, ValidatorInfo};

const VALIDATORS_PATH: &str = "/cosmos/staking/v1beta1/validators";
const PAGE_LIMIT: &str = "200";

pub struct ChainClient {
    rpc_url: String,
    api_url: String,
    bond_status: String,
    client: Client,
    max_retries: u32,
    retry_backoff: Duration,
}

impl ChainClient {
    pub fn new(chain: &ChainConfig, http: &HttpConfig) -> Result<Self, UptimeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .build()
            .map_err(|e| UptimeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            rpc_url: chain.rpc_url.trim_end_matches('/').to_string(),
            api_url: chain.api_url.trim_end_matches('/').to_string(),
            bond_status: chain.bond_status.clone(),
            client,
            max_retries: http.max_retries,
            retry_backoff: Duration::from_millis(http.retry_backoff_ms),
        })
    }

    /// Run `op`, retrying transport failures with linear backoff.
    async fn with_retry<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, UptimeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, UptimeError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!("{} failed (attempt {}/{}): {}", what, attempt, self.max_retries + 1, e);
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                }
                other => return other,
            }
        }
    }

    /// GET a CometBFT RPC route and unwrap its JSON-RPC envelope.
    /// `height` lets pruned-height errors map to `NotFound`.
    async fn get_rpc<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        height: Option<u64>,
    ) -> Result<T, UptimeError> {
        let url = format!("{}{}", self.rpc_url, path);
        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;
        decode_rpc(&url, status, &body, height)
    }

    async fn get_validator_page(&self, page_key: Option<&str>) -> Result<ValidatorsResponse, UptimeError> {
        let url = format!("{}{}", self.api_url, VALIDATORS_PATH);
        let mut query = vec![
            ("status", self.bond_status.clone()),
            ("pagination.limit", PAGE_LIMIT.to_string()),
        ];
        if let Some(key) = page_key {
            query.push(("pagination.key", key.to_string()));
        }

        let response = self.client.get(&url).query(&query).send().await?;
        if !response.status().is_success() {
            return Err(UptimeError::Unavailable(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Unwrap a JSON-RPC response. CometBFT reports RPC errors with a 500, so the
/// body is inspected before the status code.
fn decode_rpc<T: DeserializeOwned>(
    url: &str,
    status: StatusCode,
    body: &str,
    height: Option<u64>,
) -> Result<T, UptimeError> {
    match serde_json::from_str::<RpcEnvelope<T>>(body) {
        Ok(envelope) => {
            if let Some(error) = envelope.error {
                return Err(error.into_error(height));
            }
            if !status.is_success() {
                return Err(UptimeError::Unavailable(format!("{} returned {}", url, status)));
            }
            envelope
                .result
                .ok_or_else(|| UptimeError::Decode(format!("{}: missing 'result'", url)))
        }
        Err(_) if !status.is_success() => {
            Err(UptimeError::Unavailable(format!("{} returned {}", url, status)))
        }
        Err(e) => Err(UptimeError::Decode(format!("{}: {}", url, e))),
    }
}

#[async_trait]
impl ChainReader for ChainClient {
    async fn current_height(&self) -> Result<u64, UptimeError> {
        let status: StatusResult = self
            .with_retry("status", || self.get_rpc("/status", &[], None))
            .await?;
        status.latest_height()
    }

    async fn bonded_validators(&self) -> Result<Vec<ValidatorInfo>, UptimeError> {
        let mut validators = Vec::new();
        let mut page_key: Option<String> = None;
        let mut seen_keys = HashSet::new();

        loop {
            let page = self
                .with_retry("validators", || self.get_validator_page(page_key.as_deref()))
                .await?;
            let next_key = page.next_key();
            for raw in page.validators {
                validators.push(raw.into_validator()?);
            }
            debug!("Fetched {} validators so far", validators.len());

            match next_key {
                Some(key) if !seen_keys.insert(key.clone()) => {
                    warn!("Validators endpoint repeated pagination key {}, stopping", key);
                    break;
                }
                Some(key) => page_key = Some(key),
                None => break,
            }
        }

        Ok(validators)
    }

    async fn commit_signatures(&self, height: u64) -> Result<Vec<BlockSignature>, UptimeError> {
        let query = [("height", height.to_string())];
        let block: BlockResult = self
            .with_retry("block", || self.get_rpc("/block", &query, Some(height)))
            .await?;
        block.into_signatures()
    }
}

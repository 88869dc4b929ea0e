// Wire shapes of the CometBFT RPC and Cosmos SDK REST responses we consume
use serde::Deserialize;

use crate::crypto::decode_pubkey;
use crate::error::UptimeError;
use crate::types::{BlockIdFlag, BlockSignature, ValidatorInfo};

/// JSON-RPC 2.0 envelope returned by every CometBFT RPC route.
#[derive(Debug, Deserialize)]
pub struct RpcEnvelope<T> {
    pub result: Option<T>,
    pub error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorBody {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<String>,
}

impl RpcErrorBody {
    /// Pruned or future heights come back as an internal error whose `data` names the height.
    pub fn into_error(self, height: Option<u64>) -> UptimeError {
        let detail = self.data.unwrap_or_default();
        if let Some(h) = height {
            let lower = detail.to_lowercase();
            let height_unavailable = lower.contains("height")
                && (lower.contains("not available")
                    || lower.contains("lowest height")
                    || lower.contains("must be less than or equal"));
            if height_unavailable {
                return UptimeError::NotFound(h);
            }
        }
        UptimeError::Unavailable(format!("RPC error {}: {} {}", self.code, self.message, detail))
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusResult {
    pub sync_info: SyncInfo,
}

#[derive(Debug, Deserialize)]
pub struct SyncInfo {
    pub latest_block_height: String,
}

impl StatusResult {
    pub fn latest_height(&self) -> Result<u64, UptimeError> {
        parse_u64(&self.sync_info.latest_block_height, "latest_block_height")
    }
}

#[derive(Debug, Deserialize)]
pub struct BlockResult {
    pub block: Block,
}

#[derive(Debug, Deserialize)]
pub struct Block {
    pub last_commit: Option<LastCommit>,
}

#[derive(Debug, Deserialize)]
pub struct LastCommit {
    #[serde(default)]
    pub signatures: Vec<RawSignature>,
}

#[derive(Debug, Deserialize)]
pub struct RawSignature {
    #[serde(default)]
    pub validator_address: Option<String>,
    pub block_id_flag: RawFlag,
}

/// CometBFT serves the integer code; gRPC-gateway proxies serve the enum name.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawFlag {
    Code(u64),
    Name(String),
}

impl RawFlag {
    fn decode(&self) -> Result<BlockIdFlag, UptimeError> {
        let flag = match self {
            RawFlag::Code(code) => BlockIdFlag::from_code(*code),
            RawFlag::Name(name) => BlockIdFlag::from_name(name)
                .or_else(|| name.parse::<u64>().ok().and_then(BlockIdFlag::from_code)),
        };
        flag.ok_or_else(|| UptimeError::Decode(format!("Unknown block_id_flag: {:?}", self)))
    }
}

impl BlockResult {
    pub fn into_signatures(self) -> Result<Vec<BlockSignature>, UptimeError> {
        let Some(commit) = self.block.last_commit else {
            return Ok(Vec::new());
        };
        commit
            .signatures
            .into_iter()
            .map(|sig| {
                Ok(BlockSignature {
                    signer_address: sig.validator_address.unwrap_or_default().to_uppercase(),
                    flag: sig.block_id_flag.decode()?,
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct ValidatorsResponse {
    pub validators: Vec<RawValidator>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub next_key: Option<String>,
}

impl ValidatorsResponse {
    pub fn next_key(&self) -> Option<String> {
        self.pagination
            .as_ref()
            .and_then(|p| p.next_key.clone())
            .filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct RawValidator {
    #[serde(default)]
    pub operator_address: String,
    pub description: Description,
    pub consensus_pubkey: RawPubKey,
    pub tokens: String,
}

#[derive(Debug, Deserialize)]
pub struct Description {
    #[serde(default)]
    pub moniker: String,
}

#[derive(Debug, Deserialize)]
pub struct RawPubKey {
    #[serde(rename = "@type", default)]
    pub type_url: String,
    pub key: String,
}

impl RawValidator {
    /// The consensus address is left unset; it is always derived, never taken from the wire.
    pub fn into_validator(self) -> Result<ValidatorInfo, UptimeError> {
        let consensus_pubkey = decode_pubkey(&self.consensus_pubkey.key).map_err(|e| {
            UptimeError::Decode(format!("validator {}: {}", self.operator_address, e))
        })?;
        let stake_weight = self.tokens.trim().parse::<u128>().map_err(|e| {
            UptimeError::Decode(format!("tokens '{}' is not an integer: {}", self.tokens, e))
        })?;
        Ok(ValidatorInfo {
            moniker: self.description.moniker,
            operator_address: self.operator_address,
            key_type: self.consensus_pubkey.type_url,
            consensus_pubkey,
            consensus_address: None,
            stake_weight,
        })
    }
}

fn parse_u64(raw: &str, field: &str) -> Result<u64, UptimeError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| UptimeError::Decode(format!("{} '{}' is not an integer: {}", field, raw, e)))
}

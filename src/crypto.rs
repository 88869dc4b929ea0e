use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::error::UptimeError;

/// Length of a consensus address in bytes (first 160 bits of the key digest).
pub const ADDRESS_LEN: usize = 20;

/// Uppercase hex consensus address, as it appears in block commit signatures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConsensusAddress(String);

impl ConsensusAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConsensusAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ConsensusAddress {
    type Err = UptimeError;

    /// Accepts either case; stores the canonical uppercase form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)
            .map_err(|e| UptimeError::Decode(format!("Invalid consensus address '{}': {}", s, e)))?;
        if bytes.len() != ADDRESS_LEN {
            return Err(UptimeError::Decode(format!(
                "Consensus address must be {} bytes, got {}",
                ADDRESS_LEN,
                bytes.len()
            )));
        }
        Ok(ConsensusAddress(hex::encode_upper(bytes)))
    }
}

impl TryFrom<String> for ConsensusAddress {
    type Error = UptimeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ConsensusAddress> for String {
    fn from(addr: ConsensusAddress) -> Self {
        addr.0
    }
}

/// Derive the consensus address of a raw consensus public key:
/// SHA-256 of the key bytes, truncated to 20 bytes, uppercase hex.
pub fn consensus_address(pubkey: &[u8]) -> ConsensusAddress {
    let digest = Sha256::digest(pubkey);
    ConsensusAddress(hex::encode_upper(&digest[..ADDRESS_LEN]))
}

/// Decode a base64 public key (as served by the staking API) and derive its address.
pub fn consensus_address_from_base64(key_b64: &str) -> Result<ConsensusAddress, UptimeError> {
    let bytes = decode_pubkey(key_b64)?;
    Ok(consensus_address(&bytes))
}

pub fn decode_pubkey(key_b64: &str) -> Result<Vec<u8>, UptimeError> {
    let bytes = BASE64
        .decode(key_b64.trim())
        .map_err(|e| UptimeError::Decode(format!("Invalid base64 public key: {}", e)))?;
    if bytes.is_empty() {
        return Err(UptimeError::Decode("Empty public key".to_string()));
    }
    Ok(bytes)
}

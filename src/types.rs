use serde::{Deserialize, Serialize};

use crate::crypto::{consensus_address, ConsensusAddress};

/// A bonded validator as reported by the staking API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorInfo {
    pub moniker: String,
    pub operator_address: String,
    /// Proto type URL of the consensus key, e.g. `/cosmos.crypto.ed25519.PubKey`
    pub key_type: String,
    #[serde(skip)]
    pub consensus_pubkey: Vec<u8>,
    /// Filled in by [`ValidatorInfo::with_consensus_address`], never read from the API.
    pub consensus_address: Option<ConsensusAddress>,
    pub stake_weight: u128,
}

impl ValidatorInfo {
    pub fn with_consensus_address(mut self) -> Self {
        self.consensus_address = Some(consensus_address(&self.consensus_pubkey));
        self
    }

    pub fn address(&self) -> ConsensusAddress {
        match &self.consensus_address {
            Some(addr) => addr.clone(),
            None => consensus_address(&self.consensus_pubkey),
        }
    }

    /// Moniker, or the consensus address when the validator never set one.
    pub fn display_name(&self) -> String {
        if self.moniker.trim().is_empty() {
            self.address().to_string()
        } else {
            self.moniker.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockIdFlag {
    Absent,
    Commit,
    Nil,
}

impl BlockIdFlag {
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            1 => Some(BlockIdFlag::Absent),
            2 => Some(BlockIdFlag::Commit),
            3 => Some(BlockIdFlag::Nil),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "BLOCK_ID_FLAG_ABSENT" => Some(BlockIdFlag::Absent),
            "BLOCK_ID_FLAG_COMMIT" => Some(BlockIdFlag::Commit),
            "BLOCK_ID_FLAG_NIL" => Some(BlockIdFlag::Nil),
            _ => None,
        }
    }
}

/// One entry of a block's last-commit signature set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSignature {
    /// Uppercase hex; empty for absent votes.
    pub signer_address: String,
    pub flag: BlockIdFlag,
}

impl BlockSignature {
    /// The signer's address when this entry counts as a signed block.
    pub fn committed_signer(&self) -> Option<&str> {
        (self.flag == BlockIdFlag::Commit).then_some(self.signer_address.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightStatus {
    pub height: u64,
    pub signed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UptimeRecord {
    pub moniker: String,
    pub consensus_address: ConsensusAddress,
    pub stake_weight: u128,
    /// Oldest height first.
    pub statuses: Vec<HeightStatus>,
    pub percentage: f64,
}

impl UptimeRecord {
    pub fn signed_count(&self) -> usize {
        self.statuses.iter().filter(|s| s.signed).count()
    }

    pub fn missed_count(&self) -> usize {
        self.statuses.len() - self.signed_count()
    }
}

/// Immutable result of one analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UptimeReport {
    pub latest_height: u64,
    pub window_size: u64,
    /// Heights that contributed to every record, ascending.
    pub heights: Vec<u64>,
    /// Heights whose signature set could not be fetched; excluded from all records.
    pub skipped_heights: Vec<u64>,
    pub records: Vec<UptimeRecord>,
    pub generated_at_ms: i64,
}

impl UptimeReport {
    pub fn is_complete(&self) -> bool {
        self.skipped_heights.is_empty()
    }
}

/// `value` rounded to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

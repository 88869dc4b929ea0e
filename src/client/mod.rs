// Client module
pub mod chain_client;
pub mod wire;

pub use chain_client::ChainClient;

use async_trait::async_trait;

use crate::error::UptimeError;
use crate::types::{BlockSignature, ValidatorInfo};

/// Read access to chain state needed for one analysis pass.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Latest finalized height known to the node.
    async fn current_height(&self) -> Result<u64, UptimeError>;

    /// Currently bonded validators with stake populated, in source order.
    /// Consensus addresses are not populated.
    async fn bonded_validators(&self) -> Result<Vec<ValidatorInfo>, UptimeError>;

    /// Last-commit signatures recorded in the block at `height`.
    async fn commit_signatures(&self, height: u64) -> Result<Vec<BlockSignature>, UptimeError>;
}

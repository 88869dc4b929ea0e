use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::client::ChainReader;
use crate::error::UptimeError;
use crate::types::BlockSignature;

/// Heights of the trailing window ending at `latest_height`, oldest first.
/// Heights below 1 do not exist and are left out.
pub fn window_heights(latest_height: u64, window_size: u64) -> Vec<u64> {
    if latest_height == 0 || window_size == 0 {
        return Vec::new();
    }
    let oldest = latest_height.saturating_sub(window_size - 1).max(1);
    (oldest..=latest_height).collect()
}

/// Signature sets of every height in one window, fetched once per pass and
/// shared by all validators.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureWindow {
    pub latest_height: u64,
    pub window_size: u64,
    sets: BTreeMap<u64, Vec<BlockSignature>>,
    skipped: Vec<u64>,
}

impl SignatureWindow {
    /// Assemble a window from per-height outcomes in any order. Heights whose
    /// fetch failed are recorded as skipped.
    pub fn from_results<I>(latest_height: u64, window_size: u64, results: I) -> Self
    where
        I: IntoIterator<Item = (u64, Result<Vec<BlockSignature>, UptimeError>)>,
    {
        let mut sets = BTreeMap::new();
        let mut skipped = Vec::new();
        for (height, result) in results {
            match result {
                Ok(signatures) => {
                    sets.insert(height, signatures);
                }
                Err(e) => {
                    warn!("Skipping height {}: {}", height, e);
                    skipped.push(height);
                }
            }
        }
        skipped.sort_unstable();

        Self {
            latest_height,
            window_size,
            sets,
            skipped,
        }
    }

    /// Fetch every height of the window, at most `max_concurrent` requests in flight.
    pub async fn fetch(
        reader: Arc<dyn ChainReader>,
        latest_height: u64,
        window_size: u64,
        max_concurrent: usize,
    ) -> Result<Self, UptimeError> {
        let heights = window_heights(latest_height, window_size);
        let permits = Arc::new(Semaphore::new(max_concurrent.max(1)));
        let mut tasks = JoinSet::new();

        for height in heights.iter().copied() {
            let reader = Arc::clone(&reader);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = match permits.acquire_owned().await {
                    Ok(p) => p,
                    Err(e) => return (height, Err(UptimeError::Unavailable(e.to_string()))),
                };
                let result = reader.commit_signatures(height).await;
                debug!("Fetched signatures for height {}", height);
                (height, result)
            });
        }

        let mut results = Vec::with_capacity(heights.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => results.push(outcome),
                Err(e) => {
                    return Err(UptimeError::Aborted(format!("signature fetch task failed: {}", e)))
                }
            }
        }

        let window = Self::from_results(latest_height, window_size, results);
        if !heights.is_empty() && window.sets.is_empty() {
            return Err(UptimeError::Aborted(format!(
                "no signature set available in window {}..={}",
                heights[0], latest_height
            )));
        }
        Ok(window)
    }

    /// Successfully fetched heights, ascending.
    pub fn heights(&self) -> Vec<u64> {
        self.sets.keys().copied().collect()
    }

    pub fn skipped_heights(&self) -> &[u64] {
        &self.skipped
    }

    pub fn signatures_at(&self, height: u64) -> Option<&[BlockSignature]> {
        self.sets.get(&height).map(|s| s.as_slice())
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (u64, &[BlockSignature])> + '_ {
        self.sets.iter().map(|(h, s)| (*h, s.as_slice()))
    }
}

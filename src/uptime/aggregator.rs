use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use super::window::SignatureWindow;
use crate::client::ChainReader;
use crate::error::UptimeError;
use crate::types::{round2, BlockSignature, HeightStatus, UptimeRecord, UptimeReport, ValidatorInfo};

/// Folds a signature window into per-validator uptime, ranked by stake.
#[derive(Debug, Clone)]
pub struct UptimeAggregator {
    pub window_size: u64,
    pub max_concurrent_fetches: usize,
}

impl UptimeAggregator {
    pub fn new(window_size: u64, max_concurrent_fetches: usize) -> Self {
        Self {
            window_size,
            max_concurrent_fetches,
        }
    }

    /// Fetch the window ending at `latest_height` and score every validator against it.
    pub async fn analyze(
        &self,
        validators: &[ValidatorInfo],
        latest_height: u64,
        reader: Arc<dyn ChainReader>,
    ) -> Result<UptimeReport, UptimeError> {
        if validators.is_empty() {
            info!("No bonded validators at height {}", latest_height);
            return Ok(UptimeReport {
                latest_height,
                window_size: self.window_size,
                heights: Vec::new(),
                skipped_heights: Vec::new(),
                records: Vec::new(),
                generated_at_ms: chrono::Utc::now().timestamp_millis(),
            });
        }

        let window = SignatureWindow::fetch(
            reader,
            latest_height,
            self.window_size,
            self.max_concurrent_fetches,
        )
        .await?;

        Ok(UptimeReport {
            latest_height,
            window_size: self.window_size,
            heights: window.heights(),
            skipped_heights: window.skipped_heights().to_vec(),
            records: rank_by_stake(score_validators(validators, &window)),
            generated_at_ms: chrono::Utc::now().timestamp_millis(),
        })
    }
}

/// Classify every validator at every fetched height. Skipped heights are left
/// out of both the statuses and the denominator, for all validators alike.
pub fn score_validators(validators: &[ValidatorInfo], window: &SignatureWindow) -> Vec<UptimeRecord> {
    // Committed signers per height, newest first
    let committed: Vec<(u64, HashSet<&str>)> = window
        .iter()
        .rev()
        .map(|(height, signatures)| {
            let signers = signatures.iter().filter_map(BlockSignature::committed_signer).collect();
            (height, signers)
        })
        .collect();

    validators
        .iter()
        .map(|validator| {
            let address = validator.address();
            let mut statuses: Vec<HeightStatus> = committed
                .iter()
                .map(|(height, signers)| HeightStatus {
                    height: *height,
                    signed: signers.contains(address.as_str()),
                })
                .collect();
            statuses.reverse();

            let signed = statuses.iter().filter(|s| s.signed).count();
            let percentage = if statuses.is_empty() {
                0.0
            } else {
                round2(signed as f64 / statuses.len() as f64 * 100.0)
            };

            UptimeRecord {
                moniker: validator.display_name(),
                consensus_address: address,
                stake_weight: validator.stake_weight,
                statuses,
                percentage,
            }
        })
        .collect()
}

/// Stake descending; ties keep their fetch order.
pub fn rank_by_stake(mut records: Vec<UptimeRecord>) -> Vec<UptimeRecord> {
    records.sort_by(|a, b| b.stake_weight.cmp(&a.stake_weight));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::consensus_address;
    use crate::types::BlockIdFlag;
    use crate::uptime::window_heights;
    use async_trait::async_trait;
    use std::collections::HashMap;

    fn validator(seed: u8, moniker: &str, stake: u128) -> ValidatorInfo {
        ValidatorInfo {
            moniker: moniker.to_string(),
            operator_address: format!("valoper{}", seed),
            key_type: "/cosmos.crypto.ed25519.PubKey".to_string(),
            consensus_pubkey: vec![seed; 32],
            consensus_address: None,
            stake_weight: stake,
        }
        .with_consensus_address()
    }

    fn commit(v: &ValidatorInfo) -> BlockSignature {
        BlockSignature {
            signer_address: v.address().to_string(),
            flag: BlockIdFlag::Commit,
        }
    }

    /// In-memory chain: signature sets by height; missing heights fail as pruned.
    struct MockChain {
        blocks: HashMap<u64, Vec<BlockSignature>>,
        unavailable: HashSet<u64>,
    }

    #[async_trait]
    impl ChainReader for MockChain {
        async fn current_height(&self) -> Result<u64, UptimeError> {
            Ok(self.blocks.keys().copied().max().unwrap_or(0))
        }

        async fn bonded_validators(&self) -> Result<Vec<ValidatorInfo>, UptimeError> {
            Ok(Vec::new())
        }

        async fn commit_signatures(&self, height: u64) -> Result<Vec<BlockSignature>, UptimeError> {
            if self.unavailable.contains(&height) {
                return Err(UptimeError::Unavailable("connection reset".to_string()));
            }
            self.blocks
                .get(&height)
                .cloned()
                .ok_or(UptimeError::NotFound(height))
        }
    }

    fn chain(latest: u64, window: u64) -> MockChain {
        MockChain {
            blocks: window_heights(latest, window)
                .into_iter()
                .map(|h| (h, Vec::new()))
                .collect(),
            unavailable: HashSet::new(),
        }
    }

    #[tokio::test]
    async fn test_single_commit_in_window() {
        let v = validator(1, "alice", 100);
        let mut mock = chain(1000, 30);
        mock.blocks.insert(999, vec![commit(&v)]);

        let report = UptimeAggregator::new(30, 8)
            .analyze(&[v.clone()], 1000, Arc::new(mock))
            .await
            .unwrap();

        let record = &report.records[0];
        assert_eq!(record.statuses.len(), 30);
        assert_eq!(record.signed_count(), 1);
        assert_eq!(record.missed_count(), 29);
        assert!(record.statuses.iter().find(|s| s.signed).map(|s| s.height) == Some(999));
        assert_eq!(record.percentage, 3.33);
        assert_eq!(record.consensus_address, v.address());
    }

    #[tokio::test]
    async fn test_statuses_cover_window_ascending() {
        let v = validator(1, "alice", 1);
        let report = UptimeAggregator::new(30, 8)
            .analyze(&[v], 500, Arc::new(chain(500, 30)))
            .await
            .unwrap();
        let heights: Vec<u64> = report.records[0].statuses.iter().map(|s| s.height).collect();
        assert_eq!(heights, (471..=500).collect::<Vec<_>>());
        assert_eq!(report.heights, heights);
    }

    #[tokio::test]
    async fn test_empty_validator_set() {
        let report = UptimeAggregator::new(30, 8)
            .analyze(&[], 1000, Arc::new(chain(1000, 30)))
            .await
            .unwrap();
        assert!(report.records.is_empty());
        assert!(report.is_complete());
        assert!(report.heights.is_empty());
    }

    #[tokio::test]
    async fn test_failed_height_excluded_for_everyone() {
        let a = validator(1, "a", 10);
        let b = validator(2, "b", 20);
        let mut mock = chain(100, 10);
        for h in 91..=100 {
            mock.blocks.insert(h, vec![commit(&a), commit(&b)]);
        }
        mock.blocks.remove(&95);
        mock.unavailable.insert(97);

        let report = UptimeAggregator::new(10, 3)
            .analyze(&[a, b], 100, Arc::new(mock))
            .await
            .unwrap();

        assert_eq!(report.skipped_heights, vec![95, 97]);
        for record in &report.records {
            assert_eq!(record.statuses.len(), 8);
            assert!(record.statuses.iter().all(|s| s.height != 95 && s.height != 97));
            assert_eq!(record.percentage, 100.0);
        }
    }

    #[tokio::test]
    async fn test_nil_and_absent_are_missed() {
        let v = validator(1, "v", 1);
        let mut mock = chain(3, 3);
        mock.blocks.insert(
            1,
            vec![BlockSignature { signer_address: v.address().to_string(), flag: BlockIdFlag::Nil }],
        );
        mock.blocks.insert(
            2,
            vec![BlockSignature { signer_address: String::new(), flag: BlockIdFlag::Absent }],
        );
        mock.blocks.insert(3, vec![commit(&v)]);

        let report = UptimeAggregator::new(3, 1)
            .analyze(&[v], 3, Arc::new(mock))
            .await
            .unwrap();
        let signed: Vec<bool> = report.records[0].statuses.iter().map(|s| s.signed).collect();
        assert_eq!(signed, vec![false, false, true]);
        assert_eq!(report.records[0].percentage, 33.33);
    }

    #[tokio::test]
    async fn test_rank_by_stake_is_stable_and_idempotent() {
        let validators = vec![
            validator(1, "small", 5),
            validator(2, "big", 50),
            validator(3, "tie-first", 20),
            validator(4, "tie-second", 20),
        ];
        let mut mock = chain(40, 30);
        for h in 11..=40 {
            let signers = validators.iter().filter(|v| h % (v.stake_weight as u64 % 7 + 2) == 0);
            mock.blocks.insert(h, signers.map(commit).collect());
        }
        let mock = Arc::new(mock);
        let aggregator = UptimeAggregator::new(30, 4);

        let first = aggregator.analyze(&validators, 40, mock.clone()).await.unwrap();
        let second = aggregator.analyze(&validators, 40, mock).await.unwrap();

        let order: Vec<&str> = first.records.iter().map(|r| r.moniker.as_str()).collect();
        assert_eq!(order, vec!["big", "tie-first", "tie-second", "small"]);
        assert!(first
            .records
            .windows(2)
            .all(|w| w[0].stake_weight >= w[1].stake_weight));
        assert_eq!(first.records, second.records);
        assert_eq!(
            serde_json::to_string(&first.records).unwrap(),
            serde_json::to_string(&second.records).unwrap()
        );
    }

    #[test]
    fn test_percentage_matches_signed_count() {
        let v = validator(9, "v", 1);
        let results = (1..=7u64).map(|h| {
            let sigs = if h % 3 == 0 { vec![commit(&v)] } else { Vec::new() };
            (h, Ok(sigs))
        });
        let window = SignatureWindow::from_results(7, 7, results);
        let records = score_validators(&[v], &window);
        let record = &records[0];
        assert_eq!(record.signed_count(), 2);
        assert_eq!(record.percentage, round2(2.0 / 7.0 * 100.0));
        assert!((0.0..=100.0).contains(&record.percentage));
    }

    #[test]
    fn test_unknown_validator_never_signs() {
        let v = validator(1, "v", 1);
        let stranger = consensus_address(b"someone else");
        let results = (1..=3u64).map(|h| {
            (
                h,
                Ok(vec![BlockSignature {
                    signer_address: stranger.to_string(),
                    flag: BlockIdFlag::Commit,
                }]),
            )
        });
        let window = SignatureWindow::from_results(3, 3, results);
        let records = score_validators(&[v], &window);
        assert_eq!(records[0].percentage, 0.0);
    }
}

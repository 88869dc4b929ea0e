use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

use crate::client::ChainReader;
use crate::config::UptimeConfig;
use crate::error::UptimeError;
use crate::types::{UptimeReport, ValidatorInfo};
use crate::uptime::UptimeAggregator;

/// Latest successful report, if any pass has completed yet.
pub type ReportSnapshot = Option<Arc<UptimeReport>>;

pub struct UptimeMonitor {
    reader: Arc<dyn ChainReader>,
    aggregator: UptimeAggregator,
    refresh_interval: Duration,
    report_tx: watch::Sender<ReportSnapshot>,
}

impl UptimeMonitor {
    pub fn new(reader: Arc<dyn ChainReader>, config: &UptimeConfig) -> Self {
        let (report_tx, _) = watch::channel(None);
        Self {
            reader,
            aggregator: UptimeAggregator::new(
                config.uptime.window_size,
                config.uptime.max_concurrent_fetches,
            ),
            refresh_interval: Duration::from_secs(config.uptime.refresh_interval_secs.max(1)),
            report_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ReportSnapshot> {
        self.report_tx.subscribe()
    }

    pub fn latest(&self) -> ReportSnapshot {
        self.report_tx.borrow().clone()
    }

    /// One full analysis pass. Failing to read the height or the bonded set
    /// aborts the pass; nothing is published here.
    pub async fn run_pass(&self) -> Result<UptimeReport, UptimeError> {
        let started = Instant::now();
        let latest_height = self.reader.current_height().await?;
        let validators: Vec<ValidatorInfo> = self
            .reader
            .bonded_validators()
            .await?
            .into_iter()
            .map(ValidatorInfo::with_consensus_address)
            .collect();

        info!(
            "Analyzing {} validators over {} blocks ending at {}",
            validators.len(),
            self.aggregator.window_size,
            latest_height
        );

        let report = self
            .aggregator
            .analyze(&validators, latest_height, Arc::clone(&self.reader))
            .await?;

        info!(
            "Pass complete at height {} in {:?} ({} skipped heights)",
            latest_height,
            started.elapsed(),
            report.skipped_heights.len()
        );
        Ok(report)
    }

    /// Run a pass and publish it. On failure the previous report stays current.
    pub async fn refresh(&self) -> Result<Arc<UptimeReport>, UptimeError> {
        let report = Arc::new(self.run_pass().await?);
        self.report_tx.send_replace(Some(Arc::clone(&report)));
        Ok(report)
    }

    pub async fn run(&self, mut stop_rx: mpsc::Receiver<()>) {
        info!("🚀 Uptime Monitor Starting (every {:?})", self.refresh_interval);
        let mut ticker = interval(self.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.refresh().await {
                        error!("Uptime pass failed, keeping last report: {}", e);
                    }
                }
                _ = stop_rx.recv() => {
                    info!("🛑 Uptime Monitor Stopping...");
                    break;
                }
            }
        }
    }
}

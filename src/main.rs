use clap::Parser;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use validator_uptime::cli::{Cli, Commands};
use validator_uptime::crypto::consensus_address_from_base64;
use validator_uptime::render::{render_json, render_text};
use validator_uptime::{ChainClient, UptimeConfig, UptimeError, UptimeMonitor};

fn init_tracing(default_level: &str) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_monitor(config: &UptimeConfig) -> Result<UptimeMonitor, UptimeError> {
    config.validate()?;
    let client = ChainClient::new(&config.chain, &config.http)?;
    Ok(UptimeMonitor::new(Arc::new(client), config))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let loaded = UptimeConfig::load(&cli.global.config);
    let mut config = loaded.clone().ok().flatten().unwrap_or_default();
    cli.global.apply(&mut config);
    init_tracing(&config.log_level);

    match loaded {
        Ok(Some(_)) => info!("Config loaded from {}", cli.global.config),
        Ok(None) => info!("Config file not found at '{}'. Using defaults.", cli.global.config),
        Err(e) => warn!("{}. Using defaults.", e),
    }

    let result = match cli.command.unwrap_or(Commands::Report { json: false }) {
        Commands::Report { json } => run_report(&config, json).await,
        Commands::Watch { interval } => {
            let mut config = config;
            if let Some(secs) = interval {
                config.uptime.refresh_interval_secs = secs;
            }
            run_watch(&config).await
        }
        Commands::Address { pubkey } => consensus_address_from_base64(&pubkey).map(|addr| {
            println!("{}", addr);
        }),
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run_report(config: &UptimeConfig, json: bool) -> Result<(), UptimeError> {
    let monitor = build_monitor(config)?;
    let report = monitor.run_pass().await?;
    if json {
        println!("{}", render_json(&report)?);
    } else {
        print!("{}", render_text(&report));
    }
    Ok(())
}

async fn run_watch(config: &UptimeConfig) -> Result<(), UptimeError> {
    let monitor = Arc::new(build_monitor(config)?);
    let mut reports = monitor.subscribe();
    let (stop_tx, stop_rx) = mpsc::channel(1);

    let runner = {
        let monitor = Arc::clone(&monitor);
        tokio::spawn(async move { monitor.run(stop_rx).await })
    };

    loop {
        tokio::select! {
            changed = reports.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = reports.borrow_and_update().clone();
                if let Some(report) = snapshot {
                    print!("{}", render_text(&report));
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received");
                let _ = stop_tx.send(()).await;
                break;
            }
        }
    }

    runner
        .await
        .map_err(|e| UptimeError::Aborted(format!("monitor task failed: {}", e)))
}

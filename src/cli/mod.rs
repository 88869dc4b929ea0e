use clap::{Args, Parser, Subcommand};

use crate::config::UptimeConfig;

#[derive(Parser)]
#[command(name = "validator-uptime")]
#[command(about = "Validator block-signing uptime over the latest blocks", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = "uptime.toml")]
    pub config: String,
    /// CometBFT RPC endpoint
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,
    /// Cosmos SDK REST endpoint
    #[arg(long, global = true)]
    pub api_url: Option<String>,
    /// Number of trailing blocks to analyze
    #[arg(long, global = true)]
    pub window: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one analysis pass and print the report (default)
    Report {
        #[arg(long)]
        json: bool,
    },
    /// Refresh the report periodically until Ctrl-C
    Watch {
        /// Seconds between passes
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Derive the consensus address of a base64 consensus public key
    Address { pubkey: String },
}

impl GlobalArgs {
    /// Command-line values win over the config file.
    pub fn apply(&self, config: &mut UptimeConfig) {
        if let Some(url) = &self.rpc_url {
            config.chain.rpc_url = url.clone();
        }
        if let Some(url) = &self.api_url {
            config.chain.api_url = url.clone();
        }
        if let Some(window) = self.window {
            config.uptime.window_size = window;
        }
    }
}

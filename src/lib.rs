pub mod cli;
pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod monitor;
pub mod render;
pub mod types;
pub mod uptime;

pub use client::{ChainClient, ChainReader};
pub use config::UptimeConfig;
pub use error::UptimeError;
pub use monitor::UptimeMonitor;
pub use types::{BlockIdFlag, BlockSignature, HeightStatus, UptimeRecord, UptimeReport, ValidatorInfo};

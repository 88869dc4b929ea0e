// Presentation of an UptimeReport for the terminal
use chrono::{TimeZone, Utc};
use serde::Serialize;
use std::fmt::Write;

use crate::error::UptimeError;
use crate::types::{UptimeRecord, UptimeReport};

const COMMITTED: char = '█';
const MISSED: char = '·';
const MONIKER_WIDTH: usize = 24;

pub fn render_json(report: &UptimeReport) -> Result<String, UptimeError> {
    encode_json(report)
}

fn encode_json<T: Serialize>(value: &T) -> Result<String, UptimeError> {
    serde_json::to_string_pretty(value).map_err(|e| UptimeError::Encode(e.to_string()))
}

pub fn render_text(report: &UptimeReport) -> String {
    let mut out = String::new();
    let generated = Utc
        .timestamp_millis_opt(report.generated_at_ms)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "unknown time".to_string());

    let _ = writeln!(
        out,
        "Validator Uptime (Last {} Blocks) at height {} ({})",
        report.window_size, report.latest_height, generated
    );
    if !report.skipped_heights.is_empty() {
        let _ = writeln!(
            out,
            "⚠️  {} height(s) unavailable and excluded: {:?}",
            report.skipped_heights.len(),
            report.skipped_heights
        );
    }
    if report.records.is_empty() {
        let _ = writeln!(out, "No bonded validators.");
        return out;
    }

    for (rank, record) in report.records.iter().enumerate() {
        let _ = writeln!(out, "{}", render_record(rank + 1, record));
    }
    out
}

fn render_record(rank: usize, record: &UptimeRecord) -> String {
    let strip: String = record
        .statuses
        .iter()
        .map(|s| if s.signed { COMMITTED } else { MISSED })
        .collect();
    format!(
        "{:>3}. {:<width$} {:>6.2}%  VP: {:>24}  {}",
        rank,
        truncate(&record.moniker, MONIKER_WIDTH),
        record.percentage,
        group_thousands(record.stake_weight),
        strip,
        width = MONIKER_WIDTH
    )
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut t: String = s.chars().take(max - 1).collect();
    t.push('…');
    t
}

fn group_thousands(value: u128) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

//! History table and path listings.

use super::usage_style;
use crate::domain::QuotaRecord;
use chrono::{DateTime, NaiveDateTime};
use console::style;
use std::fmt::Write;

const RULE_WIDTH: usize = 100;

/// Tabulate records. The path column is only shown for unfiltered listings,
/// where rows can come from different files.
pub fn history_table(records: &[QuotaRecord], show_paths: bool) -> String {
    if records.is_empty() {
        return style("No history records").blue().bold().to_string();
    }

    let mut header =
        format!("{:<4} {:<25} {:<15} {:<8} {:<20}", "#", "Time", "Type", "Usage", "Current/Max");
    if show_paths {
        header.push_str(" Path");
    }

    let mut out = String::new();
    let _ = writeln!(out, "{}", style(header).cyan().bold());
    let _ = writeln!(out, "{}", style("-".repeat(RULE_WIDTH)).dim());

    for (index, record) in records.iter().enumerate() {
        let percent = usage_style(record.percentage(), 30.0, 70.0)
            .apply_to(format!("{:>6.2}%", record.percentage()));
        let mut row = format!(
            "{:<4} {:<25} {:<15} {:<8} {}",
            index + 1,
            display_timestamp(record.timestamp()),
            record.quota_type(),
            percent,
            style(format!("({:>6.2}/{:<6.2})", record.current(), record.maximum())).blue()
        );
        if show_paths {
            let _ = write!(row, " {}", style(record.source_path()).dim());
        }
        let _ = writeln!(out, "{row}");
    }

    let _ = writeln!(out, "{}", style("-".repeat(RULE_WIDTH)).dim());
    let _ = write!(out, "{}", style(format!("{} record(s)", records.len())).blue().bold());
    out
}

/// Numbered list of paths, or a placeholder line when there are none.
pub fn path_list(title: &str, paths: &[String]) -> String {
    if paths.is_empty() {
        return style(format!("{title}: none")).blue().bold().to_string();
    }
    let mut out = format!("{}", style(format!("{title}:")).cyan().bold());
    for (index, path) in paths.iter().enumerate() {
        let _ = write!(out, "\n  {}. {}", index + 1, path);
    }
    out
}

/// `YYYY-MM-DD HH:MM:SS` for ISO-8601 input, the raw text otherwise.
pub fn display_timestamp(raw: &str) -> String {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    raw.to_string()
}

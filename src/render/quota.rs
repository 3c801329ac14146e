//! Single-record details and the usage bar.

use super::usage_style;
use crate::domain::QuotaRecord;
use console::style;
use std::fmt::Write;

pub const BAR_WIDTH: usize = 30;

/// `┃███░░░┃  12.50%`, colored green below 30%, yellow below 70%, red above.
pub fn progress_bar(percentage: f64, width: usize) -> String {
    let (fill, empty) = if (30.0..70.0).contains(&percentage) { ('▓', '░') } else { ('█', '░') };
    let color = usage_style(percentage, 30.0, 70.0);

    let filled = ((width as f64 * percentage / 100.0).floor().max(0.0) as usize).min(width);
    let bar = format!(
        "{}{}",
        color.apply_to(fill.to_string().repeat(filled)),
        style(empty.to_string().repeat(width - filled)).dim()
    );
    format!(
        "{}{}{} {}",
        color.apply_to("┃").bold(),
        bar,
        color.apply_to("┃").bold(),
        style(format!("{percentage:6.2}%")).bold()
    )
}

pub fn quota_details(record: &QuotaRecord) -> String {
    let label = |text: &str| style(text.to_string()).blue().bold();
    let value = |text: String| style(text).green().bold();
    let heading = |text: &str| style(text.to_string()).cyan().bold();
    let percent_style = usage_style(record.percentage(), 50.0, 80.0);
    let refill = record.refill();

    let mut out = String::new();
    let _ = writeln!(out, "{}", heading(&"=".repeat(60)));
    let _ = writeln!(out, "{} {}", label("File:"), value(record.source_path().to_string()));

    let _ = writeln!(out, "\n{}", heading("Quota"));
    let _ = writeln!(out, "{} {}", label("Type:"), value(record.quota_type().to_string()));
    let _ = writeln!(out, "{} {}", label("Current:"), value(format!("{:.2}", record.current())));
    let _ = writeln!(out, "{} {}", label("Maximum:"), value(format!("{:.2}", record.maximum())));
    let _ = writeln!(
        out,
        "{} {}",
        label("Usage:"),
        percent_style.apply_to(format!("{:.2}%", record.percentage()))
    );
    let _ = writeln!(out, "{} {}", label("Valid until:"), value(record.valid_until().to_string()));

    let _ = writeln!(out, "\n{}", heading("Refill"));
    let _ = writeln!(out, "{} {}", label("Type:"), value(refill.kind().to_string()));
    let _ = writeln!(out, "{} {}", label("Next refill:"), value(refill.next().to_string()));
    let _ = writeln!(out, "{} {}", label("Amount:"), value(format!("{:.2}", refill.amount())));
    let _ = writeln!(out, "{} {}", label("Duration:"), value(refill.duration().to_string()));

    let _ = writeln!(out, "\n{} {}", label("Recorded at:"), value(record.timestamp().to_string()));
    let _ = writeln!(out, "{}", heading(&"-".repeat(60)));
    let _ = write!(out, "{} {}", label("Usage:"), progress_bar(record.percentage(), BAR_WIDTH));
    out
}

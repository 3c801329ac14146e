//! Console rendering
//!
//! Every renderer returns a `String` so the CLI decides where it goes and
//! tests can inspect the text with colors stripped.

pub mod help;
pub mod history;
pub mod quota;

pub use help::common_paths_help;
pub use history::{history_table, path_list};
pub use quota::{progress_bar, quota_details};

use console::Style;

/// Color band for a usage percentage with the given low/high thresholds.
pub(crate) fn usage_style(percentage: f64, low: f64, high: f64) -> Style {
    if percentage < low {
        Style::new().green()
    } else if percentage < high {
        Style::new().yellow()
    } else {
        Style::new().red()
    }
}

//! Where quota files usually live.

use console::style;
use std::fmt::Write;

pub fn common_paths_help(file_name: &str) -> String {
    let heading = |text: &str| style(text.to_string()).blue().bold();
    let mut out = String::new();

    let _ = writeln!(out, "{}", heading("Usage:"));
    let _ = writeln!(out, "  quota-analyzer analyze /path/to/{file_name}");
    let _ = writeln!(out, "  quota-analyzer analyze /path/to/IDE-config-dir");
    let _ = writeln!(out, "  quota-analyzer find --all");

    let _ = writeln!(out, "\n{}", heading("Common quota file locations:"));
    let _ = writeln!(out, "  Windows: %APPDATA%\\JetBrains\\<product>\\options\\{file_name}");
    let _ = writeln!(
        out,
        "  macOS:   ~/Library/Application Support/JetBrains/<product>/options/{file_name}"
    );
    let _ = writeln!(out, "  Linux:   ~/.config/JetBrains/<product>/options/{file_name}");

    let _ = writeln!(out, "\n{}", heading("Where <product> is for example:"));
    for product in ["PyCharm2024.1", "IntelliJIdea2024.1", "WebStorm2024.1", "CLion2024.1"] {
        let _ = writeln!(out, "  - {product}");
    }
    out
}

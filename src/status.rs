// Resource status display — shows which model checkpoints are installed.

use std::path::Path;

use colored::Colorize;

use crate::extractor::{assets, ExtractorKind};

/// Print per-variant checkpoint presence under the resources root.
pub fn show(resources_dir: &Path) {
    println!("Resources: {}", resources_dir.display());

    for kind in ExtractorKind::all() {
        println!("\n{kind}:");
        for rel in assets::expected_assets(kind) {
            let path = resources_dir.join(rel);
            match std::fs::metadata(&path) {
                Ok(meta) => println!("  {} ({})", rel, format_bytes(meta.len())),
                Err(_) => println!("  {} {}", rel, "(missing)".dimmed()),
            }
        }
    }
    println!(
        "\n{}",
        "Install missing checkpoints with `stamp fetch-asset --model <name> --url <URL>`.".dimmed()
    );
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

//! Terminal styling for the pipeline's console output

use std::path::Path;
use std::time::Duration;

use console::{style, Emoji};

use crate::pipeline::PipelineConfig;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static TOOTH: Emoji<'_, '_> = Emoji("🦷 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");

const CARD_WIDTH: usize = 64;

pub fn print_banner(version: &str) {
    println!();
    println!(
        "    {} {}",
        style("cariesprep").cyan().bold(),
        style(format!("v{}", version)).dim()
    );
    println!(
        "    {}",
        style("Dental caries phenotypes and survey feature tables").dim()
    );
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print the configuration card for a pipeline run
pub fn print_config(config: &PipelineConfig) {
    let line = "─".repeat(CARD_WIDTH - 2);
    let value_width = CARD_WIDTH - 20;

    println!("    ┌{}┐", line);
    println!("    │ {}", style("⚙️  Configuration").cyan().bold());
    println!("    ├{}┤", line);
    println!(
        "    │  {} Base:        {}",
        FOLDER,
        truncate_path(&config.base_path, value_width)
    );
    println!(
        "    │  {} Dental:      {}",
        TOOTH,
        truncate_path(&config.dental_file, value_width)
    );
    println!(
        "    │  {} Demographic: {}",
        FOLDER,
        truncate_path(&config.demographic_file, value_width)
    );
    println!(
        "    │  {} Output:      {}",
        SAVE,
        truncate_path(&config.output_dir, value_width)
    );
    println!("    ├{}┤", line);
    println!(
        "    │  {} Missing threshold:  {}",
        CHART,
        style(format!("{:.1}%", config.missing_threshold * 100.0)).yellow()
    );
    println!(
        "    │  {} Categoricals:       {} {}",
        CHART,
        style(config.categorical_columns.len()).yellow(),
        style(if config.encode_missing {
            "(with missing indicator)"
        } else {
            "(no missing indicator)"
        })
        .dim()
    );
    println!("    └{}┘", line);
    println!();
}

pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

pub fn print_step_time(elapsed: Duration) {
    println!(
        "    {}",
        style(format!("⏱  {:.2}s", elapsed.as_secs_f64())).dim()
    );
}

pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

pub fn print_completion() {
    println!();
    println!(
        "    {} {}",
        ROCKET,
        style("Survey preparation complete!").green().bold()
    );
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, detail: Option<&str>) {
    match detail {
        Some(detail) => println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(detail).dim()
        ),
        None => println!("      Found {} {}", style(count).yellow().bold(), description),
    }
}

fn truncate_path(path: &Path, max_len: usize) -> String {
    truncate_string(&path.display().to_string(), max_len)
}

/// Keep the tail of `s`; paths are most informative at the end.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else {
        let keep = max_len.saturating_sub(3);
        let tail: String = chars[chars.len() - keep..].iter().collect();
        format!("...{}", tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string_short_is_unchanged() {
        assert_eq!(truncate_string("data/lab", 20), "data/lab");
    }

    #[test]
    fn test_truncate_string_keeps_tail() {
        let out = truncate_string("/very/long/path/to/OHXDEN_J.XPT", 15);
        assert_eq!(out, "...OHXDEN_J.XPT");
        assert_eq!(out.chars().count(), 15);
    }
}

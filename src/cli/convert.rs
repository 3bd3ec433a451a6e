//! Single-file conversion between survey formats

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;

use crate::pipeline::{load_frame, write_frame};
use crate::utils::{create_spinner, finish_with_success};

/// Default output: the input's stem with a `.parquet` extension, next to the input.
pub fn default_output_path(input: &Path) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    parent.join(format!("{}.parquet", stem))
}

/// Load one XPT, CSV or Parquet file and write it as CSV or Parquet.
pub fn run_convert(input: &Path, output: Option<&Path>) -> Result<()> {
    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(input));

    println!("\n {} Converting survey file", style("◆").cyan().bold());
    println!("   Input:  {}", style(input.display()).dim());
    println!("   Output: {}", style(output_path.display()).dim());
    println!();

    let spinner = create_spinner("Reading input...");
    let mut df = load_frame(input)
        .with_context(|| format!("Failed to load file: {}", input.display()))?;
    finish_with_success(
        &spinner,
        &format!("Loaded {} rows × {} columns", df.height(), df.width()),
    );

    let spinner = create_spinner("Writing output...");
    write_frame(&mut df, &output_path)
        .with_context(|| format!("Failed to write file: {}", output_path.display()))?;
    finish_with_success(&spinner, "Output written");

    let input_size = file_size_mb(input);
    let output_size = file_size_mb(&output_path);
    println!();
    println!("   {} File sizes:", style("✧").cyan());
    println!("      Input:  {:.2} MB", input_size);
    println!("      Output: {:.2} MB", output_size);

    println!();
    println!(" {} Conversion complete!", style("✓").green().bold());

    Ok(())
}

fn file_size_mb(path: &Path) -> f64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0) as f64 / (1024.0 * 1024.0)
}

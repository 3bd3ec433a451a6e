//! Run summary report generation

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::RunStats;

/// Console summary of a completed run
#[derive(Debug)]
pub struct RunSummary<'a> {
    stats: &'a RunStats,
}

impl<'a> RunSummary<'a> {
    pub fn new(stats: &'a RunStats) -> Self {
        Self { stats }
    }

    /// Rows of the summary table as (label, value) pairs.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        let s = self.stats;
        let c = &s.cleaning;
        vec![
            ("🦷 Complete dental exams", s.dental_subjects.to_string()),
            ("🚫 Excluded (incomplete exam)", s.excluded_subjects.to_string()),
            ("⚠️  Caries-positive subjects", s.caries_positive.to_string()),
            ("👥 Demographic subjects", s.demographic_subjects.to_string()),
            ("📁 Source files merged", s.sources.len().to_string()),
            ("🧩 Merged columns", s.merged_columns.to_string()),
            ("🔤 Dropped (text)", c.text_columns_dropped.len().to_string()),
            ("🧹 Sentinel cells removed", c.scrubbed_cells.to_string()),
            ("🗑️  Dropped (removal list)", c.prune.removal_list.len().to_string()),
            ("🗑️  Dropped (missing)", c.prune.high_missing.len().to_string()),
            ("🗑️  Dropped (quarantine)", c.prune.quarantined.len().to_string()),
            (
                "🔀 Indicator columns",
                c.encoded
                    .iter()
                    .map(|e| e.indicators.len())
                    .sum::<usize>()
                    .to_string(),
            ),
            ("✅ Final features", s.final_columns.to_string()),
        ]
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("RUN SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        let final_label = "✅ Final features";
        for (label, value) in self.rows() {
            let cell = if label == final_label {
                Cell::new(value)
                    .fg(Color::Green)
                    .add_attribute(Attribute::Bold)
            } else if label.contains("Dropped") && value != "0" {
                Cell::new(value).fg(Color::Red)
            } else {
                Cell::new(value)
            };
            table.add_row(vec![Cell::new(label), cell]);
        }

        // Indent the table
        for line in table.to_string().lines() {
            println!("    {}", line);
        }

        let prune = &self.stats.cleaning.prune;
        if !prune.high_missing.is_empty() || !prune.quarantined.is_empty() {
            println!();
            println!(
                "    {} {}",
                style("📝").cyan(),
                style("DROPPED FEATURES").white().bold()
            );
            println!("    {}", style("─".repeat(50)).dim());
            print_group("High Missing Values", &prune.high_missing);
            print_group("Quarantined Dental Fields", &prune.quarantined);
        }
    }
}

fn print_group(title: &str, names: &[String]) {
    if names.is_empty() {
        return;
    }
    println!();
    println!(
        "      {} {}:",
        style(title).yellow(),
        style(format!("({})", names.len())).dim()
    );
    for name in names {
        println!("        {} {}", style("•").dim(), name);
    }
}

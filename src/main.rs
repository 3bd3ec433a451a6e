//! cariesprep: survey preparation CLI
//!
//! Builds the dental caries phenotype table and the merged survey feature
//! table from a directory of survey extracts.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use cariesprep::cli::{convert::run_convert, Cli, Commands};
use cariesprep::pipeline::{
    build_demographic_base, build_phenotype, clean_features, merge_sources, write_outputs,
    ColumnLists, RunStats,
};
use cariesprep::report::{export_run_report, RunReport, RunSummary};
use cariesprep::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config,
    print_count, print_info, print_step_header, print_step_time, print_success,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Some(command) = &cli.command {
        return match command {
            Commands::Convert { input, output } => run_convert(input, output.as_deref()),
        };
    }

    let config = cli.to_config()?;

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&config);

    // Step 1: Column lists
    print_step_header(1, "Column Lists");
    let step_start = Instant::now();
    let lists = ColumnLists::load(&config)
        .with_context(|| format!("Failed to read removal list: {}", config.removal_list.display()))?;
    print_count("column(s) on the removal list", lists.removal_list.len(), None);
    print_step_time(step_start.elapsed());

    // Step 2: Dental phenotype
    print_step_header(2, "Dental Caries Phenotype");
    let step_start = Instant::now();
    let spinner = create_spinner("Deriving caries features...");
    let caries = build_phenotype(&config)
        .with_context(|| format!("Failed to build phenotype from {}", config.dental_file.display()))?;
    finish_with_success(&spinner, "Caries features derived");
    print_count(
        "subject(s) with a complete dental exam",
        caries.phenotype.height(),
        Some(&format!("({} excluded)", caries.excluded_subjects)),
    );
    print_count("tooth surface column(s)", caries.tooth_flags.width(), None);
    print_step_time(step_start.elapsed());

    // Step 3: Demographic base
    print_step_header(3, "Demographic Base");
    let step_start = Instant::now();
    let mut features = build_demographic_base(&config, &caries).with_context(|| {
        format!(
            "Failed to build demographic base from {}",
            config.demographic_file.display()
        )
    })?;
    let demographic_subjects = features.height();
    print_count("demographic subject(s)", demographic_subjects, None);
    print_step_time(step_start.elapsed());

    // Step 4: Merge survey sources
    print_step_header(4, "Merge Survey Sources");
    let step_start = Instant::now();
    let spinner = create_spinner("Merging source files...");
    let sources = merge_sources(&config, &mut features).context("Failed to merge survey sources")?;
    finish_with_success(&spinner, "Sources merged");
    let merged_columns = features.width();
    print_count(
        "source file(s) merged",
        sources.len(),
        Some(&format!("({} columns)", merged_columns)),
    );
    print_step_time(step_start.elapsed());

    // Step 5: Clean features
    print_step_header(5, "Clean Features");
    let step_start = Instant::now();
    let spinner = create_spinner("Scrubbing, pruning and encoding...");
    let cleaning = clean_features(&config, &lists, &mut features);
    finish_with_success(&spinner, "Feature table cleaned");
    if cleaning.scrubbed_cells == 0 {
        print_info("No survey sentinel codes found");
    } else {
        print_count(
            "sentinel cell(s) removed",
            cleaning.scrubbed_cells,
            Some(&format!("(in {} columns)", cleaning.scrubbed_columns)),
        );
    }
    print_count(
        "column(s) dropped",
        cleaning.prune.total_dropped() + cleaning.text_columns_dropped.len(),
        Some(&format!(
            "(>{:.1}% missing threshold)",
            config.missing_threshold * 100.0
        )),
    );
    print_step_time(step_start.elapsed());

    // Step 6: Save outputs
    print_step_header(6, "Save Results");
    let step_start = Instant::now();
    let spinner = create_spinner("Writing output files...");
    let written = write_outputs(&config, &caries.phenotype, &features)
        .with_context(|| format!("Failed to write outputs to {}", config.output_dir.display()))?;
    finish_with_success(&spinner, &format!("Saved to {}", config.output_dir.display()));
    for path in &written {
        println!("      {}", style(path.display()).dim());
    }
    print_step_time(step_start.elapsed());

    let stats = RunStats::collect(
        &caries,
        demographic_subjects,
        sources,
        merged_columns,
        cleaning,
        &features,
    );

    RunSummary::new(&stats).display();

    if let Some(report_path) = &cli.report {
        let report = RunReport::new(&config, &stats, &written);
        export_run_report(&report, report_path)?;
        print_success(&format!("Run report written to {}", report_path.display()));
    }

    print_completion();

    Ok(())
}

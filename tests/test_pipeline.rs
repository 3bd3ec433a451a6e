//! End-to-end tests over a generated survey directory

use cariesprep::pipeline::{
    build_demographic_base, build_phenotype, run_pipeline, ColumnData, DataError, PipelineError,
    OUTCOME_COLUMN,
};
use polars::prelude::*;

#[path = "common/mod.rs"]
mod common;

use common::{create_survey_dir, numeric, read_csv, write_xpt, XptColumn};

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

fn f64_values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

#[test]
fn test_phenotype_stage() {
    let fixture = create_survey_dir();
    let caries = build_phenotype(&fixture.config()).unwrap();

    assert_eq!(caries.phenotype.ids(), &[101, 102, 103, 104]);
    assert_eq!(caries.excluded_subjects, 1);
    assert_eq!(
        numeric(&caries.phenotype, "tooth_count"),
        vec![Some(1.0), Some(0.0), Some(1.0), Some(0.0)]
    );
    assert_eq!(
        numeric(&caries.phenotype, "tooth_count_sev"),
        vec![Some(1.0), Some(0.0), Some(2.0), Some(0.0)]
    );
    assert_eq!(
        numeric(&caries.phenotype, "norm_sum"),
        vec![Some(2.0), Some(0.0), Some(2.0), Some(0.0)]
    );
}

#[test]
fn test_demographic_base_stage() {
    let fixture = create_survey_dir();
    let config = fixture.config();
    let caries = build_phenotype(&config).unwrap();

    let base = build_demographic_base(&config, &caries).unwrap();

    assert_eq!(base.ids(), &[101, 102, 103, 104, 105, 106]);
    assert_eq!(base.width(), 23);
    assert!(!base.has_column("DMDEXTRA"), "Projected onto the keep list");
    assert_eq!(
        numeric(&base, OUTCOME_COLUMN),
        vec![Some(1.0), Some(0.0), Some(1.0), Some(0.0), None, None]
    );
}

#[test]
fn test_demographic_keep_list_column_missing() {
    let fixture = create_survey_dir();
    let mut config = fixture.config();
    config.demographic_columns.push("NOT_IN_DEMO".to_string());
    let caries = build_phenotype(&config).unwrap();

    let err = build_demographic_base(&config, &caries).unwrap_err();
    assert!(
        matches!(err, PipelineError::Schema { ref column, .. } if column == "NOT_IN_DEMO"),
        "got {:?}",
        err
    );
}

#[test]
fn test_full_run_stats() {
    let fixture = create_survey_dir();
    let outcome = run_pipeline(&fixture.config()).unwrap();
    let stats = &outcome.stats;

    assert_eq!(stats.dental_subjects, 4);
    assert_eq!(stats.excluded_subjects, 1);
    assert_eq!(stats.tooth_columns, 2);
    assert_eq!(stats.caries_positive, 2);
    assert_eq!(stats.demographic_subjects, 6);

    let files: Vec<&str> = stats.sources.iter().map(|s| s.file.as_str()).collect();
    assert_eq!(
        files,
        vec!["LAB_A.csv", "LAB_B.csv", "DIQ_J.csv", "OHXDEN_J.XPT", "DR2TOT_J.XPT"]
    );
    assert_eq!(stats.merged_columns, 34);

    let cleaning = &stats.cleaning;
    assert_eq!(cleaning.text_columns_dropped.len(), 3);
    assert_eq!(cleaning.scrubbed_cells, 3);
    assert_eq!(cleaning.prune.removal_list, vec!["WTINT2YR", "OHDEXSTS"]);
    assert_eq!(cleaning.prune.removal_list_absent, vec!["NOT_A_COLUMN"]);
    assert_eq!(cleaning.prune.high_missing, vec!["LBXSPARSE"]);
    assert_eq!(cleaning.prune.quarantined, vec!["OHX02TC"]);

    assert_eq!(stats.final_subjects, 6);
    assert_eq!(stats.final_columns, 39);
}

#[test]
fn test_full_run_feature_table() {
    let fixture = create_survey_dir();
    let outcome = run_pipeline(&fixture.config()).unwrap();
    let features = &outcome.features;

    // later sources only fill subjects present in the demographic file
    assert_eq!(
        numeric(features, "LBXTC"),
        vec![Some(180.0), Some(190.0), Some(200.0), None, None, None]
    );
    // first nutrition recall day is kept
    assert_eq!(
        numeric(features, "DR2TKCAL"),
        vec![Some(2000.0), Some(1800.0), Some(2200.0), None, None, None]
    );
    // 7777 is a sentinel for a 6-valued column
    assert_eq!(numeric(features, "LBXGLU")[2], None);

    // DIQ010's 9 became missing before encoding
    assert_eq!(
        numeric(features, "DIQ010_nan"),
        vec![Some(0.0), Some(0.0), Some(0.0), Some(1.0), Some(0.0), Some(0.0)]
    );
    let names = features.column_names();
    let dmdmartl: Vec<&str> = names
        .iter()
        .filter(|n| n.starts_with("DMDMARTL_"))
        .map(String::as_str)
        .collect();
    assert_eq!(dmdmartl, vec!["DMDMARTL_1.0", "DMDMARTL_nan", "DMDMARTL_2.0"]);

    for gone in ["DIQ010", "DR2DAY", "OHX02CSC", "LBDNOTE", "OHX02TC", "WTINT2YR"] {
        assert!(!features.has_column(gone), "{} should be gone", gone);
    }
    assert!(features
        .columns()
        .iter()
        .all(|c| matches!(c.data, ColumnData::Numeric(_))));
}

#[test]
fn test_outputs_written() {
    let fixture = create_survey_dir();
    let config = fixture.config();
    let outcome = run_pipeline(&config).unwrap();

    assert_eq!(outcome.written, vec![config.phenotype_path(), config.feature_path()]);

    let pheno = read_csv(&config.phenotype_path());
    assert_eq!(pheno.shape(), (4, 7));
    assert_eq!(column_names(&pheno)[0], "SEQN");
    assert_eq!(
        f64_values(&pheno, "surface_sum"),
        vec![Some(2.0), Some(0.0), Some(4.0), Some(0.0)]
    );

    let features = read_csv(&config.feature_path());
    assert_eq!(features.shape(), (6, 40));
    let names = column_names(&features);
    assert_eq!(names[0], "SEQN");
    assert!(names.contains(&"outcome".to_string()));
    assert!(names.contains(&"DR2DAY_2.0".to_string()));

    let entries = std::fs::read_dir(&config.output_dir).unwrap().count();
    assert_eq!(entries, 2, "No temporary files are left behind");
}

#[test]
fn test_custom_output_directory() {
    let fixture = create_survey_dir();
    let mut config = fixture.config();
    config.output_dir = fixture.base().join("out").join("2018");
    config.encode_missing = false;

    let outcome = run_pipeline(&config).unwrap();

    assert!(config.feature_path().exists());
    assert!(!outcome.features.has_column("DIQ010_nan"));
}

#[test]
fn test_bad_surface_code_aborts_without_outputs() {
    let fixture = create_survey_dir();
    let config = fixture.config();
    write_xpt(
        &config.dental_file,
        "OHXDEN_J",
        &[
            XptColumn::Num("SEQN", vec![Some(101.0), Some(102.0)]),
            XptColumn::Num("OHDEXSTS", vec![Some(1.0), Some(1.0)]),
            XptColumn::Char("OHX02CSC", vec![Some("1"), Some("Z")]),
        ],
    );

    let err = run_pipeline(&config).unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Data(DataError::UnrecognisedSurfaceCode { subject: 102, .. })
    ));
    assert!(!config.phenotype_path().exists());
    assert!(!config.feature_path().exists());
}

#[test]
fn test_missing_removal_list() {
    let fixture = create_survey_dir();
    std::fs::remove_file(fixture.base().join("vars_to_remove.txt")).unwrap();

    let err = run_pipeline(&fixture.config()).unwrap_err();
    assert!(matches!(err, PipelineError::Config { .. }));
}

#[test]
fn test_missing_source_directory() {
    let fixture = create_survey_dir();
    std::fs::remove_dir_all(fixture.base().join("quest")).unwrap();

    let err = run_pipeline(&fixture.config()).unwrap_err();
    assert!(matches!(err, PipelineError::Config { .. }));
    assert!(!fixture.config().feature_path().exists());
}

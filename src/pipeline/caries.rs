//! Dental caries outcome derivation
//!
//! Each tooth has a coronal-surface code column holding the surfaces with
//! caries (e.g. `"1-2"` means two affected surfaces) or nothing when the tooth
//! is sound. From these codes we derive per-tooth surface counts and the
//! subject-level outcome used as the modelling target.

use super::error::{DataError, PipelineError, Result};
use super::table::{ColumnData, SubjectTable};

/// Marker used for sound teeth.
pub const NO_CARIES: &str = "no caries";

/// Separator removed from surface codes before counting.
pub const SURFACE_SEPARATOR: char = '-';

/// Naming and filter conventions of the dental examination file.
#[derive(Debug, Clone)]
pub struct DentalSettings {
    /// Exam status column
    pub status_column: String,
    /// Status value meaning "complete exam"
    pub complete_status: f64,
    /// Substring identifying tooth-surface code columns
    pub surface_pattern: String,
}

impl Default for DentalSettings {
    fn default() -> Self {
        Self {
            status_column: "OHDEXSTS".to_string(),
            complete_status: 1.0,
            surface_pattern: "CSC".to_string(),
        }
    }
}

/// Classification of one stripped surface code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToothStatus {
    Caries,
    NoCaries,
    /// Neither the sound marker nor digit-bearing. Cannot be scored.
    Other(String),
}

/// Per-tooth view of a single surface code cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceCode {
    /// Code after missing → "no caries" and separator removal
    pub stripped: String,
    /// Number of affected surfaces
    pub length: usize,
    pub status: ToothStatus,
}

impl SurfaceCode {
    pub fn parse(raw: Option<&str>) -> Self {
        let stripped: String = raw
            .unwrap_or(NO_CARIES)
            .chars()
            .filter(|&c| c != SURFACE_SEPARATOR)
            .collect();

        let length = if stripped == NO_CARIES {
            0
        } else {
            stripped.chars().count()
        };

        let status = if stripped.chars().any(|c| c.is_ascii_digit()) {
            ToothStatus::Caries
        } else if stripped == NO_CARIES {
            ToothStatus::NoCaries
        } else {
            ToothStatus::Other(stripped.clone())
        };

        Self {
            stripped,
            length,
            status,
        }
    }
}

/// Subject-level outcome features.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubjectOutcome {
    pub surface_sum: f64,
    pub tooth_count_sev: f64,
    pub tooth_count: f64,
    pub norm_sum: f64,
}

impl SubjectOutcome {
    pub fn from_counts(surface_sum: f64, tooth_count_sev: f64) -> Self {
        let norm_sum = if tooth_count_sev > 0.0 {
            round2(surface_sum / tooth_count_sev)
        } else {
            0.0
        };
        Self {
            surface_sum,
            tooth_count_sev,
            tooth_count: if tooth_count_sev >= 1.0 { 1.0 } else { 0.0 },
            norm_sum,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Result of caries feature extraction.
#[derive(Debug, Clone)]
pub struct CariesFeatures {
    /// `length_*`, `surface_sum`, `tooth_count`, `norm_sum`, `tooth_count_sev`
    pub phenotype: SubjectTable,
    /// Tooth columns recoded to 1.0 (caries) / 0.0 (sound)
    pub tooth_flags: SubjectTable,
    /// Subjects dropped because their exam was not complete
    pub excluded_subjects: usize,
}

impl CariesFeatures {
    /// Binarised caries indicator per subject of the phenotype table.
    pub fn outcome(&self) -> &[Option<f64>] {
        self.phenotype
            .column("tooth_count")
            .and_then(ColumnData::as_numeric)
            .unwrap_or(&[])
    }
}

/// Keep only subjects with a complete dental exam.
pub fn filter_complete_exams(dental: SubjectTable, settings: &DentalSettings) -> Result<SubjectTable> {
    let status = dental
        .column(&settings.status_column)
        .ok_or_else(|| PipelineError::schema("dental examination table", &settings.status_column))?;

    let keep: Vec<bool> = match status {
        ColumnData::Numeric(v) => v
            .iter()
            .map(|s| *s == Some(settings.complete_status))
            .collect(),
        ColumnData::Text(v) => v
            .iter()
            .map(|s| {
                s.as_deref()
                    .and_then(|t| t.trim().parse::<f64>().ok())
                    == Some(settings.complete_status)
            })
            .collect(),
    };

    Ok(dental.filter_rows(|row| keep[row]))
}

/// Derive the phenotype table from the dental examination table.
pub fn extract_caries_features(
    dental: SubjectTable,
    settings: &DentalSettings,
) -> Result<CariesFeatures> {
    let total = dental.height();
    let dental = filter_complete_exams(dental, settings)?;
    let excluded_subjects = total - dental.height();

    let mut phenotype = dental.empty_like();
    let mut tooth_flags = dental.empty_like();

    let height = dental.height();
    let mut surface_sum = vec![0.0f64; height];
    let mut tooth_count_sev = vec![0.0f64; height];

    let tooth_columns = dental
        .columns()
        .iter()
        .filter(|c| c.name.contains(&settings.surface_pattern));

    for column in tooth_columns {
        let codes: Vec<SurfaceCode> = match &column.data {
            ColumnData::Text(v) => v.iter().map(|s| SurfaceCode::parse(s.as_deref())).collect(),
            // A numeric surface column is all-missing in practice (the survey
            // stores these as character); render any value as text.
            ColumnData::Numeric(v) => v
                .iter()
                .map(|x| SurfaceCode::parse(x.map(|n| n.to_string()).as_deref()))
                .collect(),
        };

        let mut flags = Vec::with_capacity(height);
        for (row, code) in codes.iter().enumerate() {
            surface_sum[row] += code.length as f64;
            let flag = match &code.status {
                ToothStatus::Caries => 1.0,
                ToothStatus::NoCaries => 0.0,
                ToothStatus::Other(raw) => {
                    return Err(DataError::UnrecognisedSurfaceCode {
                        column: column.name.clone(),
                        subject: dental.ids()[row],
                        code: raw.clone(),
                    }
                    .into())
                }
            };
            tooth_count_sev[row] += flag;
            flags.push(Some(flag));
        }

        phenotype.insert_column(
            format!("length_{}", column.name),
            ColumnData::Numeric(codes.iter().map(|c| Some(c.length as f64)).collect()),
        );
        tooth_flags.insert_column(column.name.clone(), ColumnData::Numeric(flags));
    }

    let outcomes: Vec<SubjectOutcome> = surface_sum
        .iter()
        .zip(&tooth_count_sev)
        .map(|(&s, &t)| SubjectOutcome::from_counts(s, t))
        .collect();

    phenotype.insert_column(
        "surface_sum",
        ColumnData::Numeric(outcomes.iter().map(|o| Some(o.surface_sum)).collect()),
    );
    phenotype.insert_column(
        "tooth_count",
        ColumnData::Numeric(outcomes.iter().map(|o| Some(o.tooth_count)).collect()),
    );
    phenotype.insert_column(
        "norm_sum",
        ColumnData::Numeric(outcomes.iter().map(|o| Some(o.norm_sum)).collect()),
    );
    phenotype.insert_column(
        "tooth_count_sev",
        ColumnData::Numeric(outcomes.iter().map(|o| Some(o.tooth_count_sev)).collect()),
    );

    log::info!(
        "Derived caries features for {} subjects ({} excluded, {} tooth columns)",
        height,
        excluded_subjects,
        tooth_flags.width()
    );

    Ok(CariesFeatures {
        phenotype,
        tooth_flags,
        excluded_subjects,
    })
}

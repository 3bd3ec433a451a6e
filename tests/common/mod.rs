//! Shared test utilities and fixture generators
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use cariesprep::pipeline::{ColumnData, PipelineConfig, SubjectTable, DEFAULT_DEMOGRAPHIC_COLUMNS};
use polars::prelude::*;
use tempfile::TempDir;

/// A column to be written into a transport file.
pub enum XptColumn {
    Num(&'static str, Vec<Option<f64>>),
    Char(&'static str, Vec<Option<&'static str>>),
}

impl XptColumn {
    fn name(&self) -> &'static str {
        match self {
            XptColumn::Num(name, _) | XptColumn::Char(name, _) => name,
        }
    }

    fn width(&self) -> usize {
        match self {
            XptColumn::Num(_, _) => 8,
            XptColumn::Char(_, values) => values
                .iter()
                .flatten()
                .map(|s| s.len())
                .max()
                .unwrap_or(1)
                .max(1),
        }
    }

    fn rows(&self) -> usize {
        match self {
            XptColumn::Num(_, v) => v.len(),
            XptColumn::Char(_, v) => v.len(),
        }
    }
}

/// Encode an f64 as an 8-byte IBM hexadecimal float (missing -> SAS `.`).
pub fn ibm_float(value: Option<f64>) -> [u8; 8] {
    let mut out = [0u8; 8];
    let Some(v) = value else {
        out[0] = b'.';
        return out;
    };
    if v == 0.0 {
        return out;
    }

    let sign = if v < 0.0 { 0x80 } else { 0 };
    let mut fraction = v.abs();
    let mut exponent = 0i32;
    while fraction >= 1.0 {
        fraction /= 16.0;
        exponent += 1;
    }
    while fraction < 1.0 / 16.0 {
        fraction *= 16.0;
        exponent -= 1;
    }

    let mantissa = (fraction * 2f64.powi(56)) as u64;
    out[0] = sign | (exponent + 64) as u8;
    out[1..].copy_from_slice(&mantissa.to_be_bytes()[1..]);
    out
}

fn push_record(buf: &mut Vec<u8>, text: &[u8]) {
    let mut rec = [b' '; 80];
    rec[..text.len()].copy_from_slice(text);
    buf.extend_from_slice(&rec);
}

fn pad_to_record(buf: &mut Vec<u8>) {
    while buf.len() % 80 != 0 {
        buf.push(b' ');
    }
}

fn padded<const N: usize>(text: &str) -> [u8; N] {
    let mut out = [b' '; N];
    out[..text.len()].copy_from_slice(text.as_bytes());
    out
}

/// Build an XPT v5 file with one member.
pub fn xpt_bytes(dataset: &str, columns: &[XptColumn]) -> Vec<u8> {
    let mut buf = Vec::new();
    let header = |kind: &str, tail: &str| {
        let mut text = format!("HEADER RECORD*******{:<8}HEADER RECORD!!!!!!!", kind).into_bytes();
        text.extend_from_slice(tail.as_bytes());
        text
    };

    push_record(&mut buf, &header("LIBRARY", "000000000000000000000000000000"));
    push_record(&mut buf, b"SAS     SAS     SASLIB  9.4     X64_10PR");
    push_record(&mut buf, b"01JAN20:00:00:00");
    push_record(&mut buf, &header("MEMBER", "000000000000000001600000000140"));
    push_record(&mut buf, &header("DSCRPTR", "000000000000000000000000000000"));
    let mut member = b"SAS     ".to_vec();
    member.extend_from_slice(&padded::<8>(dataset));
    member.extend_from_slice(b"SASDATA 9.4     X64_10PR");
    push_record(&mut buf, &member);
    push_record(&mut buf, b"01JAN20:00:00:00");
    push_record(
        &mut buf,
        &header(
            "NAMESTR",
            &format!("000000{:04}00000000000000000000", columns.len()),
        ),
    );

    let mut position = 0i32;
    for (i, column) in columns.iter().enumerate() {
        let mut raw = [0u8; 140];
        let ntype: i16 = match column {
            XptColumn::Num(_, _) => 1,
            XptColumn::Char(_, _) => 2,
        };
        let width = column.width() as i16;
        raw[0..2].copy_from_slice(&ntype.to_be_bytes());
        raw[4..6].copy_from_slice(&width.to_be_bytes());
        raw[6..8].copy_from_slice(&(i as i16 + 1).to_be_bytes());
        raw[8..16].copy_from_slice(&padded::<8>(column.name()));
        raw[16..56].copy_from_slice(&padded::<40>(column.name()));
        raw[84..88].copy_from_slice(&position.to_be_bytes());
        buf.extend_from_slice(&raw);
        position += width as i32;
    }
    pad_to_record(&mut buf);

    push_record(&mut buf, &header("OBS", "000000000000000000000000000000"));
    let rows = columns.first().map(XptColumn::rows).unwrap_or(0);
    for row in 0..rows {
        for column in columns {
            match column {
                XptColumn::Num(_, values) => buf.extend_from_slice(&ibm_float(values[row])),
                XptColumn::Char(_, values) => {
                    let width = column.width();
                    let mut cell = vec![b' '; width];
                    if let Some(text) = values[row] {
                        cell[..text.len()].copy_from_slice(text.as_bytes());
                    }
                    buf.extend_from_slice(&cell);
                }
            }
        }
    }
    pad_to_record(&mut buf);
    buf
}

pub fn write_xpt(path: &Path, dataset: &str, columns: &[XptColumn]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, xpt_bytes(dataset, columns)).unwrap();
}

pub fn write_csv(path: &Path, df: &mut DataFrame) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut file = std::fs::File::create(path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();
}

pub fn read_csv(path: &Path) -> DataFrame {
    LazyCsvReader::new(path).finish().unwrap().collect().unwrap()
}

/// A table with the given identifiers and numeric columns.
pub fn numeric_table(ids: &[u64], columns: &[(&str, Vec<Option<f64>>)]) -> SubjectTable {
    let mut table = SubjectTable::new("SEQN", ids.to_vec()).unwrap();
    for (name, values) in columns {
        table.insert_column(*name, ColumnData::Numeric(values.clone()));
    }
    table
}

/// A dental examination table with status and surface code columns.
pub fn dental_table(
    ids: &[u64],
    status: &[f64],
    teeth: &[(&str, Vec<Option<&str>>)],
) -> SubjectTable {
    let mut table = SubjectTable::new("SEQN", ids.to_vec()).unwrap();
    table.insert_column(
        "OHDEXSTS",
        ColumnData::Numeric(status.iter().map(|&s| Some(s)).collect()),
    );
    for (name, codes) in teeth {
        table.insert_column(*name, ColumnData::text(codes.iter().copied()));
    }
    table
}

pub fn numeric(table: &SubjectTable, name: &str) -> Vec<Option<f64>> {
    table
        .column(name)
        .and_then(ColumnData::as_numeric)
        .unwrap_or_else(|| panic!("numeric column '{}' not found", name))
        .to_vec()
}

pub const SUBJECTS: [u64; 6] = [101, 102, 103, 104, 105, 106];

/// A survey directory laid out the way the pipeline expects.
///
/// Subjects 101..=106 are in the demographic file; 101..=105 were examined
/// and 105's exam is incomplete. Phenotypes of the four complete exams:
///
/// | SEQN | OHX02CSC | OHX03CSC | surface_sum | sev | tooth_count | norm_sum |
/// |------|----------|----------|-------------|-----|-------------|----------|
/// | 101  | 1-2      |          | 2           | 1   | 1           | 2.0      |
/// | 102  |          |          | 0           | 0   | 0           | 0.0      |
/// | 103  | 3        | 4-5-6    | 4           | 2   | 1           | 2.0      |
/// | 104  |          |          | 0           | 0   | 0           | 0.0      |
pub struct SurveyFixture {
    pub dir: TempDir,
}

impl SurveyFixture {
    pub fn base(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub fn config(&self) -> PipelineConfig {
        PipelineConfig::from_base(self.base())
    }
}

pub fn create_survey_dir() -> SurveyFixture {
    let dir = TempDir::new().unwrap();
    let base = dir.path();
    let ids: Vec<Option<f64>> = SUBJECTS.iter().map(|&id| Some(id as f64)).collect();

    // demographics: every keep-list variable, cycling through 1, 2, 3
    let mut demo = vec![XptColumn::Num("SEQN", ids.clone())];
    for name in DEFAULT_DEMOGRAPHIC_COLUMNS {
        let values = match name {
            "DMDMARTL" => vec![Some(1.0), Some(77.0), Some(2.0), Some(1.0), Some(2.0), Some(1.0)],
            _ => (0..SUBJECTS.len()).map(|i| Some((i % 3 + 1) as f64)).collect(),
        };
        demo.push(XptColumn::Num(name, values));
    }
    demo.push(XptColumn::Num("DMDEXTRA", vec![Some(5.0); 6]));
    write_xpt(&base.join("demo").join("DEMO_J.XPT"), "DEMO_J", &demo);

    write_xpt(
        &base.join("examination").join("OHXDEN_J.XPT"),
        "OHXDEN_J",
        &[
            XptColumn::Num("SEQN", ids[..5].to_vec()),
            XptColumn::Num("OHDEXSTS", vec![Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(3.0)]),
            XptColumn::Char("OHX02CSC", vec![Some("1-2"), None, Some("3"), None, Some("1")]),
            XptColumn::Char("OHX03CSC", vec![None, None, Some("4-5-6"), None, None]),
            XptColumn::Num("OHX02TC", vec![Some(2.0); 5]),
        ],
    );

    let mut lab_a = df! {
        "SEQN" => [101i64, 102, 103, 104, 105, 106],
        "LBXGLU" => [90.0f64, 95.5, 7777.0, 100.0, 110.0, 120.0],
        "LBXSPARSE" => [Some(1.0f64), None, None, None, None, Some(2.0)],
        "LBDNOTE" => ["a", "b", "c", "d", "e", "f"],
    }
    .unwrap();
    write_csv(&base.join("lab").join("LAB_A.csv"), &mut lab_a);

    let mut lab_b = df! {
        "SEQN" => [101i64, 102, 103, 999],
        "LBXTC" => [180.0f64, 190.0, 200.0, 210.0],
    }
    .unwrap();
    write_csv(&base.join("lab").join("LAB_B.csv"), &mut lab_b);

    let mut quest = df! {
        "SEQN" => [101i64, 102, 103, 104, 105, 106],
        "DIQ010" => [1.0f64, 2.0, 2.0, 9.0, 1.0, 2.0],
    }
    .unwrap();
    write_csv(&base.join("quest").join("DIQ_J.csv"), &mut quest);
    std::fs::write(base.join("quest").join("notes.txt"), "not a survey file").unwrap();

    write_xpt(
        &base.join("nutrition").join("DR2TOT_J.XPT"),
        "DR2TOT_J",
        &[
            XptColumn::Num("SEQN", vec![Some(101.0), Some(101.0), Some(102.0), Some(103.0)]),
            XptColumn::Num("DR2TKCAL", vec![Some(2000.0), Some(2500.0), Some(1800.0), Some(2200.0)]),
            XptColumn::Num("DR2DAY", vec![Some(1.0), Some(2.0), Some(1.0), Some(2.0)]),
        ],
    );
    std::fs::write(base.join("nutrition").join("readme.csv"), "SEQN\n1\n").unwrap();

    std::fs::write(
        base.join("vars_to_remove.txt"),
        "OHDEXSTS  \n\nWTINT2YR\nNOT_A_COLUMN\n",
    )
    .unwrap();

    SurveyFixture { dir }
}

//! SAS transport (XPT v5) reader.
//!
//! The survey publishes every extract as a transport file. This module reads
//! the first member of such a file and turns it into a Polars DataFrame.
//!
//! # Module Structure
//!
//! - `error` - Error type for decoding failures
//! - `header` - Fixed header records and NAMESTR variable descriptors
//! - `data` - IBM float / character cell decoding and Series building

pub mod data;
pub mod error;
pub mod header;

pub use error::XptError;
pub use header::{XptType, XptVariable};

use std::path::Path;

use polars::prelude::*;

use self::data::{build_series, decode_observations, XptColumnValues};
use self::header::{
    align_to_record, expect_header, is_member_header, parse_dataset_name, parse_namestr_len,
    parse_namestr_records, parse_variable_count, record, DSCRPTR_PREFIX, LIBRARY_PREFIX,
    MEMBER_PREFIX, NAMESTR_PREFIX, OBS_PREFIX, RECORD_LEN,
};

/// A decoded transport member.
#[derive(Debug, Clone)]
pub struct XptDataset {
    pub name: String,
    pub variables: Vec<XptVariable>,
    pub columns: Vec<XptColumnValues>,
    pub row_count: usize,
}

impl XptDataset {
    /// Convert into a DataFrame: numeric variables become Float64, character
    /// variables become String.
    pub fn into_frame(self) -> PolarsResult<DataFrame> {
        let columns: Vec<Column> = self
            .variables
            .iter()
            .zip(self.columns)
            .map(|(var, values)| build_series(&var.name, values).into())
            .collect();
        DataFrame::new(columns)
    }
}

/// Read the first member of a transport file.
pub fn read_xpt(path: &Path) -> Result<XptDataset, XptError> {
    let bytes = std::fs::read(path)?;
    parse_xpt(&bytes)
}

/// Parse transport bytes.
pub fn parse_xpt(data: &[u8]) -> Result<XptDataset, XptError> {
    let mut offset = 0usize;

    expect_header(data, offset, LIBRARY_PREFIX, "LIBRARY")?;
    // library header + two library descriptor records
    offset += RECORD_LEN * 3;

    expect_header(data, offset, MEMBER_PREFIX, "MEMBER")?;
    let namestr_len = parse_namestr_len(record(data, offset)?)?;
    offset += RECORD_LEN;

    expect_header(data, offset, DSCRPTR_PREFIX, "DSCRPTR")?;
    offset += RECORD_LEN;

    let name = parse_dataset_name(record(data, offset)?);
    // member name record + member label record
    offset += RECORD_LEN * 2;

    expect_header(data, offset, NAMESTR_PREFIX, "NAMESTR")?;
    let var_count = parse_variable_count(record(data, offset)?)?;
    offset += RECORD_LEN;

    let block_len = var_count * namestr_len;
    let block = data
        .get(offset..offset + block_len)
        .ok_or(XptError::Truncated { offset })?;
    let variables = parse_namestr_records(block, var_count, namestr_len)?;
    offset = align_to_record(offset + block_len);

    expect_header(data, offset, OBS_PREFIX, "OBS")?;
    offset += RECORD_LEN;

    let obs_len = observation_length(&variables)?;
    let obs_end = member_end(data, offset);
    let obs = &data[offset..obs_end];
    let row_count = count_rows(obs, obs_len);

    let columns = decode_observations(obs, row_count, obs_len, &variables);

    Ok(XptDataset {
        name,
        variables,
        columns,
        row_count,
    })
}

/// Observation width; every variable must fit inside it.
fn observation_length(variables: &[XptVariable]) -> Result<usize, XptError> {
    let width = variables
        .iter()
        .map(|v| v.position + v.length)
        .max()
        .unwrap_or(0);
    let declared: usize = variables.iter().map(|v| v.length).sum();
    if declared > width {
        return Err(XptError::InvalidNamestr {
            index: 0,
            message: format!(
                "variable widths sum to {} but observations span {} bytes",
                declared, width
            ),
        });
    }
    Ok(width)
}

/// End of the observation section: the next MEMBER header or end of file.
fn member_end(data: &[u8], obs_start: usize) -> usize {
    let mut offset = obs_start;
    while offset + RECORD_LEN <= data.len() {
        if is_member_header(&data[offset..offset + RECORD_LEN]) {
            return offset;
        }
        offset += RECORD_LEN;
    }
    data.len()
}

/// Whole observations in the section, ignoring trailing blank padding rows.
fn count_rows(obs: &[u8], obs_len: usize) -> usize {
    if obs_len == 0 {
        return 0;
    }
    let mut rows = obs.len() / obs_len;
    while rows > 0 {
        let start = (rows - 1) * obs_len;
        if obs[start..start + obs_len].iter().all(|&b| b == b' ') {
            rows -= 1;
        } else {
            break;
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_rows_trims_padding() {
        let mut obs = vec![b'x'; 20];
        obs.extend_from_slice(&[b' '; 15]);
        assert_eq!(count_rows(&obs, 10), 2);
        assert_eq!(count_rows(&obs, 0), 0);
    }

    #[test]
    fn test_rejects_non_transport_bytes() {
        let data = vec![b'z'; RECORD_LEN * 10];
        let err = parse_xpt(&data).unwrap_err();
        assert!(matches!(
            err,
            XptError::InvalidHeader {
                expected: "LIBRARY",
                offset: 0
            }
        ));
    }

    #[test]
    fn test_rejects_truncated_file() {
        let mut data = Vec::new();
        data.extend_from_slice(LIBRARY_PREFIX);
        data.resize(RECORD_LEN, b' ');
        let err = parse_xpt(&data).unwrap_err();
        assert!(matches!(err, XptError::Truncated { .. }));
    }
}

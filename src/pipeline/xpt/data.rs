//! Observation decoding for SAS transport files.
//!
//! Numeric cells are IBM System/360 hexadecimal floats (2 to 8 bytes,
//! big-endian, truncated on the right). Character cells are fixed-width,
//! blank padded, and decoded to plain text here so nothing downstream ever
//! sees raw bytes.

use polars::prelude::*;

use super::header::{XptType, XptVariable};

/// Decoded values for one variable, column-major.
#[derive(Debug, Clone, PartialEq)]
pub enum XptColumnValues {
    Numeric(Vec<Option<f64>>),
    Character(Vec<Option<String>>),
}

/// Decode an IBM hexadecimal float. Returns `None` for SAS missing values
/// (`.`, `._`, `.A` .. `.Z`).
pub fn decode_numeric(bytes: &[u8]) -> Option<f64> {
    if bytes.is_empty() || is_missing(bytes) {
        return None;
    }

    let mut buf = [0u8; 8];
    let len = bytes.len().min(8);
    buf[..len].copy_from_slice(&bytes[..len]);

    let negative = buf[0] & 0x80 != 0;
    let exponent = i32::from(buf[0] & 0x7f) - 64;
    let mantissa = buf[1..]
        .iter()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b));

    if mantissa == 0 {
        return Some(0.0);
    }

    // value = 0.mantissa (base 16) * 16^exponent, with a 56-bit mantissa
    let magnitude = mantissa as f64 / 2f64.powi(56) * 16f64.powi(exponent);
    Some(if negative { -magnitude } else { magnitude })
}

/// SAS missing values: first byte is `.`, `_` or `A`-`Z`, remaining bytes zero.
fn is_missing(bytes: &[u8]) -> bool {
    let first = bytes[0];
    let marker = first == b'.' || first == b'_' || first.is_ascii_uppercase();
    marker && bytes[1..].iter().all(|&b| b == 0)
}

/// Decode a blank-padded character cell. Bytes that are not valid UTF-8 are
/// decoded as Windows-1252. Blank cells are missing.
pub fn decode_character(bytes: &[u8]) -> Option<String> {
    let end = bytes
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |p| p + 1);
    let trimmed = &bytes[..end];
    if trimmed.is_empty() {
        return None;
    }

    let text = match std::str::from_utf8(trimmed) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(trimmed);
            decoded.into_owned()
        }
    };
    Some(text)
}

/// Decode `row_count` fixed-width observations into per-variable columns.
pub fn decode_observations(
    obs: &[u8],
    row_count: usize,
    obs_len: usize,
    variables: &[XptVariable],
) -> Vec<XptColumnValues> {
    variables
        .iter()
        .map(|var| {
            let cells = (0..row_count).map(|row| {
                let start = row * obs_len + var.position;
                &obs[start..start + var.length]
            });
            match var.var_type {
                XptType::Numeric => XptColumnValues::Numeric(cells.map(decode_numeric).collect()),
                XptType::Character => {
                    XptColumnValues::Character(cells.map(decode_character).collect())
                }
            }
        })
        .collect()
}

/// Build a Polars Series for a decoded column.
pub fn build_series(name: &str, values: XptColumnValues) -> Series {
    match values {
        XptColumnValues::Numeric(v) => {
            let ca: Float64Chunked = v.into_iter().collect();
            ca.with_name(name.into()).into_series()
        }
        XptColumnValues::Character(v) => {
            let ca: StringChunked = v.iter().map(|s| s.as_deref()).collect();
            ca.with_name(name.into()).into_series()
        }
    }
}

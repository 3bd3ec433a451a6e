//! Header record parsing for SAS transport (XPT v5) files.
//!
//! A transport file is a stream of 80-byte records:
//!
//! | Record | Contents                                       |
//! |--------|------------------------------------------------|
//! | 0      | LIBRARY header                                 |
//! | 1-2    | library creation / modification records        |
//! | 3      | MEMBER header (carries the NAMESTR length)     |
//! | 4      | DSCRPTR header                                 |
//! | 5-6    | member name, label and timestamps              |
//! | 7      | NAMESTR header (carries the variable count)    |
//! | ...    | NAMESTR records, padded to a record boundary   |
//! | ...    | OBS header, then fixed-width observations      |

use super::error::XptError;

pub const RECORD_LEN: usize = 80;

/// Standard NAMESTR length (VAX/VMS files use 136).
pub const NAMESTR_LEN: usize = 140;

pub const LIBRARY_PREFIX: &[u8; 48] = b"HEADER RECORD*******LIBRARY HEADER RECORD!!!!!!!";
pub const MEMBER_PREFIX: &[u8; 48] = b"HEADER RECORD*******MEMBER  HEADER RECORD!!!!!!!";
pub const DSCRPTR_PREFIX: &[u8; 48] = b"HEADER RECORD*******DSCRPTR HEADER RECORD!!!!!!!";
pub const NAMESTR_PREFIX: &[u8; 48] = b"HEADER RECORD*******NAMESTR HEADER RECORD!!!!!!!";
pub const OBS_PREFIX: &[u8; 48] = b"HEADER RECORD*******OBS     HEADER RECORD!!!!!!!";

/// Variable storage class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XptType {
    Numeric,
    Character,
}

/// One variable as described by its NAMESTR record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XptVariable {
    pub name: String,
    pub label: String,
    pub var_type: XptType,
    /// Width in bytes within an observation
    pub length: usize,
    /// Byte offset within an observation
    pub position: usize,
}

/// Borrow the 80-byte record at `offset`.
pub fn record(data: &[u8], offset: usize) -> Result<&[u8], XptError> {
    data.get(offset..offset + RECORD_LEN)
        .ok_or(XptError::Truncated { offset })
}

/// Check that the record at `offset` starts with `prefix`.
pub fn expect_header(
    data: &[u8],
    offset: usize,
    prefix: &[u8; 48],
    expected: &'static str,
) -> Result<(), XptError> {
    let rec = record(data, offset)?;
    if rec.starts_with(prefix) {
        Ok(())
    } else {
        Err(XptError::InvalidHeader { expected, offset })
    }
}

pub fn is_member_header(rec: &[u8]) -> bool {
    rec.starts_with(MEMBER_PREFIX)
}

/// Round `offset` up to the next record boundary.
pub fn align_to_record(offset: usize) -> usize {
    offset.div_ceil(RECORD_LEN) * RECORD_LEN
}

/// NAMESTR length declared in the MEMBER header (bytes 74..78).
pub fn parse_namestr_len(member_header: &[u8]) -> Result<usize, XptError> {
    let len = parse_decimal(&member_header[74..78], "MEMBER")?;
    if len == NAMESTR_LEN || len == 136 {
        Ok(len)
    } else {
        Err(XptError::InvalidNumberField {
            section: "MEMBER",
            value: len.to_string(),
        })
    }
}

/// Variable count declared in the NAMESTR header (bytes 54..58).
pub fn parse_variable_count(namestr_header: &[u8]) -> Result<usize, XptError> {
    parse_decimal(&namestr_header[54..58], "NAMESTR")
}

/// Dataset name from the first member data record (bytes 8..16).
pub fn parse_dataset_name(member_data: &[u8]) -> String {
    read_text(&member_data[8..16])
}

/// Parse `count` NAMESTR records of `namestr_len` bytes each.
pub fn parse_namestr_records(
    block: &[u8],
    count: usize,
    namestr_len: usize,
) -> Result<Vec<XptVariable>, XptError> {
    (0..count)
        .map(|index| {
            let start = index * namestr_len;
            let raw = block
                .get(start..start + namestr_len)
                .ok_or_else(|| XptError::InvalidNamestr {
                    index,
                    message: "descriptor block too short".to_string(),
                })?;
            parse_namestr(raw, index)
        })
        .collect()
}

/// Decode a single NAMESTR record.
///
/// Field offsets: `ntype` 0..2, `nlng` 4..6, `nname` 8..16, `nlabel` 16..56,
/// `npos` 84..88. All integers are big-endian.
fn parse_namestr(raw: &[u8], index: usize) -> Result<XptVariable, XptError> {
    let var_type = match read_i16(raw, 0) {
        1 => XptType::Numeric,
        2 => XptType::Character,
        other => {
            return Err(XptError::InvalidNamestr {
                index,
                message: format!("invalid variable type {}", other),
            })
        }
    };

    let length = read_i16(raw, 4);
    if length <= 0 {
        return Err(XptError::InvalidNamestr {
            index,
            message: format!("invalid variable length {}", length),
        });
    }
    if var_type == XptType::Numeric && !(2..=8).contains(&length) {
        return Err(XptError::InvalidNamestr {
            index,
            message: format!("numeric variable length {} outside 2..=8", length),
        });
    }

    let name = read_text(&raw[8..16]);
    if name.is_empty() {
        return Err(XptError::InvalidNamestr {
            index,
            message: "empty variable name".to_string(),
        });
    }

    let position = i32::from_be_bytes([raw[84], raw[85], raw[86], raw[87]]);
    if position < 0 {
        return Err(XptError::InvalidNamestr {
            index,
            message: format!("negative observation offset {}", position),
        });
    }

    Ok(XptVariable {
        name,
        label: read_text(&raw[16..56]),
        var_type,
        length: length as usize,
        position: position as usize,
    })
}

fn read_i16(raw: &[u8], offset: usize) -> i16 {
    i16::from_be_bytes([raw[offset], raw[offset + 1]])
}

fn read_text(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches([' ', '\0'])
        .to_string()
}

fn parse_decimal(raw: &[u8], section: &'static str) -> Result<usize, XptError> {
    let text = String::from_utf8_lossy(raw);
    text.trim()
        .parse::<usize>()
        .map_err(|_| XptError::InvalidNumberField {
            section,
            value: text.to_string(),
        })
}

//! Error types for SAS transport (XPT) decoding.

use std::fmt;

/// Errors that can occur when decoding a SAS transport file.
#[derive(Debug)]
pub enum XptError {
    /// A fixed header record does not carry the expected prefix.
    ///
    /// Transport files are a sequence of 80-byte records; the library, member,
    /// descriptor, NAMESTR and observation sections each start with a
    /// well-known header record.
    InvalidHeader {
        /// Which header was expected (e.g. "LIBRARY")
        expected: &'static str,
        /// Byte offset of the offending record
        offset: usize,
    },

    /// The file ends before a required record or block.
    Truncated {
        /// Byte offset where more data was required
        offset: usize,
    },

    /// A header field that should hold a decimal number does not.
    InvalidNumberField {
        /// Header section containing the field
        section: &'static str,
        /// Raw field contents
        value: String,
    },

    /// A variable descriptor (NAMESTR) is malformed.
    InvalidNamestr {
        /// Zero-based variable index
        index: usize,
        /// Detailed error message
        message: String,
    },

    /// I/O error occurred while reading the file.
    Io(std::io::Error),
}

impl fmt::Display for XptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XptError::InvalidHeader { expected, offset } => {
                write!(
                    f,
                    "Invalid transport file: expected {} header record at byte offset {}",
                    expected, offset
                )
            }
            XptError::Truncated { offset } => {
                write!(f, "Truncated transport file at byte offset {}", offset)
            }
            XptError::InvalidNumberField { section, value } => {
                write!(f, "Invalid numeric field '{}' in {} header", value, section)
            }
            XptError::InvalidNamestr { index, message } => {
                write!(f, "Invalid variable descriptor #{}: {}", index, message)
            }
            XptError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for XptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            XptError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for XptError {
    fn from(err: std::io::Error) -> Self {
        XptError::Io(err)
    }
}

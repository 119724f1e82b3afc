use thiserror::Error;

use edmcore::header::HeaderError;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum EdmError {
    #[error("header parse error: {0}")]
    HeaderParse(String),

    #[error("header checksum mismatch: expected {expected:02X}, actual {actual:02X}")]
    Checksum { expected: u8, actual: u8 },
}

impl From<HeaderError> for EdmError {
    fn from(err: HeaderError) -> Self {
        match err {
            HeaderError::Checksum { expected, actual } => EdmError::Checksum { expected, actual },
            other => EdmError::HeaderParse(other.to_string()),
        }
    }
}

use std::error::Error;
use std::fmt;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveErrorCode {
    Io,
    Truncated,
    OutOfRange,
    SignatureNotFound,
    InvalidStringLength,
    Decompress,
    InvalidChunkSize,
    UnknownObjectType,
    UnknownPropertyType,
    UnsupportedArrayElementType,
    UnsupportedTextHistory,
    EntityTableMismatch,
    EntityOverrun,
    CollectionNotFound,
    EntityNotFound,
    ArrayNotFound,
    ArrayLengthMismatch,
    ArrayByteLengthMismatch,
    PermutationInvalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveError {
    pub code: SaveErrorCode,
    pub message: String,
}

pub type Result<T> = std::result::Result<T, SaveError>;

impl SaveError {
    pub fn new(code: SaveErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn truncated(pos: usize, wanted: usize, len: usize) -> Self {
        Self::new(
            SaveErrorCode::Truncated,
            format!("wanted {wanted} bytes at pos={pos}, buffer length {len}"),
        )
    }
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl Error for SaveError {}

impl From<io::Error> for SaveError {
    fn from(e: io::Error) -> Self {
        Self::new(SaveErrorCode::Io, e.to_string())
    }
}

use thiserror::Error;

use crate::ObjectId;

/// Errors produced while tokenising PDF syntax and reconstructing the xref table.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid file header")]
    InvalidFileHeader,
    #[error("invalid dictionary")]
    InvalidDictionary,
    #[error("invalid object reference")]
    InvalidReference,
    #[error("invalid object stream")]
    InvalidObjectStream,
    #[error("invalid xref table")]
    InvalidXref,
    #[error("invalid trailer")]
    InvalidTrailer,
    #[error("{location}: spec violation rejected in strict mode")]
    SpecViolation { location: String },
    #[error("circular cross-reference chain detected at offset {0}")]
    CircularXRef(usize),
}

/// Errors specific to xref table reconstruction.
#[derive(Debug, Error)]
pub enum XrefError {
    #[error("could not locate startxref")]
    Start,
    #[error("invalid Prev offset in trailer chain")]
    PrevStart,
    #[error("invalid XRefStm offset in trailer chain")]
    StreamStart,
    #[error("xref stream W array malformed")]
    MalformedWidths,
    #[error("xref entry type {0} out of range")]
    InvalidEntryType(u8),
}

/// Errors produced by the filter (codec) pipeline.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("unsupported filter {0}")]
    UnsupportedFilter(String),
    #[error("unsupported predictor parameter {0}")]
    UnsupportedFilterParam(i64),
    #[error("flate decode error: {0}")]
    Flate(String),
    #[error("lzw decode error: {0}")]
    Lzw(String),
    #[error("ascii85 decode error: malformed input")]
    Ascii85,
    #[error("asciihex decode error: malformed input")]
    AsciiHex,
    #[error("runlength decode error: malformed input")]
    RunLength,
}

/// Errors from the security handler while authenticating or keying.
#[derive(Debug, Error)]
pub enum DecryptionError {
    #[error("encryption version/revision combination unsupported")]
    EncryptionUnsupported,
    #[error("password authentication failed")]
    AuthenticationFailed,
    #[error("document has not been authenticated")]
    NotAuthenticated,
    #[error("invalid ciphertext length for block cipher")]
    InvalidCiphertext,
    #[error("padding validation failed")]
    InvalidPadding,
}

/// Errors raised while emitting a document back to bytes.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("io error: {0}")]
    Io(String),
    #[error("dangling indirect reference to object {}.{}", .0.0, .0.1)]
    DanglingReference(ObjectId),
    #[error("security context installed but not ready to encrypt output")]
    EncryptionNotReady,
    #[error("write operation cancelled")]
    Cancelled,
}

/// Top level error type returned from the public API.
#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("xref error: {0}")]
    Xref(#[from] XrefError),
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),
    #[error("decryption error: {0}")]
    Decryption(#[from] DecryptionError),
    #[error("write error: {0}")]
    Write(#[from] WriteError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid password")]
    InvalidPassword,
    #[error("missing xref entry")]
    MissingXrefEntry,
    #[error("invalid offset {0}")]
    InvalidOffset(usize),
    #[error("invalid object type, expected {expected}")]
    Type { expected: &'static str },
    #[error("dictionary key not found: {0}")]
    DictKey(String),
    #[error("reference cycle detected at {}.{}", .0.0, .0.1)]
    ReferenceCycle(ObjectId),
    #[error("invalid page tree at {}.{}", .0.0, .0.1)]
    InvalidPageTree(ObjectId),
    #[error("page index {0} out of range")]
    PageNumberNotFound(u32),
    #[error("invalid stream: {0}")]
    InvalidStream(String),
    #[error("numeric cast error: {0}")]
    NumericCast(String),
    #[error("operation not implemented: {0}")]
    Unimplemented(&'static str),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

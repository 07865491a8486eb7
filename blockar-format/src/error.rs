use std::path::PathBuf;

use crate::path::IntoEntryPathError;

/// A header block that cannot be understood.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("header field `{field}` is not a decimal number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("zero block at offset {offset:#x} is not followed by a second terminator block")]
    BadTerminator { offset: u64 },
}

/// An entry that cannot be represented in a header block.
#[derive(Debug, thiserror::Error)]
pub enum HeaderError {
    #[error("value {value} does not fit in the {width}-byte `{field}` field")]
    FieldOverflow {
        field: &'static str,
        value: u64,
        width: usize,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("stream ended {read} bytes into a {expected}-byte read at offset {offset:#x}")]
    Truncated {
        offset: u64,
        read: usize,
        expected: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("cannot open source file `{}`", .path.display())]
    OpenSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read source file `{}`", .path.display())]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{}` is not a regular file", .path.display())]
    NotAFile { path: PathBuf },

    #[error("cannot archive path `{}`", .path.display())]
    InvalidPath {
        path: PathBuf,
        #[source]
        source: IntoEntryPathError,
    },

    #[error("`{name}` changed size while being archived: header says {expected} bytes, read {actual}")]
    SizeChanged {
        name: String,
        expected: u64,
        actual: u64,
    },

    #[error("cannot encode header for `{name}`")]
    Header {
        name: String,
        #[source]
        source: HeaderError,
    },

    #[error("cannot write archive")]
    Write(#[source] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("not an archive: expected signature {expected:02x?}, found {found:02x?}")]
    BadSignature { expected: [u8; 8], found: Vec<u8> },

    #[error("malformed header")]
    Format(#[from] FormatError),

    #[error("archive stream is truncated")]
    TruncatedStream(#[source] StreamError),

    #[error("incomplete archive: `{name}` is missing {remaining} of {size} bytes")]
    IncompleteArchive {
        name: String,
        size: u64,
        remaining: u64,
    },

    #[error("refusing to extract entry `{name}`")]
    UnsafePath {
        name: String,
        #[source]
        source: IntoEntryPathError,
    },

    #[error("cannot create directory `{}`", .path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot create file `{}`", .path.display())]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write content of `{name}`")]
    WriteFile {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read archive")]
    Read(#[source] std::io::Error),

    #[error("archive reader already failed")]
    Failed,
}

impl From<StreamError> for ExtractError {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Io(source) => ExtractError::Read(source),
            truncated => ExtractError::TruncatedStream(truncated),
        }
    }
}

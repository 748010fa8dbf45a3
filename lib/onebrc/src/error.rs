use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CalcError>;

#[derive(Debug, Error)]
pub enum CalcError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line that does not have the `key;value` shape. `byte_offset` is the absolute file
    /// offset of the first byte of the line, `range_index` the range that line starts in.
    #[error("malformed record in range {range_index} at byte {byte_offset}: {reason}")]
    Parse { range_index: usize, byte_offset: u64, reason: ParseFailure },

    #[error("boundary invariant broken at range {range_index}: {detail}")]
    BoundaryInvariant { range_index: usize, detail: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("scan cancelled after an earlier failure")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("missing ';' delimiter")]
    MissingDelimiter,
    #[error("empty value")]
    EmptyValue,
    #[error("value is not a one-decimal number")]
    InvalidNumber,
}

impl CalcError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self { Self::Io { path: path.into(), source } }

    pub fn parse(range_index: usize, byte_offset: u64, reason: ParseFailure) -> Self {
        Self::Parse { range_index, byte_offset, reason }
    }

    pub fn boundary(range_index: usize, detail: impl Into<String>) -> Self {
        Self::BoundaryInvariant { range_index, detail: detail.into() }
    }

    pub fn is_cancelled(&self) -> bool { matches!(self, Self::Cancelled) }
}

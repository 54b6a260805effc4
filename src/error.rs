//! Error taxonomy shared by every layer of the driver.
//!
//! One enum, `thiserror`-derived, rather than a per-module error type: the teacher
//! crate gives each layer its own `{Fat,Dir,File}Error`, but those only ever get
//! folded back into `BlockDeviceError` at the top anyway, and this driver is small
//! enough that the folding step buys nothing.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FatError {
    #[error("usage: fatmod IMAGE OPTION [ARGS...]")]
    ArgError,

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("short read at sector {sector}: got {got} of {expected} bytes")]
    ShortRead {
        sector: u64,
        got: usize,
        expected: usize,
    },

    #[error("short write at sector {sector}: wrote {wrote} of {expected} bytes")]
    ShortWrite {
        sector: u64,
        wrote: usize,
        expected: usize,
    },

    #[error("bad boot sector: {reason}")]
    BadBootSector { reason: &'static str },

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("File already exists: {0}")]
    Exists(String),

    #[error("No free directory entry found.")]
    Full,

    #[error("No free clusters available")]
    NoSpace,

    #[error("Offset exceeds file size. File size: {size} bytes")]
    OffsetBeyondEnd { size: u32 },
}

impl FatError {
    /// Whether this failure should end the process with a non-zero exit code.
    ///
    /// Matches §7/§6 of the spec: argument errors and a volume that fails to open
    /// at all are hard failures; everything a live command discovers about the
    /// file it was asked to operate on is a diagnostic with exit code 0.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FatError::ArgError | FatError::BadBootSector { .. })
    }
}

pub type Result<T> = std::result::Result<T, FatError>;

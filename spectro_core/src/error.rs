use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error surface of the conversion pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// The audio file is missing, corrupt, or in an unsupported format.
    #[error("cannot decode audio file {path:?}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// Resampler construction or processing failure.
    #[error("resampling failed: {0}")]
    Resample(String),

    /// The image could not be encoded or written to the target path.
    #[error("cannot write image {path:?}: {reason}")]
    Write { path: PathBuf, reason: String },

    /// The input directory holds no regular files.
    #[error("no files to convert in {0:?}")]
    EmptyInputDir(PathBuf),

    /// Filesystem failure outside of decode/encode (directory listing, mkdir).
    #[error("I/O error on {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Convenience alias so callers can write `Result<T>` instead of `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

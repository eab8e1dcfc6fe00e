mod archive;
mod bin;
mod builder;
pub mod ext;

pub use archive::*;
pub use bin::*;
pub use builder::*;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

const COPY_BUF_SIZE: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to open archive: {}", .path.display())]
    ArchiveOpen {
        path: PathBuf,
        source: io::Error,
    },

    #[error("{}: {}", .reason, .path.display())]
    Io {
        reason: String,
        path: PathBuf,
        source: io::Error,
    },

    #[error("Malformed header at offset {offset}: {source}")]
    MalformedHeader {
        offset: u64,
        source: wpress_core::Error,
    },

    #[error("Invalid path component {} in entry {}", .component.display(), .entry.display())]
    InvalidPath {
        entry: PathBuf,
        component: PathBuf,
    },

    #[error("Entry name is not valid UTF-8: {name}")]
    NonUtf8Name {
        name: String,
    },

    #[error("Archive ended inside a header record at offset {offset}: {read} bytes")]
    TruncatedHeader {
        offset: u64,
        read: usize,
    },

    #[error("Archive ended inside entry {}: {copied} of {expected} bytes", .entry.display())]
    TruncatedPayload {
        entry: PathBuf,
        expected: u64,
        copied: u64,
    },

    #[error(transparent)]
    Core(#[from] wpress_core::Error),
}

impl Error {
    pub(crate) fn io(reason: &str, path: impl AsRef<Path>, source: io::Error) -> Error {
        Error::Io {
            reason: reason.to_string(),
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Attach a path to an I/O error that was raised without one. Calling
    /// `path()` on an error that already carries a path keeps the original.
    pub(crate) fn path(self, path: impl AsRef<Path>) -> Error {
        match self {
            Error::Io {
                reason,
                path: old,
                source,
            } if old.as_os_str().is_empty() => Error::Io {
                reason,
                path: path.as_ref().to_path_buf(),
                source,
            },
            other => other,
        }
    }
}

//! Error types shared by every pseudo-file parser
//!
//! Three things can go wrong when reading a pseudo-file: the kernel refuses
//! to hand us its contents, a line does not have the structure that the
//! parser expects, or a single token cannot be converted into the value that
//! it is supposed to hold. Each of these gets its own variant, carrying the
//! raw text that caused the trouble so that kernel format surprises can be
//! diagnosed from the error message alone.

use std::io;
use std::path::PathBuf;
use thiserror::Error;


/// Result type alias for pseudo-file parsing operations
pub type Result<T> = std::result::Result<T, Error>;


/// Everything that can go wrong while parsing a pseudo-file
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Opening, reading or stat-ing a file failed
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        /// Path that was being accessed (relative to its base directory)
        path: PathBuf,

        /// Underlying system error
        #[source]
        source: io::Error,
    },

    /// A line does not follow the structural contract of its parser
    #[error("corrupted line ({reason}): '{line}'")]
    CorruptedLine {
        /// What is wrong with the line
        reason: &'static str,

        /// The raw offending text
        line: String,
    },

    /// A token could not be converted into the requested value
    #[error("malformed value '{token}', expected {expected}")]
    MalformedValue {
        /// The raw offending token
        token: String,

        /// What the token was supposed to be
        expected: &'static str,
    },
}
//
impl Error {
    /// Build an I/O error associated with a certain path
    pub fn io<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a structural line error
    pub fn corrupted<S: Into<String>>(reason: &'static str, line: S) -> Self {
        Error::CorruptedLine {
            reason,
            line: line.into(),
        }
    }

    /// Build a value conversion error
    pub fn malformed<S: Into<String>>(token: S, expected: &'static str) -> Self {
        Error::MalformedValue {
            token: token.into(),
            expected,
        }
    }
}

//! Parsing engine for Linux pseudo-files
//!
//! The /proc and /sys pseudo-filesystems present kernel state as small text
//! files, re-rendered on every read, with layouts that vary from file to file
//! and from kernel version to kernel version: key-value lists, column tables,
//! hex-encoded addresses... This crate provides the generic machinery that
//! turns these files into typed records:
//!
//! - `parsers::file::KeyValueParser` dispatches the lines of key-value files
//!   to per-key handlers.
//! - `parsers::lines::LineParser` decodes the lines of column tables into
//!   collections of elements.
//! - `splitter`, `number` and `net` provide the text-to-value primitives used
//!   by record parsers.
//! - `reader` and `dir` provide directory-relative, leak-free access to files
//!   and directory listings.
//!
//! Knowledge of specific file formats lives in the handler tables and line
//! decoders supplied by the users of this crate, not here.
//!
//! Everything is synchronous, since pseudo-files are generated on the host CPU
//! and never block for long. Every parse opens its own descriptors and closes
//! them before returning, whether it succeeded or not.

pub mod dir;
pub mod error;
pub mod net;
pub mod number;
pub mod parsers;
pub mod reader;
pub mod splitter;

pub use crate::error::{Error, Result};
pub use crate::number::{to_number, Base};
pub use crate::parsers::{FilterAction, HandlerTable, KeyValueParser, LineParser,
                         ParseRecord};
pub use crate::reader::{BaseDir, Root};

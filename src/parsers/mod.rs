//! Generic pseudo-file parsers
//!
//! The textual data from a pseudo-file is not exploitable right after it has
//! been fetched from the kernel. It must be parsed back into usable values
//! first. By nature, this operation is specific to a given file format, but
//! almost every format in /proc and /sys is one of two kinds:
//!
//! - Key-value files (e.g. /proc/[pid]/status, /proc/meminfo), where each line
//!   holds a named field. These are handled by the `file` module's
//!   KeyValueParser, which dispatches each line to a handler chosen by key.
//! - Column tables (e.g. /proc/net/tcp, /proc/diskstats), where each line is a
//!   record whose meaning depends on the position of its columns. These are
//!   handled by the `lines` module's LineParser, which decodes every line into
//!   one element of an output collection.
//!
//! A concrete record parser is thus nothing more than a configuration of one
//! of these engines.

pub mod file;
pub mod lines;

use crate::error::Result;
use crate::reader::BaseDir;
use std::path::Path;

pub use self::file::{HandlerTable, KeyRemap, KeyValueParser, ValueHandler};
pub use self::lines::{FilterAction, LineParser};


/// Interface shared by every pseudo-file parser
///
/// This lets code which locates pseudo-files (e.g. under a procfs root) stay
/// generic over the parser that will make sense of them.
///
pub trait ParseRecord {
    /// What one parsed file turns into
    type Output;

    /// Parse the file at `path`, resolved relative to `base`
    fn parse_record(&self, base: BaseDir, path: &Path) -> Result<Self::Output>;
}

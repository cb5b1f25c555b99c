//! Key-value pseudo-file parser
//!
//! Most pseudo-files which describe a single object are lists of named fields,
//! one per line, with the name separated from the value by a delimiter:
//!
//! ```text
//! Name:   bash
//! Pid:    4242
//! Groups:
//! VmRSS:      3412 kB
//! ```
//!
//! The KeyValueParser reads such a file line by line, and hands the value of
//! every line whose key it knows about to a handler, which stores it into the
//! output record. Keys that no handler asked for are skipped, because the
//! kernel adds new fields over time and older parsers must keep working. For
//! the same reason, empty values are perfectly legal.

use super::ParseRecord;
use crate::error::{Error, Result};
use crate::reader::{BaseDir, LineReader};
use crate::splitter::{ltrim, rtrim, split_once};
use std::collections::{BTreeSet, HashMap};
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, trace};


/// Delimiter between keys and values, unless told otherwise
pub const DEFAULT_DELIMITER: char = ':';


/// Something that can store the value of a key-value line into a record
///
/// Any `Fn(&str, &mut O) -> Result<()>` closure qualifies. Handlers must be
/// thread-safe so that a handler table can be stored in a static and shared.
///
pub trait ValueHandler<O>: Send + Sync {
    /// Parse `value` and store the result into `output`
    fn handle(&self, value: &str, output: &mut O) -> Result<()>;
}
//
impl<O, F> ValueHandler<O> for F
    where F: Fn(&str, &mut O) -> Result<()> + Send + Sync
{
    fn handle(&self, value: &str, output: &mut O) -> Result<()> {
        self(value, output)
    }
}


/// Mapping from canonical key names to value handlers
pub struct HandlerTable<O> {
    handlers: HashMap<String, Box<dyn ValueHandler<O>>>,
}
//
impl<O> HandlerTable<O> {
    /// Create an empty handler table
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Builder-style registration of a closure handler
    pub fn with<F>(mut self, key: &str, handler: F) -> Self
        where F: Fn(&str, &mut O) -> Result<()> + Send + Sync + 'static
    {
        self.insert(key, handler);
        self
    }

    /// Register a handler for a key, replacing any previous one
    pub fn insert<H>(&mut self, key: &str, handler: H)
        where H: ValueHandler<O> + 'static
    {
        self.handlers.insert(key.to_owned(), Box::new(handler));
    }

    /// Look up the handler associated with a key
    pub fn get(&self, key: &str) -> Option<&dyn ValueHandler<O>> {
        self.handlers.get(key).map(|handler| handler.as_ref())
    }

    /// Number of registered keys
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Truth that no key is registered
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
//
impl<O> Default for HandlerTable<O> {
    fn default() -> Self {
        Self::new()
    }
}


/// Function normalizing keys in place before handler lookup, so that several
/// spellings of a key can share one handler
pub type KeyRemap = fn(&mut String);


/// Parser for key-value pseudo-files
///
/// The parser borrows its handler table, which thus outlives every parse.
/// Parsing carries no state from one call to the next.
///
pub struct KeyValueParser<'t, O> {
    /// Separator between keys and values
    delimiter: char,

    /// Handlers for the keys that we care about
    handlers: &'t HandlerTable<O>,

    /// Optional key normalization
    key_remap: Option<KeyRemap>,
}
//
impl<'t, O: Default> KeyValueParser<'t, O> {
    /// Set up a parser using the default ':' delimiter and no key remapping
    pub fn new(handlers: &'t HandlerTable<O>) -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            handlers,
            key_remap: None,
        }
    }

    /// Use a different key-value delimiter
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Normalize keys before looking up their handler
    pub fn key_remap(mut self, remap: KeyRemap) -> Self {
        self.key_remap = Some(remap);
        self
    }

    /// Parse a file, relative to the current working directory
    pub fn parse<P: AsRef<Path>>(&self, path: P) -> Result<O> {
        self.parse_at(BaseDir::cwd(), path)
    }

    /// Parse a file, relative to a base directory
    pub fn parse_at<P: AsRef<Path>>(&self, base: BaseDir, path: P) -> Result<O> {
        self.parse_keys_at(base, path, &BTreeSet::new())
    }

    /// Parse a file, but only feed the handlers of a subset of keys
    ///
    /// An empty key set means that every known key is handled.
    ///
    pub fn parse_keys_at<P: AsRef<Path>>(&self,
                                         base: BaseDir,
                                         path: P,
                                         keys: &BTreeSet<&str>) -> Result<O> {
        let mut lines = LineReader::open_at(base, path)?;
        self.parse_lines(&mut lines, keys)
    }

    /// Parse text coming from an arbitrary buffered source
    pub fn parse_reader<R: BufRead>(&self,
                                    reader: R,
                                    keys: &BTreeSet<&str>) -> Result<O> {
        self.parse_lines(&mut LineReader::from_reader(reader), keys)
    }

    /// Run the parser on every line of the input
    fn parse_lines<R: BufRead>(&self,
                               lines: &mut LineReader<R>,
                               keys: &BTreeSet<&str>) -> Result<O> {
        let mut output = O::default();
        let mut line_count = 0usize;
        let mut handled_count = 0usize;

        while let Some(line) = lines.next_line()? {
            line_count += 1;

            let (mut key, mut value) = split_once(line, self.delimiter);
            if key.is_empty() {
                let error = Error::corrupted("missing key", line);
                debug!("Missing key in line {} of {}",
                       line_count, lines.path().display());
                return Err(error);
            }

            rtrim(&mut key);
            if let Some(remap) = self.key_remap {
                remap(&mut key);
            }

            // If the caller asked for specific keys, skip the others
            if !keys.is_empty() && !keys.contains(key.as_str()) {
                continue;
            }

            match self.handlers.get(&key) {
                Some(handler) => {
                    ltrim(&mut value);
                    if let Err(error) = handler.handle(&value, &mut output) {
                        debug!("Failed to handle key {:?} in line {} of {}: {}",
                               key, line_count, lines.path().display(), error);
                        return Err(error);
                    }
                    handled_count += 1;
                },
                None => trace!("Ignoring unknown key {:?}", key),
            }
        }

        debug!("Parsed {}: {} lines, {} handled",
               lines.path().display(), line_count, handled_count);
        Ok(output)
    }
}
//
impl<'t, O: Default> ParseRecord for KeyValueParser<'t, O> {
    type Output = O;

    fn parse_record(&self, base: BaseDir, path: &Path) -> Result<O> {
        self.parse_at(base, path)
    }
}

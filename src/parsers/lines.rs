//! Line-collection pseudo-file parser
//!
//! Tables such as /proc/net/tcp, /proc/diskstats or /proc/[pid]/maps hold one
//! record per line, whose fields are identified by their position rather than
//! by a key. The LineParser decodes every such line into one element of an
//! output collection, after optionally skipping header lines, and lets a
//! filter discard the elements that the caller is not interested in.

use super::ParseRecord;
use crate::error::Result;
use crate::reader::{BaseDir, LineReader};
use std::io::BufRead;
use std::iter;
use std::path::Path;
use tracing::{debug, trace};


/// Verdict of a LineParser filter on a decoded element
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FilterAction {
    Keep,
    Drop,
}


/// Parser for line-oriented pseudo-files
pub struct LineParser<'a, T> {
    /// Turns one line into one element
    decoder: Box<dyn Fn(&str) -> Result<T> + 'a>,

    /// Tells which decoded elements should be kept
    filter: Option<Box<dyn Fn(&T) -> FilterAction + 'a>>,

    /// Number of leading lines to ignore (e.g. table headers)
    lines_to_skip: usize,
}
//
impl<'a, T> LineParser<'a, T> {
    /// Set up a parser which decodes every line and keeps everything
    pub fn new<D>(decoder: D) -> Self
        where D: Fn(&str) -> Result<T> + 'a
    {
        Self {
            decoder: Box::new(decoder),
            filter: None,
            lines_to_skip: 0,
        }
    }

    /// Only keep the elements for which `filter` says so
    pub fn filter<F>(mut self, filter: F) -> Self
        where F: Fn(&T) -> FilterAction + 'a
    {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Ignore the first `count` lines of the file
    pub fn skip_lines(mut self, count: usize) -> Self {
        self.lines_to_skip = count;
        self
    }

    /// Parse a file relative to the current working directory into a Vec
    pub fn parse<P: AsRef<Path>>(&self, path: P) -> Result<Vec<T>> {
        self.parse_at(BaseDir::cwd(), path)
    }

    /// Parse a file relative to a base directory into a Vec
    pub fn parse_at<P: AsRef<Path>>(&self, base: BaseDir, path: P) -> Result<Vec<T>> {
        let mut output = Vec::new();
        self.parse_into(base, path, &mut output)?;
        Ok(output)
    }

    /// Parse a file relative to a base directory, appending the elements to
    /// a caller-provided collection, and tell how many were appended
    pub fn parse_into<P, C>(&self, base: BaseDir, path: P, output: &mut C) -> Result<usize>
        where P: AsRef<Path>,
              C: Extend<T>
    {
        let mut lines = LineReader::open_at(base, path)?;
        self.parse_lines(&mut lines, output)
    }

    /// Parse text coming from an arbitrary buffered source
    pub fn parse_reader<R, C>(&self, reader: R, output: &mut C) -> Result<usize>
        where R: BufRead,
              C: Extend<T>
    {
        self.parse_lines(&mut LineReader::from_reader(reader), output)
    }

    /// Run the parser on every line of the input
    fn parse_lines<R, C>(&self, lines: &mut LineReader<R>, output: &mut C) -> Result<usize>
        where R: BufRead,
              C: Extend<T>
    {
        let mut line_index = 0usize;
        let mut inserted = 0usize;

        while let Some(line) = lines.next_line()? {
            // Header lines count even when they are empty
            let current_index = line_index;
            line_index += 1;
            if current_index < self.lines_to_skip || line.is_empty() {
                continue;
            }

            let element = match (self.decoder)(line) {
                Ok(element) => element,
                Err(error) => {
                    debug!("Failed to decode line {} of {}: {}",
                           current_index, lines.path().display(), error);
                    return Err(error);
                },
            };
            if let Some(ref filter) = self.filter {
                if filter(&element) != FilterAction::Keep {
                    trace!("Filtered out line {}", current_index);
                    continue;
                }
            }

            output.extend(iter::once(element));
            inserted += 1;
        }

        debug!("Parsed {}: {} lines, {} elements kept",
               lines.path().display(), line_index, inserted);
        Ok(inserted)
    }
}
//
impl<'a, T> ParseRecord for LineParser<'a, T> {
    type Output = Vec<T>;

    fn parse_record(&self, base: BaseDir, path: &Path) -> Result<Vec<T>> {
        self.parse_at(base, path)
    }
}

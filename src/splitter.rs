//! Text splitting and trimming primitives for pseudo-file contents
//!
//! The metadata provided by pseudo-files is mostly organized as lines of text
//! that are cut into fields by a single delimiter character: colons for the
//! key-value files of procfs (e.g. /proc/self/status), commas for sysfs CPU
//! lists, spaces for column tables... The primitives in this module are the
//! building blocks which every record parser uses to take those lines apart.
//!
//! Unlike the standard `str::split`, our splitter knows about the kernel's
//! habit of terminating lists with a delimiter, and can be told whether the
//! empty tokens that arise from consecutive delimiters are meaningful.

/// Separator used when building directory prefixes
const DIR_SEPARATOR: char = '/';


/// Whitespace, as understood by the C locale's isspace()
///
/// This differs from Rust's ASCII whitespace in that vertical tabs count.
#[inline]
fn is_space(c: char) -> bool {
    c.is_ascii_whitespace() || c == '\x0b'
}


/// Split a buffer into all of its delimiter-separated tokens
///
/// A trailing delimiter never produces a final empty token. Empty tokens
/// arising from consecutive (or leading) delimiters are only reported if
/// `keep_empty` is set. Splitting the empty string yields nothing.
///
pub fn split(buffer: &str, delim: char, keep_empty: bool) -> Vec<String> {
    let mut tokens: Vec<&str> = buffer.split(delim).collect();

    // Whatever follows the last delimiter only counts if it isn't empty
    if tokens.last() == Some(&"") {
        tokens.pop();
    }

    tokens.into_iter()
          .filter(|token| keep_empty || !token.is_empty())
          .map(str::to_owned)
          .collect()
}


/// Split a buffer around the first occurence of a delimiter
///
/// If the delimiter is absent, the whole buffer is returned on the left-hand
/// side and the right-hand side is empty.
///
pub fn split_once(buffer: &str, delim: char) -> (String, String) {
    match buffer.split_once(delim) {
        Some((left, right)) => (left.to_owned(), right.to_owned()),
        None => (buffer.to_owned(), String::new()),
    }
}


/// Remove leading whitespace in place
pub fn ltrim(text: &mut String) {
    let start = text.len() - text.trim_start_matches(is_space).len();
    text.drain(..start);
}

/// Remove trailing whitespace in place
pub fn rtrim(text: &mut String) {
    let end = text.trim_end_matches(is_space).len();
    text.truncate(end);
}

/// Remove leading and trailing whitespace in place
pub fn trim(text: &mut String) {
    rtrim(text);
    ltrim(text);
}


/// Make sure that a directory path ends with a separator, so that file names
/// can be appended to it directly
pub fn ensure_dir_terminator(dir_path: &mut String) {
    if !dir_path.ends_with(DIR_SEPARATOR) {
        dir_path.push(DIR_SEPARATOR);
    }
}


/// Unit tests
#[cfg(test)]
mod tests {
    use super::*;

    /// Check single splits, with and without the delimiter
    #[test]
    fn split_once_behaviour() {
        assert_eq!(split_once("a:b", ':'), ("a".to_owned(), "b".to_owned()));
        assert_eq!(split_once("a", ':'), ("a".to_owned(), String::new()));
        assert_eq!(split_once(":42", ':'), (String::new(), "42".to_owned()));
        assert_eq!(split_once("Foo:", ':'), ("Foo".to_owned(), String::new()));

        // Only the first delimiter matters
        assert_eq!(split_once("a:b:c", ':'),
                   ("a".to_owned(), "b:c".to_owned()));
    }

    /// Check full splits and their handling of empty tokens
    #[test]
    fn split_behaviour() {
        let empty: Vec<String> = Vec::new();

        // Empty input yields nothing, whatever the policy
        assert_eq!(split("", ',', false), empty);
        assert_eq!(split("", ',', true), empty);

        // Internal empty tokens are only kept on request
        assert_eq!(split("a,,b", ',', false), vec!["a", "b"]);
        assert_eq!(split("a,,b", ',', true), vec!["a", "", "b"]);

        // A trailing delimiter never produces a final empty token
        assert_eq!(split("a,b,", ',', false), vec!["a", "b"]);
        assert_eq!(split("a,b,", ',', true), vec!["a", "b"]);

        // But a leading one does, when empty tokens are kept
        assert_eq!(split(",a", ',', true), vec!["", "a"]);
        assert_eq!(split(",a", ',', false), vec!["a"]);

        // Only delimiters
        assert_eq!(split(",,", ',', true), vec!["", ""]);
        assert_eq!(split(",,", ',', false), empty);

        // No delimiter at all
        assert_eq!(split("0-3", ',', false), vec!["0-3"]);
    }

    /// Check in-place trimming
    #[test]
    fn trimming() {
        let mut left = String::from(" \t 42 kB \n");
        ltrim(&mut left);
        assert_eq!(left, "42 kB \n");

        let mut right = String::from(" \t 42 kB \n");
        rtrim(&mut right);
        assert_eq!(right, " \t 42 kB");

        let mut both = String::from("\x0b 42 kB \x0b");
        trim(&mut both);
        assert_eq!(both, "42 kB");

        let mut blank = String::from(" \t\n ");
        trim(&mut blank);
        assert_eq!(blank, "");
    }

    /// Check directory prefix construction
    #[test]
    fn dir_terminator() {
        let mut bare = String::from("/sys/block/sda");
        ensure_dir_terminator(&mut bare);
        assert_eq!(bare, "/sys/block/sda/");

        let mut terminated = String::from("/proc/");
        ensure_dir_terminator(&mut terminated);
        assert_eq!(terminated, "/proc/");
    }
}

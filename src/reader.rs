//! Scoped, directory-relative access to pseudo-files
//!
//! Linux pseudo-files, such as those from /proc and /sys, have a number of
//! special characteristics that are best accounted for through a dedicated
//! abstraction:
//!
//! - They are small (a few kB at most), so it is best to read them in one go
//!   or line by line through a single reused buffer.
//! - They do not live on hardware devices, but are generated on the host CPU.
//!   So there is no benefit in reading them asynchronously, and no transient
//!   I/O error that retrying would fix.
//! - They almost exclusively contain ASCII-encoded text. The exceptions are
//!   user-controlled strings (process names, mapped file paths...), which can
//!   hold arbitrary bytes and are decoded lossily rather than rejected.
//! - Their format is part of the kernel ABI, and is thus expected to only be
//!   modified through backwards-compatible extensions.
//!
//! Every access goes through openat(2) relative to a base directory, which
//! defaults to the current working directory. Opening a `Root` on a recorded
//! snapshot of /proc and passing its `BaseDir` around is how the same parsers
//! get pointed at something other than the live kernel.
//!
//! Descriptors are always owned by a value whose destructor releases them, so
//! nothing leaks when a parser bails out halfway through a file.

use crate::error::{Error, Result};
use std::ffi::{CString, OsString};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::os::unix::io::{AsRawFd, FromRawFd, RawFd};
use std::path::{Path, PathBuf};


/// Reasonable byte cap for `read_file`: one page, which is what the kernel
/// produces in a single read for most single-value pseudo-files
pub const DEFAULT_READ_CAP: usize = 4096;

const NEWLINE: char = '\n';


/// Directory against which relative paths are resolved
///
/// This is either the current working directory or a directory held open by
/// a `Root`, which the borrow checker keeps alive for as long as the BaseDir
/// is in use.
///
#[derive(Clone, Copy, Debug)]
pub struct BaseDir<'root> {
    /// Descriptor handed to the *at() family of system calls
    fd: RawFd,

    /// Ties the descriptor to the lifetime of its owner
    _root: PhantomData<&'root Root>,
}
//
impl BaseDir<'static> {
    /// Resolve paths relative to the current working directory
    pub fn cwd() -> Self {
        Self {
            fd: libc::AT_FDCWD,
            _root: PhantomData,
        }
    }
}
//
impl<'root> BaseDir<'root> {
    /// Raw descriptor, for use in system calls
    pub(crate) fn raw(self) -> RawFd {
        self.fd
    }
}
//
impl Default for BaseDir<'static> {
    fn default() -> Self {
        Self::cwd()
    }
}


/// A directory held open to serve as the base of relative paths
///
/// The descriptor is closed when the Root is dropped.
///
#[derive(Debug)]
pub struct Root {
    /// Open handle to the directory
    dir: File,

    /// Path which was used to open the directory
    path: PathBuf,
}
//
impl Root {
    /// Open a directory, making sure that it actually is one
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let dir = open_at(BaseDir::cwd(), path)?;

        let metadata = dir.metadata().map_err(|e| Error::io(path, e))?;
        if !metadata.is_dir() {
            return Err(Error::io(path,
                                 io::Error::from_raw_os_error(libc::ENOTDIR)));
        }

        Ok(
            Self {
                dir,
                path: path.to_owned(),
            }
        )
    }

    /// Base directory handle resolving paths relative to this root
    pub fn base(&self) -> BaseDir<'_> {
        BaseDir {
            fd: self.dir.as_raw_fd(),
            _root: PhantomData,
        }
    }

    /// Path that this root was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }
}


/// Convert a path into the NUL-terminated form expected by libc
pub(crate) fn c_path(path: &Path) -> Result<CString> {
    CString::new(path.as_os_str().as_bytes())
           .map_err(|e| Error::io(path,
                                  io::Error::new(io::ErrorKind::InvalidInput, e)))
}


/// Open a file for reading, relative to a base directory
///
/// Absolute paths ignore the base directory, as with openat(2).
///
pub fn open_at<P: AsRef<Path>>(base: BaseDir, path: P) -> Result<File> {
    let path = path.as_ref();
    let c_path = c_path(path)?;

    let fd = unsafe {
        libc::openat(base.raw(), c_path.as_ptr(), libc::O_RDONLY | libc::O_CLOEXEC)
    };
    if fd < 0 {
        return Err(Error::io(path, io::Error::last_os_error()));
    }

    // The File takes ownership of the descriptor and closes it on drop
    Ok(unsafe { File::from_raw_fd(fd) })
}


/// Line-oriented reader for pseudo-files
///
/// Lines are read one at a time into buffers that are reused across calls,
/// and handed out with their trailing newline stripped. Invalid UTF-8 is
/// replaced with U+FFFD instead of failing the read.
///
pub struct LineReader<R> {
    /// Buffered source of text
    reader: R,

    /// Raw bytes of the current line
    raw_buffer: Vec<u8>,

    /// Decoded text of the current line
    line_buffer: String,

    /// Where the text comes from, for error reporting
    path: PathBuf,
}
//
impl LineReader<BufReader<File>> {
    /// Open a pseudo-file for line-by-line reading
    pub fn open_at<P: AsRef<Path>>(base: BaseDir, path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = open_at(base, path)?;
        Ok(
            Self {
                reader: BufReader::new(file),
                raw_buffer: Vec::new(),
                line_buffer: String::new(),
                path: path.to_owned(),
            }
        )
    }
}
//
impl<R: BufRead> LineReader<R> {
    /// Read lines from an arbitrary buffered source (e.g. an in-memory copy
    /// of a pseudo-file)
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            raw_buffer: Vec::new(),
            line_buffer: String::new(),
            path: PathBuf::new(),
        }
    }

    /// Fetch the next line, without its trailing newline, or None at the end
    /// of the input
    pub fn next_line(&mut self) -> Result<Option<&str>> {
        self.raw_buffer.clear();
        let bytes_read = self.reader.read_until(NEWLINE as u8, &mut self.raw_buffer)
                                    .map_err(|e| Error::io(&self.path, e))?;
        if bytes_read == 0 {
            return Ok(None);
        }

        if self.raw_buffer.last() == Some(&(NEWLINE as u8)) {
            self.raw_buffer.pop();
        }
        self.line_buffer.clear();
        self.line_buffer.push_str(&String::from_utf8_lossy(&self.raw_buffer));
        Ok(Some(self.line_buffer.as_str()))
    }

    /// Where the lines come from
    pub fn path(&self) -> &Path {
        &self.path
    }
}


/// Read the first line of a file, without its trailing newline
///
/// Fails if the file is empty.
///
pub fn read_line<P: AsRef<Path>>(base: BaseDir, path: P) -> Result<String> {
    let path = path.as_ref();
    let mut lines = LineReader::open_at(base, path)?;
    match lines.next_line()? {
        Some(line) => Ok(line.to_owned()),
        None => Err(Error::io(path,
                              io::Error::new(io::ErrorKind::UnexpectedEof,
                                             "empty file"))),
    }
}


/// Read up to `max_bytes` of a file in a single read(2)
///
/// There is no retry loop on short reads: pseudo-files are generated in one
/// go by the kernel for the sizes that we are interested in. If requested,
/// a single trailing newline is removed. Invalid UTF-8 is replaced with
/// U+FFFD.
///
pub fn read_file<P: AsRef<Path>>(base: BaseDir,
                                 path: P,
                                 max_bytes: usize,
                                 trim_newline: bool) -> Result<String> {
    let path = path.as_ref();
    let mut file = open_at(base, path)?;

    let mut buffer = vec![0u8; max_bytes];
    let bytes_read = file.read(&mut buffer).map_err(|e| Error::io(path, e))?;
    buffer.truncate(bytes_read);

    if trim_newline && buffer.last() == Some(&(NEWLINE as u8)) {
        buffer.pop();
    }

    Ok(String::from_utf8_lossy(&buffer).into_owned())
}


/// Read the target of a symbolic link (e.g. /proc/self or /proc/[pid]/exe)
pub fn read_link<P: AsRef<Path>>(base: BaseDir, path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    let c_path = c_path(path)?;

    // Room for the longest possible path and a NUL terminator
    let mut buffer = vec![0u8; libc::PATH_MAX as usize + 1];
    let len = unsafe {
        libc::readlinkat(base.raw(),
                         c_path.as_ptr(),
                         buffer.as_mut_ptr() as *mut libc::c_char,
                         buffer.len())
    };
    if len < 0 {
        return Err(Error::io(path, io::Error::last_os_error()));
    }

    buffer.truncate(len as usize);
    Ok(PathBuf::from(OsString::from_vec(buffer)))
}


/// Query the inode number of a file (e.g. to identify a namespace or socket)
pub fn get_inode<P: AsRef<Path>>(base: BaseDir, path: P) -> Result<u64> {
    let path = path.as_ref();
    let c_path = c_path(path)?;

    let mut stat = MaybeUninit::<libc::stat>::uninit();
    let rv = unsafe {
        libc::fstatat(base.raw(), c_path.as_ptr(), stat.as_mut_ptr(), 0)
    };
    if rv != 0 {
        return Err(Error::io(path, io::Error::last_os_error()));
    }

    let stat = unsafe { stat.assume_init() };
    Ok(stat.st_ino as u64)
}


/// Unit tests
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use std::os::unix::fs::{symlink, MetadataExt};
    use tempfile::TempDir;

    /// Build a scratch directory holding a few files
    fn scratch_dir() -> TempDir {
        let dir = tempfile::tempdir().expect("Failed to create scratch dir");
        fs::write(dir.path().join("lines"), "first\n\nthird\n\n")
           .expect("Failed to write lines");
        fs::write(dir.path().join("digits"), "0123456789\n\n")
           .expect("Failed to write digits");
        fs::write(dir.path().join("empty"), "").expect("Failed to write empty");
        fs::write(dir.path().join("comm"), b"ab\xffcd\n")
           .expect("Failed to write comm");
        symlink("digits", dir.path().join("link"))
               .expect("Failed to create link");
        dir
    }

    /// Check that opening a live pseudo-file works as expected
    #[test]
    fn open_live_file() {
        let uptime = read_line(BaseDir::cwd(), "/proc/uptime")
                              .expect("Should be able to read /proc/uptime");
        assert!(!uptime.is_empty());
        assert!(!uptime.ends_with('\n'));
    }

    /// Check line reading, from files and from memory
    #[test]
    fn line_reader() {
        let mut lines =
            LineReader::from_reader(Cursor::new("a\n\nb\n\nc"));
        assert_eq!(lines.next_line().unwrap(), Some("a"));
        assert_eq!(lines.next_line().unwrap(), Some(""));
        assert_eq!(lines.next_line().unwrap(), Some("b"));
        assert_eq!(lines.next_line().unwrap(), Some(""));
        assert_eq!(lines.next_line().unwrap(), Some("c"));
        assert_eq!(lines.next_line().unwrap(), None);

        let dir = scratch_dir();
        let root = Root::open(dir.path()).unwrap();
        let mut file_lines = LineReader::open_at(root.base(), "lines").unwrap();
        assert_eq!(file_lines.path(), Path::new("lines"));
        assert_eq!(file_lines.next_line().unwrap(), Some("first"));
        assert_eq!(file_lines.next_line().unwrap(), Some(""));
        assert_eq!(file_lines.next_line().unwrap(), Some("third"));
    }

    /// Bytes which are not UTF-8 get replaced, and the following lines are
    /// still readable
    #[test]
    fn invalid_utf8() {
        let mut lines =
            LineReader::from_reader(Cursor::new(&b"7f00 /tmp/\xff\nnext\n"[..]));
        assert_eq!(lines.next_line().unwrap(), Some("7f00 /tmp/\u{FFFD}"));
        assert_eq!(lines.next_line().unwrap(), Some("next"));
        assert_eq!(lines.next_line().unwrap(), None);

        let dir = scratch_dir();
        let root = Root::open(dir.path()).unwrap();
        assert_eq!(read_line(root.base(), "comm").unwrap(), "ab\u{FFFD}cd");
        assert_eq!(read_file(root.base(), "comm", DEFAULT_READ_CAP, true)
                            .unwrap(),
                   "ab\u{FFFD}cd");
    }

    /// Check single line reads
    #[test]
    fn single_line() {
        let dir = scratch_dir();
        let root = Root::open(dir.path()).unwrap();
        assert_eq!(read_line(root.base(), "lines").unwrap(), "first");

        // Empty and missing files are errors
        match read_line(root.base(), "empty") {
            Err(Error::Io { source, .. }) => {
                assert_eq!(source.kind(), io::ErrorKind::UnexpectedEof)
            },
            other => panic!("Unexpected result: {:?}", other),
        }
        match read_line(root.base(), "missing") {
            Err(Error::Io { path, source }) => {
                assert_eq!(path, Path::new("missing"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            },
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    /// Check capped whole-file reads
    #[test]
    fn whole_file() {
        let dir = scratch_dir();
        let root = Root::open(dir.path()).unwrap();
        assert_eq!(read_file(root.base(), "digits", 4, true).unwrap(), "0123");
        assert_eq!(read_file(root.base(), "digits", DEFAULT_READ_CAP, false)
                            .unwrap(),
                   "0123456789\n\n");

        // Only a single newline gets trimmed
        assert_eq!(read_file(root.base(), "digits", DEFAULT_READ_CAP, true)
                            .unwrap(),
                   "0123456789\n");
        assert_eq!(read_file(root.base(), "empty", DEFAULT_READ_CAP, true)
                            .unwrap(),
                   "");
    }

    /// Check that roots must be directories, and resolve relative paths
    #[test]
    fn roots() {
        let dir = scratch_dir();
        assert!(Root::open(dir.path().join("digits")).is_err());
        assert!(Root::open(dir.path().join("missing")).is_err());

        let root = Root::open(dir.path()).unwrap();
        assert_eq!(root.path(), dir.path());

        // Absolute paths ignore the root
        let absolute = dir.path().join("lines");
        assert_eq!(read_line(root.base(), &absolute).unwrap(), "first");
        assert_eq!(read_line(BaseDir::default(), &absolute).unwrap(), "first");
    }

    /// Check link and inode queries
    #[test]
    fn link_and_inode() {
        let dir = scratch_dir();
        let root = Root::open(dir.path()).unwrap();
        assert_eq!(read_link(root.base(), "link").unwrap(),
                   PathBuf::from("digits"));
        assert!(read_link(root.base(), "digits").is_err());

        let expected = fs::metadata(dir.path().join("digits")).unwrap().ino();
        assert_eq!(get_inode(root.base(), "digits").unwrap(), expected);
        assert!(get_inode(root.base(), "missing").is_err());
    }
}

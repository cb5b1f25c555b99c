//! Enumeration of pseudo-filesystem directories
//!
//! Kernel directory listings (the per-process directories of /proc, the block
//! devices of /sys/block, the descriptors of /proc/[pid]/fd...) are small and
//! come in no particular order, so they are always read in full and returned
//! as ordered sets.

use crate::error::{Error, Result};
use crate::number::{to_number, Base};
use crate::reader::{c_path, BaseDir};
use std::collections::BTreeSet;
use std::ffi::CStr;
use std::fs::File;
use std::io;
use std::os::unix::io::{AsRawFd, FromRawFd, IntoRawFd};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};


/// Names starting with this character are hidden
const DOTFILE_PREFIX: char = '.';


/// Open directory stream, yielding the name of every entry (including "."
/// and "..") and closing the directory when dropped
struct DirStream {
    /// Stream handle from fdopendir(3), which owns the directory descriptor
    dir: *mut libc::DIR,

    /// Path of the directory, for error reporting
    path: PathBuf,
}
//
impl DirStream {
    /// Open a directory relative to some base directory
    fn open_at(base: BaseDir, path: &Path) -> Result<Self> {
        let c_path = c_path(path)?;
        let fd = unsafe {
            libc::openat(base.raw(),
                         c_path.as_ptr(),
                         libc::O_RDONLY | libc::O_DIRECTORY | libc::O_CLOEXEC)
        };
        if fd < 0 {
            return Err(Error::io(path, io::Error::last_os_error()));
        }

        // Keep the descriptor guarded until the stream has taken it over
        let guard = unsafe { File::from_raw_fd(fd) };
        let dir = unsafe { libc::fdopendir(guard.as_raw_fd()) };
        if dir.is_null() {
            return Err(Error::io(path, io::Error::last_os_error()));
        }
        let _ = guard.into_raw_fd();

        Ok(
            Self {
                dir,
                path: path.to_owned(),
            }
        )
    }
}
//
impl Iterator for DirStream {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        // readdir() only reports errors through errno
        unsafe { *libc::__errno_location() = 0; }
        let entry = unsafe { libc::readdir(self.dir) };
        if entry.is_null() {
            let error = io::Error::last_os_error();
            return match error.raw_os_error() {
                Some(0) | None => None,
                Some(_) => Some(Err(Error::io(&self.path, error))),
            };
        }

        let name = unsafe { CStr::from_ptr((*entry).d_name.as_ptr()) };
        Some(Ok(name.to_string_lossy().into_owned()))
    }
}
//
impl Drop for DirStream {
    fn drop(&mut self) {
        unsafe { libc::closedir(self.dir); }
    }
}


/// Run a callback on the name of every entry of a directory, and return how
/// many entries were visited
///
/// Entries whose name starts with a dot (including "." and "..") are only
/// visited if `include_dots` is set.
///
pub fn iterate_files<P, F>(base: BaseDir,
                           dir: P,
                           include_dots: bool,
                           mut handle: F) -> Result<usize>
    where P: AsRef<Path>,
          F: FnMut(&str)
{
    let dir = dir.as_ref();
    let mut count = 0;
    for name in DirStream::open_at(base, dir)? {
        let name = name?;
        if !include_dots && name.starts_with(DOTFILE_PREFIX) {
            continue;
        }
        count += 1;
        handle(&name);
    }
    debug!("Visited {} entries of {}", count, dir.display());
    Ok(count)
}


/// Count the entries of a directory
pub fn count_files<P: AsRef<Path>>(base: BaseDir,
                                   dir: P,
                                   include_dots: bool) -> Result<usize> {
    iterate_files(base, dir, include_dots, |_| {})
}


/// List the names of the entries of a directory
pub fn enumerate_files<P: AsRef<Path>>(base: BaseDir,
                                       dir: P,
                                       include_dots: bool)
                                       -> Result<BTreeSet<String>> {
    let mut files = BTreeSet::new();
    iterate_files(base, dir, include_dots, |name| {
        files.insert(name.to_owned());
    })?;
    Ok(files)
}


/// List the entries of a directory whose name is a number, such as process
/// IDs in /proc or descriptors in /proc/[pid]/fd
///
/// Entries whose whole name is not a decimal number are skipped silently.
///
pub fn enumerate_numeric_files<P: AsRef<Path>>(base: BaseDir,
                                               dir: P) -> Result<BTreeSet<u32>> {
    let mut files = BTreeSet::new();
    iterate_files(base, dir, false, |name| {
        match to_number::<u32>(name, Base::Decimal) {
            Ok(number) => { files.insert(number); },
            Err(_) => trace!("Skipping non-numeric entry {:?}", name),
        }
    })?;
    Ok(files)
}

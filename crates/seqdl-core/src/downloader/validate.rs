//! Destination directory checks run before any session is created.

use std::fs;
use std::path::Path;

use crate::outcome::Outcome;

/// Checks, in order: exists, is a directory, is writable. The first failing
/// check decides the outcome.
pub(crate) fn check_destination(dir: &Path) -> Result<(), Outcome> {
    let meta = fs::metadata(dir).map_err(|_| Outcome::DestinationNotFound)?;
    if !meta.is_dir() {
        return Err(Outcome::DestinationNotADirectory);
    }
    if !is_writable(dir, &meta) {
        return Err(Outcome::DestinationNotWritable);
    }
    Ok(())
}

/// A directory with no write bits at all is never writable, even for root;
/// otherwise ask the kernel for the calling user.
fn is_writable(dir: &Path, meta: &fs::Metadata) -> bool {
    if meta.permissions().readonly() {
        return false;
    }
    access_w_ok(dir)
}

#[cfg(unix)]
fn access_w_ok(dir: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let Ok(c_path) = CString::new(dir.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: c_path is a valid NUL-terminated string for the duration of the call.
    unsafe { libc::access(c_path.as_ptr(), libc::W_OK) == 0 }
}

#[cfg(not(unix))]
fn access_w_ok(_dir: &Path) -> bool {
    true
}

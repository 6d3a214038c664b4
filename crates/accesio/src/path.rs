use std::{
    ffi::CString,
    os::{
        fd::{FromRawFd as _, OwnedFd, RawFd},
        unix::ffi::OsStrExt as _,
    },
    path::Path,
};

use accesio_sys::{Errno, file};

/// Opens the character device at `path` for reading and writing.
///
/// Paths containing a NUL byte are rejected with `EINVAL`.
pub(crate) fn open_device(path: &Path) -> Result<OwnedFd, Errno> {
    let path = CString::new(path.as_os_str().as_bytes()).ok().ok_or(Errno::EINVAL)?;
    let fd = file::open(&path).into_result()?;
    let fd = RawFd::try_from(fd).ok().ok_or(Errno::EBADF)?;
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

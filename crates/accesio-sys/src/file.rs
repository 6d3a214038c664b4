//! Character device file operations.
//!
//! The PCI driver maps the file position onto the register offset of the main
//! region: `lseek` selects the register and every `read`/`write` transfers
//! single bytes at that offset.

use core::ffi::{CStr, c_int};

use crate::SysRet;

/// Opens the character device at `path` for reading and writing.
///
/// The descriptor is created with `O_CLOEXEC`.
pub fn open(path: &CStr) -> SysRet {
    SysRet::capture(unsafe { libc::open(path.as_ptr(), libc::O_RDWR | libc::O_CLOEXEC) })
}

/// Closes a descriptor returned by [`open`].
///
/// # Safety
///
/// `fd` must be owned by the caller and must not be used after this call.
pub unsafe fn close(fd: c_int) -> SysRet {
    SysRet::capture(unsafe { libc::close(fd) })
}

/// Sets the file position (the register offset) of `fd` to `offset`.
pub fn lseek(fd: c_int, offset: libc::off_t) -> SysRet {
    SysRet::capture(unsafe { libc::lseek(fd, offset, libc::SEEK_SET) })
}

/// Reads up to `buf.len()` bytes at the current file position.
pub fn read(fd: c_int, buf: &mut [u8]) -> SysRet {
    let ret = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
    // `ssize_t` is at most 64 bits wide on every supported target
    SysRet::capture(ret as i64)
}

/// Writes up to `buf.len()` bytes at the current file position.
pub fn write(fd: c_int, buf: &[u8]) -> SysRet {
    let ret = unsafe { libc::write(fd, buf.as_ptr().cast(), buf.len()) };
    SysRet::capture(ret as i64)
}

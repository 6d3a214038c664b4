//! C ABI of the ACCES I/O user-space library.
//!
//! The exported functions keep the conventions of `libacces.so`: a handle is
//! the file descriptor returned by [`open_device`], every function returns a
//! non-negative value on success and the negated error code on failure, and
//! handle `0` is rejected with `-EINVAL`.

use core::ffi::{CStr, c_char, c_int};
use std::{
    ffi::OsStr,
    mem::ManuallyDrop,
    os::{
        fd::{FromRawFd as _, IntoRawFd},
        unix::ffi::OsStrExt as _,
    },
};

use accesio::{Errno, Handle};

const SUCCESS: c_int = 0;

fn to_ret(res: Result<c_int, Errno>) -> c_int {
    match res {
        Ok(value) => value,
        Err(errno) => -errno.code(),
    }
}

/// Runs `f` on a handle borrowed from `fd`, leaving the descriptor open.
///
/// # Safety
///
/// `fd` must be an open descriptor for the duration of the call.
unsafe fn with_handle<F>(fd: c_int, f: F) -> c_int
where
    F: FnOnce(&mut Handle) -> Result<c_int, Errno>,
{
    if fd == 0 {
        return -libc::EINVAL;
    }
    if fd < 0 {
        return -libc::EBADF;
    }
    let mut handle = ManuallyDrop::new(unsafe { Handle::from_raw_fd(fd) });
    to_ret(f(&mut handle))
}

fn register_offset(offset: c_int) -> Result<u64, Errno> {
    u64::try_from(offset).ok().ok_or(Errno::EINVAL)
}

/// Opens the character device at `device`, usually under `/dev/accesio/`.
///
/// Returns the file descriptor to use as handle for the other functions.
///
/// # Safety
///
/// `device` must be null or point to a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn open_device(device: *const c_char) -> c_int {
    if device.is_null() {
        return -libc::EINVAL;
    }
    let path = OsStr::from_bytes(unsafe { CStr::from_ptr(device) }.to_bytes());
    to_ret(Handle::open(path).map(IntoRawFd::into_raw_fd))
}

/// Closes a handle returned by [`open_device`].
///
/// # Safety
///
/// `fd` must be owned by the caller and must not be used after this call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn close_handle(fd: c_int) -> c_int {
    if fd == 0 {
        return -libc::EINVAL;
    }
    if fd < 0 {
        return -libc::EBADF;
    }
    let handle = unsafe { Handle::from_raw_fd(fd) };
    to_ret(handle.close().map(|()| SUCCESS))
}

/// Sets the register offset for future reads and writes.
///
/// # Safety
///
/// `fd` must be an open descriptor.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn set_register_offset(fd: c_int, offset: c_int) -> c_int {
    unsafe {
        with_handle(fd, |handle| {
            handle.set_register_offset(register_offset(offset)?)?;
            Ok(SUCCESS)
        })
    }
}

/// Reads one byte at the current register offset and returns it.
///
/// # Safety
///
/// `fd` must be an open descriptor.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn read_handle(fd: c_int) -> c_int {
    unsafe { with_handle(fd, |handle| Ok(c_int::from(handle.read()?))) }
}

/// Writes the low byte of `data` at the current register offset.
///
/// # Safety
///
/// `fd` must be an open descriptor.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn write_handle(fd: c_int, data: c_int) -> c_int {
    unsafe {
        with_handle(fd, |handle| {
            handle.write(data.to_le_bytes()[0])?;
            Ok(SUCCESS)
        })
    }
}

/// Reads one byte at `offset` and returns it.
///
/// # Safety
///
/// `fd` must be an open descriptor.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn read_offset(fd: c_int, offset: c_int) -> c_int {
    unsafe {
        with_handle(fd, |handle| {
            let data = handle.read_offset(register_offset(offset)?)?;
            Ok(c_int::from(data))
        })
    }
}

/// Writes the low byte of `data` at `offset`.
///
/// # Safety
///
/// `fd` must be an open descriptor.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn write_offset(fd: c_int, offset: c_int, data: c_int) -> c_int {
    unsafe {
        with_handle(fd, |handle| {
            handle.write_offset(register_offset(offset)?, data.to_le_bytes()[0])?;
            Ok(SUCCESS)
        })
    }
}

/// Blocks until the device raises an interrupt.
///
/// # Safety
///
/// `fd` must be an open descriptor.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wait_for_irq(fd: c_int) -> c_int {
    unsafe {
        with_handle(fd, |handle| {
            handle.wait_for_irq()?;
            Ok(SUCCESS)
        })
    }
}

/// Cancels an interrupt wait pending on the device.
///
/// # Safety
///
/// `fd` must be an open descriptor.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cancel_wait_irq(fd: c_int) -> c_int {
    unsafe {
        with_handle(fd, |handle| {
            handle.cancel_wait_irq()?;
            Ok(SUCCESS)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_handle_is_invalid() {
        unsafe {
            assert_eq!(close_handle(0), -libc::EINVAL);
            assert_eq!(set_register_offset(0, 1), -libc::EINVAL);
            assert_eq!(read_handle(0), -libc::EINVAL);
            assert_eq!(write_handle(0, 1), -libc::EINVAL);
            assert_eq!(read_offset(0, 1), -libc::EINVAL);
            assert_eq!(write_offset(0, 1, 1), -libc::EINVAL);
            assert_eq!(wait_for_irq(0), -libc::EINVAL);
            assert_eq!(cancel_wait_irq(0), -libc::EINVAL);
        }
    }

    #[test]
    fn test_null_path_is_invalid() {
        assert_eq!(unsafe { open_device(core::ptr::null()) }, -libc::EINVAL);
    }

    #[test]
    fn test_negative_offset_is_invalid() {
        assert_eq!(register_offset(-1), Err(Errno::EINVAL));
        assert_eq!(register_offset(0x10), Ok(0x10));
    }
}

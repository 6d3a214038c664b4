//! This crate provides low-level Rust bindings for the user-space interface of
//! the ACCES I/O Linux drivers.
//!
//! It is intended to be used as a low-level building block for implementing
//! safe and high-level device APIs in Rust. The library exposes the raw ioctl
//! request numbers, the packet layouts shared with the kernel drivers, the
//! system calls used on the character devices and the error codes they report.

use core::{error::Error, ffi::c_int, fmt, num::NonZeroI32};
use std::io;

pub mod file;
pub mod ioctl;
pub mod pci;
pub mod usb;

/// Represents an error code reported by the operating system or the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Errno(NonZeroI32);

macro_rules! define_errno {
    ($($(#[$attrs:meta])* $name:ident => $desc:literal,)*) => {
        impl Errno {
            $(
                $(#[$attrs])*
                pub const $name: Self = Self::from_const(libc::$name);
            )*

            /// Returns the symbolic name and description of a known error code.
            fn describe(self) -> Option<(&'static str, &'static str)> {
                match self {
                    $(Self::$name => Some((stringify!($name), $desc)),)*
                    _ => None,
                }
            }
        }
    };
}

define_errno! {
    /// Operation not permitted.
    EPERM => "operation not permitted",
    /// No such file or directory.
    ENOENT => "no such file or directory",
    /// I/O error.
    EIO => "input/output error",
    /// No such device or address.
    ///
    /// Reported by the PCI driver when the selected BAR has no valid region.
    ENXIO => "no such device or address",
    /// Bad file descriptor.
    EBADF => "bad file descriptor",
    /// Permission denied.
    EACCES => "permission denied",
    /// Bad address.
    ///
    /// Reported by the PCI driver when the register offset is outside the
    /// selected region.
    EFAULT => "bad address",
    /// Device or resource busy.
    ///
    /// The drivers allow a single open handle per device.
    EBUSY => "device or resource busy",
    /// No such device.
    ENODEV => "no such device",
    /// Invalid argument.
    EINVAL => "invalid argument",
    /// Inappropriate ioctl for device.
    ENOTTY => "inappropriate ioctl for device",
    /// Illegal seek.
    ESPIPE => "illegal seek",
    /// Function not implemented.
    ///
    /// Returned for PCI-only requests sent to a USB device and vice versa.
    ENOSYS => "function not implemented",
    /// Operation already in progress.
    EALREADY => "operation already in progress",
    /// Operation canceled.
    ECANCELED => "operation canceled",
}

impl Errno {
    const fn from_const(code: c_int) -> Self {
        match NonZeroI32::new(code) {
            Some(code) => Self(code),
            None => panic!("errno must be non-zero"),
        }
    }

    /// Creates an `Errno` from a raw, positive error code.
    ///
    /// Returns `None` if `code` is 0.
    #[must_use]
    pub const fn new(code: c_int) -> Option<Self> {
        match NonZeroI32::new(code) {
            Some(code) => Some(Self(code)),
            None => None,
        }
    }

    /// Returns the raw, positive error code.
    #[must_use]
    pub const fn code(self) -> c_int {
        self.0.get()
    }

    /// Returns the error code of the last failed system call on this thread.
    ///
    /// Falls back to `EIO` if the operating system reports no error.
    #[must_use]
    pub fn last() -> Self {
        Self::from_io_error(&io::Error::last_os_error())
    }

    /// Extracts the error code carried by an [`io::Error`].
    ///
    /// Errors without an OS error code are reported as `EIO`.
    #[must_use]
    pub fn from_io_error(err: &io::Error) -> Self {
        err.raw_os_error().and_then(Self::new).unwrap_or(Self::EIO)
    }

    /// Returns the symbolic name of the error code, such as `EACCES`.
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        self.describe().map(|(name, _)| name)
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.describe() {
            Some((name, desc)) => write!(f, "{name} ({desc})"),
            None => write!(f, "unknown ({})", self.code()),
        }
    }
}

impl Error for Errno {}

impl From<Errno> for io::Error {
    fn from(errno: Errno) -> Self {
        Self::from_raw_os_error(errno.code())
    }
}

/// The return value of a raw system call.
///
/// The error code is captured right after the call so that later calls cannot
/// overwrite it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct SysRet {
    /// Raw return value (`-1` for errors).
    pub value: i64,
    /// The value of `errno` right after the call; only meaningful on errors.
    pub errno: c_int,
}

impl SysRet {
    /// Captures the return value of a system call and the current `errno`.
    pub fn capture(value: impl Into<i64>) -> Self {
        let value = value.into();
        let errno = if value == -1 {
            io::Error::last_os_error().raw_os_error().unwrap_or(0)
        } else {
            0
        };
        Self { value, errno }
    }

    /// Converts this `SysRet` into a `Result`.
    ///
    /// Returns `Ok(value)` unless `value` is `-1`, otherwise returns the
    /// captured `Errno` (or `EIO` if none was recorded).
    pub fn into_result(self) -> Result<i64, Errno> {
        Result::from(self)
    }
}

impl From<SysRet> for Result<i64, Errno> {
    fn from(ret: SysRet) -> Self {
        if ret.value == -1 {
            Err(Errno::new(ret.errno).unwrap_or(Errno::EIO))
        } else {
            Ok(ret.value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_display() {
        assert_eq!(Errno::EACCES.to_string(), "EACCES (permission denied)");
        assert_eq!(Errno::ENXIO.name(), Some("ENXIO"));
        let unknown = Errno::new(4242).unwrap();
        assert_eq!(unknown.name(), None);
        assert_eq!(unknown.to_string(), "unknown (4242)");
    }

    #[test]
    fn test_errno_new_rejects_zero() {
        assert_eq!(Errno::new(0), None);
        assert_eq!(Errno::new(libc::EIO), Some(Errno::EIO));
        assert_eq!(Errno::EINVAL.code(), libc::EINVAL);
    }

    #[test]
    fn test_errno_io_error_conversion() {
        let err = io::Error::from(Errno::ENOENT);
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(Errno::from_io_error(&err), Errno::ENOENT);

        let custom = io::Error::other("no os code");
        assert_eq!(Errno::from_io_error(&custom), Errno::EIO);
    }

    #[test]
    fn test_sysret_into_result() {
        let ok = SysRet {
            value: 3,
            errno: 0,
        };
        assert_eq!(ok.into_result(), Ok(3));

        let err = SysRet {
            value: -1,
            errno: libc::EBUSY,
        };
        assert_eq!(err.into_result(), Err(Errno::EBUSY));

        let missing = SysRet {
            value: -1,
            errno: 0,
        };
        assert_eq!(missing.into_result(), Err(Errno::EIO));
    }
}

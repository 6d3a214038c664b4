//! ioctl request numbers understood by the ACCES I/O drivers.
//!
//! The numbers are encoded with the generic Linux `_IOC` layout. Requests that
//! the drivers declare with a pointer type carry the size of a pointer, not the
//! size of the pointee, exactly as the C macros compute them.

use core::{
    ffi::{c_int, c_void},
    mem,
};

use bitflags::bitflags;

use crate::SysRet;

/// The ioctl type (magic number) shared by the PCI and USB drivers.
pub const MAGIC_NUM: u8 = 0xE0;

bitflags! {
    /// Data transfer direction of an ioctl request, seen from user space.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IocDir : u32 {
        /// User space writes data to the driver.
        const WRITE = 1 << 0;
        /// User space reads data from the driver.
        const READ = 1 << 1;
    }
}

const NR_SHIFT: u32 = 0;
const TYPE_SHIFT: u32 = 8;
const SIZE_SHIFT: u32 = 16;
const DIR_SHIFT: u32 = 30;
const SIZE_MAX: usize = (1 << 14) - 1;

/// Encodes an ioctl request number (`_IOC`).
///
/// # Panics
///
/// Panics if `size` does not fit in the 14-bit size field.
#[must_use]
pub const fn ioc(dir: IocDir, ty: u8, nr: u8, size: usize) -> u32 {
    assert!(size <= SIZE_MAX, "ioctl argument size does not fit in 14 bits");
    #[expect(clippy::cast_possible_truncation)]
    let size = size as u32;
    (dir.bits() << DIR_SHIFT)
        | (size << SIZE_SHIFT)
        | ((ty as u32) << TYPE_SHIFT)
        | ((nr as u32) << NR_SHIFT)
}

/// Encodes a request without argument (`_IO`).
const fn io(nr: u8) -> u32 {
    ioc(IocDir::empty(), MAGIC_NUM, nr, 0)
}

/// Encodes a request reading a `T` from the driver (`_IOR`).
const fn ior<T>(nr: u8) -> u32 {
    ioc(IocDir::READ, MAGIC_NUM, nr, mem::size_of::<T>())
}

/// Encodes a request writing a `T` to the driver (`_IOW`).
const fn iow<T>(nr: u8) -> u32 {
    ioc(IocDir::WRITE, MAGIC_NUM, nr, mem::size_of::<T>())
}

type Ptr = *mut c_void;

pub const GET_TOTAL_DEVICE_COUNT: u32 = io(1);
/// Superseded by [`GET_PCI_INFO`]; the PCI driver still accepts it.
pub const GET_DEVICE_INFO: u32 = ior::<Ptr>(2);
/// Superseded by [`PCI_WRITE`]; the PCI driver still accepts it.
pub const WRITE: u32 = iow::<Ptr>(3);
/// Superseded by [`PCI_READ`]; the PCI driver still accepts it.
pub const READ: u32 = ior::<Ptr>(4);

// PCI-only requests (the USB driver returns `ENOSYS`)
pub const WAIT: u32 = io(5);
pub const CANCEL_WAIT: u32 = io(6);
pub const GET_DEVICE_IS_PCIE: u32 = ior::<bool>(7);
pub const GET_DEVICE_IRQ_CAPABLE: u32 = ior::<bool>(8);
pub const GET_DEVICE_WAITING_FOR_IRQ: u32 = ior::<bool>(9);
pub const GET_DEVICE_IRQ_CANCELLED: u32 = ior::<bool>(10);
pub const GET_DEVICE_PLX_START: u32 = ior::<u32>(11);
pub const GET_DEVICE_PLX_END: u32 = ior::<u32>(12);
pub const GET_DEVICE_IS_PCI: u32 = ior::<bool>(13);
pub const GET_DEVICE_IS_USB: u32 = ior::<bool>(14);
pub const GET_PCI_INFO: u32 = ior::<Ptr>(15);
pub const GET_USB_INFO: u32 = ior::<Ptr>(16);
pub const PCI_WRITE: u32 = iow::<Ptr>(17);
pub const PCI_READ: u32 = ior::<Ptr>(18);

// USB-only requests (the PCI driver returns `ENOSYS`)
pub const USB_WRITE: u32 = iow::<Ptr>(19);
pub const USB_READ: u32 = ior::<Ptr>(20);
pub const GET_USB_IS_READING: u32 = ior::<bool>(21);
pub const GET_USB_IS_WRITING: u32 = ior::<bool>(22);
pub const GET_USB_IS_IO: u32 = ior::<bool>(23);

/// Converts a request number to the request type of the C library.
#[cfg(not(any(target_env = "musl", target_os = "android")))]
fn request_arg(request: u32) -> libc::Ioctl {
    libc::Ioctl::from(request)
}

/// Converts a request number to the request type of the C library.
///
/// The C library takes an `int`; the bits are passed through unchanged.
#[cfg(any(target_env = "musl", target_os = "android"))]
fn request_arg(request: u32) -> libc::Ioctl {
    request.cast_signed()
}

/// Issues an ioctl request without argument.
///
/// Query requests report their result through the return value.
pub fn ioctl_none(fd: c_int, request: u32) -> SysRet {
    let request = request_arg(request);
    SysRet::capture(unsafe { libc::ioctl(fd, request) })
}

/// Issues an ioctl request with a pointer argument.
///
/// # Safety
///
/// `arg` must point to a valid, properly initialized `T` that stays alive for
/// the duration of the call, and `T` must be the layout the driver expects for
/// `request`. The driver may write through `arg`.
pub unsafe fn ioctl_ptr<T>(fd: c_int, request: u32, arg: *mut T) -> SysRet {
    let request = request_arg(request);
    SysRet::capture(unsafe { libc::ioctl(fd, request, arg) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_without_argument() {
        assert_eq!(WAIT, 0x0000_E005);
        assert_eq!(CANCEL_WAIT, 0x0000_E006);
        assert_eq!(GET_TOTAL_DEVICE_COUNT, 0x0000_E001);
    }

    #[test]
    fn test_request_with_value_argument() {
        // _IOR(0xE0, 7, bool)
        assert_eq!(GET_DEVICE_IS_PCIE, 0x8001_E007);
        // _IOR(0xE0, 11, uint32_t)
        assert_eq!(GET_DEVICE_PLX_START, 0x8004_E00B);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_request_with_pointer_argument() {
        // _IOR(0xE0, 15, accesio_pci_info*)
        assert_eq!(GET_PCI_INFO, 0x8008_E00F);
        // _IOW(0xE0, 17, accesio_pci_ioctl_packet*)
        assert_eq!(PCI_WRITE, 0x4008_E011);
        // _IOR(0xE0, 18, accesio_pci_ioctl_packet*)
        assert_eq!(PCI_READ, 0x8008_E012);
    }

    #[test]
    fn test_ioc_layout() {
        let both = IocDir::READ | IocDir::WRITE;
        assert_eq!(ioc(both, 0x12, 0x34, 0x100), 0xC100_1234);
        assert_eq!(ioc(IocDir::empty(), 0, 0, 0), 0);
    }

    #[test]
    fn test_ioctl_on_invalid_descriptor_fails() {
        let ret = ioctl_none(-1, WAIT);
        assert_eq!(ret.into_result(), Err(crate::Errno::EBADF));
    }
}

//! Interface of the PCI driver.
//!
//! This module provides the packet layouts exchanged with the PCI driver and
//! the raw requests operating on them.

use core::ffi::c_int;

use dataview::Pod;

use crate::{SysRet, ioctl};

/// Number of base address register regions reported per device.
pub const MAX_REGIONS: usize = 6;

/// The data read or written is 8 bits wide.
pub const IO_SIZE_BYTE: i32 = 1;
/// The data read or written is 16 bits wide.
pub const IO_SIZE_WORD: i32 = 2;
/// The data read or written is 32 bits wide.
pub const IO_SIZE_DWORD: i32 = 4;

/// The region has no valid address associated.
pub const ADDRESS_TYPE_INVALID: i32 = 0;
/// The region uses I/O mapped address space.
pub const ADDRESS_TYPE_IO: i32 = 1;
/// The region uses memory mapped address space.
pub const ADDRESS_TYPE_MEM: i32 = 2;

/// A single register access exchanged with [`ioctl::PCI_READ`] and
/// [`ioctl::PCI_WRITE`].
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod)]
pub struct PciIoctlPacket {
    /// Index given to the device by the driver.
    pub device_index: u32,
    /// Data to write, or the data returned by a read.
    ///
    /// Only the low `size` bytes are meaningful.
    pub data: u32,
    /// Base address register selecting the region (`0..MAX_REGIONS`).
    pub bar: u8,
    /// Register offset within the region.
    pub offset: u8,
    pub padding: [u8; 2],
    /// Access width, one of the `IO_SIZE_*` constants.
    pub size: i32,
}

/// Layout of one mapped region of the device.
///
/// The length of a region bounds the valid register offsets.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod)]
pub struct IoRegion {
    /// One of the `ADDRESS_TYPE_*` constants.
    pub address_type: i32,
    pub end: u32,
    pub length: u32,
    pub start: u32,
}

/// Device information returned by [`ioctl::GET_PCI_INFO`].
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod)]
pub struct PciInfo {
    /// Base address register of the main region.
    pub bar: u8,
    pub padding: [u8; 3],
    /// `regions[bar].address_type`
    pub base_address_type: i32,
    /// `regions[bar].end`
    pub base_end: u32,
    /// `regions[bar].length`
    pub base_length: u32,
    /// `regions[bar].start`
    pub base_start: u32,
    /// Registration order of the device within the driver, starting at 0.
    pub device_index: u32,
    pub product_id: u32,
    pub regions: [IoRegion; MAX_REGIONS],
}

const _: () = assert!(size_of::<PciIoctlPacket>() == 16);
const _: () = assert!(size_of::<IoRegion>() == 16);
const _: () = assert!(size_of::<PciInfo>() == 124);

/// Retrieves the device information.
pub fn get_pci_info(fd: c_int, info: &mut PciInfo) -> SysRet {
    unsafe { ioctl::ioctl_ptr(fd, ioctl::GET_PCI_INFO, info) }
}

/// Reads the register described by `packet`, storing the value in
/// `packet.data`.
pub fn read(fd: c_int, packet: &mut PciIoctlPacket) -> SysRet {
    unsafe { ioctl::ioctl_ptr(fd, ioctl::PCI_READ, packet) }
}

/// Writes `packet.data` to the register described by `packet`.
pub fn write(fd: c_int, packet: &PciIoctlPacket) -> SysRet {
    let mut packet = *packet;
    unsafe { ioctl::ioctl_ptr(fd, ioctl::PCI_WRITE, &raw mut packet) }
}

/// Blocks until the device raises an interrupt or the wait is cancelled.
pub fn wait(fd: c_int) -> SysRet {
    ioctl::ioctl_none(fd, ioctl::WAIT)
}

/// Cancels a pending [`wait`] on the device.
pub fn cancel_wait(fd: c_int) -> SysRet {
    ioctl::ioctl_none(fd, ioctl::CANCEL_WAIT)
}

/// Issues a query request whose answer is the return value of the call.
///
/// Meant for [`ioctl::GET_TOTAL_DEVICE_COUNT`] and the `GET_DEVICE_*`
/// requests.
pub fn query(fd: c_int, request: u32) -> SysRet {
    ioctl::ioctl_none(fd, request)
}

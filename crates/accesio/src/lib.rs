//! Safe, high-level access to ACCES I/O cards.
//!
//! Devices are reached through the character devices created by the ACCES I/O
//! Linux drivers, usually found under `/dev/accesio/`.
//!
//! - [`Handle`] is the plain file interface: select a register offset with
//!   `lseek` and transfer single bytes with `read`/`write`.
//! - [`PciDevice`] talks to the PCI driver through its ioctl packets, which
//!   also allows 16 and 32 bit accesses, other regions and interrupt waits.
//! - [`UsbDevice`] performs bulk and control transfers through the USB driver.
//!
//! [`RegisterPort`] abstracts over the byte-wide register access shared by the
//! handle and the PCI device.

pub use accesio_sys::Errno;

pub use self::{
    handle::Handle,
    info::{AddressType, DeviceInfo, Region, UsbDeviceInfo, UsbEndpointInfo, UsbEndpointKind},
    pci::{IoSize, PciDevice},
    port::RegisterPort,
    usb::UsbDevice,
};

mod handle;
mod info;
mod path;
mod pci;
mod port;
mod usb;

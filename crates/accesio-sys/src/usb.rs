//! Interface of the USB driver.
//!
//! The layouts follow the user-space build of the driver headers; the fields
//! only present in power-management enabled kernel builds are not part of it.

use core::ffi::{c_char, c_int, c_uint, c_ulong, c_ushort, c_void};

use crate::{SysRet, ioctl};

/// Index of the bulk endpoint in [`UsbInfo::endpoints`].
pub const ENDPOINT_BULK: usize = 0;
/// Index of the control endpoint in [`UsbInfo::endpoints`].
pub const ENDPOINT_CTRL: usize = 1;
/// Index of the interrupt endpoint in [`UsbInfo::endpoints`].
pub const ENDPOINT_INT: usize = 2;
/// Index of the isochronous endpoint in [`UsbInfo::endpoints`].
pub const ENDPOINT_ISO: usize = 3;

/// Bulk transfer on the bulk endpoints.
pub const MSG_TYPE_BULK: c_int = 0;
/// Control transfer on the default endpoint.
pub const MSG_TYPE_CTRL: c_int = 1;

/// State of one endpoint pair of the device.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsbEndpoint {
    pub endpoint_type: c_int,
    pub in_address: u8,
    pub in_buffer_size: usize,
    pub in_buffer_filled: usize,
    pub in_buffer_copied: usize,
    pub out_address: u8,
    pub out_buffer_size: usize,
    pub out_buffer_filled: usize,
    pub out_buffer_copied: usize,
}

/// Device information returned by [`ioctl::GET_USB_INFO`].
///
/// Boolean fields are kept as `u8` because the driver fills them.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsbInfo {
    pub endpoints: [UsbEndpoint; 4],
    /// Status of the last failed request.
    pub errors: c_int,
    pub ongoing_read: u8,
    pub ctrl_msg: u8,
    pub device_index: u32,
    pub product_id: u32,
    pub kernel_devnum: c_int,
    /// NUL-terminated device path, such as `1-2.3`.
    pub kernel_devpath: [c_char; 16],
    pub kernel_route: u32,
    pub kernel_usb_state: c_int,
    pub kernel_usb_speed: c_int,
    pub kernel_usb_bus_ma: c_ushort,
    pub kernel_usb_portnum: u8,
    pub kernel_usb_level: u8,
    pub kernel_usb_can_submit: u8,
    pub kernel_usb_persist_enabled: u8,
    pub kernel_usb_have_langid: u8,
    pub kernel_usb_authorized: u8,
    pub kernel_usb_authenticated: u8,
    pub kernel_usb_wusb: u8,
    pub kernel_usb_lpm_capable: u8,
    pub kernel_usb2_hw_lpm_capable: u8,
    pub kernel_usb2_hw_lpm_besl_capable: u8,
    pub kernel_usb2_hw_lpm_enabled: u8,
    pub kernel_usb2_hw_lpm_allowed: u8,
    pub kernel_usb_string_langid: c_int,
    pub kernel_usb_quirks: u32,
    pub kernel_usb_urbnum: u64,
    pub kernel_usb_active_duration: c_ulong,
    pub kernel_usb_slot_id: c_int,
    pub kernel_usb_lpm_disable_count: c_uint,
}

/// A transfer request exchanged with [`ioctl::USB_READ`] and
/// [`ioctl::USB_WRITE`].
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct UsbIoctlPacket {
    pub data: *mut c_void,
    pub data_len: u16,
    /// One of the `MSG_TYPE_*` constants.
    pub msg_type: c_int,
    /// Only used by control transfers.
    pub request: u8,
    /// Only used by control transfers.
    pub value: u16,
    /// Only used by control transfers.
    pub index: u16,
}

/// Retrieves the device information.
pub fn get_usb_info(fd: c_int, info: &mut UsbInfo) -> SysRet {
    unsafe { ioctl::ioctl_ptr(fd, ioctl::GET_USB_INFO, info) }
}

/// Performs the inbound transfer described by `packet`.
///
/// # Safety
///
/// `packet.data` must be valid for writes of `packet.data_len` bytes.
pub unsafe fn read(fd: c_int, packet: &mut UsbIoctlPacket) -> SysRet {
    unsafe { ioctl::ioctl_ptr(fd, ioctl::USB_READ, packet) }
}

/// Performs the outbound transfer described by `packet`.
///
/// # Safety
///
/// `packet.data` must be valid for reads of `packet.data_len` bytes.
pub unsafe fn write(fd: c_int, packet: &mut UsbIoctlPacket) -> SysRet {
    unsafe { ioctl::ioctl_ptr(fd, ioctl::USB_WRITE, packet) }
}

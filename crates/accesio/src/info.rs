use core::ffi::CStr;

use accesio_sys::{
    pci::{ADDRESS_TYPE_INVALID, ADDRESS_TYPE_IO, ADDRESS_TYPE_MEM, IoRegion, PciInfo},
    usb::{ENDPOINT_BULK, ENDPOINT_CTRL, ENDPOINT_INT, ENDPOINT_ISO, UsbEndpoint, UsbInfo},
};
use platform_cast::CastFrom as _;

/// Address space used by a device region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum AddressType {
    /// The region has no valid address associated.
    #[display("invalid")]
    Invalid,
    /// I/O port mapped region.
    #[display("io")]
    Io,
    /// Memory mapped region.
    #[display("mem")]
    Mem,
    /// A value this library does not know about.
    #[display("unknown({_0})")]
    Unknown(i32),
}

impl AddressType {
    fn from_raw(raw: i32) -> Self {
        match raw {
            ADDRESS_TYPE_INVALID => Self::Invalid,
            ADDRESS_TYPE_IO => Self::Io,
            ADDRESS_TYPE_MEM => Self::Mem,
            _ => Self::Unknown(raw),
        }
    }
}

/// A mapped region of a PCI device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub address_type: AddressType,
    pub start: u32,
    pub end: u32,
    /// Number of addressable bytes; bounds the valid register offsets.
    pub length: u32,
}

impl Region {
    fn from_raw(raw: &IoRegion) -> Self {
        Self {
            address_type: AddressType::from_raw(raw.address_type),
            start: raw.start,
            end: raw.end,
            length: raw.length,
        }
    }

    /// Returns the number of addressable bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        usize::cast_from(self.length)
    }

    /// Returns `true` if the region has no addressable byte.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// Information about an opened PCI device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    raw: PciInfo,
}

impl From<PciInfo> for DeviceInfo {
    fn from(raw: PciInfo) -> Self {
        Self { raw }
    }
}

impl DeviceInfo {
    /// Returns the base address register of the main region.
    #[must_use]
    pub fn bar(&self) -> u8 {
        self.raw.bar
    }

    /// Returns the main region, used by the plain file interface.
    #[must_use]
    pub fn base_region(&self) -> Region {
        Region {
            address_type: AddressType::from_raw(self.raw.base_address_type),
            start: self.raw.base_start,
            end: self.raw.base_end,
            length: self.raw.base_length,
        }
    }

    /// Returns the registration order of the device within the driver.
    #[must_use]
    pub fn device_index(&self) -> u32 {
        self.raw.device_index
    }

    #[must_use]
    pub fn product_id(&self) -> u32 {
        self.raw.product_id
    }

    /// Returns all regions, indexed by base address register.
    pub fn regions(&self) -> impl Iterator<Item = Region> + '_ {
        self.raw.regions.iter().map(Region::from_raw)
    }

    /// Returns the layout received from the driver.
    #[must_use]
    pub fn raw(&self) -> &PciInfo {
        &self.raw
    }
}

/// Endpoint pairs reported by the USB driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum UsbEndpointKind {
    #[display("bulk")]
    Bulk,
    #[display("ctrl")]
    Control,
    #[display("int")]
    Interrupt,
    #[display("iso")]
    Isochronous,
}

impl UsbEndpointKind {
    /// All endpoint kinds, in driver order.
    pub const ALL: [Self; 4] = [
        Self::Bulk,
        Self::Control,
        Self::Interrupt,
        Self::Isochronous,
    ];

    fn index(self) -> usize {
        match self {
            Self::Bulk => ENDPOINT_BULK,
            Self::Control => ENDPOINT_CTRL,
            Self::Interrupt => ENDPOINT_INT,
            Self::Isochronous => ENDPOINT_ISO,
        }
    }
}

/// Addresses and buffer state of one endpoint pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsbEndpointInfo {
    pub in_address: u8,
    pub in_buffer_size: usize,
    pub out_address: u8,
    pub out_buffer_size: usize,
}

impl UsbEndpointInfo {
    fn from_raw(raw: &UsbEndpoint) -> Self {
        Self {
            in_address: raw.in_address,
            in_buffer_size: raw.in_buffer_size,
            out_address: raw.out_address,
            out_buffer_size: raw.out_buffer_size,
        }
    }
}

/// Information about an opened USB device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsbDeviceInfo {
    raw: UsbInfo,
}

impl From<UsbInfo> for UsbDeviceInfo {
    fn from(raw: UsbInfo) -> Self {
        Self { raw }
    }
}

impl UsbDeviceInfo {
    #[must_use]
    pub fn endpoint(&self, kind: UsbEndpointKind) -> UsbEndpointInfo {
        UsbEndpointInfo::from_raw(&self.raw.endpoints[kind.index()])
    }

    /// Returns the status of the last failed request.
    #[must_use]
    pub fn errors(&self) -> i32 {
        self.raw.errors
    }

    #[must_use]
    pub fn ongoing_read(&self) -> bool {
        self.raw.ongoing_read != 0
    }

    #[must_use]
    pub fn device_index(&self) -> u32 {
        self.raw.device_index
    }

    #[must_use]
    pub fn product_id(&self) -> u32 {
        self.raw.product_id
    }

    /// Returns the kernel device path (such as `1-2.3`).
    ///
    /// Returns `None` if the driver did not terminate the string.
    #[must_use]
    pub fn kernel_devpath(&self) -> Option<String> {
        let bytes = self.raw.kernel_devpath.map(|c| c.to_ne_bytes()[0]);
        let path = CStr::from_bytes_until_nul(&bytes).ok()?;
        Some(path.to_string_lossy().into_owned())
    }

    /// Returns the layout received from the driver, including the kernel
    /// bookkeeping fields.
    #[must_use]
    pub fn raw(&self) -> &UsbInfo {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use core::ffi::c_char;

    use accesio_sys::pci::{IoRegion, MAX_REGIONS};

    use super::*;

    fn pci_info() -> PciInfo {
        let mut regions = [IoRegion::default(); MAX_REGIONS];
        regions[2] = IoRegion {
            address_type: ADDRESS_TYPE_IO,
            start: 0xD000,
            end: 0xD01F,
            length: 0x20,
        };
        PciInfo {
            bar: 2,
            base_address_type: ADDRESS_TYPE_IO,
            base_end: 0xD01F,
            base_length: 0x20,
            base_start: 0xD000,
            device_index: 1,
            product_id: 0x0C50,
            regions,
            ..PciInfo::default()
        }
    }

    #[test]
    fn test_device_info_base_region() {
        let info = DeviceInfo::from(pci_info());
        let base = info.base_region();
        assert_eq!(info.bar(), 2);
        assert!(base.address_type.is_io());
        assert_eq!(base.len(), 0x20);
        assert_eq!(base.start, 0xD000);
        assert_eq!(info.product_id(), 0x0C50);
        assert_eq!(info.regions().nth(2), Some(base));
        assert!(info.regions().next().unwrap().address_type.is_invalid());
    }

    #[test]
    fn test_address_type_unknown() {
        assert_eq!(AddressType::from_raw(7), AddressType::Unknown(7));
        assert_eq!(AddressType::Unknown(7).to_string(), "unknown(7)");
        assert_eq!(AddressType::from_raw(ADDRESS_TYPE_MEM).to_string(), "mem");
    }

    #[test]
    fn test_usb_info_devpath() {
        let mut raw = UsbInfo::default();
        for (dst, src) in raw.kernel_devpath.iter_mut().zip(b"1-2.3\0") {
            *dst = c_char::from_ne_bytes([*src]);
        }
        raw.endpoints[ENDPOINT_BULK].in_address = 0x81;
        raw.endpoints[ENDPOINT_BULK].out_buffer_size = 512;
        raw.ongoing_read = 1;

        let info = UsbDeviceInfo::from(raw);
        assert_eq!(info.kernel_devpath().as_deref(), Some("1-2.3"));
        assert!(info.ongoing_read());
        let bulk = info.endpoint(UsbEndpointKind::Bulk);
        assert_eq!(bulk.in_address, 0x81);
        assert_eq!(bulk.out_buffer_size, 512);

        raw.kernel_devpath = [1; 16];
        assert_eq!(UsbDeviceInfo::from(raw).kernel_devpath(), None);
    }
}

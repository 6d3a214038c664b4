use std::{
    os::fd::{AsFd, AsRawFd as _, BorrowedFd},
    path::Path,
};

use accesio_sys::{
    Errno, ioctl,
    pci::{self, IO_SIZE_BYTE, IO_SIZE_DWORD, IO_SIZE_WORD, PciInfo, PciIoctlPacket},
};

use crate::{DeviceInfo, Handle, RegisterPort};

/// Width of a register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, derive_more::IsVariant)]
pub enum IoSize {
    /// 8 bits.
    #[default]
    Byte,
    /// 16 bits.
    Word,
    /// 32 bits.
    Dword,
}

impl IoSize {
    fn to_raw(self) -> i32 {
        match self {
            Self::Byte => IO_SIZE_BYTE,
            Self::Word => IO_SIZE_WORD,
            Self::Dword => IO_SIZE_DWORD,
        }
    }

    /// Keeps the bytes of `data` that an access of this width transfers.
    fn truncate(self, data: u32) -> u32 {
        match self {
            Self::Byte => data & 0xFF,
            Self::Word => data & 0xFFFF,
            Self::Dword => data,
        }
    }
}

/// An open device of the PCI driver.
///
/// Register accesses go through the ioctl packet interface. The packet is
/// kept between calls: [`PciDevice::set_offset`] and the `set_*` data methods
/// stage an access, [`PciDevice::read`] and [`PciDevice::write`] execute it.
/// The sized accessors (`read8`, `write16`, ...) stage and execute in one
/// call.
#[derive(Debug)]
pub struct PciDevice {
    handle: Handle,
    info: DeviceInfo,
    io_data: PciIoctlPacket,
}

impl PciDevice {
    /// Opens the device at `path` and retrieves its information.
    ///
    /// Fails with `ENOTTY` (or another driver error) if `path` is not a device
    /// of the PCI driver.
    pub fn open<P>(path: P) -> Result<Self, Errno>
    where
        P: AsRef<Path>,
    {
        let handle = Handle::open(path)?;
        let info = fetch_info(handle.as_fd())?;
        Ok(Self::with_info(handle, info))
    }

    fn with_info(handle: Handle, info: DeviceInfo) -> Self {
        let io_data = PciIoctlPacket {
            device_index: info.device_index(),
            bar: info.bar(),
            size: IO_SIZE_BYTE,
            ..PciIoctlPacket::default()
        };
        Self {
            handle,
            info,
            io_data,
        }
    }

    /// Closes the device, reporting the error of the underlying `close`.
    pub fn close(self) -> Result<(), Errno> {
        self.handle.close()
    }

    /// Returns the information retrieved when the device was opened.
    #[must_use]
    pub fn device_info(&self) -> &DeviceInfo {
        &self.info
    }

    /// Retrieves the device information again.
    ///
    /// The staged packet is pointed back at the main region.
    pub fn refresh_device_info(&mut self) -> Result<&DeviceInfo, Errno> {
        self.info = fetch_info(self.handle.as_fd())?;
        self.io_data.bar = self.info.bar();
        self.io_data.device_index = self.info.device_index();
        Ok(&self.info)
    }

    /// Returns the plain file interface of the device.
    pub fn handle_mut(&mut self) -> &mut Handle {
        &mut self.handle
    }

    /// Selects the region (base address register) of the following accesses.
    pub fn set_bar(&mut self, bar: u8) {
        self.io_data.bar = bar;
    }

    /// Sets the register offset of the following accesses.
    pub fn set_offset(&mut self, register_offset: u8) {
        self.io_data.offset = register_offset;
    }

    /// Stages an 8-bit access with `data` to write.
    pub fn set_byte(&mut self, data: u8) {
        self.stage(IoSize::Byte, u32::from(data));
    }

    /// Stages a 16-bit access with `data` to write.
    pub fn set_word(&mut self, data: u16) {
        self.stage(IoSize::Word, u32::from(data));
    }

    /// Stages a 32-bit access with `data` to write.
    pub fn set_dword(&mut self, data: u32) {
        self.stage(IoSize::Dword, data);
    }

    fn stage(&mut self, size: IoSize, data: u32) {
        self.io_data.size = size.to_raw();
        self.io_data.data = data;
    }

    /// Returns the staged data, or the result of the last read.
    #[must_use]
    pub fn data(&self) -> u32 {
        self.io_data.data
    }

    /// Returns the staged packet.
    #[must_use]
    pub fn packet(&self) -> &PciIoctlPacket {
        &self.io_data
    }

    /// Executes the staged access as a read and returns the value read.
    pub fn read(&mut self) -> Result<u32, Errno> {
        pci::read(self.handle.as_raw_fd(), &mut self.io_data).into_result()?;
        Ok(self.io_data.data)
    }

    /// Executes the staged access as a write.
    pub fn write(&mut self) -> Result<(), Errno> {
        pci::write(self.handle.as_raw_fd(), &self.io_data).into_result()?;
        Ok(())
    }

    /// Reads a register of the given width at `register_offset`.
    ///
    /// The value is zero-extended to 32 bits.
    pub fn read_sized(&mut self, register_offset: u8, size: IoSize) -> Result<u32, Errno> {
        self.io_data.offset = register_offset;
        self.io_data.size = size.to_raw();
        let data = self.read()?;
        Ok(size.truncate(data))
    }

    /// Writes the low bytes of `data` to a register of the given width at
    /// `register_offset`.
    pub fn write_sized(&mut self, register_offset: u8, size: IoSize, data: u32) -> Result<(), Errno> {
        self.io_data.offset = register_offset;
        self.stage(size, size.truncate(data));
        self.write()
    }

    pub fn read8(&mut self, register_offset: u8) -> Result<u8, Errno> {
        let data = self.read_sized(register_offset, IoSize::Byte)?;
        Ok(data.to_le_bytes()[0])
    }

    pub fn read16(&mut self, register_offset: u8) -> Result<u16, Errno> {
        let [b0, b1, _, _] = self.read_sized(register_offset, IoSize::Word)?.to_le_bytes();
        Ok(u16::from_le_bytes([b0, b1]))
    }

    pub fn read32(&mut self, register_offset: u8) -> Result<u32, Errno> {
        self.read_sized(register_offset, IoSize::Dword)
    }

    pub fn write8(&mut self, register_offset: u8, data: u8) -> Result<(), Errno> {
        self.write_sized(register_offset, IoSize::Byte, u32::from(data))
    }

    pub fn write16(&mut self, register_offset: u8, data: u16) -> Result<(), Errno> {
        self.write_sized(register_offset, IoSize::Word, u32::from(data))
    }

    pub fn write32(&mut self, register_offset: u8, data: u32) -> Result<(), Errno> {
        self.write_sized(register_offset, IoSize::Dword, data)
    }

    /// Blocks until the device raises an interrupt.
    ///
    /// See [`Handle::wait_for_irq`].
    pub fn wait_for_irq(&self) -> Result<(), Errno> {
        self.handle.wait_for_irq()
    }

    /// Cancels an interrupt wait pending on the device.
    pub fn cancel_wait_irq(&self) -> Result<(), Errno> {
        self.handle.cancel_wait_irq()
    }

    fn query(&self, request: u32) -> Result<i64, Errno> {
        pci::query(self.handle.as_raw_fd(), request).into_result()
    }

    fn query_flag(&self, request: u32) -> Result<bool, Errno> {
        Ok(self.query(request)? != 0)
    }

    fn query_u32(&self, request: u32) -> Result<u32, Errno> {
        // values travel through the `int` return value of ioctl
        let value = i32::try_from(self.query(request)?).ok().ok_or(Errno::EIO)?;
        Ok(value.cast_unsigned())
    }

    /// Returns the number of devices registered by the driver.
    pub fn total_device_count(&self) -> Result<u32, Errno> {
        self.query_u32(ioctl::GET_TOTAL_DEVICE_COUNT)
    }

    pub fn is_pci(&self) -> Result<bool, Errno> {
        self.query_flag(ioctl::GET_DEVICE_IS_PCI)
    }

    pub fn is_pcie(&self) -> Result<bool, Errno> {
        self.query_flag(ioctl::GET_DEVICE_IS_PCIE)
    }

    pub fn is_usb(&self) -> Result<bool, Errno> {
        self.query_flag(ioctl::GET_DEVICE_IS_USB)
    }

    /// Returns `true` if the device can raise interrupts.
    pub fn irq_capable(&self) -> Result<bool, Errno> {
        self.query_flag(ioctl::GET_DEVICE_IRQ_CAPABLE)
    }

    /// Returns `true` while an interrupt wait is pending.
    pub fn waiting_for_irq(&self) -> Result<bool, Errno> {
        self.query_flag(ioctl::GET_DEVICE_WAITING_FOR_IRQ)
    }

    /// Returns `true` if the last interrupt wait was cancelled.
    pub fn irq_cancelled(&self) -> Result<bool, Errno> {
        self.query_flag(ioctl::GET_DEVICE_IRQ_CANCELLED)
    }

    /// Returns the start address of the PLX bridge region.
    pub fn plx_start(&self) -> Result<u32, Errno> {
        self.query_u32(ioctl::GET_DEVICE_PLX_START)
    }

    /// Returns the end address of the PLX bridge region.
    pub fn plx_end(&self) -> Result<u32, Errno> {
        self.query_u32(ioctl::GET_DEVICE_PLX_END)
    }
}

fn fetch_info(fd: BorrowedFd<'_>) -> Result<DeviceInfo, Errno> {
    let mut info = PciInfo::default();
    pci::get_pci_info(fd.as_raw_fd(), &mut info).into_result()?;
    Ok(DeviceInfo::from(info))
}

impl RegisterPort for PciDevice {
    type Error = Errno;

    fn select(&mut self, offset: u8) -> Result<(), Self::Error> {
        self.set_offset(offset);
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        let offset = self.io_data.offset;
        self.read8(offset)
    }

    fn write_byte(&mut self, value: u8) -> Result<(), Self::Error> {
        let offset = self.io_data.offset;
        self.write8(offset, value)
    }
}

impl AsFd for PciDevice {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.handle.as_fd()
    }
}

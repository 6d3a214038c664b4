use std::{
    os::fd::{AsFd, AsRawFd as _, BorrowedFd},
    path::Path,
};

use accesio_sys::{
    Errno,
    usb::{self, MSG_TYPE_BULK, MSG_TYPE_CTRL, UsbInfo, UsbIoctlPacket},
};

use crate::{Handle, UsbDeviceInfo};

/// An open device of the USB driver.
///
/// Transfers are limited to `u16::MAX` bytes; an empty buffer or a larger
/// one is rejected with `EINVAL` before reaching the driver.
#[derive(Debug)]
pub struct UsbDevice {
    handle: Handle,
    info: UsbDeviceInfo,
}

impl UsbDevice {
    /// Opens the device at `path` and retrieves its information.
    pub fn open<P>(path: P) -> Result<Self, Errno>
    where
        P: AsRef<Path>,
    {
        let handle = Handle::open(path)?;
        let mut info = UsbInfo::default();
        usb::get_usb_info(handle.as_fd().as_raw_fd(), &mut info).into_result()?;
        Ok(Self::with_info(handle, info))
    }

    fn with_info(handle: Handle, info: UsbInfo) -> Self {
        Self {
            handle,
            info: UsbDeviceInfo::from(info),
        }
    }

    /// Closes the device, reporting the error of the underlying `close`.
    pub fn close(self) -> Result<(), Errno> {
        self.handle.close()
    }

    #[must_use]
    pub fn device_info(&self) -> &UsbDeviceInfo {
        &self.info
    }

    /// Reads from the bulk in endpoint into `buf`.
    pub fn bulk_read(&mut self, buf: &mut [u8]) -> Result<(), Errno> {
        let mut packet = Self::packet(MSG_TYPE_BULK, buf.as_mut_ptr(), buf.len())?;
        unsafe { usb::read(self.handle.as_fd().as_raw_fd(), &mut packet) }.into_result()?;
        Ok(())
    }

    /// Writes `buf` to the bulk out endpoint.
    pub fn bulk_write(&mut self, buf: &[u8]) -> Result<(), Errno> {
        let mut packet = Self::packet(MSG_TYPE_BULK, buf.as_ptr().cast_mut(), buf.len())?;
        unsafe { usb::write(self.handle.as_fd().as_raw_fd(), &mut packet) }.into_result()?;
        Ok(())
    }

    /// Issues a vendor control request reading into `buf`.
    pub fn control_read(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
    ) -> Result<(), Errno> {
        let mut packet = UsbIoctlPacket {
            request,
            value,
            index,
            ..Self::packet(MSG_TYPE_CTRL, buf.as_mut_ptr(), buf.len())?
        };
        unsafe { usb::read(self.handle.as_fd().as_raw_fd(), &mut packet) }.into_result()?;
        Ok(())
    }

    /// Issues a vendor control request sending `buf`.
    pub fn control_write(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        buf: &[u8],
    ) -> Result<(), Errno> {
        let mut packet = UsbIoctlPacket {
            request,
            value,
            index,
            ..Self::packet(MSG_TYPE_CTRL, buf.as_ptr().cast_mut(), buf.len())?
        };
        unsafe { usb::write(self.handle.as_fd().as_raw_fd(), &mut packet) }.into_result()?;
        Ok(())
    }

    fn packet(msg_type: i32, data: *mut u8, len: usize) -> Result<UsbIoctlPacket, Errno> {
        let data_len = transfer_len(len)?;
        Ok(UsbIoctlPacket {
            data: data.cast(),
            data_len,
            msg_type,
            request: 0,
            value: 0,
            index: 0,
        })
    }
}

fn transfer_len(len: usize) -> Result<u16, Errno> {
    match u16::try_from(len) {
        Ok(0) | Err(_) => Err(Errno::EINVAL),
        Ok(len) => Ok(len),
    }
}

impl AsFd for UsbDevice {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.handle.as_fd()
    }
}

#[cfg(test)]
mod tests {
    use std::{env, fs, path::PathBuf, process};

    use super::*;

    /// A device on a regular file, so every ioctl fails with `ENOTTY`.
    struct FakeDevice {
        path: PathBuf,
        device: UsbDevice,
    }

    impl FakeDevice {
        fn new(name: &str) -> Self {
            let path = env::temp_dir().join(format!("accesio-usb-{}-{name}", process::id()));
            fs::write(&path, b"").unwrap();
            let handle = Handle::open(&path).unwrap();
            let info = UsbInfo {
                device_index: 1,
                product_id: 0x8040,
                ..UsbInfo::default()
            };
            let device = UsbDevice::with_info(handle, info);
            Self { path, device }
        }
    }

    impl Drop for FakeDevice {
        fn drop(&mut self) {
            let _ = fs::remove_file(&self.path);
        }
    }

    #[test]
    fn test_device_info() {
        let fake = FakeDevice::new("info");
        assert_eq!(fake.device.device_info().device_index(), 1);
        assert_eq!(fake.device.device_info().product_id(), 0x8040);
    }

    #[test]
    fn test_bulk_transfers() {
        let mut fake = FakeDevice::new("bulk");
        let device = &mut fake.device;

        let mut buf = [0; 64];
        assert_eq!(device.bulk_read(&mut buf), Err(Errno::ENOTTY));
        assert_eq!(device.bulk_write(&buf), Err(Errno::ENOTTY));
        assert_eq!(buf, [0; 64]);

        assert_eq!(device.bulk_read(&mut []), Err(Errno::EINVAL));
        assert_eq!(device.bulk_write(&[]), Err(Errno::EINVAL));
        let large = vec![0_u8; usize::from(u16::MAX) + 1];
        assert_eq!(device.bulk_write(&large), Err(Errno::EINVAL));
    }

    #[test]
    fn test_control_transfers() {
        let mut fake = FakeDevice::new("control");
        let device = &mut fake.device;

        let mut buf = [0; 2];
        assert_eq!(device.control_read(0xA2, 0, 0, &mut buf), Err(Errno::ENOTTY));
        assert_eq!(device.control_write(0xA3, 1, 2, &buf), Err(Errno::ENOTTY));
        assert_eq!(device.control_read(0xA2, 0, 0, &mut []), Err(Errno::EINVAL));
        assert_eq!(device.control_write(0xA3, 0, 0, &[]), Err(Errno::EINVAL));
    }

    #[test]
    fn test_transfer_len() {
        assert_eq!(transfer_len(0), Err(Errno::EINVAL));
        assert_eq!(transfer_len(1), Ok(1));
        assert_eq!(transfer_len(usize::from(u16::MAX)), Ok(u16::MAX));
        assert_eq!(transfer_len(usize::from(u16::MAX) + 1), Err(Errno::EINVAL));
    }
}

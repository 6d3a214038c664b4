use std::{
    os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, IntoRawFd, OwnedFd, RawFd},
    path::Path,
};

use accesio_sys::{Errno, file, pci};

use crate::{RegisterPort, path};

/// An open device handle using the plain file interface of the driver.
///
/// The file position is the register offset: [`Handle::set_register_offset`]
/// selects the register that the following [`Handle::read`] or
/// [`Handle::write`] transfers a single byte from or to.
///
/// The handle is closed when dropped; use [`Handle::close`] to observe close
/// errors.
#[derive(Debug)]
pub struct Handle {
    fd: OwnedFd,
}

impl Handle {
    /// Opens the device at `path`, usually under `/dev/accesio/`.
    ///
    /// The path is handed to the operating system as is.
    pub fn open<P>(path: P) -> Result<Self, Errno>
    where
        P: AsRef<Path>,
    {
        let fd = path::open_device(path.as_ref())?;
        Ok(Self { fd })
    }

    /// Closes the handle, reporting the error of the underlying `close`.
    pub fn close(self) -> Result<(), Errno> {
        let fd = self.fd.into_raw_fd();
        unsafe { file::close(fd) }.into_result()?;
        Ok(())
    }

    /// Sets the register offset for future reads and writes.
    pub fn set_register_offset(&mut self, offset: u64) -> Result<(), Errno> {
        let offset = libc::off_t::try_from(offset).ok().ok_or(Errno::EINVAL)?;
        file::lseek(self.fd.as_raw_fd(), offset).into_result()?;
        Ok(())
    }

    /// Reads one byte at the current register offset.
    ///
    /// The driver transfers nothing when the offset is past the end of the
    /// region; that is reported as `EIO`.
    pub fn read(&mut self) -> Result<u8, Errno> {
        let mut buf = [0; 1];
        let nread = file::read(self.fd.as_raw_fd(), &mut buf).into_result()?;
        if nread == 0 {
            return Err(Errno::EIO);
        }
        Ok(buf[0])
    }

    /// Writes one byte at the current register offset.
    pub fn write(&mut self, data: u8) -> Result<(), Errno> {
        let nwritten = file::write(self.fd.as_raw_fd(), &[data]).into_result()?;
        if nwritten == 0 {
            return Err(Errno::EIO);
        }
        Ok(())
    }

    /// Reads one byte at `offset`.
    pub fn read_offset(&mut self, offset: u64) -> Result<u8, Errno> {
        self.set_register_offset(offset)?;
        self.read()
    }

    /// Writes one byte at `offset`.
    pub fn write_offset(&mut self, offset: u64, data: u8) -> Result<(), Errno> {
        self.set_register_offset(offset)?;
        self.write(data)
    }

    /// Blocks until the device raises an interrupt.
    ///
    /// Fails with `ECANCELED` when the wait is cancelled with
    /// [`Handle::cancel_wait_irq`] and with `EALREADY` when another wait is
    /// pending. USB devices report `ENOSYS`.
    pub fn wait_for_irq(&self) -> Result<(), Errno> {
        pci::wait(self.fd.as_raw_fd()).into_result()?;
        Ok(())
    }

    /// Cancels an interrupt wait pending on the device.
    pub fn cancel_wait_irq(&self) -> Result<(), Errno> {
        pci::cancel_wait(self.fd.as_raw_fd()).into_result()?;
        Ok(())
    }
}

impl RegisterPort for Handle {
    type Error = Errno;

    fn select(&mut self, offset: u8) -> Result<(), Self::Error> {
        self.set_register_offset(u64::from(offset))
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        self.read()
    }

    fn write_byte(&mut self, value: u8) -> Result<(), Self::Error> {
        self.write(value)
    }
}

impl AsFd for Handle {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for Handle {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl IntoRawFd for Handle {
    fn into_raw_fd(self) -> RawFd {
        self.fd.into_raw_fd()
    }
}

impl FromRawFd for Handle {
    unsafe fn from_raw_fd(fd: RawFd) -> Self {
        Self {
            fd: unsafe { OwnedFd::from_raw_fd(fd) },
        }
    }
}

impl From<OwnedFd> for Handle {
    fn from(fd: OwnedFd) -> Self {
        Self { fd }
    }
}

impl From<Handle> for OwnedFd {
    fn from(handle: Handle) -> Self {
        handle.fd
    }
}

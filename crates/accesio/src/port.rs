/// Byte-wide access to the registers of a device.
///
/// An access is a two step operation: [`RegisterPort::select`] chooses the
/// register offset, then [`RegisterPort::read_byte`] or
/// [`RegisterPort::write_byte`] transfers one byte at that offset.
pub trait RegisterPort {
    type Error;

    /// Selects the register offset of the following transfers.
    fn select(&mut self, offset: u8) -> Result<(), Self::Error>;

    /// Reads one byte at the selected offset.
    fn read_byte(&mut self) -> Result<u8, Self::Error>;

    /// Writes one byte at the selected offset.
    fn write_byte(&mut self, value: u8) -> Result<(), Self::Error>;
}

impl<P> RegisterPort for &mut P
where
    P: RegisterPort + ?Sized,
{
    type Error = P::Error;

    fn select(&mut self, offset: u8) -> Result<(), Self::Error> {
        (**self).select(offset)
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        (**self).read_byte()
    }

    fn write_byte(&mut self, value: u8) -> Result<(), Self::Error> {
        (**self).write_byte(value)
    }
}

use core::error::Error;
use std::io::Write;

use accesio::RegisterPort;
use snafu::ResultExt as _;
use snafu_utils::GenericError;

/// Register offsets visited by a sweep of `count` registers.
fn offsets(count: u16) -> impl Iterator<Item = u8> {
    (0..=u8::MAX).take(usize::from(count))
}

/// Reads one byte from each of the first `count` registers, printing every
/// value read.
///
/// Stops at the first failing access.
pub fn read_sweep<P, W>(port: &mut P, count: u16, out: &mut W) -> Result<(), GenericError>
where
    P: RegisterPort,
    P::Error: Error + 'static,
    W: Write,
{
    for offset in offsets(count) {
        writeln!(out, "Reading from offset {offset:#04X}").whatever_context("failed to print")?;
        trace!("select, offset={offset:#04X}");
        port.select(offset)
            .with_whatever_context(|_| format!("failed to select register, offset={offset:#04X}"))?;
        let data = port
            .read_byte()
            .with_whatever_context(|_| format!("failed to read register, offset={offset:#04X}"))?;
        trace!("read, offset={offset:#04X}, data={data:#04X}");
        writeln!(out, "data read = {data:#04X}").whatever_context("failed to print")?;
    }
    Ok(())
}

/// Writes `value` to each of the first `count` registers, printing a
/// confirmation for every write.
///
/// Stops at the first failing access; registers already written are left as
/// they are.
pub fn write_sweep<P, W>(
    port: &mut P,
    count: u16,
    value: u8,
    out: &mut W,
) -> Result<(), GenericError>
where
    P: RegisterPort,
    P::Error: Error + 'static,
    W: Write,
{
    for offset in offsets(count) {
        writeln!(out, "Writing {value:#04X} to offset {offset:#04X}")
            .whatever_context("failed to print")?;
        trace!("select, offset={offset:#04X}");
        port.select(offset)
            .with_whatever_context(|_| format!("failed to select register, offset={offset:#04X}"))?;
        port.write_byte(value)
            .with_whatever_context(|_| format!("failed to write register, offset={offset:#04X}"))?;
        trace!("write, offset={offset:#04X}, data={value:#04X}");
        writeln!(out, "wrote data").whatever_context("failed to print")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io;

    use accesio::Errno;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Select(u8),
        Read,
        Write(u8),
    }

    #[derive(Default)]
    struct RecordingPort {
        calls: Vec<Call>,
        offset: u8,
        fail_at: Option<u8>,
    }

    impl RegisterPort for RecordingPort {
        type Error = Errno;

        fn select(&mut self, offset: u8) -> Result<(), Self::Error> {
            self.calls.push(Call::Select(offset));
            self.offset = offset;
            Ok(())
        }

        fn read_byte(&mut self) -> Result<u8, Self::Error> {
            self.calls.push(Call::Read);
            if self.fail_at == Some(self.offset) {
                return Err(Errno::EFAULT);
            }
            Ok(self.offset.wrapping_mul(3))
        }

        fn write_byte(&mut self, value: u8) -> Result<(), Self::Error> {
            self.calls.push(Call::Write(value));
            if self.fail_at == Some(self.offset) {
                return Err(Errno::EFAULT);
            }
            Ok(())
        }
    }

    #[test]
    fn test_read_sweep_selects_before_each_read() {
        let mut port = RecordingPort::default();
        let mut out: Vec<u8> = vec![];
        read_sweep(&mut port, 16, &mut out).unwrap();

        let expected = (0..16)
            .flat_map(|offset| [Call::Select(offset), Call::Read])
            .collect::<Vec<_>>();
        assert_eq!(port.calls, expected);

        let out = String::from_utf8(out).unwrap();
        let lines = out.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 32);
        assert_eq!(lines[0], "Reading from offset 0x00");
        assert_eq!(lines[1], "data read = 0x00");
        assert_eq!(lines[30], "Reading from offset 0x0F");
        assert_eq!(lines[31], "data read = 0x2D");
    }

    #[test]
    fn test_write_sweep_writes_value_at_each_offset() {
        let mut port = RecordingPort::default();
        let mut out: Vec<u8> = vec![];
        write_sweep(&mut port, 16, 0x00, &mut out).unwrap();

        let expected = (0..16)
            .flat_map(|offset| [Call::Select(offset), Call::Write(0x00)])
            .collect::<Vec<_>>();
        assert_eq!(port.calls, expected);

        let out = String::from_utf8(out).unwrap();
        let lines = out.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "Writing 0x00 to offset 0x00");
        assert_eq!(lines[1], "wrote data");
        assert_eq!(lines[30], "Writing 0x00 to offset 0x0F");
    }

    #[test]
    fn test_sweep_stops_at_first_error() {
        let mut port = RecordingPort {
            fail_at: Some(3),
            ..RecordingPort::default()
        };
        let mut out: Vec<u8> = vec![];
        let err = read_sweep(&mut port, 16, &mut out).unwrap_err();
        assert_eq!(err.to_string(), "failed to read register, offset=0x03");
        assert_eq!(port.calls.len(), 8);
        assert_eq!(port.calls.last(), Some(&Call::Read));

        let out = String::from_utf8(out).unwrap();
        assert!(out.ends_with("Reading from offset 0x03\n"));
    }

    #[test]
    fn test_sweep_count() {
        assert_eq!(offsets(0).count(), 0);
        assert_eq!(offsets(1).collect::<Vec<_>>(), [0]);
        assert_eq!(offsets(256).last(), Some(0xFF));

        let mut port = RecordingPort::default();
        write_sweep(&mut port, 2, 0xA5, &mut io::sink()).unwrap();
        assert_eq!(
            port.calls,
            [
                Call::Select(0),
                Call::Write(0xA5),
                Call::Select(1),
                Call::Write(0xA5)
            ]
        );
    }
}

use core::str::FromStr;
use std::{
    io::{self, Write},
    path::PathBuf,
    process,
};

use ansi_term::ColorChoice;
use argh::FromArgs;
use snafu::ResultExt as _;
use snafu_utils::{GenericError, Report};

use self::{log::LogLevel, session::Backend};

#[macro_use]
mod log;
mod session;
mod shell;
mod sweep;
mod usb_report;

const USAGE: &str = "usage: accesio-test /dev/accesio/device";

/// Upper bound of `--count`, the size of the register offset space.
const MAX_COUNT: u16 = 256;

/// Read every register of an ACCES I/O card, then write a value to each.
#[derive(Debug, FromArgs)]
struct Args {
    /// device file, such as /dev/accesio/device0
    #[argh(positional)]
    device: Option<PathBuf>,

    /// register access (`file`, `ioctl` or `shell`)
    #[argh(option, default = "Default::default()")]
    backend: Backend,
    /// number of registers to sweep, 1 to 256 (defaults to 16, or the region length with `ioctl`)
    #[argh(option)]
    count: Option<Count>,
    /// byte written to every register, decimal or 0x-prefixed hex (defaults to 0x00)
    #[argh(option, default = "Byte(0)")]
    value: Byte,
    /// skip the write sweep
    #[argh(switch)]
    read_only: bool,
    /// path of the dd program used by the shell backend
    #[argh(option, default = "PathBuf::from(\"dd\")")]
    dd: PathBuf,
    /// path of the hexdump program used by the shell backend
    #[argh(option, default = "PathBuf::from(\"hexdump\")")]
    hexdump: PathBuf,
    /// log threshold (`trace`, `debug`, `info`, `warn` or `error`), overrides `ACCESIO_LOG`
    #[argh(option)]
    log_level: Option<LogLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Count(u16);

impl FromStr for Count {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let count = parse_number(s)?;
        match u16::try_from(count) {
            Ok(count @ 1..=MAX_COUNT) => Ok(Self(count)),
            _ => Err(format!("count must be between 1 and {MAX_COUNT}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Byte(u8);

impl FromStr for Byte {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = parse_number(s)?;
        u8::try_from(value)
            .map(Self)
            .map_err(|e| format!("value out of range: {e}"))
    }
}

fn parse_number(s: &str) -> Result<u32, String> {
    let res = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    res.map_err(|e| format!("invalid number {s:?}: {e}"))
}

fn main() {
    let args: Args = argh::from_env();
    log::init(args.log_level);

    let res = run(&args, &mut io::stdout().lock());
    if let Err(err) = res {
        let report = Report::new(err).with_color(ColorChoice::detect(&io::stderr()));
        eprintln!("{report}");
        process::exit(1);
    }
}

fn run<W>(args: &Args, out: &mut W) -> Result<(), GenericError>
where
    W: Write,
{
    let Some(device) = &args.device else {
        writeln!(out, "{USAGE}").whatever_context("failed to print usage")?;
        return Ok(());
    };

    let is_usb = device
        .as_os_str()
        .as_encoded_bytes()
        .windows(4)
        .any(|w| w == b"usb_");
    if is_usb {
        session::report_usb(device, out).with_whatever_context(|_| {
            format!("failed to query USB device, path={}", device.display())
        })?;
    } else {
        session::exercise(args, device, out).with_whatever_context(|_| {
            format!("failed to exercise device, path={}", device.display())
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, argh::EarlyExit> {
        Args::from_args(&["accesio-test"], args)
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["/dev/accesio/device0"]).unwrap();
        assert_eq!(args.device, Some(PathBuf::from("/dev/accesio/device0")));
        assert_eq!(args.backend, Backend::File);
        assert_eq!(args.count, None);
        assert_eq!(args.value, Byte(0));
        assert!(!args.read_only);
        assert_eq!(args.dd, PathBuf::from("dd"));
        assert_eq!(args.log_level, None);
    }

    #[test]
    fn test_options() {
        let args = parse(&[
            "--backend",
            "ioctl",
            "--count",
            "0x20",
            "--value",
            "0xA5",
            "--read-only",
            "--log-level",
            "debug",
            "/dev/accesio/device1",
        ])
        .unwrap();
        assert_eq!(args.backend, Backend::Ioctl);
        assert_eq!(args.count, Some(Count(0x20)));
        assert_eq!(args.value, Byte(0xA5));
        assert!(args.read_only);
        assert_eq!(args.log_level, Some(LogLevel::Debug));
    }

    #[test]
    fn test_invalid_numbers() {
        parse(&["--count", "0", "dev"]).unwrap_err();
        parse(&["--count", "257", "dev"]).unwrap_err();
        assert_eq!("256".parse(), Ok(Count(256)));
        parse(&["--value", "256", "dev"]).unwrap_err();
        parse(&["--value", "0xZZ", "dev"]).unwrap_err();
        parse(&["--backend", "mmap", "dev"]).unwrap_err();
    }

    #[test]
    fn test_usage_without_device() {
        let args = parse(&[]).unwrap();
        let mut out: Vec<u8> = vec![];
        run(&args, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), format!("{USAGE}\n"));
    }
}

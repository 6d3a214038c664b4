use core::{error::Error, str::FromStr};
use std::{io::Write, path::Path};

use accesio::{Handle, PciDevice, RegisterPort, UsbDevice};
use snafu::ResultExt as _;
use snafu_utils::GenericError;

use crate::{Args, MAX_COUNT, shell::ShellPort, sweep, usb_report};

/// Number of registers swept when `--count` is not given.
const DEFAULT_COUNT: u16 = 16;

/// How register accesses reach the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, derive_more::Display)]
pub enum Backend {
    /// `lseek` and single byte `read`/`write` on the device file.
    #[default]
    #[display("file")]
    File,
    /// The packet ioctls of the PCI driver.
    #[display("ioctl")]
    Ioctl,
    /// `dd` and `hexdump` child processes.
    #[display("shell")]
    Shell,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(Self::File),
            "ioctl" => Ok(Self::Ioctl),
            "shell" => Ok(Self::Shell),
            _ => Err("expected file, ioctl or shell".into()),
        }
    }
}

fn open_failed(device: &Path) -> String {
    format!("could not open device '{}' (are you root?)", device.display())
}

/// Opens `device` with the selected backend and runs the sweeps on it.
pub fn exercise<W>(args: &Args, device: &Path, out: &mut W) -> Result<(), GenericError>
where
    W: Write,
{
    info!(
        "opening device, path={}, backend={}",
        device.display(),
        args.backend
    );
    match args.backend {
        Backend::File => {
            let mut handle = Handle::open(device).with_whatever_context(|_| open_failed(device))?;
            run_sweeps(&mut handle, args, DEFAULT_COUNT, device, out)?;
            handle.close().whatever_context("failed to close device")?;
        }
        Backend::Ioctl => {
            let mut pci =
                PciDevice::open(device).with_whatever_context(|_| open_failed(device))?;
            let info = pci.device_info();
            let base = info.base_region();
            debug!(
                "device info, index={}, product_id={:#06X}, bar={}, type={}, start={:#X}, length={}",
                info.device_index(),
                info.product_id(),
                info.bar(),
                base.address_type,
                base.start,
                base.length,
            );
            let region_count = u16::try_from(base.length.min(u32::from(MAX_COUNT))).unwrap_or(MAX_COUNT);
            run_sweeps(&mut pci, args, region_count, device, out)?;
            pci.close().whatever_context("failed to close device")?;
        }
        Backend::Shell => {
            let mut port = ShellPort::open(device, &args.dd, &args.hexdump)
                .with_whatever_context(|_| open_failed(device))?;
            run_sweeps(&mut port, args, DEFAULT_COUNT, device, out)?;
        }
    }
    info!("device closed, path={}", device.display());
    Ok(())
}

fn run_sweeps<P, W>(
    port: &mut P,
    args: &Args,
    default_count: u16,
    device: &Path,
    out: &mut W,
) -> Result<(), GenericError>
where
    P: RegisterPort,
    P::Error: Error + 'static,
    W: Write,
{
    let count = args.count.map_or(default_count, |count| count.0);
    if count == 0 {
        warn!("nothing to sweep, path={}", device.display());
    }
    writeln!(out, "Communicating with device {}", device.display())
        .whatever_context("failed to print")?;
    sweep::read_sweep(port, count, out)?;
    if args.read_only {
        debug!("write sweep skipped");
    } else {
        sweep::write_sweep(port, count, args.value.0, out)?;
    }
    Ok(())
}

/// Opens the USB device at `device` and prints its information.
pub fn report_usb<W>(device: &Path, out: &mut W) -> Result<(), GenericError>
where
    W: Write,
{
    info!("opening USB device, path={}", device.display());
    let usb = UsbDevice::open(device).with_whatever_context(|_| open_failed(device))?;
    usb_report::write_usb_report(out, device, usb.device_info())
        .whatever_context("failed to print")?;
    usb.close().whatever_context("failed to close device")?;
    Ok(())
}

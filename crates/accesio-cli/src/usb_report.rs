use std::{
    io::{self, Write},
    path::Path,
};

use accesio::{UsbDeviceInfo, UsbEndpointKind};

/// Prints the information the USB driver reports about a device.
pub fn write_usb_report<W>(out: &mut W, path: &Path, info: &UsbDeviceInfo) -> io::Result<()>
where
    W: Write,
{
    let raw = info.raw();
    writeln!(out, "Device {} opened:", path.display())?;
    for kind in UsbEndpointKind::ALL {
        let ep = info.endpoint(kind);
        if ep.in_address == 0 && ep.out_address == 0 && kind != UsbEndpointKind::Bulk {
            continue;
        }
        writeln!(out, "ep_{kind}_in_addr: {}", ep.in_address)?;
        writeln!(out, "ep_{kind}_in_buffer_size: {}", ep.in_buffer_size)?;
        writeln!(out, "ep_{kind}_out_addr: {}", ep.out_address)?;
        writeln!(out, "ep_{kind}_out_buffer_size: {}", ep.out_buffer_size)?;
    }
    writeln!(out, "errors: {}", info.errors())?;
    writeln!(out, "reading: {}", u8::from(info.ongoing_read()))?;
    writeln!(out, "device index: {}", info.device_index())?;
    writeln!(out, "product_id: {:#06X}", info.product_id())?;
    writeln!(out, "kernel_devnum: {}", raw.kernel_devnum)?;
    if let Some(devpath) = info.kernel_devpath().filter(|p| !p.is_empty()) {
        writeln!(out, "kernel_devpath: {devpath}")?;
    }
    writeln!(out, "kernel_route: {}", raw.kernel_route)?;
    writeln!(out, "kernel_usb_state: {}", raw.kernel_usb_state)?;
    writeln!(out, "kernel_usb_speed: {}", raw.kernel_usb_speed)?;
    writeln!(out, "kernel_usb_bus_mA: {}", raw.kernel_usb_bus_ma)?;
    writeln!(out, "kernel_usb_portnum: {}", raw.kernel_usb_portnum)?;
    writeln!(out, "kernel_usb_level: {}", raw.kernel_usb_level)?;
    writeln!(out, "kernel_usb_wusb: {}", raw.kernel_usb_wusb)?;
    writeln!(out, "kernel_usb_lpm_capable: {}", raw.kernel_usb_lpm_capable)?;
    writeln!(out, "kernel_usb_string_langid: {}", raw.kernel_usb_string_langid)?;
    writeln!(out, "kernel_usb_quirks: {}", raw.kernel_usb_quirks)?;
    writeln!(out, "kernel_usb_urbnum: {}", raw.kernel_usb_urbnum)?;
    writeln!(out, "kernel_usb_active_duration: {}", raw.kernel_usb_active_duration)?;
    writeln!(out, "kernel_usb_slot_id: {}", raw.kernel_usb_slot_id)?;
    writeln!(out, "kernel_usb_lpm_disable_count: {}", raw.kernel_usb_lpm_disable_count)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use accesio_sys::usb::{ENDPOINT_BULK, ENDPOINT_INT, UsbInfo};

    use super::*;

    #[test]
    fn test_usb_report() {
        let mut raw = UsbInfo::default();
        raw.endpoints[ENDPOINT_BULK].in_address = 0x82;
        raw.endpoints[ENDPOINT_BULK].in_buffer_size = 512;
        raw.endpoints[ENDPOINT_BULK].out_address = 0x02;
        raw.endpoints[ENDPOINT_BULK].out_buffer_size = 512;
        raw.endpoints[ENDPOINT_INT].in_address = 0x81;
        raw.product_id = 0x8040;
        raw.kernel_usb_bus_ma = 500;
        let info = UsbDeviceInfo::from(raw);

        let mut out: Vec<u8> = vec![];
        write_usb_report(&mut out, Path::new("/dev/accesio/usb_aio16_16f_0"), &info).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines = out.lines().collect::<Vec<_>>();

        assert_eq!(lines[0], "Device /dev/accesio/usb_aio16_16f_0 opened:");
        assert_eq!(lines[1], "ep_bulk_in_addr: 130");
        assert_eq!(lines[2], "ep_bulk_in_buffer_size: 512");
        assert_eq!(lines[3], "ep_bulk_out_addr: 2");
        assert_eq!(lines[5], "ep_int_in_addr: 129");
        assert!(!out.contains("ep_ctrl"));
        assert!(lines.contains(&"product_id: 0x8040"));
        assert!(lines.contains(&"kernel_usb_bus_mA: 500"));
        assert!(!out.contains("kernel_devpath"));
        assert!(out.ends_with("kernel_usb_lpm_disable_count: 0\n\n"));
    }
}

#![cfg(test)]

use std::{
    ffi::CString,
    fs,
    os::unix::ffi::OsStrExt as _,
    path::{Path, PathBuf},
    process,
};

use acces::{
    cancel_wait_irq, close_handle, open_device, read_handle, read_offset, set_register_offset,
    wait_for_irq, write_handle, write_offset,
};

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("accesio-ffi-{}-{name}", process::id()))
}

fn c_path(path: &Path) -> CString {
    CString::new(path.as_os_str().as_bytes()).unwrap()
}

#[test]
fn byte_access_through_c_abi() {
    let path = scratch_path("bytes");
    fs::write(&path, [0x11; 16]).unwrap();
    let c_path = c_path(&path);

    unsafe {
        let fd = open_device(c_path.as_ptr());
        assert!(fd > 0, "open_device returned {fd}");

        assert_eq!(write_offset(fd, 3, 0x1A5), 0);
        assert_eq!(read_offset(fd, 3), 0xA5);

        assert_eq!(set_register_offset(fd, 7), 0);
        assert_eq!(write_handle(fd, 0xFF), 0);
        assert_eq!(set_register_offset(fd, 7), 0);
        assert_eq!(read_handle(fd), 0xFF);

        assert_eq!(read_offset(fd, 0), 0x11);
        assert_eq!(read_offset(fd, -1), -libc::EINVAL);
        assert_eq!(wait_for_irq(fd), -libc::ENOTTY);
        assert_eq!(cancel_wait_irq(fd), -libc::ENOTTY);

        assert_eq!(close_handle(fd), 0);
    }

    let contents = fs::read(&path).unwrap();
    assert_eq!(contents[3], 0xA5);
    assert_eq!(contents[7], 0xFF);
    fs::remove_file(&path).unwrap();
}

#[test]
fn missing_device_reports_errno() {
    let path = c_path(&scratch_path("missing"));
    assert_eq!(unsafe { open_device(path.as_ptr()) }, -libc::ENOENT);
}

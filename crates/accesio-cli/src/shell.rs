//! Register access through the `dd` and `hexdump` command-line tools.
//!
//! Every transfer spawns `dd` on the device file with a one byte block size
//! and uses the register offset as block number, so it behaves like an
//! `lseek` followed by a single byte `read`/`write`.

use std::{
    ffi::{OsStr, OsString},
    fs,
    io::{self, Write as _},
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus, Output, Stdio},
};

use accesio::RegisterPort;

/// `hexdump` format printing every byte as two upper case hex digits.
const HEXDUMP_FORMAT: &str = r#"1/1 "%02X""#;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ShellError {
    #[display("failed to run {}", program.display())]
    Run { program: PathBuf, source: io::Error },
    #[display("{} exited with {status}: {}", program.display(), stderr.trim())]
    Status {
        program: PathBuf,
        status: ExitStatus,
        stderr: String,
    },
    #[display("unexpected hexdump output {output:?}")]
    Parse { output: String },
}

/// Register port backed by external `dd` and `hexdump` processes.
#[derive(Debug)]
pub struct ShellPort {
    device: PathBuf,
    dd: PathBuf,
    hexdump: PathBuf,
    offset: u8,
}

impl ShellPort {
    /// Creates a port for the device at `device`.
    ///
    /// The device must exist; it is opened anew by every transfer.
    pub fn open(device: &Path, dd: &Path, hexdump: &Path) -> io::Result<Self> {
        fs::metadata(device)?;
        Ok(Self {
            device: device.to_owned(),
            dd: dd.to_owned(),
            hexdump: hexdump.to_owned(),
            offset: 0,
        })
    }

    fn dd_read_command(&self) -> Command {
        let mut cmd = Command::new(&self.dd);
        cmd.arg(key_value("if", self.device.as_os_str()))
            .args(["bs=1", "count=1"])
            .arg(format!("skip={}", self.offset));
        cmd
    }

    fn hexdump_command(&self) -> Command {
        let mut cmd = Command::new(&self.hexdump);
        cmd.args(["-v", "-e", HEXDUMP_FORMAT]);
        cmd
    }

    fn dd_write_command(&self) -> Command {
        let mut cmd = Command::new(&self.dd);
        cmd.arg(key_value("of", self.device.as_os_str()))
            .args(["bs=1", "count=1"])
            .arg(format!("seek={}", self.offset))
            .arg("conv=notrunc");
        cmd
    }
}

fn key_value(key: &str, value: &OsStr) -> OsString {
    let mut arg = OsString::from(key);
    arg.push("=");
    arg.push(value);
    arg
}

fn spawn(program: &Path, cmd: &mut Command) -> Result<Child, ShellError> {
    debug!("spawn, command={cmd:?}");
    cmd.spawn().map_err(|source| ShellError::Run {
        program: program.to_owned(),
        source,
    })
}

/// Spawns a process reading the output of `upstream`.
///
/// `upstream` is killed and waited for if the spawn fails.
fn spawn_downstream(
    program: &Path,
    cmd: &mut Command,
    upstream: &mut Child,
) -> Result<Child, ShellError> {
    spawn(program, cmd).inspect_err(|_| reap(upstream))
}

fn reap(child: &mut Child) {
    if let Err(err) = child.kill() {
        debug!("failed to kill child, pid={}, error={err}", child.id());
    }
    if let Err(err) = child.wait() {
        warn!("failed to wait for child, pid={}, error={err}", child.id());
    }
}

fn check(program: &Path, res: io::Result<Output>) -> Result<Vec<u8>, ShellError> {
    let output = res.map_err(|source| ShellError::Run {
        program: program.to_owned(),
        source,
    })?;
    if !output.status.success() {
        return Err(ShellError::Status {
            program: program.to_owned(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(output.stdout)
}

/// Parses the two hex digits printed by `hexdump` for a single byte.
fn parse_hex_byte(output: &[u8]) -> Option<u8> {
    let digits = core::str::from_utf8(output).ok()?.trim();
    if digits.len() != 2 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(digits, 16).ok()
}

impl RegisterPort for ShellPort {
    type Error = ShellError;

    fn select(&mut self, offset: u8) -> Result<(), Self::Error> {
        self.offset = offset;
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        let mut dd = spawn(
            &self.dd,
            self.dd_read_command()
                .stdout(Stdio::piped())
                .stderr(Stdio::piped()),
        )?;
        let dd_stdout = dd.stdout.take().map_or_else(Stdio::null, Stdio::from);
        let hexdump = spawn_downstream(
            &self.hexdump,
            self.hexdump_command()
                .stdin(dd_stdout)
                .stdout(Stdio::piped())
                .stderr(Stdio::piped()),
            &mut dd,
        )?;
        let hexdump_res = hexdump.wait_with_output();
        check(&self.dd, dd.wait_with_output())?;
        let stdout = check(&self.hexdump, hexdump_res)?;
        parse_hex_byte(&stdout).ok_or_else(|| ShellError::Parse {
            output: String::from_utf8_lossy(&stdout).into_owned(),
        })
    }

    fn write_byte(&mut self, value: u8) -> Result<(), Self::Error> {
        let mut dd = spawn(
            &self.dd,
            self.dd_write_command()
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::piped()),
        )?;
        if let Some(mut stdin) = dd.stdin.take()
            && let Err(source) = stdin.write_all(&[value])
        {
            reap(&mut dd);
            return Err(ShellError::Run {
                program: self.dd.clone(),
                source,
            });
        }
        check(&self.dd, dd.wait_with_output())?;
        Ok(())
    }
}

//! The device under test, as seen by the scanner.
//!
//! The scanner only ever needs positional reads and writes plus a flush, so
//! that is all [`BlockDevice`] exposes. Production code binds it to a raw
//! device node; the tests bind it to a simulated card with injectable faults.

use std::{
    fs::{File, OpenOptions},
    io,
    os::unix::fs::{FileExt, OpenOptionsExt},
    path::{Path, PathBuf},
};

/// Byte-addressed device with pread/pwrite semantics.
pub trait BlockDevice {
    /// Write all of `buf` at `offset`. A short write is an error.
    fn write_all_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()>;

    /// Read exactly `buf.len()` bytes from `offset`.
    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()>;

    /// Flush pending writes to stable storage.
    fn sync(&mut self) -> io::Result<()>;
}

/// Hands out fresh handles to the same device, once per pass.
pub trait DeviceOpener {
    type Device: BlockDevice;

    /// Opens the device so that every write reaches the media before returning.
    fn open_for_write(&self) -> io::Result<Self::Device>;

    fn open_for_read(&self) -> io::Result<Self::Device>;
}

/// A device node (or any other file) accessed with positional I/O.
#[derive(Debug)]
pub struct RawDevice {
    file: File,
}

impl BlockDevice for RawDevice {
    fn write_all_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()> {
        self.file.write_all_at(buf, offset)
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.file.read_exact_at(buf, offset)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.file.sync_all()
    }
}

#[derive(Debug, Clone)]
pub struct DevicePath {
    path: PathBuf,
}

impl DevicePath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DeviceOpener for DevicePath {
    type Device = RawDevice;

    fn open_for_write(&self) -> io::Result<RawDevice> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(&self.path)?;
        Ok(RawDevice { file })
    }

    fn open_for_read(&self) -> io::Result<RawDevice> {
        let file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        Ok(RawDevice { file })
    }
}

//! Meta-information about devices under test, and the knobs of a scan.

use std::{
    fs::OpenOptions,
    io::{self, Seek},
    path::Path,
};

use anyhow::Context as _;

use crate::generator::WORD_SIZE;

pub(crate) const SECTOR_SIZE: u64 = 512;
pub(crate) const MIB: u64 = 1024 * 1024;

/// Bytes moved per positional read or write: 128 sectors.
pub(crate) const BUFFER_SIZE: usize = 128 * SECTOR_SIZE as usize;

/// Both passes log a progress line each time they cross this many bytes.
pub(crate) const PROGRESS_INTERVAL: u64 = 10 * MIB;

/// Parameters shared by the write and the read pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub buffer_size: usize,
    pub seed: u64,
}

impl ScanOptions {
    pub fn new(buffer_size: usize, seed: u64) -> anyhow::Result<Self> {
        if buffer_size == 0 || buffer_size % WORD_SIZE != 0 {
            anyhow::bail!(
                "Buffer size must be a positive multiple of {WORD_SIZE} bytes, got {buffer_size}"
            );
        }
        Ok(Self { buffer_size, seed })
    }

    pub(crate) fn buffer_len(&self) -> u64 {
        self.buffer_size as u64
    }
}

/// The size in bytes a card reports for itself, logged before the scan so it
/// can be held against the capacity the write pass actually reaches.
///
/// Block devices report a zero file length, so this seeks to the end instead.
pub fn advertised_capacity(dev_path: &Path) -> anyhow::Result<u64> {
    let mut card = OpenOptions::new()
        .read(true)
        .open(dev_path)
        .with_context(|| format!("Opening {dev_path:?} to query its advertised size"))?;
    card.seek(io::SeekFrom::End(0))
        .with_context(|| format!("Seeking to the end of {dev_path:?}"))
}

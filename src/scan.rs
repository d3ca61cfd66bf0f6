//! Ties the two passes together and summarises what they found.

use crate::device::{BlockDevice as _, DeviceOpener};
use crate::generator::StreamGenerator;
use crate::metadata::{ScanOptions, MIB};
use crate::read_test::{self, ReadStats};
use crate::write_test;
use anyhow::Context as _;
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    /// Bytes written before the device refused a write.
    pub capacity: u64,
    pub read_errors: u64,
    pub compare_errors: u64,
    /// Blocks covered by the read pass.
    pub blocks: u64,
}

impl ScanReport {
    pub fn capacity_mib(&self) -> u64 {
        self.capacity / MIB
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "### RESULTS ###")?;
        writeln!(f, "Apparent size of device: {} MiB", self.capacity_mib())?;
        writeln!(f, "Read errors: {}", self.read_errors)?;
        write!(
            f,
            "Compare errors: {} of {}",
            self.compare_errors, self.blocks
        )
    }
}

/// Writes the whole device, then reads it back and compares.
///
/// Only failing to open the device is an error; everything the device does
/// wrong once open ends up in the report.
pub fn run<O: DeviceOpener>(opener: &O, opts: &ScanOptions) -> anyhow::Result<ScanReport> {
    let mut writer = StreamGenerator::new(opts.seed);
    let mut reference = StreamGenerator::new(opts.seed);

    let mut dev = opener
        .open_for_write()
        .context("Failed to open the device for writing")?;
    let outcome = write_test::write(&mut dev, &mut writer, opts);
    if let Err(error) = dev.sync() {
        warn!(%error, "Could not flush the device after writing");
    }
    // Close before reading back, or the reads may be served from cache.
    drop(dev);
    info!(
        capacity = outcome.capacity,
        blocks = outcome.blocks_written(opts),
        reason = %outcome.stop_reason,
        "Write finished - reading written data"
    );

    let dev = opener
        .open_for_read()
        .context("Failed to reopen the device for reading")?;
    let ReadStats {
        read_errors,
        compare_errors,
        blocks,
    } = read_test::read_back(&dev, &mut reference, opts, outcome.capacity);

    Ok(ScanReport {
        capacity: outcome.capacity,
        read_errors,
        compare_errors,
        blocks,
    })
}

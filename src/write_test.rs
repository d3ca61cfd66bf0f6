//! Running the "write" portion of the test.

use crate::device::BlockDevice;
use crate::generator::StreamGenerator;
use crate::metadata::{ScanOptions, MIB, PROGRESS_INTERVAL, SECTOR_SIZE};
use std::io;
use tracing::{info, warn};

/// How the write pass ended.
#[derive(Debug)]
pub(crate) struct WriteOutcome {
    /// Offset of the first write the device refused: its apparent capacity.
    pub capacity: u64,
    /// The refusal itself. Every finite device produces one eventually.
    pub stop_reason: io::Error,
}

impl WriteOutcome {
    pub(crate) fn blocks_written(&self, opts: &ScanOptions) -> u64 {
        self.capacity / opts.buffer_len()
    }
}

/// Fills the device with the generator's stream, one buffer at a time, until a
/// write fails.
#[tracing::instrument(name = "write test", skip_all)]
pub(crate) fn write(
    dev: &mut impl BlockDevice,
    generator: &mut StreamGenerator,
    opts: &ScanOptions,
) -> WriteOutcome {
    let mut buf = vec![0; opts.buffer_size];
    let mut offset = 0;
    loop {
        generator.fill(&mut buf);
        if let Err(error) = dev.write_all_at(offset, &buf) {
            warn!(
                %error,
                offset,
                "Write failed at {} MiB (block {})",
                offset / MIB,
                offset / SECTOR_SIZE
            );
            return WriteOutcome {
                capacity: offset,
                stop_reason: error,
            };
        }
        if offset % PROGRESS_INTERVAL == 0 {
            info!("Wrote {} MiB...", offset / MIB);
        }
        offset += opts.buffer_len();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::device::{sim::SimCard, DeviceOpener as _};
    use tracing_test::traced_test;

    fn run(card: &SimCard, opts: &ScanOptions) -> WriteOutcome {
        let mut dev = card.open_for_write().expect("open");
        write(&mut dev, &mut StreamGenerator::new(opts.seed), opts)
    }

    #[traced_test]
    #[test]
    fn stops_at_the_first_refused_write() {
        let opts = ScanOptions::new(64, 42).unwrap();
        let card = SimCard::new(256);
        let outcome = run(&card, &opts);

        assert_eq!(outcome.capacity, 256);
        assert_eq!(outcome.blocks_written(&opts), 4);
        assert_eq!(outcome.stop_reason.raw_os_error(), Some(libc::ENOSPC));
        assert_eq!(card.state().writes, vec![0, 64, 128, 192, 256]);
        assert!(logs_contain("Write failed at 0 MiB (block 0)"));
    }

    #[traced_test]
    #[test]
    fn short_final_write_does_not_count() {
        let opts = ScanOptions::new(64, 42).unwrap();
        let card = SimCard::new(300);
        let outcome = run(&card, &opts);

        assert_eq!(outcome.capacity, 256);
        assert_eq!(outcome.stop_reason.kind(), io::ErrorKind::WriteZero);
    }

    #[traced_test]
    #[test]
    fn refused_first_write_means_no_capacity() {
        let opts = ScanOptions::new(64, 42).unwrap();
        let card = SimCard::new(0);
        let outcome = run(&card, &opts);

        assert_eq!(outcome.capacity, 0);
        assert_eq!(outcome.blocks_written(&opts), 0);
        assert_eq!(card.state().writes, vec![0]);
    }

    #[traced_test]
    #[test]
    fn writes_the_generator_stream_in_order() {
        let opts = ScanOptions::new(64, 9).unwrap();
        let card = SimCard::new(192);
        run(&card, &opts);

        let dev = card.open_for_read().unwrap();
        let mut on_card = vec![0; 192];
        dev.read_exact_at(0, &mut on_card).unwrap();
        let mut expected = vec![0; 192];
        StreamGenerator::new(9).fill(&mut expected);
        assert_eq!(on_card, expected);
    }

    #[traced_test]
    #[test]
    fn reports_progress_every_ten_mib() {
        let opts = ScanOptions::new(1024 * 1024, 1).unwrap();
        let card = SimCard::new(21 * MIB);
        let outcome = run(&card, &opts);

        assert_eq!(outcome.capacity, 21 * MIB);
        assert!(logs_contain("Wrote 0 MiB..."));
        assert!(logs_contain("Wrote 10 MiB..."));
        assert!(logs_contain("Wrote 20 MiB..."));
        assert!(!logs_contain("Wrote 5 MiB..."));
    }
}

//! Routines for generating a reproducible stream of random-looking garbage.

use anyhow::Context as _;
use rand::{rngs::OsRng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Size in bytes of one generator output word.
pub(crate) const WORD_SIZE: usize = std::mem::size_of::<u64>();

/// A generator for deterministically random-looking garbage data.
///
/// Two generators seeded with the same value produce the same words for as
/// long as they are called in the same order, which lets the read pass
/// regenerate what the write pass put on the device without storing it.
#[derive(Clone, Debug)]
pub(crate) struct StreamGenerator {
    rng: ChaCha8Rng,
}

impl StreamGenerator {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub(crate) fn next64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    /// Fills `buf` with consecutive words from the stream, little-endian.
    ///
    /// # Panics
    /// If `buf` is empty or its length is not a multiple of [`WORD_SIZE`].
    pub(crate) fn fill(&mut self, buf: &mut [u8]) {
        assert!(
            !buf.is_empty() && buf.len() % WORD_SIZE == 0,
            "buffer length {} is not a positive multiple of {WORD_SIZE}",
            buf.len()
        );
        for word in buf.chunks_exact_mut(WORD_SIZE) {
            word.copy_from_slice(&self.next64().to_le_bytes());
        }
    }
}

/// Draws a fresh seed from the operating system's entropy source.
pub(crate) fn entropy_seed() -> anyhow::Result<u64> {
    seed_from_source(&mut OsRng)
}

/// Assembles a 64-bit seed from two 32-bit draws: the first becomes the low
/// word, the second the high word.
///
/// The layout is fixed regardless of the source's native word size, so a seed
/// recorded from one run means the same thing on any platform.
pub(crate) fn seed_from_source(source: &mut impl RngCore) -> anyhow::Result<u64> {
    let low = draw_u32(source).context("Drawing the low seed word")?;
    let high = draw_u32(source).context("Drawing the high seed word")?;
    Ok(u64::from(low) | (u64::from(high) << 32))
}

fn draw_u32(source: &mut impl RngCore) -> anyhow::Result<u32> {
    let mut word = [0; 4];
    source
        .try_fill_bytes(&mut word)
        .context("Reading from the entropy source")?;
    Ok(u32::from_le_bytes(word))
}

use anyhow::Context;
use clap::Parser;
use std::{io, path::PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::{MakeWriter, MakeWriterExt, OrElse, WithMaxLevel};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod device;
mod generator;
mod metadata;
mod scan;
mod write_test;

use device::DevicePath;
use metadata::{ScanOptions, BUFFER_SIZE, MIB};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Raw block device of the card to check (e.g. /dev/sdb, /dev/mmcblk0).
    ///
    /// Everything stored on it will be overwritten.
    device: PathBuf,
}

/// Warnings and errors go to `errors`, everything else (progress) to `progress`.
fn split_by_level<E, P>(errors: E, progress: P) -> OrElse<WithMaxLevel<E>, P>
where
    E: for<'w> MakeWriter<'w>,
    P: for<'w> MakeWriter<'w>,
{
    errors.with_max_level(Level::WARN).or_else(progress)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(LevelFilter::INFO)
        .with(
            tracing_subscriber::fmt::layer().with_writer(split_by_level(io::stderr, io::stdout)),
        )
        .init();
    let args = Args::parse();
    let dev_path = DevicePath::new(args.device);

    let seed = generator::entropy_seed().context("Choosing a seed")?;
    let opts = ScanOptions::new(BUFFER_SIZE, seed)?;

    match metadata::advertised_capacity(dev_path.path()) {
        Ok(advertised) => info!(
            path = ?dev_path.path(),
            seed,
            "Starting test; device advertises {} MiB",
            advertised / MIB
        ),
        Err(error) => warn!(
            path = ?dev_path.path(),
            seed,
            "Starting test; could not determine advertised size: {error:#}"
        ),
    }

    let report = scan::run(&dev_path, &opts)
        .with_context(|| format!("Checking {:?}", dev_path.path()))?;
    println!("\n\n{report}");
    Ok(())
}

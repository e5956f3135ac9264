use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use nearsort::MAX_QUERY_VALUE;
use nearsort::logging::init_logger;

#[derive(Parser, Debug)]
#[command(name = "gen_input", version, about = "Write random big-endian u32 values for nearsort")]
struct Args {
    #[arg(short, long)]
    output: PathBuf,

    /// Number of integers to write
    #[arg(short, long, default_value_t = 1 << 25)]
    count: usize,

    /// Largest value generated (inclusive)
    #[arg(long, default_value_t = MAX_QUERY_VALUE)]
    max_value: u32,

    /// Seed for reproducible files; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let file = File::create(&args.output)
        .with_context(|| format!("cannot create {}", args.output.display()))?;
    let mut writer = BufWriter::with_capacity(1 << 20, file);
    for _ in 0..args.count {
        let value: u32 = rng.random_range(0..=args.max_value);
        writer.write_all(&value.to_be_bytes())?;
    }
    writer.flush()?;

    info!(
        "Wrote {} integers in [0, {}] to {}",
        args.count,
        args.max_value,
        args.output.display()
    );
    Ok(())
}

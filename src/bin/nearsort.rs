use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;

use nearsort::logging::init_logger;
use nearsort::{MAX_QUERY_VALUE, MergeEngine, SortConfig, SortStats, SortedFile, generate_runs};

#[derive(Parser, Debug)]
#[command(
    name = "nearsort",
    version,
    about = "Sort a big-endian u32 file externally, then print the closest value for each testcase read from stdin"
)]
struct Args {
    /// Unsorted input file of big-endian u32 values
    input: PathBuf,

    /// Sorted output file (native byte order)
    #[arg(short, long, default_value = "sorted.bin")]
    output: PathBuf,

    /// Number of integers in the input
    #[arg(long, default_value_t = 1 << 25)]
    total: usize,

    /// Number of runs generated in phase 1
    #[arg(long, default_value_t = 32)]
    runs: usize,

    /// Integers per run; defaults to total / runs
    #[arg(long = "run-size")]
    run_size: Option<usize>,

    /// Integers per merge block
    #[arg(long = "block-size", default_value_t = 4096)]
    block_size: usize,

    /// Directory for run files
    #[arg(short = 'd', long = "temp-dir", default_value = ".")]
    temp_dir: PathBuf,

    /// Skip sorting and query an existing sorted output file
    #[arg(long)]
    query_only: bool,

    /// Log phase progress and timings to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn read_testcases(mut input: impl Read) -> Result<Vec<u32>> {
    let mut text = String::new();
    input
        .read_to_string(&mut text)
        .context("failed to read testcases from stdin")?;
    let mut tokens = text.split_whitespace();

    let count: usize = match tokens.next() {
        Some(tok) => tok
            .parse()
            .with_context(|| format!("invalid testcase count '{tok}'"))?,
        None => return Ok(Vec::new()),
    };

    let mut testcases = Vec::with_capacity(count);
    for i in 0..count {
        let Some(tok) = tokens.next() else {
            bail!("expected {count} testcases, got {i}");
        };
        let value: u32 = tok
            .parse()
            .with_context(|| format!("invalid testcase '{tok}'"))?;
        if value > MAX_QUERY_VALUE {
            bail!("testcase {value} is outside [0, {MAX_QUERY_VALUE}]");
        }
        testcases.push(value);
    }
    Ok(testcases)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    let testcases = read_testcases(io::stdin().lock())?;

    let run_size = args.run_size.unwrap_or(args.total / args.runs.max(1));
    let config = SortConfig::new(args.total, args.runs, run_size, args.block_size)
        .with_temp_dir(&args.temp_dir);
    config.validate().context("invalid sort configuration")?;

    if !args.query_only {
        let (runs, run_gen_stats) = generate_runs(&args.input, &config)
            .with_context(|| format!("run generation failed for {}", args.input.display()))?;
        let merge_stats = MergeEngine::new(&config, &runs)
            .and_then(|engine| engine.merge(&args.output))
            .with_context(|| format!("merge failed writing {}", args.output.display()))?;
        info!("{}", SortStats::new(run_gen_stats, merge_stats));
    }

    let sorted = SortedFile::open_with_len(&args.output, config.total_elements)
        .with_context(|| format!("query failed opening {}", args.output.display()))?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for target in testcases {
        let matched = sorted
            .nearest(target)
            .with_context(|| format!("query failed for testcase {target}"))?;
        writeln!(out, "{matched}")?;
    }
    out.flush()?;
    Ok(())
}

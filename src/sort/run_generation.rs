use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Instant;

use log::{debug, info};

use crate::byte_order::{ELEMENT_SIZE, normalize_in_place};
use crate::config::SortConfig;
use crate::diskio::{RunFile, read_elements};
use crate::error::{Result, SortError};
use crate::sort::quicksort::quick_sort;
use crate::{RunGenerationStats, RunInfo};

/// Phase 1: cut the big-endian input into `num_runs` sorted run files.
///
/// Each run reads the next `run_size` integers, normalizes them, sorts them in
/// memory and writes them natively to `run_<n>.bin` in the configured temp
/// directory. An input holding fewer than `num_runs * run_size` integers fails
/// with a `Read` error. Runs written before a failure are left on disk.
pub fn generate_runs(
    input: impl AsRef<Path>,
    config: &SortConfig,
) -> Result<(Vec<RunFile>, RunGenerationStats)> {
    config.validate()?;
    let input = input.as_ref();
    let run_generation_start = Instant::now();

    let file = File::open(input).map_err(|e| SortError::open(input, e))?;
    let mut reader = BufReader::new(file);

    info!(
        "Generating {} runs of {} elements from {}",
        config.num_runs,
        config.run_size,
        input.display()
    );

    let mut words = alloc_words(config.run_size)?;
    let mut bytes = alloc_bytes(config.run_size)?;
    let mut runs = Vec::with_capacity(config.num_runs);
    let mut total_load_ms: u128 = 0;
    let mut total_sort_ms: u128 = 0;
    let mut total_store_ms: u128 = 0;

    for n in 0..config.num_runs {
        let offset = (n * config.run_size * ELEMENT_SIZE) as u64;

        let load_start = Instant::now();
        read_elements(&mut reader, input, offset, &mut bytes, &mut words)?;
        normalize_in_place(&mut words);
        let load_ms = load_start.elapsed().as_millis();

        let sort_start = Instant::now();
        quick_sort(&mut words);
        let sort_ms = sort_start.elapsed().as_millis();

        let store_start = Instant::now();
        let run = RunFile::create(&config.temp_dir, n, &words)?;
        let store_ms = store_start.elapsed().as_millis();

        debug!(
            "Run {} -> {} (load={} ms, sort={} ms, store={} ms)",
            n,
            run.path().display(),
            load_ms,
            sort_ms,
            store_ms
        );
        total_load_ms += load_ms;
        total_sort_ms += sort_ms;
        total_store_ms += store_ms;
        runs.push(run);
    }

    let run_generation_time_ms = run_generation_start.elapsed().as_millis();
    info!(
        "Generated {} runs in {} ms",
        runs.len(),
        run_generation_time_ms
    );

    let runs_info = runs
        .iter()
        .map(|run| RunInfo {
            entries: run.total_entries(),
            file_size: run.total_bytes() as u64,
        })
        .collect();

    let stats = RunGenerationStats {
        num_runs: runs.len(),
        runs_info,
        time_ms: run_generation_time_ms,
        load_time_ms: total_load_ms,
        sort_time_ms: total_sort_ms,
        store_time_ms: total_store_ms,
    };
    Ok((runs, stats))
}

pub(crate) fn alloc_words(elements: usize) -> Result<Vec<u32>> {
    let mut words = Vec::new();
    words
        .try_reserve_exact(elements)
        .map_err(|_| SortError::Allocation { elements })?;
    words.resize(elements, 0);
    Ok(words)
}

/// Staging space for `elements` integers in their on-disk form.
pub(crate) fn alloc_bytes(elements: usize) -> Result<Vec<u8>> {
    let len = elements
        .checked_mul(ELEMENT_SIZE)
        .ok_or(SortError::Allocation { elements })?;
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(len)
        .map_err(|_| SortError::Allocation { elements })?;
    bytes.resize(len, 0);
    Ok(bytes)
}

// External sort of big-endian u32 files with nearest-value lookup

pub mod byte_order;
pub mod config;
pub mod diskio;
pub mod error;
pub mod logging;
pub mod query;
pub mod sort;

pub use config::{MAX_QUERY_VALUE, SortConfig};
pub use diskio::RunFile;
pub use error::{Result, SortError};
pub use query::SortedFile;
pub use sort::heap::MinHeap;
pub use sort::merge::{Head, MergeEngine, RunCursor, StreamingBuffer};
pub use sort::run_generation::generate_runs;
pub use sort::sorter::ExternalSorter;

/// Statistics about a sort operation
#[derive(Clone, Debug)]
pub struct SortStats {
    pub run_gen_stats: RunGenerationStats,
    pub merge_stats: MergeStats,
}

impl SortStats {
    pub fn new(run_gen_stats: RunGenerationStats, merge_stats: MergeStats) -> Self {
        Self {
            run_gen_stats,
            merge_stats,
        }
    }
}

impl std::fmt::Display for SortStats {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "SortStats:")?;
        let rg = &self.run_gen_stats;
        writeln!(f, "  Number of runs: {}", rg.num_runs)?;
        writeln!(f, "  (R) time: {} ms", rg.time_ms)?;
        writeln!(
            f,
            "  (R) breakdown: load={} ms, sort={} ms, store={} ms",
            rg.load_time_ms, rg.sort_time_ms, rg.store_time_ms
        )?;
        let written: u64 = rg.runs_info.iter().map(|r| r.file_size).sum();
        writeln!(
            f,
            "  (R) run bytes written: {} ({:.2} MiB)",
            written,
            written as f64 / (1024.0 * 1024.0)
        )?;

        let m = &self.merge_stats;
        writeln!(f, "  (M) time: {} ms", m.time_ms)?;
        writeln!(
            f,
            "  (M) output: {} elements in {} blocks, {} refills",
            m.output_elements, m.output_blocks, m.refills
        )?;
        Ok(())
    }
}

/// Information about a single run
#[derive(Clone, Debug)]
pub struct RunInfo {
    pub entries: usize,
    pub file_size: u64,
}

impl std::fmt::Display for RunInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "entries={}, file_size={}", self.entries, self.file_size)
    }
}

/// Statistics from the run generation phase
#[derive(Clone, Debug)]
pub struct RunGenerationStats {
    pub num_runs: usize,
    pub runs_info: Vec<RunInfo>,
    pub time_ms: u128,
    pub load_time_ms: u128,
    pub sort_time_ms: u128,
    pub store_time_ms: u128,
}

/// Statistics from the merge phase
#[derive(Clone, Debug)]
pub struct MergeStats {
    pub output_elements: usize,
    pub output_blocks: usize,
    /// Blocks loaded from run files after the initial priming read.
    pub refills: usize,
    pub time_ms: u128,
}

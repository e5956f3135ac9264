use std::path::{Path, PathBuf};

use crate::error::{Result, SortError};

/// Largest target accepted by the query front end (2^25).
pub const MAX_QUERY_VALUE: u32 = 1 << 25;

/// The four sizing values fixed for one sort invocation, plus where the run
/// files go.
///
/// `num_runs * run_size` must equal `total_elements` and `block_size` must
/// divide `run_size`. Both phases call [`SortConfig::validate`] before they
/// touch the disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortConfig {
    pub total_elements: usize,
    pub num_runs: usize,
    pub run_size: usize,
    pub block_size: usize,
    pub temp_dir: PathBuf,
}

impl SortConfig {
    pub fn new(total_elements: usize, num_runs: usize, run_size: usize, block_size: usize) -> Self {
        Self {
            total_elements,
            num_runs,
            run_size,
            block_size,
            temp_dir: std::env::temp_dir(),
        }
    }

    /// Split `total_elements` into `num_runs` runs of equal size.
    pub fn with_uniform_runs(total_elements: usize, num_runs: usize, block_size: usize) -> Self {
        let run_size = if num_runs == 0 {
            0
        } else {
            total_elements / num_runs
        };
        Self::new(total_elements, num_runs, run_size, block_size)
    }

    pub fn with_temp_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.temp_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Blocks per run, i.e. how many refills a run can serve during the merge.
    pub fn blocks_per_run(&self) -> usize {
        self.run_size / self.block_size
    }

    /// Elements held by the merge buffer: one block per run plus the output block.
    pub fn buffer_elements(&self) -> usize {
        self.block_size * (self.num_runs + 1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_runs == 0 {
            return Err(SortError::config("number of runs must be at least 1"));
        }
        if self.run_size == 0 {
            return Err(SortError::config("run size must be at least 1"));
        }
        if self.block_size == 0 {
            return Err(SortError::config("block size must be at least 1"));
        }
        let covered = self.num_runs.checked_mul(self.run_size).ok_or_else(|| {
            SortError::config(format!(
                "{} runs of {} elements overflows",
                self.num_runs, self.run_size
            ))
        })?;
        if covered != self.total_elements {
            return Err(SortError::config(format!(
                "{} runs x {} elements = {} does not match total element count {}",
                self.num_runs, self.run_size, covered, self.total_elements
            )));
        }
        if self.run_size % self.block_size != 0 {
            return Err(SortError::config(format!(
                "block size {} does not divide run size {}",
                self.block_size, self.run_size
            )));
        }
        self.block_size
            .checked_mul(self.num_runs + 1)
            .ok_or_else(|| SortError::config("merge buffer size overflows"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = SortConfig::new(8, 2, 4, 2);
        assert!(config.validate().is_ok());
        assert_eq!(config.blocks_per_run(), 2);
        assert_eq!(config.buffer_elements(), 6);
    }

    #[test]
    fn test_uniform_runs() {
        let config = SortConfig::with_uniform_runs(1024, 4, 64);
        assert_eq!(config.run_size, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mismatched_total_is_rejected() {
        let err = SortConfig::new(9, 2, 4, 2).validate().unwrap_err();
        assert!(matches!(err, SortError::Configuration(_)));
    }

    #[test]
    fn test_uniform_runs_with_remainder_is_rejected() {
        let config = SortConfig::with_uniform_runs(10, 3, 1);
        assert!(matches!(
            config.validate(),
            Err(SortError::Configuration(_))
        ));
    }

    #[test]
    fn test_block_must_divide_run() {
        let err = SortConfig::new(12, 2, 6, 4).validate().unwrap_err();
        assert!(err.to_string().contains("does not divide"));
    }

    #[test]
    fn test_zero_sizes_are_rejected() {
        assert!(SortConfig::new(0, 0, 4, 2).validate().is_err());
        assert!(SortConfig::new(0, 2, 0, 2).validate().is_err());
        assert!(SortConfig::new(8, 2, 4, 0).validate().is_err());
    }

    #[test]
    fn test_overflow_is_rejected() {
        let err = SortConfig::new(usize::MAX, usize::MAX, 2, 1)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("overflows"));
    }
}

use std::path::Path;

use log::info;

use crate::SortStats;
use crate::config::SortConfig;
use crate::error::Result;
use crate::query::SortedFile;
use crate::sort::merge::MergeEngine;
use crate::sort::run_generation::generate_runs;

/// Two-phase external sort of a big-endian `u32` file.
///
/// Always goes through run generation and the K-way merge, even when the
/// whole input would fit in one run.
#[derive(Clone, Debug)]
pub struct ExternalSorter {
    config: SortConfig,
}

impl ExternalSorter {
    pub fn new(config: SortConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SortConfig {
        &self.config
    }

    /// Sort `input` into `output`. Run files are removed once the merge
    /// succeeds and left in the temp directory otherwise.
    pub fn sort(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<SortStats> {
        let (runs, run_gen_stats) = generate_runs(input, &self.config)?;
        let merge_stats = MergeEngine::new(&self.config, &runs)?.merge(output)?;
        let stats = SortStats::new(run_gen_stats, merge_stats);
        info!("{}", stats);
        Ok(stats)
    }

    /// Sort and open the result for nearest-value queries.
    pub fn sort_for_queries(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<(SortedFile, SortStats)> {
        let output = output.as_ref();
        let stats = self.sort(input, output)?;
        let sorted = SortedFile::open_with_len(output, self.config.total_elements)?;
        Ok((sorted, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_order::encode_big_endian;
    use crate::error::SortError;
    use tempfile::TempDir;

    #[test]
    fn test_sort_for_queries() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("input.bin");
        std::fs::write(&input, encode_big_endian(&[7, 3, 9, 1, 8, 2, 6, 4])).unwrap();

        let config = SortConfig::new(8, 2, 4, 2).with_temp_dir(temp_dir.path());
        let sorter = ExternalSorter::new(config).unwrap();
        let (sorted, stats) = sorter
            .sort_for_queries(&input, temp_dir.path().join("out.bin"))
            .unwrap();

        assert_eq!(stats.run_gen_stats.num_runs, 2);
        assert_eq!(stats.merge_stats.output_elements, 8);
        assert_eq!(sorted.len(), 8);
        assert_eq!(sorted.nearest(5).unwrap(), 4);
        assert_eq!(sorted.nearest(6).unwrap(), 6);
    }

    #[test]
    fn test_invalid_config_is_rejected_up_front() {
        let config = SortConfig::new(10, 2, 4, 2);
        assert!(matches!(
            ExternalSorter::new(config),
            Err(SortError::Configuration(_))
        ));
    }
}

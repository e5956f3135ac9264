//! Nearest-value lookup over the sorted output file.
//!
//! The file is never loaded: each probe is a single positional read of one
//! element, so a lookup costs O(log n) reads plus a window of at most three.

use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use log::debug;

use crate::byte_order::ELEMENT_SIZE;
use crate::diskio::{file_size_fd, pread_fd};
use crate::error::{Result, SortError};

/// Read-only handle on a sorted, native-endian integer file.
pub struct SortedFile {
    file: File,
    path: PathBuf,
    len: usize,
}

impl SortedFile {
    /// Open `path`, taking the element count from the file size.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| SortError::open(path, e))?;
        let size = file_size_fd(file.as_raw_fd()).map_err(|e| SortError::open(path, e))?;
        if size % ELEMENT_SIZE as u64 != 0 {
            return Err(SortError::Read {
                path: path.to_path_buf(),
                offset: size - size % ELEMENT_SIZE as u64,
                expected: 1,
                actual: 0,
                source: None,
            });
        }
        Ok(Self {
            file,
            path: path.to_path_buf(),
            len: (size / ELEMENT_SIZE as u64) as usize,
        })
    }

    /// Open `path` and require it to hold at least `len` elements; only the
    /// first `len` are searched.
    pub fn open_with_len(path: impl AsRef<Path>, len: usize) -> Result<Self> {
        let mut sorted = Self::open(path)?;
        if sorted.len < len {
            return Err(SortError::Read {
                path: sorted.path.clone(),
                offset: (sorted.len * ELEMENT_SIZE) as u64,
                expected: len,
                actual: sorted.len,
                source: None,
            });
        }
        sorted.len = len;
        Ok(sorted)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Element at `index`.
    pub fn read_at(&self, index: usize) -> Result<u32> {
        let offset = (index * ELEMENT_SIZE) as u64;
        let mut buf = [0u8; ELEMENT_SIZE];
        let short = |actual: usize, source: Option<std::io::Error>| SortError::Read {
            path: self.path.clone(),
            offset,
            expected: 1,
            actual,
            source,
        };
        match pread_fd(self.file.as_raw_fd(), &mut buf, offset) {
            Ok(ELEMENT_SIZE) => Ok(u32::from_ne_bytes(buf)),
            Ok(n) => Err(short(n / ELEMENT_SIZE, None)),
            Err(e) => Err(short(0, Some(e))),
        }
    }

    /// Value closest to `target`; the smaller one wins when two are equally close.
    pub fn nearest(&self, target: u32) -> Result<u32> {
        if self.len == 0 {
            return Err(SortError::EmptyFile {
                path: self.path.clone(),
            });
        }

        let mut low = 0usize;
        let mut high = self.len;
        let mut mid = 0usize;
        while low < high {
            mid = low + (high - low) / 2;
            let value = self.read_at(mid)?;
            if value == target {
                debug!("query {} matched exactly at index {}", target, mid);
                return Ok(value);
            }
            if value < target {
                low = mid + 1;
            } else {
                high = mid;
            }
        }

        // The insertion point is `mid` or `mid + 1`, so its neighbours all lie
        // within one slot of the last probe.
        let first = mid.saturating_sub(1);
        let last = (mid + 1).min(self.len - 1);
        let mut best = self.read_at(first)?;
        for index in first + 1..=last {
            let candidate = self.read_at(index)?;
            if candidate.abs_diff(target) < best.abs_diff(target) {
                best = candidate;
            }
        }
        debug!("query {} resolved to {} near index {}", target, best, mid);
        Ok(best)
    }

    /// Answer several targets in order.
    pub fn nearest_many(&self, targets: &[u32]) -> Result<Vec<u32>> {
        targets.iter().map(|&t| self.nearest(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diskio::RunFile;
    use tempfile::TempDir;

    fn sorted_file(dir: &TempDir, values: &[u32]) -> SortedFile {
        let run = RunFile::create(dir.path(), 0, values).unwrap();
        SortedFile::open(run.path()).unwrap()
    }

    #[test]
    fn test_exact_matches() {
        let dir = TempDir::new().unwrap();
        let values = [1, 2, 3, 4, 6, 7, 8, 9];
        let sorted = sorted_file(&dir, &values);
        assert_eq!(sorted.len(), 8);
        for v in values {
            assert_eq!(sorted.nearest(v).unwrap(), v);
        }
    }

    #[test]
    fn test_tie_prefers_lower() {
        let dir = TempDir::new().unwrap();
        let sorted = sorted_file(&dir, &[10, 20]);
        assert_eq!(sorted.nearest(15).unwrap(), 10);
        assert_eq!(sorted.nearest(16).unwrap(), 20);
    }

    #[test]
    fn test_boundaries() {
        let dir = TempDir::new().unwrap();
        let sorted = sorted_file(&dir, &[5, 9, 14]);
        assert_eq!(sorted.nearest(0).unwrap(), 5);
        assert_eq!(sorted.nearest(100).unwrap(), 14);
        assert_eq!(sorted.nearest(11).unwrap(), 9);
        assert_eq!(sorted.nearest(12).unwrap(), 14);
    }

    #[test]
    fn test_single_element() {
        let dir = TempDir::new().unwrap();
        let sorted = sorted_file(&dir, &[42]);
        assert_eq!(sorted.nearest(0).unwrap(), 42);
        assert_eq!(sorted.nearest(u32::MAX).unwrap(), 42);
    }

    #[test]
    fn test_matches_linear_scan() {
        let dir = TempDir::new().unwrap();
        let values: Vec<u32> = vec![0, 3, 3, 8, 15, 15, 16, 40, 41, 100, 1 << 25];
        let sorted = sorted_file(&dir, &values);
        for target in (0..120).chain([1 << 24, 1 << 25]) {
            let expected = values
                .iter()
                .copied()
                .min_by_key(|v| (v.abs_diff(target), *v))
                .unwrap();
            assert_eq!(sorted.nearest(target).unwrap(), expected, "target {target}");
        }
    }

    #[test]
    fn test_nearest_many_keeps_order() {
        let dir = TempDir::new().unwrap();
        let sorted = sorted_file(&dir, &[1, 2, 3, 4, 6, 7, 8, 9]);
        assert_eq!(sorted.nearest_many(&[5, 6, 0, 50]).unwrap(), vec![4, 6, 1, 9]);
    }

    #[test]
    fn test_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::write(&path, b"").unwrap();
        let sorted = SortedFile::open(&path).unwrap();
        assert!(sorted.is_empty());
        assert!(matches!(
            sorted.nearest(3),
            Err(SortError::EmptyFile { .. })
        ));
    }

    #[test]
    fn test_ragged_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ragged.bin");
        std::fs::write(&path, [0u8; 6]).unwrap();
        assert!(matches!(
            SortedFile::open(&path),
            Err(SortError::Read { offset: 4, .. })
        ));
    }

    #[test]
    fn test_file_truncated_after_open_is_read_error() {
        let dir = TempDir::new().unwrap();
        let run = RunFile::create(dir.path(), 0, &[1, 2, 3]).unwrap();
        let sorted = SortedFile::open(run.path()).unwrap();
        std::fs::OpenOptions::new()
            .write(true)
            .open(run.path())
            .unwrap()
            .set_len(6)
            .unwrap();

        assert_eq!(sorted.read_at(0).unwrap(), 1);
        assert!(matches!(
            sorted.read_at(1),
            Err(SortError::Read {
                offset: 4,
                expected: 1,
                actual: 0,
                source: None,
                ..
            })
        ));
    }

    #[test]
    fn test_declared_length_longer_than_file() {
        let dir = TempDir::new().unwrap();
        let run = RunFile::create(dir.path(), 0, &[1, 2, 3]).unwrap();
        let err = SortedFile::open_with_len(run.path(), 5).err().unwrap();
        assert!(matches!(
            err,
            SortError::Read {
                expected: 5,
                actual: 3,
                ..
            }
        ));
        let prefix = SortedFile::open_with_len(run.path(), 2).unwrap();
        assert_eq!(prefix.nearest(3).unwrap(), 2);
    }
}

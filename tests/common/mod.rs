#![allow(dead_code)]

use std::path::{Path, PathBuf};

use nearsort::byte_order::encode_big_endian;
use tempfile::TempDir;

pub fn test_dir() -> TempDir {
    TempDir::new().expect("Failed to create test directory")
}

/// Write `values` as a big-endian input file named `name` inside `dir`.
pub fn write_input(dir: &Path, name: &str, values: &[u32]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, encode_big_endian(values)).expect("Failed to write input file");
    path
}

/// Read a native-endian run or output file back into memory.
pub fn read_native(path: &Path) -> Vec<u32> {
    std::fs::read(path)
        .expect("Failed to read output file")
        .chunks_exact(4)
        .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Names of run files left in `dir`.
pub fn leftover_runs(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to list test directory")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("run_"))
        .collect();
    names.sort();
    names
}

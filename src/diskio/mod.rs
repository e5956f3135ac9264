pub mod file;

pub use file::{RunFile, RunReader, file_size_fd, pread_fd, read_elements, read_full, remove_runs};

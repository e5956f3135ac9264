use libc::{c_void, fstat, off_t, pread};
use log::warn;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::os::unix::io::RawFd;
use std::path::{Path, PathBuf};

use crate::byte_order::{ELEMENT_SIZE, load_verbatim, store_native};
use crate::error::{Result, SortError};

/// A sorted run persisted to its own file, identified by its run index.
#[derive(Debug, Clone)]
pub struct RunFile {
    index: usize,
    path: PathBuf,
    entries: usize,
}

impl RunFile {
    /// Location of run `index` inside `dir`.
    pub fn path_for(dir: &Path, index: usize) -> PathBuf {
        dir.join(format!("run_{index}.bin"))
    }

    /// Write `values` (native order) as run `index` under `dir`.
    ///
    /// The handle is closed before returning, on success and on error.
    pub fn create(dir: &Path, index: usize, values: &[u32]) -> Result<Self> {
        let path = Self::path_for(dir, index);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| SortError::open(&path, e))?;

        let mut bytes = vec![0u8; values.len() * ELEMENT_SIZE];
        store_native(values, &mut bytes);

        let mut writer = BufWriter::new(file);
        writer
            .write_all(&bytes)
            .and_then(|_| writer.flush())
            .map_err(|source| SortError::Write {
                path: path.clone(),
                offset: 0,
                len: bytes.len(),
                source,
            })?;

        Ok(Self {
            index,
            path,
            entries: values.len(),
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn total_entries(&self) -> usize {
        self.entries
    }

    pub fn total_bytes(&self) -> usize {
        self.entries * ELEMENT_SIZE
    }

    pub fn open_reader(&self) -> Result<RunReader> {
        let file = File::open(&self.path).map_err(|e| SortError::open(&self.path, e))?;
        Ok(RunReader {
            file,
            path: self.path.clone(),
        })
    }
}

/// Open read handle on a run file, refilled block by block during the merge.
pub struct RunReader {
    file: File,
    path: PathBuf,
}

impl RunReader {
    /// Seek to block `block` (of `out.len()` elements) and fill `out` from it.
    ///
    /// `bytes` is caller-owned staging space of `out.len() * 4` bytes.
    pub fn read_block(&mut self, block: usize, bytes: &mut [u8], out: &mut [u32]) -> Result<()> {
        let offset = (block * out.len() * ELEMENT_SIZE) as u64;
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|source| SortError::Seek {
                path: self.path.clone(),
                offset,
                source,
            })?;
        read_elements(&mut self.file, &self.path, offset, bytes, out)
    }
}

/// Fill `out` from `reader`, failing with a `Read` error on a short read.
pub fn read_elements(
    reader: &mut impl Read,
    path: &Path,
    offset: u64,
    bytes: &mut [u8],
    out: &mut [u32],
) -> Result<()> {
    let bytes = &mut bytes[..out.len() * ELEMENT_SIZE];
    match read_full(reader, bytes) {
        Ok(n) if n == bytes.len() => {
            load_verbatim(bytes, out);
            Ok(())
        }
        Ok(n) => Err(SortError::Read {
            path: path.to_path_buf(),
            offset,
            expected: out.len(),
            actual: n / ELEMENT_SIZE,
            source: None,
        }),
        Err(source) => Err(SortError::Read {
            path: path.to_path_buf(),
            offset,
            expected: out.len(),
            actual: 0,
            source: Some(source),
        }),
    }
}

/// Read until `buf` is full or the reader hits end of file.
pub fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Delete consumed run files and make the removal durable.
///
/// Every run is attempted even after a failure; the first error is returned
/// once the directory has been synced.
pub fn remove_runs(runs: &[RunFile]) -> io::Result<()> {
    let mut first_err = None;
    for run in runs {
        if let Err(e) = std::fs::remove_file(run.path()) {
            warn!("Failed to remove {}: {}", run.path().display(), e);
            if first_err.is_none() {
                first_err = Some(e);
            }
        }
    }
    if let Some(first) = runs.first() {
        sync_parent_directory(first.path());
    }
    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(target_family = "unix")]
fn sync_parent_directory(path: &Path) {
    if let Some(parent) = path.parent() {
        // A read-only fd is enough to fsync a directory on Linux/Unix.
        if let Ok(dir_file) = File::open(parent) {
            use std::os::unix::io::AsRawFd;
            let result = unsafe { libc::fsync(dir_file.as_raw_fd()) };
            if result < 0 {
                warn!(
                    "fsync of {} failed: {}",
                    parent.display(),
                    io::Error::last_os_error()
                );
            }
        }
    }
}

#[cfg(not(target_family = "unix"))]
fn sync_parent_directory(_path: &Path) {}

/// Get the size of a file using its raw file descriptor
pub fn file_size_fd(fd: RawFd) -> io::Result<u64> {
    let mut stat_buf: libc::stat = unsafe { std::mem::zeroed() };

    let result = unsafe { fstat(fd, &mut stat_buf) };

    if result < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(stat_buf.st_size as u64)
    }
}

/// Perform pread using raw file descriptor
///
/// Reads at a fixed offset without moving the file position, so lookups never
/// need a separate seek.
pub fn pread_fd(fd: RawFd, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    let result = unsafe {
        pread(
            fd,
            buf.as_mut_ptr() as *mut c_void,
            buf.len(),
            offset as off_t,
        )
    };

    if result < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(result as usize)
    }
}

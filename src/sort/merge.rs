//! Phase 2: K-way merge of the sorted run files into one output file.
//!
//! Memory is bounded by a [`StreamingBuffer`] of `block_size * (num_runs + 1)`
//! integers: one input block per run plus one output block. A [`MinHeap`] of
//! [`RunCursor`]s picks the smallest live head; a cursor whose block runs dry is
//! refilled from its run file until the run has no blocks left, after which
//! its head becomes [`Head::Exhausted`] and sorts after every real value.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::ops::Range;
use std::path::Path;
use std::time::Instant;

use log::{debug, info, warn};

use crate::MergeStats;
use crate::byte_order::{ELEMENT_SIZE, store_native};
use crate::config::SortConfig;
use crate::diskio::{RunFile, RunReader, remove_runs};
use crate::error::{Result, SortError};
use crate::sort::heap::MinHeap;
use crate::sort::run_generation::{alloc_bytes, alloc_words};

/// Current head of a run. `Exhausted` compares greater than any `Active` value,
/// including `Active(u32::MAX)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Head {
    Active(u32),
    Exhausted,
}

/// Per-run merge state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunCursor {
    pub head: Head,
    pub run: usize,
    /// Next unread slot in the run's input block.
    pub next_offset: usize,
    /// Blocks of the run loaded so far, including the one in the buffer.
    pub blocks_read: usize,
}

/// Merge working memory, reused in place for the whole merge.
pub struct StreamingBuffer {
    words: Vec<u32>,
    bytes: Vec<u8>,
    block_size: usize,
    num_runs: usize,
}

impl StreamingBuffer {
    pub fn new(block_size: usize, num_runs: usize) -> Result<Self> {
        let elements = block_size * (num_runs + 1);
        let words = alloc_words(elements)?;
        let bytes = alloc_bytes(block_size)?;
        Ok(Self {
            words,
            bytes,
            block_size,
            num_runs,
        })
    }

    pub fn capacity(&self) -> usize {
        self.words.len()
    }

    pub fn input_block(&self, run: usize) -> &[u32] {
        &self.words[self.input_range(run)]
    }

    pub fn output_block(&self) -> &[u32] {
        &self.words[self.output_range()]
    }

    /// Load block `block` of a run into that run's slot.
    pub fn fill(&mut self, run: usize, reader: &mut RunReader, block: usize) -> Result<()> {
        let range = self.input_range(run);
        reader.read_block(block, &mut self.bytes, &mut self.words[range])
    }

    fn set_output(&mut self, slot: usize, value: u32) {
        let start = self.output_range().start;
        self.words[start + slot] = value;
    }

    fn write_output(&mut self, file: &mut File, path: &Path, offset: u64) -> Result<()> {
        let range = self.output_range();
        store_native(&self.words[range], &mut self.bytes);
        file.write_all(&self.bytes)
            .map_err(|source| SortError::Write {
                path: path.to_path_buf(),
                offset,
                len: self.bytes.len(),
                source,
            })
    }

    fn input_range(&self, run: usize) -> Range<usize> {
        debug_assert!(run < self.num_runs);
        let start = run * self.block_size;
        start..start + self.block_size
    }

    fn output_range(&self) -> Range<usize> {
        let start = self.num_runs * self.block_size;
        start..start + self.block_size
    }
}

/// Merges a complete set of runs produced under one [`SortConfig`].
pub struct MergeEngine<'a> {
    config: &'a SortConfig,
    runs: &'a [RunFile],
}

impl<'a> MergeEngine<'a> {
    /// Check the configuration and the run set before anything is opened.
    ///
    /// The drain loop is driven by `total_elements / block_size`, so a total
    /// that disagrees with `num_runs * run_size` is rejected here instead of
    /// silently dropping data or emitting sentinels.
    pub fn new(config: &'a SortConfig, runs: &'a [RunFile]) -> Result<Self> {
        config.validate()?;
        if runs.len() != config.num_runs {
            return Err(SortError::config(format!(
                "expected {} runs, got {}",
                config.num_runs,
                runs.len()
            )));
        }
        for (position, run) in runs.iter().enumerate() {
            if run.index() != position {
                return Err(SortError::config(format!(
                    "run at position {} has index {}",
                    position,
                    run.index()
                )));
            }
            if run.total_entries() != config.run_size {
                return Err(SortError::config(format!(
                    "run {} holds {} elements, expected {}",
                    position,
                    run.total_entries(),
                    config.run_size
                )));
            }
        }
        Ok(Self { config, runs })
    }

    /// Merge into `output`, then delete the run files.
    ///
    /// On error the run files stay on disk and the output may be partial.
    pub fn merge(self, output: impl AsRef<Path>) -> Result<MergeStats> {
        let output = output.as_ref();
        let merge_start = Instant::now();
        let block_size = self.config.block_size;

        let mut state = MergeState {
            buffer: StreamingBuffer::new(block_size, self.config.num_runs)?,
            readers: self
                .runs
                .iter()
                .map(RunFile::open_reader)
                .collect::<Result<Vec<_>>>()?,
            block_size,
            blocks_per_run: self.config.blocks_per_run(),
            refills: 0,
        };
        info!(
            "Merging {} runs of {} elements (block={}, buffer={} elements) into {}",
            self.config.num_runs,
            self.config.run_size,
            block_size,
            state.buffer.capacity(),
            output.display()
        );

        let cursors = (0..self.config.num_runs)
            .map(|run| state.prime(run))
            .collect::<Result<Vec<_>>>()?;
        let mut heap = MinHeap::build(cursors, |c: &RunCursor| c.head);

        let mut out_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(output)
            .map_err(|e| SortError::open(output, e))?;

        let output_blocks = self.config.total_elements / block_size;
        for block in 0..output_blocks {
            for slot in 0..block_size {
                let Some(&root) = heap.peek() else {
                    return Err(SortError::config("merge started without runs"));
                };
                let Head::Active(value) = root.head else {
                    return Err(SortError::config(format!(
                        "all runs exhausted after {} of {} elements",
                        block * block_size + slot,
                        self.config.total_elements
                    )));
                };
                state.buffer.set_output(slot, value);

                let mut cursor = root;
                state.advance(&mut cursor)?;
                heap.replace_root(cursor);
            }
            let offset = (block * block_size * ELEMENT_SIZE) as u64;
            state.buffer.write_output(&mut out_file, output, offset)?;
        }

        out_file.sync_all().map_err(|source| SortError::Write {
            path: output.to_path_buf(),
            offset: (self.config.total_elements * ELEMENT_SIZE) as u64,
            len: 0,
            source,
        })?;
        drop(out_file);
        drop(state.readers);

        let time_ms = merge_start.elapsed().as_millis();
        info!(
            "Merged {} elements in {} ms ({} refills)",
            self.config.total_elements, time_ms, state.refills
        );

        match remove_runs(self.runs) {
            Ok(()) => debug!("Removed {} run files", self.runs.len()),
            Err(e) => warn!("Failed to remove run files: {}", e),
        }

        Ok(MergeStats {
            output_elements: self.config.total_elements,
            output_blocks,
            refills: state.refills,
            time_ms,
        })
    }
}

struct MergeState {
    buffer: StreamingBuffer,
    readers: Vec<RunReader>,
    block_size: usize,
    blocks_per_run: usize,
    refills: usize,
}

impl MergeState {
    fn prime(&mut self, run: usize) -> Result<RunCursor> {
        self.buffer.fill(run, &mut self.readers[run], 0)?;
        Ok(RunCursor {
            head: Head::Active(self.buffer.input_block(run)[0]),
            run,
            next_offset: 1,
            blocks_read: 1,
        })
    }

    /// Move `cursor` past its head, refilling from disk when its block is spent.
    fn advance(&mut self, cursor: &mut RunCursor) -> Result<()> {
        let run = cursor.run;
        if cursor.next_offset < self.block_size {
            cursor.head = Head::Active(self.buffer.input_block(run)[cursor.next_offset]);
            cursor.next_offset += 1;
        } else if cursor.blocks_read < self.blocks_per_run {
            self.buffer
                .fill(run, &mut self.readers[run], cursor.blocks_read)?;
            cursor.head = Head::Active(self.buffer.input_block(run)[0]);
            cursor.next_offset = 1;
            cursor.blocks_read += 1;
            self.refills += 1;
        } else {
            cursor.head = Head::Exhausted;
        }
        Ok(())
    }
}

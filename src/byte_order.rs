//! Conversion between the big-endian input layout and native integers.
//!
//! Input files are loaded verbatim (`u32::from_ne_bytes` over the raw bytes)
//! and then normalized once. Run files and the sorted output are written in
//! native order, so nothing downstream of run generation normalizes again.

pub const ELEMENT_SIZE: usize = std::mem::size_of::<u32>();

/// Turn words loaded verbatim from big-endian storage into native values.
///
/// On little-endian hosts this reverses the four bytes of every word; applying
/// it twice restores the original buffer. An empty buffer is left untouched.
pub fn normalize_in_place(buf: &mut [u32]) {
    for word in buf.iter_mut() {
        *word = u32::from_be(*word);
    }
}

/// Load raw bytes into `out` without any byte reordering.
///
/// `bytes` must hold exactly `out.len() * 4` bytes.
pub fn load_verbatim(bytes: &[u8], out: &mut [u32]) {
    debug_assert_eq!(bytes.len(), out.len() * ELEMENT_SIZE);
    for (word, chunk) in out.iter_mut().zip(bytes.chunks_exact(ELEMENT_SIZE)) {
        *word = u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
}

/// Serialize native values into `out` in native order (run and output files).
pub fn store_native(values: &[u32], out: &mut [u8]) {
    debug_assert_eq!(out.len(), values.len() * ELEMENT_SIZE);
    for (chunk, value) in out.chunks_exact_mut(ELEMENT_SIZE).zip(values) {
        chunk.copy_from_slice(&value.to_ne_bytes());
    }
}

/// Encode values in the big-endian input layout.
pub fn encode_big_endian(values: &[u32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * ELEMENT_SIZE);
    for value in values {
        bytes.extend_from_slice(&value.to_be_bytes());
    }
    bytes
}

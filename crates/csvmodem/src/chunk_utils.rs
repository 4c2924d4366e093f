//! Helpers for splitting a payload into chunks, used by tests, benches and
//! the fuzzer to exercise chunk boundaries.

use alloc::vec::Vec;

/// Split `payload` into approximately equal-sized chunks.
///
/// # Panics
///
/// Panics if `parts` is zero.
#[must_use]
pub fn produce_chunks(payload: &[u8], parts: usize) -> Vec<&[u8]> {
    assert!(parts > 0);
    let chunk_size = payload.len().div_ceil(parts).max(1);
    payload.chunks(chunk_size).collect()
}

/// Split `payload` into chunks of `size` bytes; the last chunk may be
/// shorter.
///
/// # Panics
///
/// Panics if `size` is zero.
#[must_use]
pub fn fixed_chunks(payload: &[u8], size: usize) -> Vec<&[u8]> {
    assert!(size > 0);
    payload.chunks(size).collect()
}

/// Split `payload` at the given cut points. Each cut is reduced modulo the
/// remaining length, so every chunk is non-empty and any `cuts` is valid.
#[must_use]
pub fn split_at_cuts<'a>(payload: &'a [u8], cuts: &[usize]) -> Vec<&'a [u8]> {
    let mut chunks = Vec::with_capacity(cuts.len() + 1);
    let mut rest = payload;
    for &cut in cuts {
        if rest.is_empty() {
            break;
        }
        let (head, tail) = rest.split_at(1 + cut % rest.len());
        chunks.push(head);
        rest = tail;
    }
    if !rest.is_empty() {
        chunks.push(rest);
    }
    chunks
}

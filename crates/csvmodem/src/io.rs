//! Driving a [`Tokenizer`] from a [`std::io::Read`] source.

use std::io::{ErrorKind, Read};

use thiserror::Error;

use crate::{Tokenizer, Visitor};

/// Failure while tokenizing a reader.
#[derive(Error, Debug)]
pub enum ReadError<E> {
    /// Reading from the source failed.
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
    /// The visitor stopped tokenization.
    #[error("visitor error: {0}")]
    Visitor(E),
}

/// Tokenizes everything `reader` produces, using `buf` as the read buffer,
/// and ends the stream once the reader is exhausted.
///
/// Returns the number of bytes read.
///
/// # Errors
///
/// Returns [`ReadError::Io`] if a read fails (reads interrupted by a signal
/// are retried) and [`ReadError::Visitor`] if the visitor fails. The
/// tokenizer's state is unspecified after an error.
///
/// # Panics
///
/// Panics if `buf` is empty.
///
/// # Examples
///
/// ```rust
/// use csvmodem::{RecordBuffer, Tokenizer, io::tokenize_reader};
///
/// let input: &[u8] = b"a,b\nc,d\n";
/// let mut records = RecordBuffer::new();
/// let read = tokenize_reader(input, &mut Tokenizer::default(), &mut records, &mut [0; 3])?;
/// assert_eq!(read, 8);
/// assert_eq!(records.records().len(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn tokenize_reader<R: Read, V: Visitor>(
    mut reader: R,
    tokenizer: &mut Tokenizer,
    visitor: &mut V,
    buf: &mut [u8],
) -> Result<u64, ReadError<V::Error>> {
    assert!(!buf.is_empty(), "read buffer must not be empty");
    let mut total = 0u64;
    loop {
        let n = match reader.read(buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(ReadError::Io(e)),
        };
        total += n as u64;
        tokenizer
            .feed(&buf[..n], visitor)
            .map_err(ReadError::Visitor)?;
    }
    tracing::trace!(total, "reader exhausted");
    tokenizer.end_of_stream(visitor).map_err(ReadError::Visitor)?;
    Ok(total)
}

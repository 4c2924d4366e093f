//! A streaming, incremental tokenizer for delimited text (RFC 4180 CSV).
//!
//! The [`Tokenizer`] is fed chunks of bytes of any size and reports the
//! structure it discovers to a [`Visitor`]: pieces of field data, field
//! boundaries and record boundaries. It never buffers field contents; every
//! slice handed to the visitor borrows from the chunk being fed.
//!
//! ```rust
//! use csvmodem::{Event, Tokenizer};
//!
//! let mut tokenizer = Tokenizer::default();
//! let mut events: Vec<Event> = Vec::new();
//! let Ok(()) = tokenizer.feed(b"id,na", &mut events);
//! let Ok(()) = tokenizer.feed(b"me\n1,\"x\"\"y\"", &mut events);
//! let Ok(()) = tokenizer.end_of_stream(&mut events);
//!
//! let records = csvmodem::reconstruct_records(events);
//! assert_eq!(records, [vec!["id", "name"], vec!["1", "x\"y"]]);
//! ```

#![no_std]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod chunk_utils;
mod error;
mod options;
mod tokenizer;
mod visitor;

#[cfg(feature = "buffered")]
mod buffered;
#[cfg(feature = "buffered")]
mod event;
#[cfg(feature = "headered")]
pub mod headered;
#[cfg(feature = "std")]
pub mod io;

#[cfg(all(test, feature = "buffered"))]
mod tests;

#[cfg(feature = "buffered")]
pub use buffered::{Field, Record, RecordBuffer};
pub use error::{DataStreamError, InvalidDelimiter};
#[cfg(feature = "buffered")]
pub use event::{Event, reconstruct_records};
pub use options::TokenizerOptions;
pub use tokenizer::Tokenizer;
pub use visitor::{NullVisitor, ValidatingVisitor, Visitor};

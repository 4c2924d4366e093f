//! The CSV tokenizer state machine.
//!
//! [`Tokenizer`] turns chunks of bytes into [`Visitor`] calls. Field data is
//! never copied: the visitor receives sub-slices of the chunk being fed, and a
//! field that spans chunks is delivered as several partial slices.
//!
//! # Dialect
//!
//! The grammar is RFC 4180 with the following extensions, chosen so that
//! every byte sequence has exactly one interpretation:
//!
//! - `\r`, `\n` and `\r\n` all end a record. A line with nothing on it
//!   produces no record at all.
//! - A quote that is not the first byte of a field is ordinary data.
//! - A quoted field may continue after its closing quote (`"ab"cd` is the
//!   field `abcd`); the visitor is told through
//!   [`Visitor::nonstandard_quoted_field`]. From then on quotes in that field
//!   are ordinary data.
//! - A record may end with a delimiter, giving it an empty final field.
//! - An unterminated quoted field runs to the end of the stream.
//!
//! # Examples
//!
//! ```rust
//! use csvmodem::{RecordBuffer, Tokenizer};
//!
//! let mut tokenizer = Tokenizer::new(b';').unwrap();
//! let mut records = RecordBuffer::new();
//! let Ok(()) = tokenizer.feed(b"a;\"b", &mut records);
//! let Ok(()) = tokenizer.feed(b"\"\"c\";d\r\n", &mut records);
//! let Ok(()) = tokenizer.end_of_stream(&mut records);
//!
//! let rows: Vec<Vec<String>> = records
//!     .take_records()
//!     .iter()
//!     .map(|r| r.fields.iter().map(|f| f.data.to_string()).collect())
//!     .collect();
//! assert_eq!(rows, [["a", "b\"c", "d"]]);
//! ```

use memchr::{memchr, memchr3};

use crate::{
    error::InvalidDelimiter,
    options::TokenizerOptions,
    visitor::{NullVisitor, Visitor},
};

const QUOTE: u8 = b'"';
const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// Where the tokenizer is within the current field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldState {
    /// Nothing of the current field has been read.
    Start,
    /// The field is in progress and only a delimiter or line ending can end
    /// it. Covers plain fields and quoted fields that continued past their
    /// closing quote.
    Unquoted,
    /// Inside the quoted portion of a field that opened with `"`.
    Quoted,
    /// As `Quoted`, but the last chunk ended directly after a quote. Whether
    /// that quote escapes a following quote or closes the field depends on
    /// the first byte of the next chunk.
    QuotedCut,
}

/// A streaming CSV tokenizer.
///
/// Feed it consecutive chunks of one stream with [`feed`](Self::feed), then
/// call [`end_of_stream`](Self::end_of_stream) exactly once to flush the last
/// record. After that the tokenizer is reset and can be used for another
/// stream.
///
/// The visitor is passed per call; the tokenizer keeps no reference to it.
/// One tokenizer must only be driven by one stream at a time.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    delimiter: u8,
    field: FieldState,
    /// A field or delimiter has been seen since the last record boundary.
    read_anything_on_line: bool,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::from_valid_delimiter(TokenizerOptions::default().delimiter)
    }
}

impl Tokenizer {
    /// Creates a tokenizer that separates fields with `delimiter`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDelimiter`] if `delimiter` is `\r`, `\n` or `"`.
    pub fn new(delimiter: u8) -> Result<Self, InvalidDelimiter> {
        if matches!(delimiter, CR | LF | QUOTE) {
            tracing::debug!(delimiter, "rejected tokenizer delimiter");
            return Err(InvalidDelimiter(delimiter));
        }
        Ok(Self::from_valid_delimiter(delimiter))
    }

    /// Creates a tokenizer from [`TokenizerOptions`].
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDelimiter`] if the configured delimiter is `\r`, `\n`
    /// or `"`.
    pub fn with_options(options: TokenizerOptions) -> Result<Self, InvalidDelimiter> {
        Self::new(options.delimiter)
    }

    const fn from_valid_delimiter(delimiter: u8) -> Self {
        Self {
            delimiter,
            field: FieldState::Start,
            read_anything_on_line: false,
        }
    }

    /// The byte that separates fields.
    #[must_use]
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Whether the tokenizer is between records, with nothing buffered in
    /// its state that [`end_of_stream`](Self::end_of_stream) would flush.
    #[must_use]
    pub fn is_at_record_boundary(&self) -> bool {
        self.field == FieldState::Start && !self.read_anything_on_line
    }

    /// Processes the next chunk of the stream, reporting what it contains to
    /// `visitor`.
    ///
    /// The whole chunk is consumed. Structure that cannot be decided yet,
    /// such as a field that continues in the next chunk, is carried in the
    /// tokenizer's state.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `visitor`. The tokenizer's state is
    /// unspecified afterwards.
    pub fn feed<V: Visitor>(&mut self, mut chunk: &[u8], visitor: &mut V) -> Result<(), V::Error> {
        while !chunk.is_empty() {
            chunk = match self.field {
                FieldState::Start if chunk[0] == QUOTE => {
                    self.field = FieldState::Quoted;
                    self.read_anything_on_line = true;
                    &chunk[1..]
                }
                FieldState::Start | FieldState::Unquoted => self.scan_unquoted(chunk, visitor)?,
                FieldState::Quoted => self.scan_quoted(chunk, visitor)?,
                FieldState::QuotedCut => self.resolve_cut_quote(chunk, visitor)?,
            };
        }
        #[cfg(any(test, feature = "fuzzing"))]
        assert!(
            self.field == FieldState::Start || self.read_anything_on_line,
            "field in progress on a line marked empty"
        );
        Ok(())
    }

    /// Processes the next chunk without reporting anything.
    ///
    /// The tokenizer's state advances exactly as with [`feed`](Self::feed),
    /// which is useful to skip input that was already consumed while keeping
    /// track of where records begin.
    pub fn skip(&mut self, chunk: &[u8]) {
        let Ok(()) = self.feed(chunk, &mut NullVisitor);
    }

    /// Signals the end of the stream, flushing the final field and record.
    ///
    /// A stream need not end with a line ending; this reports the last record
    /// in any case. The tokenizer is reset to its initial state afterwards.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `visitor`.
    pub fn end_of_stream<V: Visitor>(&mut self, visitor: &mut V) -> Result<(), V::Error> {
        let flushed = !self.is_at_record_boundary();
        tracing::trace!(flushed, state = ?self.field, "end of stream");
        let result = self.end_of_line(&[], visitor);
        self.field = FieldState::Start;
        self.read_anything_on_line = false;
        result
    }

    /// Scans a field that can only end at a delimiter or line ending.
    #[inline]
    fn scan_unquoted<'c, V: Visitor>(
        &mut self,
        chunk: &'c [u8],
        visitor: &mut V,
    ) -> Result<&'c [u8], V::Error> {
        let Some(idx) = memchr3(self.delimiter, CR, LF, chunk) else {
            self.field = FieldState::Unquoted;
            self.read_anything_on_line = true;
            visitor.partial_field(chunk)?;
            return Ok(&[]);
        };

        let data = &chunk[..idx];
        if chunk[idx] == self.delimiter {
            self.end_of_field(data, visitor)?;
        } else {
            self.end_of_line(data, visitor)?;
        }
        Ok(&chunk[idx + 1..])
    }

    /// Scans the quoted portion of a field for its next quote.
    #[inline]
    fn scan_quoted<'c, V: Visitor>(
        &mut self,
        chunk: &'c [u8],
        visitor: &mut V,
    ) -> Result<&'c [u8], V::Error> {
        let Some(idx) = memchr(QUOTE, chunk) else {
            visitor.partial_field(chunk)?;
            return Ok(&[]);
        };

        let Some(&next) = chunk.get(idx + 1) else {
            // The quote's meaning depends on a byte we don't have yet.
            if idx > 0 {
                visitor.partial_field(&chunk[..idx])?;
            }
            self.field = FieldState::QuotedCut;
            return Ok(&[]);
        };

        if next == QUOTE {
            // `""` is one literal quote: report data through the first of the
            // pair and continue after the second.
            visitor.partial_field(&chunk[..=idx])?;
            return Ok(&chunk[idx + 2..]);
        }

        self.close_quoted(&chunk[..idx], &chunk[idx + 1..], visitor)
    }

    /// The previous chunk ended right after a quote inside a quoted field.
    #[cold]
    fn resolve_cut_quote<'c, V: Visitor>(
        &mut self,
        chunk: &'c [u8],
        visitor: &mut V,
    ) -> Result<&'c [u8], V::Error> {
        if chunk[0] == QUOTE {
            // Escaped quote; the literal quote is the byte we were just given.
            self.field = FieldState::Quoted;
            visitor.partial_field(&chunk[..1])?;
            return Ok(&chunk[1..]);
        }
        self.close_quoted(&[], chunk, visitor)
    }

    /// Handles the bytes after the closing quote of a quoted field.
    ///
    /// `data` is the final part of the quoted contents; `rest` is non-empty
    /// and starts with the byte that followed the closing quote.
    fn close_quoted<'c, V: Visitor>(
        &mut self,
        data: &[u8],
        rest: &'c [u8],
        visitor: &mut V,
    ) -> Result<&'c [u8], V::Error> {
        match rest[0] {
            b if b == self.delimiter => self.end_of_field(data, visitor)?,
            CR | LF => self.end_of_line(data, visitor)?,
            _ => {
                // Data after the closing quote. Keep it, and read the rest of
                // the field as if it were unquoted.
                self.field = FieldState::Unquoted;
                visitor.partial_field(data)?;
                visitor.nonstandard_quoted_field()?;
                return Ok(rest);
            }
        }
        Ok(&rest[1..])
    }

    #[inline]
    fn end_of_field<V: Visitor>(&mut self, data: &[u8], visitor: &mut V) -> Result<(), V::Error> {
        self.field = FieldState::Start;
        self.read_anything_on_line = true;
        visitor.end_of_field(data)
    }

    fn end_of_line<V: Visitor>(&mut self, data: &[u8], visitor: &mut V) -> Result<(), V::Error> {
        let empty_line = self.is_at_record_boundary() && data.is_empty();
        self.field = FieldState::Start;
        self.read_anything_on_line = false;
        if empty_line {
            return Ok(());
        }
        visitor.end_of_field(data)?;
        visitor.end_of_record()
    }
}

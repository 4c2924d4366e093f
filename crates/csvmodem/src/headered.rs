//! A header-aware layer over the raw [`Visitor`] contract.
//!
//! [`Utf8HeaderedVisitor`] decodes the first record of a stream as UTF-8
//! header names and then hands every field of every later record to a
//! [`HeaderedVisitor`] together with its index and header. Records whose
//! width does not match the header are reported through overridable hooks.
//!
//! # Examples
//!
//! ```rust
//! use csvmodem::{
//!     DataStreamError, Tokenizer,
//!     headered::{DataField, HeaderOptions, HeaderedVisitor, Utf8HeaderedVisitor},
//! };
//!
//! #[derive(Default)]
//! struct Names(Vec<String>);
//!
//! impl HeaderedVisitor for Names {
//!     type Error = DataStreamError;
//!
//!     fn partial_data_field(&mut self, field: DataField<'_>, data: &[u8]) -> Result<(), Self::Error> {
//!         self.end_of_data_field(field, data)
//!     }
//!
//!     fn end_of_data_field(&mut self, field: DataField<'_>, data: &[u8]) -> Result<(), Self::Error> {
//!         if field.header == "name" {
//!             self.0.last_mut().unwrap().push_str(core::str::from_utf8(data).unwrap());
//!         }
//!         Ok(())
//!     }
//!
//!     fn end_of_data_record(&mut self) -> Result<(), Self::Error> {
//!         self.0.push(String::new());
//!         Ok(())
//!     }
//! }
//!
//! let mut tokenizer = Tokenizer::default();
//! let mut names = Names(vec![String::new()]);
//! let mut visitor = Utf8HeaderedVisitor::new(&mut names, HeaderOptions::default());
//! tokenizer.feed(b"id,name\n1,ada\n2,grace\n", &mut visitor)?;
//! tokenizer.end_of_stream(&mut visitor)?;
//! assert_eq!(visitor.headers(), ["id", "name"]);
//! assert_eq!(names.0, ["ada", "grace", ""]);
//! # Ok::<(), DataStreamError>(())
//! ```

use alloc::{string::String, vec::Vec};

use bstr::ByteSlice;

use crate::{DataStreamError, Visitor};

/// What to do with header bytes that are not valid UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Utf8Policy {
    /// Fail with [`DataStreamError::InvalidHeaderUtf8`].
    #[default]
    Error,
    /// Substitute U+FFFD for each maximal invalid sequence.
    Replace,
}

/// Limits and decoding choices for [`Utf8HeaderedVisitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderOptions {
    /// Maximum number of fields in the header record.
    ///
    /// # Default
    ///
    /// `1000`
    pub max_header_count: usize,

    /// Maximum length of one header, in decoded characters.
    ///
    /// # Default
    ///
    /// `100`
    pub max_header_len: usize,

    /// Maximum length of one data field, in bytes. `None` leaves data fields
    /// unbounded.
    ///
    /// # Default
    ///
    /// `None`
    pub max_data_field_len: Option<usize>,

    /// Whether to drop a byte order mark (U+FEFF) at the very start of the
    /// first header.
    ///
    /// # Default
    ///
    /// `true`
    pub strip_byte_order_mark: bool,

    /// Handling of invalid UTF-8 in headers.
    ///
    /// # Default
    ///
    /// [`Utf8Policy::Error`]
    pub invalid_utf8: Utf8Policy,
}

impl Default for HeaderOptions {
    fn default() -> Self {
        Self {
            max_header_count: 1000,
            max_header_len: 100,
            max_data_field_len: None,
            strip_byte_order_mark: true,
            invalid_utf8: Utf8Policy::Error,
        }
    }
}

/// A data field's position within its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataField<'h> {
    /// Zero-based index of the field within its record.
    pub index: usize,
    /// The header at the same index.
    pub header: &'h str,
}

/// Receives the data records of a stream with a header record.
///
/// The calls follow the same order as [`Visitor`]'s, restricted to fields
/// that have a header.
pub trait HeaderedVisitor {
    /// Error the visitor may stop processing with. Data stream problems
    /// found by the adapter are converted into it.
    type Error: core::error::Error + From<DataStreamError>;

    /// The header record is complete.
    fn headers_complete(&mut self, headers: &[String]) -> Result<(), Self::Error> {
        let _ = headers;
        Ok(())
    }

    /// Part of a data field's contents.
    fn partial_data_field(&mut self, field: DataField<'_>, data: &[u8]) -> Result<(), Self::Error>;

    /// The final part of a data field's contents, possibly empty.
    fn end_of_data_field(&mut self, field: DataField<'_>, data: &[u8]) -> Result<(), Self::Error>;

    /// A data record is complete.
    fn end_of_data_record(&mut self) -> Result<(), Self::Error>;

    /// The data field opened with a quote but continued after its closing
    /// quote.
    fn nonstandard_quoted_data_field(&mut self, field: DataField<'_>) -> Result<(), Self::Error> {
        let _ = field;
        Ok(())
    }

    /// A data record ended with only `present` of the header's fields.
    ///
    /// Called before [`end_of_data_record`](Self::end_of_data_record).
    ///
    /// # Errors
    ///
    /// Fails with [`DataStreamError::MissingDataFields`] unless overridden.
    fn missing_data_fields(&mut self, headers: &[String], present: usize) -> Result<(), Self::Error> {
        Err(DataStreamError::MissingDataFields {
            expected: headers.len(),
            actual: present,
        }
        .into())
    }

    /// A data record has a field at `index`, past the last header. The
    /// field's data is not delivered.
    ///
    /// # Errors
    ///
    /// Fails with [`DataStreamError::UnexpectedDataField`] unless overridden.
    fn unexpected_data_field(&mut self, headers: &[String], index: usize) -> Result<(), Self::Error> {
        Err(DataStreamError::UnexpectedDataField {
            expected: headers.len(),
            index,
        }
        .into())
    }
}

impl<H: HeaderedVisitor + ?Sized> HeaderedVisitor for &mut H {
    type Error = H::Error;

    fn headers_complete(&mut self, headers: &[String]) -> Result<(), Self::Error> {
        (**self).headers_complete(headers)
    }

    fn partial_data_field(&mut self, field: DataField<'_>, data: &[u8]) -> Result<(), Self::Error> {
        (**self).partial_data_field(field, data)
    }

    fn end_of_data_field(&mut self, field: DataField<'_>, data: &[u8]) -> Result<(), Self::Error> {
        (**self).end_of_data_field(field, data)
    }

    fn end_of_data_record(&mut self) -> Result<(), Self::Error> {
        (**self).end_of_data_record()
    }

    fn nonstandard_quoted_data_field(&mut self, field: DataField<'_>) -> Result<(), Self::Error> {
        (**self).nonstandard_quoted_data_field(field)
    }

    fn missing_data_fields(&mut self, headers: &[String], present: usize) -> Result<(), Self::Error> {
        (**self).missing_data_fields(headers, present)
    }

    fn unexpected_data_field(&mut self, headers: &[String], index: usize) -> Result<(), Self::Error> {
        (**self).unexpected_data_field(headers, index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Headers,
    Data,
}

/// Incremental UTF-8 decoder for the header currently being read.
#[derive(Debug, Default)]
struct HeaderDecoder {
    text: String,
    chars: usize,
    /// Start of a multi-byte sequence cut by a chunk boundary.
    pending: [u8; 4],
    pending_len: usize,
    /// Whether any character of the first header has been seen, which
    /// settles byte order mark handling.
    seen_first_char: bool,
}

/// Adapts a [`HeaderedVisitor`] to the raw [`Visitor`] contract.
///
/// Once any method has returned an error the adapter's buffers are in an
/// unspecified state and it must not be fed further.
#[derive(Debug)]
pub struct Utf8HeaderedVisitor<H> {
    inner: H,
    options: HeaderOptions,
    phase: Phase,
    headers: Vec<String>,
    decoder: HeaderDecoder,
    field_index: usize,
    field_len: usize,
}

impl<H: HeaderedVisitor> Utf8HeaderedVisitor<H> {
    /// Wraps `inner`, reading the first record of the stream as its header.
    pub fn new(inner: H, options: HeaderOptions) -> Self {
        Self {
            inner,
            options,
            phase: Phase::Headers,
            headers: Vec::new(),
            decoder: HeaderDecoder::default(),
            field_index: 0,
            field_len: 0,
        }
    }

    /// The headers decoded so far; complete once the first record has ended.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Whether the header record has been read completely.
    #[must_use]
    pub fn has_headers(&self) -> bool {
        self.phase == Phase::Data
    }

    /// The wrapped visitor.
    pub fn inner(&self) -> &H {
        &self.inner
    }

    /// The wrapped visitor, mutably.
    pub fn inner_mut(&mut self) -> &mut H {
        &mut self.inner
    }

    /// Unwraps the visitor.
    pub fn into_inner(self) -> H {
        self.inner
    }

    fn fail(err: DataStreamError) -> H::Error {
        tracing::debug!(%err, "data stream error");
        err.into()
    }

    fn check_header_count(&self) -> Result<(), H::Error> {
        let max = self.options.max_header_count;
        if self.headers.len() >= max {
            return Err(Self::fail(DataStreamError::TooManyHeaders { max }));
        }
        Ok(())
    }

    fn decode_header_bytes(&mut self, mut bytes: &[u8]) -> Result<(), H::Error> {
        let index = self.headers.len();
        let options = self.options;
        let decoder = &mut self.decoder;

        if decoder.pending_len > 0 {
            // Try to complete the cut sequence with the head of this chunk.
            let have = decoder.pending_len;
            let take = bytes.len().min(4 - have);
            let mut buf = decoder.pending;
            buf[have..have + take].copy_from_slice(&bytes[..take]);
            let combined = &buf[..have + take];
            let (ch, len) = bstr::decode_utf8(combined);
            match ch {
                None if len == combined.len() && take == bytes.len() => {
                    // Still a prefix of a valid sequence, and no more input.
                    decoder.pending = buf;
                    decoder.pending_len = combined.len();
                    return Ok(());
                }
                Some(ch) => {
                    decoder.pending_len = 0;
                    decoder.push_char(ch, index, &options).map_err(Self::fail)?;
                }
                None => {
                    decoder.pending_len = 0;
                    decoder.push_invalid(index, &options).map_err(Self::fail)?;
                }
            }
            bytes = &bytes[len.saturating_sub(have)..];
        }

        // `[u8]` has an inherent `utf8_chunks` that cannot report incomplete tails.
        for chunk in ByteSlice::utf8_chunks(bytes) {
            decoder.push_str(chunk.valid(), index, &options).map_err(Self::fail)?;
            let invalid = chunk.invalid();
            if invalid.is_empty() {
                continue;
            }
            if chunk.incomplete() {
                decoder.pending[..invalid.len()].copy_from_slice(invalid);
                decoder.pending_len = invalid.len();
            } else {
                decoder.push_invalid(index, &options).map_err(Self::fail)?;
            }
        }
        Ok(())
    }

    fn finish_header(&mut self) -> Result<(), H::Error> {
        let index = self.headers.len();
        let options = self.options;
        if self.decoder.pending_len > 0 {
            // A sequence cut short by the end of the field.
            self.decoder.pending_len = 0;
            self.decoder
                .push_invalid(index, &options)
                .map_err(Self::fail)?;
        }
        let header = core::mem::take(&mut self.decoder.text);
        self.decoder.chars = 0;
        self.headers.push(header);
        Ok(())
    }

    fn data_field(headers: &[String], index: usize) -> Option<DataField<'_>> {
        headers.get(index).map(|header| DataField { index, header })
    }

    fn check_field_len(&mut self, len: usize) -> Result<(), H::Error> {
        self.field_len += len;
        match self.options.max_data_field_len {
            Some(max) if self.field_len > max => {
                Err(Self::fail(DataStreamError::DataFieldTooLong {
                    index: self.field_index,
                    max,
                }))
            }
            _ => Ok(()),
        }
    }
}

impl HeaderDecoder {
    fn push_str(
        &mut self,
        mut s: &str,
        index: usize,
        options: &HeaderOptions,
    ) -> Result<(), DataStreamError> {
        if s.is_empty() {
            return Ok(());
        }
        if !self.seen_first_char {
            self.seen_first_char = true;
            if options.strip_byte_order_mark && index == 0 {
                s = s.strip_prefix('\u{FEFF}').unwrap_or(s);
            }
        }
        self.chars += s.chars().count();
        if self.chars > options.max_header_len {
            return Err(DataStreamError::HeaderTooLong {
                index,
                max: options.max_header_len,
            });
        }
        self.text.push_str(s);
        Ok(())
    }

    fn push_char(
        &mut self,
        ch: char,
        index: usize,
        options: &HeaderOptions,
    ) -> Result<(), DataStreamError> {
        let mut buf = [0u8; 4];
        self.push_str(ch.encode_utf8(&mut buf), index, options)
    }

    fn push_invalid(&mut self, index: usize, options: &HeaderOptions) -> Result<(), DataStreamError> {
        match options.invalid_utf8 {
            Utf8Policy::Error => Err(DataStreamError::InvalidHeaderUtf8 { index }),
            Utf8Policy::Replace => self.push_char('\u{FFFD}', index, options),
        }
    }
}

impl<H: HeaderedVisitor> Visitor for Utf8HeaderedVisitor<H> {
    type Error = H::Error;

    fn partial_field(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        match self.phase {
            Phase::Headers => {
                self.check_header_count()?;
                self.decode_header_bytes(data)
            }
            Phase::Data => {
                self.check_field_len(data.len())?;
                match Self::data_field(&self.headers, self.field_index) {
                    Some(field) => self.inner.partial_data_field(field, data),
                    None => Ok(()),
                }
            }
        }
    }

    fn end_of_field(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        match self.phase {
            Phase::Headers => {
                self.check_header_count()?;
                self.decode_header_bytes(data)?;
                self.finish_header()
            }
            Phase::Data => {
                self.check_field_len(data.len())?;
                let index = self.field_index;
                self.field_index += 1;
                self.field_len = 0;
                match Self::data_field(&self.headers, index) {
                    Some(field) => self.inner.end_of_data_field(field, data),
                    None => self.inner.unexpected_data_field(&self.headers, index),
                }
            }
        }
    }

    fn end_of_record(&mut self) -> Result<(), Self::Error> {
        match self.phase {
            Phase::Headers => {
                self.phase = Phase::Data;
                tracing::debug!(count = self.headers.len(), "header record complete");
                self.inner.headers_complete(&self.headers)
            }
            Phase::Data => {
                let present = core::mem::take(&mut self.field_index);
                if present < self.headers.len() {
                    self.inner.missing_data_fields(&self.headers, present)?;
                }
                self.inner.end_of_data_record()
            }
        }
    }

    fn nonstandard_quoted_field(&mut self) -> Result<(), Self::Error> {
        if self.phase == Phase::Headers {
            return Ok(());
        }
        match Self::data_field(&self.headers, self.field_index) {
            Some(field) => self.inner.nonstandard_quoted_data_field(field),
            None => Ok(()),
        }
    }
}

use alloc::vec::Vec;
use core::convert::Infallible;

use bstr::BString;

use crate::Visitor;

/// One complete field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    /// The field's contents with quote escapes resolved.
    pub data: BString,
    /// The field opened with a quote but continued after its closing quote.
    pub nonstandard: bool,
}

/// One complete record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    /// The record's fields, in order. Never empty.
    pub fields: Vec<Field>,
}

impl Record {
    /// Iterates over the data of each field.
    pub fn data(&self) -> impl Iterator<Item = &[u8]> {
        self.fields.iter().map(|f| f.data.as_slice())
    }
}

/// A visitor that buffers fields into owned [`Record`]s.
///
/// This trades the tokenizer's zero-copy delivery for convenience: each field
/// is copied once into its own buffer.
///
/// # Examples
///
/// ```rust
/// use csvmodem::{RecordBuffer, Tokenizer};
///
/// let mut tokenizer = Tokenizer::default();
/// let mut buffer = RecordBuffer::new();
/// let Ok(()) = tokenizer.feed(b"a,\"b\"c\n", &mut buffer);
/// let Ok(()) = tokenizer.end_of_stream(&mut buffer);
///
/// let [record] = buffer.records() else { panic!() };
/// assert_eq!(record.fields[1].data, "bc");
/// assert!(record.fields[1].nonstandard);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordBuffer {
    records: Vec<Record>,
    current: Record,
    field: Field,
}

impl RecordBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The records completed so far.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Removes and returns the records completed so far. A record still in
    /// progress stays in the buffer.
    pub fn take_records(&mut self) -> Vec<Record> {
        core::mem::take(&mut self.records)
    }
}

impl Visitor for RecordBuffer {
    type Error = Infallible;

    fn partial_field(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.field.data.extend_from_slice(data);
        Ok(())
    }

    fn end_of_field(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.field.data.extend_from_slice(data);
        self.current.fields.push(core::mem::take(&mut self.field));
        Ok(())
    }

    fn end_of_record(&mut self) -> Result<(), Self::Error> {
        self.records.push(core::mem::take(&mut self.current));
        Ok(())
    }

    fn nonstandard_quoted_field(&mut self) -> Result<(), Self::Error> {
        self.field.nonstandard = true;
        Ok(())
    }
}

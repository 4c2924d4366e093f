use alloc::vec::Vec;
use core::convert::Infallible;

use bstr::BString;

use crate::Visitor;

/// An owned record of one [`Visitor`] call.
///
/// `Vec<Event>` is itself a visitor that logs every call it receives, which
/// is handy for tests and for inspecting how a stream was split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// [`Visitor::partial_field`]
    PartialField(BString),
    /// [`Visitor::end_of_field`]
    EndOfField(BString),
    /// [`Visitor::end_of_record`]
    EndOfRecord,
    /// [`Visitor::nonstandard_quoted_field`]
    NonstandardQuotedField,
}

impl Visitor for Vec<Event> {
    type Error = Infallible;

    fn partial_field(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.push(Event::PartialField(data.into()));
        Ok(())
    }

    fn end_of_field(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.push(Event::EndOfField(data.into()));
        Ok(())
    }

    fn end_of_record(&mut self) -> Result<(), Self::Error> {
        self.push(Event::EndOfRecord);
        Ok(())
    }

    fn nonstandard_quoted_field(&mut self) -> Result<(), Self::Error> {
        self.push(Event::NonstandardQuotedField);
        Ok(())
    }
}

/// Folds a sequence of events back into records of complete fields.
///
/// Fields of a record that never received [`Event::EndOfRecord`] are dropped.
#[must_use]
pub fn reconstruct_records<I: IntoIterator<Item = Event>>(events: I) -> Vec<Vec<BString>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = BString::default();
    for event in events {
        match event {
            Event::PartialField(data) => field.extend_from_slice(&data),
            Event::EndOfField(data) => {
                field.extend_from_slice(&data);
                record.push(core::mem::take(&mut field));
            }
            Event::EndOfRecord => records.push(core::mem::take(&mut record)),
            Event::NonstandardQuotedField => {}
        }
    }
    records
}

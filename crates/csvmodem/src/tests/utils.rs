use alloc::{string::String, vec::Vec};

use bstr::ByteSlice;

use crate::{Event, RecordBuffer, Tokenizer, ValidatingVisitor, Visitor};

/// Feeds `chunks` in order through a [`ValidatingVisitor`], then ends the
/// stream.
pub fn feed_all<V: Visitor>(tokenizer: &mut Tokenizer, chunks: &[&[u8]], visitor: V) -> V {
    let mut visitor = ValidatingVisitor::new(visitor);
    for chunk in chunks {
        tokenizer
            .feed(chunk, &mut visitor)
            .unwrap_or_else(|e| panic!("visitor error: {e}"));
    }
    tokenizer
        .end_of_stream(&mut visitor)
        .unwrap_or_else(|e| panic!("visitor error: {e}"));
    visitor.assert_complete();
    visitor.into_inner()
}

/// Tokenizes `chunks` with the default delimiter and renders every record as
/// lossily decoded strings.
pub fn records(chunks: &[&[u8]]) -> Vec<Vec<String>> {
    let mut buffer = feed_all(&mut Tokenizer::default(), chunks, RecordBuffer::new());
    buffer
        .take_records()
        .iter()
        .map(|r| r.data().map(|d| d.to_str_lossy().into_owned()).collect())
        .collect()
}

/// Tokenizes `chunks` and returns the raw event log.
pub fn events(delimiter: u8, chunks: &[&[u8]]) -> Vec<Event> {
    let mut tokenizer = Tokenizer::new(delimiter).unwrap();
    feed_all(&mut tokenizer, chunks, Vec::<Event>::new())
}

/// Logical view of an event log: completed fields with their nonstandard
/// flag, grouped by record. Independent of how fields were split.
pub fn logical(events: &[Event]) -> Vec<Vec<(Vec<u8>, bool)>> {
    let mut out = Vec::new();
    let mut record = Vec::new();
    let mut field = Vec::new();
    let mut nonstandard = false;
    for event in events {
        match event {
            Event::PartialField(d) => field.extend_from_slice(d),
            Event::EndOfField(d) => {
                field.extend_from_slice(d);
                record.push((core::mem::take(&mut field), nonstandard));
                nonstandard = false;
            }
            Event::EndOfRecord => out.push(core::mem::take(&mut record)),
            Event::NonstandardQuotedField => nonstandard = true,
        }
    }
    out
}

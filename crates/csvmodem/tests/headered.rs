#![allow(missing_docs)]

use bstr::ByteSlice;
use csvmodem::{
    DataStreamError, Tokenizer,
    chunk_utils::fixed_chunks,
    headered::{DataField, HeaderOptions, HeaderedVisitor, Utf8HeaderedVisitor},
};
use rstest::rstest;
use thiserror::Error;

mod common;

#[derive(Error, Debug, PartialEq, Eq)]
enum ImportError {
    #[error(transparent)]
    Data(#[from] DataStreamError),
    #[error("rejected id {0}")]
    Rejected(String),
}

/// Collects `(header, value)` pairs per record and rejects one id.
#[derive(Debug, Default)]
struct Import {
    rows: Vec<Vec<(String, String)>>,
    current: Vec<(String, String)>,
    value: Vec<u8>,
    nonstandard: Vec<(usize, String)>,
    reject_id: Option<&'static str>,
}

impl HeaderedVisitor for Import {
    type Error = ImportError;

    fn partial_data_field(&mut self, _: DataField<'_>, data: &[u8]) -> Result<(), Self::Error> {
        self.value.extend_from_slice(data);
        Ok(())
    }

    fn end_of_data_field(&mut self, field: DataField<'_>, data: &[u8]) -> Result<(), Self::Error> {
        self.value.extend_from_slice(data);
        let value = std::mem::take(&mut self.value).to_str_lossy().into_owned();
        if field.header == "id" && self.reject_id == Some(value.as_str()) {
            return Err(ImportError::Rejected(value));
        }
        self.current.push((field.header.to_owned(), value));
        Ok(())
    }

    fn end_of_data_record(&mut self) -> Result<(), Self::Error> {
        self.rows.push(std::mem::take(&mut self.current));
        Ok(())
    }

    fn nonstandard_quoted_data_field(&mut self, field: DataField<'_>) -> Result<(), Self::Error> {
        self.nonstandard.push((self.rows.len(), field.header.to_owned()));
        Ok(())
    }
}

fn import(chunks: &[&[u8]], import: Import) -> Result<(Vec<String>, Import), ImportError> {
    let mut tokenizer = Tokenizer::default();
    let mut visitor = Utf8HeaderedVisitor::new(import, HeaderOptions::default());
    for chunk in chunks {
        tokenizer.feed(chunk, &mut visitor)?;
    }
    tokenizer.end_of_stream(&mut visitor)?;
    assert!(visitor.has_headers());
    Ok((visitor.headers().to_vec(), visitor.into_inner()))
}

fn pairs(record: &[&str]) -> Vec<(String, String)> {
    common::RECORDS[0]
        .iter()
        .zip(record)
        .map(|(h, v)| ((*h).to_owned(), (*v).to_owned()))
        .collect()
}

#[rstest]
fn imports_sample(#[values(1, 3, 16, 4096)] chunk_size: usize) {
    let chunks = fixed_chunks(common::ORIGINAL.as_bytes(), chunk_size);
    let (headers, import) = import(&chunks, Import::default()).unwrap();

    assert_eq!(headers, common::RECORDS[0]);
    let expected: Vec<_> = common::RECORDS[1..].iter().map(|r| pairs(r)).collect();
    assert_eq!(import.rows, expected);
    assert_eq!(import.nonstandard, [(3, "name".to_owned())]);
}

#[test]
fn imports_network_split() {
    let (headers, import) = import(&common::stream_chunks(), Import::default()).unwrap();
    assert_eq!(headers, common::RECORDS[0]);
    assert_eq!(import.rows.len(), 5);
}

#[test]
fn visitor_error_stops_the_stream() {
    let reject = Import {
        reject_id: Some("3"),
        ..Import::default()
    };
    let err = import(&common::stream_chunks(), reject).unwrap_err();
    assert_eq!(err, ImportError::Rejected("3".to_owned()));
}

#[test]
fn shape_errors_convert_into_visitor_error() {
    let err = import(&[b"id,name\n1\n"], Import::default()).unwrap_err();
    assert_eq!(
        err,
        ImportError::Data(DataStreamError::MissingDataFields {
            expected: 2,
            actual: 1
        })
    );
    assert_eq!(
        err.to_string(),
        "record has 1 fields but the header declares 2"
    );
}

#[rstest]
fn byte_order_mark_split_across_chunks(#[values(1, 2)] chunk_size: usize) {
    let input = "\u{FEFF}\u{E9}t\u{E9},x\n\u{1F600},y\n";
    let chunks = fixed_chunks(input.as_bytes(), chunk_size);
    let (headers, import) = import(&chunks, Import::default()).unwrap();
    assert_eq!(headers, ["\u{E9}t\u{E9}", "x"]);
    assert_eq!(
        import.rows,
        [vec![
            ("\u{E9}t\u{E9}".to_owned(), "\u{1F600}".to_owned()),
            ("x".to_owned(), "y".to_owned()),
        ]]
    );
}

#[test]
fn headers_only_stream() {
    let (headers, import) = import(&[b"a,b"], Import::default()).unwrap();
    assert_eq!(headers, ["a", "b"]);
    assert!(import.rows.is_empty());
}

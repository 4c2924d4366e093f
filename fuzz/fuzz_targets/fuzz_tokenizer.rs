#![no_main]
use std::cell::RefCell;

use arbitrary::{Arbitrary, Unstructured};
use csvmodem::{
    DataStreamError, RecordBuffer, Tokenizer, ValidatingVisitor,
    chunk_utils::split_at_cuts,
    headered::{DataField, HeaderOptions, HeaderedVisitor, Utf8HeaderedVisitor, Utf8Policy},
};
use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};

const HEADER: usize = 5; // 1 flag byte + 4-byte split seed

const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];
const LINE_ENDINGS: [&[u8]; 4] = [b"\n", b"\r\n", b"\r", b""];

thread_local! {
    static RNG: RefCell<SmallRng> = RefCell::new(SmallRng::from_os_rng());
}

fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut SmallRng) -> R,
{
    RNG.with(|cell| f(&mut cell.borrow_mut()))
}

/// A field shape, rendered with `,` as the delimiter.
#[derive(Arbitrary, Debug)]
enum ArbitraryField {
    Empty,
    Plain(String),
    Quoted(String),
    /// A quoted part followed by more data.
    Nonstandard(String, String),
}

#[derive(Arbitrary, Debug)]
struct ArbitraryRecord(Vec<ArbitraryField>);

impl ArbitraryRecord {
    fn render(&self, out: &mut Vec<u8>, line_ending: &[u8]) {
        for (i, field) in self.0.iter().enumerate() {
            if i > 0 {
                out.push(b',');
            }
            match field {
                ArbitraryField::Empty => {}
                ArbitraryField::Plain(s) => out.extend_from_slice(s.as_bytes()),
                ArbitraryField::Quoted(s) => quote(out, s),
                ArbitraryField::Nonstandard(q, rest) => {
                    quote(out, q);
                    out.extend_from_slice(rest.as_bytes());
                }
            }
        }
        out.extend_from_slice(line_ending);
    }
}

fn quote(out: &mut Vec<u8>, s: &str) {
    out.push(b'"');
    out.extend_from_slice(s.replace('"', "\"\"").as_bytes());
    out.push(b'"');
}

fn mutator(data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
    if max_size <= HEADER || (size >= HEADER && seed % 10 != 0) {
        return fuzzer_mutate(data, size, max_size);
    }

    data[0] = with_rng(|rng| rng.next_u32() as u8);
    data[1..HEADER].copy_from_slice(&with_rng(|rng| rng.next_u32().to_le_bytes()));

    let target = size.clamp(HEADER + 1, max_size);
    let mut len = HEADER;
    while len < target {
        let written = append_record(&mut data[len..max_size], size);
        if written == 0 {
            break;
        }
        len += written;
    }
    len
}

/// Appends one rendered record, truncated to fit `buf`. Returns the number
/// of bytes written.
fn append_record(buf: &mut [u8], size: usize) -> usize {
    let record = loop {
        let n = with_rng(|rng| rng.random_range(0..=size.max(8) * 2));
        let bytes: Vec<u8> = with_rng(|rng| (0..n).map(|_| rng.random::<u8>()).collect());
        if let Ok(record) = ArbitraryRecord::arbitrary(&mut Unstructured::new(&bytes)) {
            break record;
        }
    };
    let line_ending = with_rng(|rng| LINE_ENDINGS[rng.random_range(0..LINE_ENDINGS.len())]);

    let mut rendered = Vec::new();
    record.render(&mut rendered, line_ending);
    let len = rendered.len().min(buf.len());
    buf[..len].copy_from_slice(&rendered[..len]);
    len
}

fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    mutator(data, size, max_size, seed)
});

/// Accepts every data record shape and keeps only the headers.
#[derive(Debug, Default)]
struct Headers(Vec<String>);

impl HeaderedVisitor for Headers {
    type Error = DataStreamError;

    fn headers_complete(&mut self, headers: &[String]) -> Result<(), Self::Error> {
        self.0 = headers.to_vec();
        Ok(())
    }

    fn partial_data_field(&mut self, _: DataField<'_>, _: &[u8]) -> Result<(), Self::Error> {
        Ok(())
    }

    fn end_of_data_field(&mut self, _: DataField<'_>, _: &[u8]) -> Result<(), Self::Error> {
        Ok(())
    }

    fn end_of_data_record(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn missing_data_fields(&mut self, _: &[String], _: usize) -> Result<(), Self::Error> {
        Ok(())
    }

    fn unexpected_data_field(&mut self, _: &[String], _: usize) -> Result<(), Self::Error> {
        Ok(())
    }
}

fn buffer(delimiter: u8, chunks: &[&[u8]]) -> RecordBuffer {
    let mut tokenizer = Tokenizer::new(delimiter).expect("delimiter is valid");
    let mut visitor = ValidatingVisitor::new(RecordBuffer::new());
    for chunk in chunks {
        let Ok(()) = tokenizer.feed(chunk, &mut visitor);
    }
    let Ok(()) = tokenizer.end_of_stream(&mut visitor);
    visitor.assert_complete();
    visitor.into_inner()
}

fn headers(delimiter: u8, chunks: &[&[u8]]) -> Result<Vec<String>, DataStreamError> {
    let options = HeaderOptions {
        max_header_len: usize::MAX,
        max_header_count: usize::MAX,
        invalid_utf8: Utf8Policy::Replace,
        ..HeaderOptions::default()
    };
    let mut tokenizer = Tokenizer::new(delimiter).expect("delimiter is valid");
    let mut visitor = Utf8HeaderedVisitor::new(Headers::default(), options);
    for chunk in chunks {
        tokenizer.feed(chunk, &mut visitor)?;
    }
    tokenizer.end_of_stream(&mut visitor)?;
    Ok(visitor.into_inner().0)
}

fn tokenizer(data: &[u8]) {
    if data.len() < HEADER {
        return;
    }

    let flags = data[0];
    let split_seed = u32::from_le_bytes(data[1..HEADER].try_into().unwrap());
    let data = &data[HEADER..];
    let delimiter = DELIMITERS[usize::from(flags & 3)];

    let mut rng = SmallRng::seed_from_u64(u64::from(split_seed));
    let cuts: Vec<usize> = (0..data.len() / 4 + 1)
        .map(|_| rng.random_range(0..64))
        .collect();
    let chunks = split_at_cuts(data, &cuts);

    let whole = buffer(delimiter, &[data]);
    let split = buffer(delimiter, &chunks);
    assert_eq!(whole.records(), split.records());

    // Skipping tracks the same record boundaries as feeding.
    let mut fed = Tokenizer::new(delimiter).expect("delimiter is valid");
    let mut skipped = fed.clone();
    let mut sink = RecordBuffer::new();
    for chunk in &chunks {
        let Ok(()) = fed.feed(chunk, &mut sink);
        skipped.skip(chunk);
        assert_eq!(fed.is_at_record_boundary(), skipped.is_at_record_boundary());
    }

    if flags & 4 != 0 {
        assert_eq!(headers(delimiter, &[data]), headers(delimiter, &chunks));
    }
}

fuzz_target!(|data: &[u8]| tokenizer(data));

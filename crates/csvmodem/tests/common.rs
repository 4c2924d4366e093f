#![allow(missing_docs)]
#![allow(dead_code)]

/// A small export with the awkward cases in one place: quoted delimiters and
/// escapes, an empty trailing field, a quoted line break, a blank line, a
/// quoted field that continues after its closing quote, and a final record
/// without a line ending.
pub const ORIGINAL: &str = "id,name,notes\r\n\
1,\"Smith, Jane\",\"said \"\"hi\"\"\"\r\n\
2,Bob,\r\n\
3,\"multi\nline\",plain\r\n\
\r\n\
4,\"odd\"tail,x\n\
5,,\"\"";

/// `ORIGINAL`, split the way a network read might deliver it. The cuts sit on
/// the seams where the tokenizer has to carry state between chunks.
#[rustfmt::skip]
pub const STREAM: [&str; 12] = [
    "id,na",                   // cut inside an unquoted field
    "me,notes\r",              // ends on CR, LF follows
    "\n1,\"Smith",             // cut inside a quoted field
    ", Jane\"",                // ends on a quote that closes the field
    ",\"said \"",              // ends on a quote that starts an escape
    "\"hi\"\"",                // escape completed across the cut
    "\"\r\n2,Bob,",            // closing quote, then a trailing empty field
    "\r\n3,\"multi\n",         // line break inside quotes
    "line\",plain\r\n\r",      // blank line cut between CR and LF
    "\n4,\"odd\"",             // ends on a quote that turns out nonstandard
    "tail,x\n5,,",             // data after the closing quote
    "\"\"",                    // empty quoted field at end of stream
];

/// The records of `ORIGINAL`.
pub const RECORDS: [[&str; 3]; 6] = [
    ["id", "name", "notes"],
    ["1", "Smith, Jane", "said \"hi\""],
    ["2", "Bob", ""],
    ["3", "multi\nline", "plain"],
    ["4", "oddtail", "x"],
    ["5", "", ""],
];

pub fn stream_chunks() -> Vec<&'static [u8]> {
    STREAM.iter().map(|s| s.as_bytes()).collect()
}

#[test]
fn assert_stream_example() {
    assert_eq!(STREAM.join(""), ORIGINAL);
}

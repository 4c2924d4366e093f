use thiserror::Error;

/// The delimiter passed to [`Tokenizer::new`](crate::Tokenizer::new) is one of
/// the bytes the tokenizer reserves for structure: `\r`, `\n` or `"`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid delimiter {0:#04x}: \\r, \\n and '\"' cannot separate fields")]
pub struct InvalidDelimiter(pub u8);

/// A problem with the contents of a stream, raised by the header-aware layer.
///
/// The raw tokenizer accepts every byte sequence, so these only arise from
/// limits and record-shape rules a consumer configures. Each variant is fatal
/// for the stream it was raised on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataStreamError {
    /// The header record has more fields than allowed.
    #[error("header record has more than {max} fields")]
    TooManyHeaders {
        /// Configured maximum number of headers.
        max: usize,
    },
    /// A header decodes to more characters than allowed.
    #[error("header {index} is longer than {max} characters")]
    HeaderTooLong {
        /// Zero-based position of the header.
        index: usize,
        /// Configured maximum header length, in characters.
        max: usize,
    },
    /// A data field is longer than allowed.
    #[error("data field {index} is longer than {max} bytes")]
    DataFieldTooLong {
        /// Zero-based position of the field in its record.
        index: usize,
        /// Configured maximum field length, in bytes.
        max: usize,
    },
    /// A header is not valid UTF-8 and the policy is to reject it.
    #[error("header {index} is not valid UTF-8")]
    InvalidHeaderUtf8 {
        /// Zero-based position of the header.
        index: usize,
    },
    /// A data record ended before every header got a field.
    #[error("record has {actual} fields but the header declares {expected}")]
    MissingDataFields {
        /// Number of headers.
        expected: usize,
        /// Number of fields the record had.
        actual: usize,
    },
    /// A data record has a field beyond the last header.
    #[error("unexpected data field {index}, the header declares {expected}")]
    UnexpectedDataField {
        /// Number of headers.
        expected: usize,
        /// Zero-based position of the extra field.
        index: usize,
    },
}

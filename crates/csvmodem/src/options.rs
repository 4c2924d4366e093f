/// Configuration options for the CSV tokenizer.
///
/// # Examples
///
/// ```rust
/// use csvmodem::{Tokenizer, TokenizerOptions};
///
/// let tokenizer = Tokenizer::with_options(TokenizerOptions {
///     delimiter: b'\t',
/// })
/// .unwrap();
/// assert_eq!(tokenizer.delimiter(), b'\t');
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerOptions {
    /// The single byte that separates fields within a record.
    ///
    /// Any byte is accepted except `\r`, `\n` and `"`, which the tokenizer
    /// reserves for line endings and quoting. Multi-byte delimiters are not
    /// supported.
    ///
    /// # Default
    ///
    /// `b','`
    pub delimiter: u8,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

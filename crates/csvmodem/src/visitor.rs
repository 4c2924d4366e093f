//! The callback contract between the tokenizer and its consumers.

use core::{convert::Infallible, error::Error};

/// Receives the structure of a CSV stream as the [`Tokenizer`] discovers it.
///
/// For every field the tokenizer makes zero or more [`partial_field`] calls
/// followed by exactly one [`end_of_field`] call. Concatenating the data of
/// those calls, in order, gives the field's contents with quote escapes
/// already resolved. [`end_of_record`] is only ever called directly after
/// [`end_of_field`].
///
/// Slices passed to the visitor borrow from the chunk currently being fed and
/// must be copied if they are needed after the call returns.
///
/// Returning an error stops the current [`Tokenizer::feed`] call and
/// propagates the error to its caller. The tokenizer should not be used
/// afterwards.
///
/// [`Tokenizer`]: crate::Tokenizer
/// [`Tokenizer::feed`]: crate::Tokenizer::feed
/// [`partial_field`]: Visitor::partial_field
/// [`end_of_field`]: Visitor::end_of_field
/// [`end_of_record`]: Visitor::end_of_record
pub trait Visitor {
    /// Error a visitor may stop the tokenizer with. Use [`Infallible`] when
    /// the visitor cannot fail.
    type Error: Error;

    /// Part of the current field's contents. More data for the same field
    /// follows.
    fn partial_field(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// The final part of the current field's contents, possibly empty.
    fn end_of_field(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// The record containing the field that just ended is complete.
    fn end_of_record(&mut self) -> Result<(), Self::Error>;

    /// The current field opened with a quote but has data after its closing
    /// quote, for example `"ab"cd`.
    ///
    /// Called at most once per field, directly after a [`partial_field`]
    /// call. The field's data is still delivered in full; this is only a
    /// notice.
    ///
    /// [`partial_field`]: Visitor::partial_field
    fn nonstandard_quoted_field(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// A visitor that ignores every call.
///
/// Feeding a tokenizer with it advances the tokenizer's state exactly as any
/// other visitor would.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NullVisitor;

impl Visitor for NullVisitor {
    type Error = Infallible;

    fn partial_field(&mut self, _data: &[u8]) -> Result<(), Self::Error> {
        Ok(())
    }

    fn end_of_field(&mut self, _data: &[u8]) -> Result<(), Self::Error> {
        Ok(())
    }

    fn end_of_record(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<V: Visitor + ?Sized> Visitor for &mut V {
    type Error = V::Error;

    #[inline]
    fn partial_field(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        (**self).partial_field(data)
    }

    #[inline]
    fn end_of_field(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        (**self).end_of_field(data)
    }

    #[inline]
    fn end_of_record(&mut self) -> Result<(), Self::Error> {
        (**self).end_of_record()
    }

    #[inline]
    fn nonstandard_quoted_field(&mut self) -> Result<(), Self::Error> {
        (**self).nonstandard_quoted_field()
    }
}

/// `None` behaves as [`NullVisitor`].
impl<V: Visitor> Visitor for Option<V> {
    type Error = V::Error;

    #[inline]
    fn partial_field(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        match self {
            Some(v) => v.partial_field(data),
            None => Ok(()),
        }
    }

    #[inline]
    fn end_of_field(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        match self {
            Some(v) => v.end_of_field(data),
            None => Ok(()),
        }
    }

    #[inline]
    fn end_of_record(&mut self) -> Result<(), Self::Error> {
        match self {
            Some(v) => v.end_of_record(),
            None => Ok(()),
        }
    }

    #[inline]
    fn nonstandard_quoted_field(&mut self) -> Result<(), Self::Error> {
        match self {
            Some(v) => v.nonstandard_quoted_field(),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastCall {
    None,
    PartialField,
    EndOfField,
    EndOfRecord,
    NonstandardQuotedField,
}

/// Wraps a visitor and panics when the calls it receives break the
/// [`Visitor`] sequencing rules.
///
/// Meant for tests and fuzzing; it adds a branch to every call.
///
/// # Panics
///
/// Every method panics on an out-of-order call:
/// - `end_of_record` not directly after `end_of_field`,
/// - `nonstandard_quoted_field` not directly after `partial_field`, or
///   reported twice for one field.
#[derive(Debug)]
pub struct ValidatingVisitor<V> {
    inner: V,
    last: LastCall,
    nonstandard_reported: bool,
}

impl<V: Visitor> ValidatingVisitor<V> {
    /// Wraps `inner`.
    pub fn new(inner: V) -> Self {
        Self {
            inner,
            last: LastCall::None,
            nonstandard_reported: false,
        }
    }

    /// The wrapped visitor.
    pub fn inner(&self) -> &V {
        &self.inner
    }

    /// Unwraps the visitor.
    pub fn into_inner(self) -> V {
        self.inner
    }

    /// Asserts that no field is left open, as is the case after
    /// [`Tokenizer::end_of_stream`](crate::Tokenizer::end_of_stream).
    ///
    /// # Panics
    ///
    /// Panics if the last call left a field unfinished.
    pub fn assert_complete(&self) {
        assert!(
            matches!(self.last, LastCall::None | LastCall::EndOfRecord),
            "stream ended after {:?} without completing its record",
            self.last
        );
    }
}

impl<V: Visitor> Visitor for ValidatingVisitor<V> {
    type Error = V::Error;

    fn partial_field(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.last = LastCall::PartialField;
        self.inner.partial_field(data)
    }

    fn end_of_field(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.last = LastCall::EndOfField;
        self.nonstandard_reported = false;
        self.inner.end_of_field(data)
    }

    fn end_of_record(&mut self) -> Result<(), Self::Error> {
        assert_eq!(
            self.last,
            LastCall::EndOfField,
            "end_of_record must directly follow end_of_field"
        );
        self.last = LastCall::EndOfRecord;
        self.inner.end_of_record()
    }

    fn nonstandard_quoted_field(&mut self) -> Result<(), Self::Error> {
        assert_eq!(
            self.last,
            LastCall::PartialField,
            "nonstandard_quoted_field must directly follow partial_field"
        );
        assert!(
            !self.nonstandard_reported,
            "nonstandard_quoted_field reported twice for one field"
        );
        self.last = LastCall::NonstandardQuotedField;
        self.nonstandard_reported = true;
        self.inner.nonstandard_quoted_field()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_none_swallows_calls() {
        let mut v: Option<NullVisitor> = None;
        assert_eq!(v.partial_field(b"a"), Ok(()));
        assert_eq!(v.end_of_field(b"b"), Ok(()));
        assert_eq!(v.end_of_record(), Ok(()));
    }

    #[cfg(feature = "buffered")]
    #[test]
    fn option_some_forwards_calls() {
        use alloc::vec::Vec;

        use crate::Event;

        let mut v = Some(Vec::<Event>::new());
        let Ok(()) = v.partial_field(b"a");
        let Ok(()) = v.nonstandard_quoted_field();
        let Ok(()) = v.end_of_field(b"b");
        let Ok(()) = v.end_of_record();
        assert_eq!(
            v.unwrap(),
            [
                Event::PartialField("a".into()),
                Event::NonstandardQuotedField,
                Event::EndOfField("b".into()),
                Event::EndOfRecord,
            ]
        );
    }

    #[test]
    fn validating_accepts_well_formed_sequence() {
        let mut v = ValidatingVisitor::new(NullVisitor);
        v.partial_field(b"\"ab").unwrap();
        v.nonstandard_quoted_field().unwrap();
        v.partial_field(b"cd").unwrap();
        v.end_of_field(b"").unwrap();
        v.end_of_field(b"x").unwrap();
        v.end_of_record().unwrap();
        v.assert_complete();
    }

    #[test]
    #[should_panic(expected = "end_of_record must directly follow end_of_field")]
    fn validating_rejects_cold_end_of_record() {
        let mut v = ValidatingVisitor::new(NullVisitor);
        v.partial_field(b"a").unwrap();
        let _ = v.end_of_record();
    }

    #[test]
    #[should_panic(expected = "nonstandard_quoted_field must directly follow partial_field")]
    fn validating_rejects_notice_after_end_of_field() {
        let mut v = ValidatingVisitor::new(NullVisitor);
        v.end_of_field(b"a").unwrap();
        let _ = v.nonstandard_quoted_field();
    }

    #[test]
    #[should_panic(expected = "reported twice")]
    fn validating_rejects_repeated_notice() {
        let mut v = ValidatingVisitor::new(NullVisitor);
        v.partial_field(b"a").unwrap();
        v.nonstandard_quoted_field().unwrap();
        v.partial_field(b"b").unwrap();
        let _ = v.nonstandard_quoted_field();
    }

    #[test]
    #[should_panic(expected = "without completing its record")]
    fn validating_rejects_open_field_at_end() {
        let mut v = ValidatingVisitor::new(NullVisitor);
        v.partial_field(b"a").unwrap();
        v.assert_complete();
    }
}

use nom::error::ErrorKind as NomErrorKind;

use super::qname::LabelError;
use super::record::RecordError;

pub type Input<'a> = &'a [u8];
pub type ParseResult<'a, T> = nom::IResult<Input<'a>, T, ParseError<Input<'a>>>;

#[derive(Debug)]
pub enum ParseError<I> {
    Nom((I, NomErrorKind)),
    Label((I, LabelError)),
    Record((I, RecordError)),
}

impl<I> nom::error::ParseError<I> for ParseError<I> {
    fn from_error_kind(input: I, kind: NomErrorKind) -> Self {
        Self::Nom((input, kind))
    }

    fn append(_input: I, _kind: NomErrorKind, other: Self) -> Self {
        other
    }
}

impl<I> From<(I, LabelError)> for ParseError<I> {
    fn from(value: (I, LabelError)) -> Self {
        Self::Label(value)
    }
}

impl<I> From<(I, RecordError)> for ParseError<I> {
    fn from(value: (I, RecordError)) -> Self {
        Self::Record(value)
    }
}

/// Abort parsing with a layer error attached to the current input.
pub fn fail<'a, T, E>(i: Input<'a>, e: E) -> ParseResult<'a, T>
where
    ParseError<Input<'a>>: From<(Input<'a>, E)>,
{
    Err(nom::Err::Failure((i, e).into()))
}

/// Offset of `rest` inside `buf`, given `rest` is a suffix of `buf`.
pub fn offset_of(buf: Input, rest: Input) -> usize {
    buf.len() - rest.len()
}

use nom::error::{ErrorKind, ParseError};
use thiserror::Error;

/// Everything that can go wrong while reading or writing a DNS message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("message shorter than the 12 octet header")]
    TruncatedHeader,

    #[error("domain name runs past the end of the message")]
    TruncatedName,

    #[error("compressed domain names are not supported")]
    UnsupportedCompression,

    #[error("invalid label length octet {0:#04x}")]
    InvalidLabelLength(u8),

    #[error("empty label inside a domain name")]
    EmptyLabel,

    #[error("invalid escape sequence in domain name")]
    InvalidEscape,

    #[error("question runs past the end of the message")]
    TruncatedQuestion,

    #[error("message contains no question")]
    NoQuestion,

    #[error("label of {0} octets exceeds the 63 octet limit")]
    LabelTooLong(usize),

    #[error("domain name exceeds the 255 octet limit")]
    NameTooLong,

    #[error("resource record runs past the end of the message")]
    TruncatedRecord,

    #[error("record data of {0} octets does not fit RDLENGTH")]
    RdataTooLong(usize),

    #[error("{0} records do not fit a 16 bit section count")]
    TooManyRecords(usize),

    #[error("response of {len} octets exceeds the {max} octet datagram limit")]
    ResponseTooLarge { len: usize, max: usize },

    #[error("malformed message ({0:?})")]
    Malformed(ErrorKind),
}

impl<I> ParseError<I> for WireError {
    fn from_error_kind(_input: I, kind: ErrorKind) -> Self {
        WireError::Malformed(kind)
    }

    fn append(_input: I, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

pub type IResult<'a, T> = nom::IResult<&'a [u8], T, WireError>;

/// Collapses a nom error into the plain error it carries.
pub(crate) fn finish(err: nom::Err<WireError>) -> WireError {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => e,
        nom::Err::Incomplete(_) => WireError::Malformed(ErrorKind::Eof),
    }
}

/// Replaces a generic nom failure with `err`, keeping specific ones.
///
/// The complete-input parsers in nom report a short buffer as
/// `Malformed(Eof)`; this lets each codec name the section that was cut off.
pub(crate) fn or_truncated<'a, O, F>(err: WireError, parser: F) -> impl Fn(&'a [u8]) -> IResult<'a, O>
where
    F: Fn(&'a [u8]) -> IResult<'a, O>,
{
    move |input| {
        parser(input).map_err(|e| match e {
            nom::Err::Error(WireError::Malformed(_)) => nom::Err::Error(err.clone()),
            other => other,
        })
    }
}

/// Runs `parser` at `offset` into `buf`, returning the value and the
/// number of octets it consumed.
pub(crate) fn decode_at<'a, O, F>(buf: &'a [u8], offset: usize, parser: F) -> Result<(O, usize), WireError>
where
    F: Fn(&'a [u8]) -> IResult<'a, O>,
{
    let input = buf.get(offset..).ok_or(WireError::Malformed(ErrorKind::Eof))?;
    let (rest, value) = parser(input).map_err(finish)?;
    Ok((value, input.len() - rest.len()))
}

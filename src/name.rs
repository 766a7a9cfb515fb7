//! Domain names in uncompressed wire format.
//!
//! A name travels as a sequence of labels, each prefixed by its length
//! octet, closed by the zero-length root label. Labels are opaque octets;
//! nothing here assumes they are text.

use std::fmt;
use std::str::FromStr;

use nom::bytes::complete::take;
use nom::number::complete::be_u8;

use crate::error::{decode_at, or_truncated, IResult, WireError};

/// Longest permitted label content, in octets.
pub const MAX_LABEL_LEN: usize = 63;

/// Longest permitted encoded name, length octets and root label included.
pub const MAX_NAME_LEN: usize = 255;

/// Length octets with both top bits set introduce a compression pointer.
const POINTER_MASK: u8 = 0xC0;

#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Name {
    labels: Vec<Vec<u8>>,
}

impl Name {
    pub fn root() -> Self {
        Name { labels: vec![] }
    }

    /// Builds a name from raw labels without checking any limits.
    ///
    /// Limits are enforced when the name is encoded, so an oversized name
    /// can be constructed but never put on the wire.
    pub fn from_labels<I, L>(labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Vec<u8>>,
    {
        Name { labels: labels.into_iter().map(Into::into).collect() }
    }

    pub fn labels(&self) -> impl Iterator<Item = &[u8]> {
        self.labels.iter().map(Vec::as_slice)
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    /// Compares names the way DNS does, folding ASCII case only.
    pub fn eq_ignore_ascii_case(&self, other: &Name) -> bool {
        self.labels.len() == other.labels.len()
            && self.labels.iter().zip(&other.labels).all(|(a, b)| a.eq_ignore_ascii_case(b))
    }

    /// Octets this name occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        self.labels.iter().map(|label| label.len() + 1).sum::<usize>() + 1
    }

    /// Reads a name starting at `offset` in `buf`.
    ///
    /// Returns the name together with the number of octets consumed,
    /// including the terminating root label.
    pub fn decode(buf: &[u8], offset: usize) -> Result<(Name, usize), WireError> {
        decode_at(buf, offset, parse_name)
    }

    /// Appends the wire form of this name to `buf`.
    ///
    /// Nothing is written if the name breaks a length limit.
    pub fn compose(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        self.check()?;
        for label in &self.labels {
            buf.push(label.len() as u8);
            buf.extend_from_slice(label);
        }
        buf.push(0);
        Ok(())
    }

    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.compose(&mut buf)?;
        Ok(buf)
    }

    fn check(&self) -> Result<(), WireError> {
        for label in &self.labels {
            if label.is_empty() {
                return Err(WireError::EmptyLabel);
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(WireError::LabelTooLong(label.len()));
            }
        }
        if self.encoded_len() > MAX_NAME_LEN {
            return Err(WireError::NameTooLong);
        }
        Ok(())
    }
}

pub enum LabelPart<'a> {
    Root,
    Regular(&'a [u8]),
}

pub fn parse_label_part(input: &[u8]) -> IResult<LabelPart<'_>> {
    let (input, count) = or_truncated(WireError::TruncatedName, be_u8)(input)?;
    match count {
        0 => Ok((input, LabelPart::Root)),
        c if c & POINTER_MASK == POINTER_MASK => {
            Err(nom::Err::Failure(WireError::UnsupportedCompression))
        }
        c if usize::from(c) > MAX_LABEL_LEN => {
            Err(nom::Err::Failure(WireError::InvalidLabelLength(c)))
        }
        c => {
            let (input, label) = or_truncated(WireError::TruncatedName, take(c))(input)?;
            Ok((input, LabelPart::Regular(label)))
        }
    }
}

pub fn parse_name(input: &[u8]) -> IResult<Name> {
    let mut labels = vec![];
    let mut encoded_len = 1;
    let mut input = input;
    loop {
        let (rest, part) = parse_label_part(input)?;
        input = rest;
        match part {
            LabelPart::Root => return Ok((input, Name { labels })),
            LabelPart::Regular(label) => {
                encoded_len += label.len() + 1;
                if encoded_len > MAX_NAME_LEN {
                    return Err(nom::Err::Failure(WireError::NameTooLong));
                }
                labels.push(label.to_vec());
            }
        }
    }
}

impl FromStr for Name {
    type Err = WireError;

    /// Parses the dotted presentation form, e.g. `www.example.com.`.
    ///
    /// The trailing dot is optional. `\.`, `\\` and `\DDD` escapes are
    /// understood so that any label printed by `Display` parses back.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s == "." {
            return Ok(Name::root());
        }
        let mut labels = vec![];
        let mut label = vec![];
        let mut chars = s.bytes();
        while let Some(b) = chars.next() {
            match b {
                b'.' => {
                    if label.is_empty() {
                        return Err(WireError::EmptyLabel);
                    }
                    labels.push(std::mem::take(&mut label));
                }
                b'\\' => label.push(parse_escape(&mut chars)?),
                _ => label.push(b),
            }
        }
        if !label.is_empty() {
            labels.push(label);
        }
        let name = Name { labels };
        name.check()?;
        Ok(name)
    }
}

fn parse_escape(chars: &mut impl Iterator<Item = u8>) -> Result<u8, WireError> {
    let first = chars.next().ok_or(WireError::InvalidEscape)?;
    if !first.is_ascii_digit() {
        return Ok(first);
    }
    let mut value = u32::from(first - b'0');
    for _ in 0..2 {
        match chars.next() {
            Some(d) if d.is_ascii_digit() => value = value * 10 + u32::from(d - b'0'),
            _ => return Err(WireError::InvalidEscape),
        }
    }
    if value > 255 {
        return Err(WireError::InvalidEscape);
    }
    Ok(value as u8)
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            for &b in label {
                match b {
                    b'.' | b'\\' => write!(f, "\\{}", b as char)?,
                    0x21..=0x7e => write!(f, "{}", b as char)?,
                    _ => write!(f, "\\{:03}", b)?,
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self)
    }
}

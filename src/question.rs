use nom::number::complete::be_u16;
use nom::sequence::pair;

use crate::error::{decode_at, or_truncated, IResult, WireError};
use crate::name::{parse_name, Name};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Question {
    pub qname: Name,
    pub qtype: u16,
    pub qclass: u16,
}

impl Question {
    pub fn new(qname: Name, qtype: u16, qclass: u16) -> Self {
        Question { qname, qtype, qclass }
    }

    /// Reads a question starting at `offset`, returning it with the number
    /// of octets consumed.
    pub fn decode(buf: &[u8], offset: usize) -> Result<(Question, usize), WireError> {
        decode_at(buf, offset, parse_question)
    }

    pub fn encoded_len(&self) -> usize {
        self.qname.encoded_len() + 4
    }

    pub fn compose(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        self.qname.compose(buf)?;
        buf.extend_from_slice(&self.qtype.to_be_bytes());
        buf.extend_from_slice(&self.qclass.to_be_bytes());
        Ok(())
    }

    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.compose(&mut buf)?;
        Ok(buf)
    }
}

pub fn parse_question(input: &[u8]) -> IResult<Question> {
    let (input, qname) = parse_name(input)?;
    let (input, (qtype, qclass)) =
        or_truncated(WireError::TruncatedQuestion, pair(be_u16, be_u16))(input)?;
    Ok((input, Question { qname, qtype, qclass }))
}

//! The fixed twelve octet header that starts every DNS message.
//!
//! ```text
//!                                 1  1  1  1  1  1
//!   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |                      ID                       |
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |QR|   Opcode  |AA|TC|RD|RA|Z |AD|CD|   RCODE   |
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |          QDCOUNT / ANCOUNT / NSCOUNT / ARCOUNT |
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! ```

use nom::number::complete::be_u16;
use nom::sequence::tuple;

use crate::error::{decode_at, or_truncated, IResult, WireError};

pub const HEADER_LEN: usize = 12;

pub const FLAG_QR: u16 = 1 << 15;
pub const OPCODE_MASK: u16 = 0x7800; // bits 11-14
pub const OPCODE_SHIFT: u16 = 11;
pub const FLAG_AA: u16 = 1 << 10;
pub const FLAG_TC: u16 = 1 << 9;
pub const FLAG_RD: u16 = 1 << 8;
pub const FLAG_RA: u16 = 1 << 7;
pub const FLAG_Z: u16 = 1 << 6;
pub const FLAG_AD: u16 = 1 << 5;
pub const FLAG_CD: u16 = 1 << 4;
pub const RCODE_MASK: u16 = 0x000F;

/// The kind of query, a four bit field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    Query,
    IQuery,
    Status,
    Notify,
    Update,
    Other(u8),
}

impl Opcode {
    pub fn from_u8(value: u8) -> Self {
        match value & 0x0F {
            0 => Opcode::Query,
            1 => Opcode::IQuery,
            2 => Opcode::Status,
            4 => Opcode::Notify,
            5 => Opcode::Update,
            other => Opcode::Other(other),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Opcode::Query => 0,
            Opcode::IQuery => 1,
            Opcode::Status => 2,
            Opcode::Notify => 4,
            Opcode::Update => 5,
            Opcode::Other(value) => value & 0x0F,
        }
    }
}

impl Default for Opcode {
    fn default() -> Self {
        Opcode::Query
    }
}

/// The response status, a four bit field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rcode {
    NoError,
    FormErr,
    ServFail,
    NXDomain,
    NotImp,
    Refused,
    Other(u8),
}

impl Rcode {
    pub fn from_u8(value: u8) -> Self {
        match value & 0x0F {
            0 => Rcode::NoError,
            1 => Rcode::FormErr,
            2 => Rcode::ServFail,
            3 => Rcode::NXDomain,
            4 => Rcode::NotImp,
            5 => Rcode::Refused,
            other => Rcode::Other(other),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Rcode::NoError => 0,
            Rcode::FormErr => 1,
            Rcode::ServFail => 2,
            Rcode::NXDomain => 3,
            Rcode::NotImp => 4,
            Rcode::Refused => 5,
            Rcode::Other(value) => value & 0x0F,
        }
    }
}

impl Default for Rcode {
    fn default() -> Self {
        Rcode::NoError
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Header {
    pub id: u16,

    pub response: bool,
    pub opcode: Opcode,
    pub authoritative_answer: bool,
    pub truncated_message: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub z: bool, // reserved, zero in anything we send
    pub authed_data: bool,
    pub checking_disabled: bool,
    pub rcode: Rcode,

    pub questions: u16,
    pub answers: u16,
    pub authorities: u16,
    pub additionals: u16,
}

impl Header {
    /// Packs the flag fields into the second sixteen bit word.
    pub fn pack_flags(&self) -> u16 {
        let mut flags = u16::from(self.opcode.to_u8()) << OPCODE_SHIFT & OPCODE_MASK;
        flags |= u16::from(self.rcode.to_u8()) & RCODE_MASK;
        for &(set, bit) in &[
            (self.response, FLAG_QR),
            (self.authoritative_answer, FLAG_AA),
            (self.truncated_message, FLAG_TC),
            (self.recursion_desired, FLAG_RD),
            (self.recursion_available, FLAG_RA),
            (self.z, FLAG_Z),
            (self.authed_data, FLAG_AD),
            (self.checking_disabled, FLAG_CD),
        ] {
            if set {
                flags |= bit;
            }
        }
        flags
    }

    /// Sets every flag field from the second sixteen bit word.
    pub fn unpack_flags(&mut self, flags: u16) {
        self.response = flags & FLAG_QR != 0;
        self.opcode = Opcode::from_u8(((flags & OPCODE_MASK) >> OPCODE_SHIFT) as u8);
        self.authoritative_answer = flags & FLAG_AA != 0;
        self.truncated_message = flags & FLAG_TC != 0;
        self.recursion_desired = flags & FLAG_RD != 0;
        self.recursion_available = flags & FLAG_RA != 0;
        self.z = flags & FLAG_Z != 0;
        self.authed_data = flags & FLAG_AD != 0;
        self.checking_disabled = flags & FLAG_CD != 0;
        self.rcode = Rcode::from_u8((flags & RCODE_MASK) as u8);
    }

    pub fn decode(buf: &[u8]) -> Result<Header, WireError> {
        decode_at(buf, 0, parse_dns_header).map(|(header, _)| header)
    }

    pub fn compose(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.to_bytes());
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        let words = [
            self.id,
            self.pack_flags(),
            self.questions,
            self.answers,
            self.authorities,
            self.additionals,
        ];
        for (chunk, word) in out.chunks_exact_mut(2).zip(words.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        out
    }
}

pub fn parse_dns_header(input: &[u8]) -> IResult<Header> {
    let (input, (id, flags, questions, answers, authorities, additionals)) = or_truncated(
        WireError::TruncatedHeader,
        tuple((be_u16, be_u16, be_u16, be_u16, be_u16, be_u16)),
    )(input)?;
    let mut header = Header {
        id,
        questions,
        answers,
        authorities,
        additionals,
        ..Header::default()
    };
    header.unpack_flags(flags);
    Ok((input, header))
}

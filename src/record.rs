//! Resource records for the answer, authority and additional sections.

use std::convert::TryFrom;
use std::net::{Ipv4Addr, Ipv6Addr};

use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u32};
use nom::sequence::tuple;

use crate::error::{decode_at, or_truncated, IResult, WireError};
use crate::name::{parse_name, Name};

/// Record type codes.
pub mod rtype {
    pub const A: u16 = 1;
    pub const NS: u16 = 2;
    pub const CNAME: u16 = 5;
    pub const SOA: u16 = 6;
    pub const PTR: u16 = 12;
    pub const MX: u16 = 15;
    pub const TXT: u16 = 16;
    pub const AAAA: u16 = 28;
}

/// Record class codes.
pub mod class {
    pub const IN: u16 = 1;
}

/// Fixed fields between the owner name and the record data.
const RECORD_FIXED_LEN: usize = 10;

/// Converts a signed number of seconds into a wire TTL.
///
/// Negative values become 0, values past `u32::MAX` saturate.
pub fn ttl_from_secs(secs: i64) -> u32 {
    u32::try_from(secs.max(0)).unwrap_or(u32::MAX)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: Name,
    pub rtype: u16,
    pub class: u16,
    pub ttl: u32,
    pub rdata: Vec<u8>,
}

impl ResourceRecord {
    /// Creates a record with opaque record data.
    pub fn new(name: Name, rtype: u16, class: u16, ttl: u32, rdata: Vec<u8>) -> Result<Self, WireError> {
        if rdata.len() > usize::from(u16::MAX) {
            return Err(WireError::RdataTooLong(rdata.len()));
        }
        Ok(ResourceRecord { name, rtype, class, ttl, rdata })
    }

    /// An IN A record for `addr`.
    pub fn a(name: Name, addr: Ipv4Addr, ttl: u32) -> Self {
        ResourceRecord {
            name,
            rtype: rtype::A,
            class: class::IN,
            ttl,
            rdata: addr.octets().to_vec(),
        }
    }

    /// An IN AAAA record for `addr`.
    pub fn aaaa(name: Name, addr: Ipv6Addr, ttl: u32) -> Self {
        ResourceRecord {
            name,
            rtype: rtype::AAAA,
            class: class::IN,
            ttl,
            rdata: addr.octets().to_vec(),
        }
    }

    pub fn encoded_len(&self) -> usize {
        self.name.encoded_len() + RECORD_FIXED_LEN + self.rdata.len()
    }

    /// Appends the wire form of this record to `buf`.
    ///
    /// All limits are checked before the first octet is written.
    pub fn compose(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        let rdlength = u16::try_from(self.rdata.len()).map_err(|_| WireError::RdataTooLong(self.rdata.len()))?;
        self.name.compose(buf)?;
        buf.extend_from_slice(&self.rtype.to_be_bytes());
        buf.extend_from_slice(&self.class.to_be_bytes());
        buf.extend_from_slice(&self.ttl.to_be_bytes());
        buf.extend_from_slice(&rdlength.to_be_bytes());
        buf.extend_from_slice(&self.rdata);
        Ok(())
    }

    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.compose(&mut buf)?;
        Ok(buf)
    }

    /// Reads a record starting at `offset`, returning it with the number of
    /// octets consumed.
    pub fn decode(buf: &[u8], offset: usize) -> Result<(ResourceRecord, usize), WireError> {
        decode_at(buf, offset, parse_record)
    }
}

pub fn parse_record(input: &[u8]) -> IResult<ResourceRecord> {
    let (input, name) = parse_name(input)?;
    let (input, (rtype, class, ttl, rdlength)) = or_truncated(
        WireError::TruncatedRecord,
        tuple((be_u16, be_u16, be_u32, be_u16)),
    )(input)?;
    let (input, rdata) = or_truncated(WireError::TruncatedRecord, take(rdlength))(input)?;
    Ok((
        input,
        ResourceRecord {
            name,
            rtype,
            class,
            ttl,
            rdata: rdata.to_vec(),
        },
    ))
}

//! Whole messages: decoding incoming queries and assembling responses.

use std::convert::TryFrom;

use tracing::trace;

use crate::error::{finish, IResult, WireError};
use crate::header::{parse_dns_header, Header, Rcode, HEADER_LEN};
use crate::question::{parse_question, Question};
use crate::record::{parse_record, ResourceRecord};

/// A decoded query: its header and the first question it asks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    pub header: Header,
    pub question: Question,
}

impl Query {
    /// Decodes a query datagram.
    ///
    /// Only the first question is kept. Anything after it, such as an
    /// EDNS OPT record in the additional section, is ignored.
    pub fn decode(buf: &[u8]) -> Result<Query, WireError> {
        parse_query(buf).map(|(_, query)| query).map_err(|e| {
            let err = finish(e);
            trace!(len = buf.len(), error = %err, "query decode failed");
            err
        })
    }
}

pub fn parse_query(input: &[u8]) -> IResult<Query> {
    let (input, header) = parse_dns_header(input)?;
    if header.questions == 0 {
        return Err(nom::Err::Failure(WireError::NoQuestion));
    }
    let (input, question) = parse_question(input)?;
    Ok((input, Query { header, question }))
}

/// A complete message with all four sections.
///
/// The section counts in `header` are ignored when encoding; they are
/// always derived from the sections themselves.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub question: Option<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additionals: Vec<ResourceRecord>,
}

impl Message {
    pub fn decode(buf: &[u8]) -> Result<Message, WireError> {
        parse_message(buf).map(|(_, message)| message).map_err(finish)
    }

    pub fn encoded_len(&self) -> usize {
        HEADER_LEN
            + self.question.as_ref().map_or(0, Question::encoded_len)
            + self
                .answers
                .iter()
                .chain(&self.authorities)
                .chain(&self.additionals)
                .map(ResourceRecord::encoded_len)
                .sum::<usize>()
    }

    /// Encodes the message, returning nothing unless every section encodes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        let mut header = self.header.clone();
        header.questions = u16::from(self.question.is_some());
        header.answers = section_count(&self.answers)?;
        header.authorities = section_count(&self.authorities)?;
        header.additionals = section_count(&self.additionals)?;

        let mut buf = Vec::with_capacity(self.encoded_len());
        header.compose(&mut buf);
        if let Some(question) = &self.question {
            question.compose(&mut buf)?;
        }
        for record in self.answers.iter().chain(&self.authorities).chain(&self.additionals) {
            record.compose(&mut buf)?;
        }
        Ok(buf)
    }
}

fn section_count(records: &[ResourceRecord]) -> Result<u16, WireError> {
    u16::try_from(records.len()).map_err(|_| WireError::TooManyRecords(records.len()))
}

/// Parses up to `count` items, stopping early when the input runs out.
///
/// Counts come from the peer and are only a hint, so nothing is
/// preallocated from them.
fn parse_section<'a, O>(
    mut input: &'a [u8],
    count: u16,
    parser: fn(&'a [u8]) -> IResult<'a, O>,
) -> IResult<'a, Vec<O>> {
    let mut items = vec![];
    for _ in 0..count {
        if input.is_empty() {
            break;
        }
        let (rest, item) = parser(input)?;
        items.push(item);
        input = rest;
    }
    Ok((input, items))
}

pub fn parse_message(input: &[u8]) -> IResult<Message> {
    let (input, header) = parse_dns_header(input)?;
    let (input, mut questions) = parse_section(input, header.questions, parse_question)?;
    let (input, answers) = parse_section(input, header.answers, parse_record)?;
    let (input, authorities) = parse_section(input, header.authorities, parse_record)?;
    let (input, additionals) = parse_section(input, header.additionals, parse_record)?;
    let question = if questions.is_empty() { None } else { Some(questions.swap_remove(0)) };
    Ok((
        input,
        Message {
            header,
            question,
            answers,
            authorities,
            additionals,
        },
    ))
}

/// What the resolution collaborator found for a question.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub answers: Vec<ResourceRecord>,
    /// Status to report when `answers` is empty.
    pub rcode: Rcode,
}

impl Resolution {
    pub fn answers(answers: Vec<ResourceRecord>) -> Self {
        Resolution { answers, rcode: Rcode::NoError }
    }

    /// The name exists but has no data of the asked type.
    pub fn no_data() -> Self {
        Resolution::answers(vec![])
    }

    pub fn nxdomain() -> Self {
        Resolution { answers: vec![], rcode: Rcode::NXDomain }
    }
}

/// Turns decoded queries and their answers into response datagrams.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResponseBuilder {
    /// Advertised as RA. Set when the server forwards or resolves rather
    /// than answering only from local data.
    pub recursion_available: bool,
}

impl ResponseBuilder {
    pub fn new(recursion_available: bool) -> Self {
        ResponseBuilder { recursion_available }
    }

    fn response_header(&self, query: &Header, rcode: Rcode) -> Header {
        Header {
            id: query.id,
            response: true,
            opcode: query.opcode,
            authoritative_answer: true,
            recursion_desired: query.recursion_desired,
            recursion_available: self.recursion_available,
            rcode,
            ..Header::default()
        }
    }

    /// Builds the response to `question` carrying `answers`.
    ///
    /// The question is echoed as decoded. The status is NoError whenever
    /// there are answers and `hint` otherwise.
    pub fn build_response(
        &self,
        query: &Header,
        question: &Question,
        answers: &[ResourceRecord],
        hint: Rcode,
    ) -> Result<Vec<u8>, WireError> {
        let rcode = if answers.is_empty() { hint } else { Rcode::NoError };
        Message {
            header: self.response_header(query, rcode),
            question: Some(question.clone()),
            answers: answers.to_vec(),
            ..Message::default()
        }
        .to_bytes()
    }

    pub fn build_resolved(&self, query: &Query, resolution: &Resolution) -> Result<Vec<u8>, WireError> {
        self.build_response(&query.header, &query.question, &resolution.answers, resolution.rcode)
    }

    /// Builds a header-only response, e.g. ServFail after an encode error.
    pub fn build_error_response(&self, query: &Header, rcode: Rcode) -> Vec<u8> {
        self.response_header(query, rcode).to_bytes().to_vec()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::header::Opcode;
    use crate::name::Name;
    use crate::record::{class, rtype};
    use std::net::Ipv4Addr;

    const QUERY: &[u8] = include_bytes!("../testdata/query.example.dns");
    const EDNS_QUERY: &[u8] = include_bytes!("../testdata/query.google.edns.dns");

    fn www() -> Name {
        "www.example.com".parse().unwrap()
    }

    #[test]
    fn test_decode_standard_query() {
        let query = Query::decode(QUERY).unwrap();
        assert_eq!(query.header.id, 1);
        assert!(query.header.recursion_desired);
        assert_eq!(query.header.questions, 1);
        assert_eq!(query.question, Question::new(www(), rtype::A, class::IN));
    }

    #[test]
    fn test_decode_ignores_additional_section() {
        let query = Query::decode(EDNS_QUERY).unwrap();
        assert_eq!(query.header.id, 0x5c91);
        assert_eq!(query.question.qname.to_string(), "google.com");
        assert_eq!(query.question.qtype, rtype::AAAA);
    }

    #[test]
    fn test_short_buffer() {
        assert_eq!(Query::decode(&QUERY[..11]), Err(WireError::TruncatedHeader));
    }

    #[test]
    fn test_no_question() {
        let mut packet = QUERY.to_vec();
        packet[5] = 0;
        assert_eq!(Query::decode(&packet), Err(WireError::NoQuestion));
        assert_eq!(Query::decode(&packet[..HEADER_LEN]), Err(WireError::NoQuestion));
    }

    #[test]
    fn test_every_truncation_fails() {
        for packet in &[QUERY, EDNS_QUERY] {
            let question_end = HEADER_LEN + Question::decode(packet, HEADER_LEN).unwrap().1;
            for cut in 0..question_end {
                assert!(Query::decode(&packet[..cut]).is_err(), "cut at {}", cut);
            }
        }
    }

    #[test]
    fn test_compression_pointer_in_question() {
        let mut packet = QUERY[..HEADER_LEN].to_vec();
        packet.extend_from_slice(&[0x03, b'w', b'w', b'w', 0xc0, 0x0c, 0x00, 0x01, 0x00, 0x01]);
        assert_eq!(Query::decode(&packet), Err(WireError::UnsupportedCompression));
    }

    #[test]
    fn test_only_first_question_kept() {
        let mut packet = QUERY.to_vec();
        packet[5] = 2;
        packet.extend_from_slice(b"\x03foo\x00\x00\x10\x00\x01");
        let query = Query::decode(&packet).unwrap();
        assert_eq!(query.header.questions, 2);
        assert_eq!(query.question.qname, www());
    }

    #[test]
    fn test_response_assembly() {
        let query = Query::decode(QUERY).unwrap();
        let answer = ResourceRecord::new(www(), rtype::A, class::IN, 3600, vec![0x7f, 0, 0, 1]).unwrap();
        let response = ResponseBuilder::new(false)
            .build_response(&query.header, &query.question, &[answer.clone()], Rcode::NoError)
            .unwrap();

        assert_eq!(response.len(), 12 + 21 + 31);
        assert_eq!(&response[..HEADER_LEN], &[0x00, 0x01, 0x85, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(&response[HEADER_LEN..33], &QUERY[HEADER_LEN..]);
        assert_eq!(&response[33..], &answer.encode().unwrap()[..]);

        let header = Header::decode(&response).unwrap();
        assert!(header.response && header.authoritative_answer && header.recursion_desired);
        assert!(!header.truncated_message && !header.recursion_available);
        assert_eq!(header.rcode, Rcode::NoError);
    }

    #[test]
    fn test_response_round_trips_as_message() {
        let query = Query::decode(EDNS_QUERY).unwrap();
        let resolution = Resolution::answers(vec![
            ResourceRecord::a(query.question.qname.clone(), Ipv4Addr::new(192, 0, 2, 1), 60),
            ResourceRecord::a(query.question.qname.clone(), Ipv4Addr::new(192, 0, 2, 2), 60),
        ]);
        let response = ResponseBuilder::new(true).build_resolved(&query, &resolution).unwrap();
        let message = Message::decode(&response).unwrap();
        assert_eq!(message.header.id, 0x5c91);
        assert_eq!(message.header.answers, 2);
        assert_eq!(message.header.additionals, 0);
        assert!(message.header.recursion_available);
        assert_eq!(message.question, Some(query.question));
        assert_eq!(message.answers, resolution.answers);
    }

    #[test]
    fn test_empty_answers_use_hint() {
        let query = Query::decode(QUERY).unwrap();
        let builder = ResponseBuilder::default();

        let no_data = builder.build_resolved(&query, &Resolution::no_data()).unwrap();
        let header = Header::decode(&no_data).unwrap();
        assert_eq!((header.rcode, header.answers), (Rcode::NoError, 0));
        assert_eq!(no_data.len(), 12 + 21);

        let nxdomain = builder.build_resolved(&query, &Resolution::nxdomain()).unwrap();
        assert_eq!(Header::decode(&nxdomain).unwrap().rcode, Rcode::NXDomain);
    }

    #[test]
    fn test_answers_override_hint() {
        let query = Query::decode(QUERY).unwrap();
        let answers = [ResourceRecord::a(www(), Ipv4Addr::LOCALHOST, 1)];
        let response = ResponseBuilder::default()
            .build_response(&query.header, &query.question, &answers, Rcode::NXDomain)
            .unwrap();
        assert_eq!(Header::decode(&response).unwrap().rcode, Rcode::NoError);
    }

    #[test]
    fn test_opcode_copied_and_rd_preserved() {
        let mut query = Query::decode(QUERY).unwrap();
        query.header.opcode = Opcode::Status;
        query.header.recursion_desired = false;
        query.header.checking_disabled = true;
        let response = ResponseBuilder::default().build_resolved(&query, &Resolution::no_data()).unwrap();
        let header = Header::decode(&response).unwrap();
        assert_eq!(header.opcode, Opcode::Status);
        assert!(!header.recursion_desired);
        assert!(!header.checking_disabled);
    }

    #[test]
    fn test_encode_error_yields_nothing() {
        let query = Query::decode(QUERY).unwrap();
        let bad = ResourceRecord::a(Name::from_labels(vec![vec![b'x'; 64]]), Ipv4Addr::LOCALHOST, 1);
        let result = ResponseBuilder::default().build_response(&query.header, &query.question, &[bad], Rcode::NoError);
        assert_eq!(result, Err(WireError::LabelTooLong(64)));
    }

    #[test]
    fn test_error_response_is_header_only() {
        let query = Query::decode(QUERY).unwrap();
        let response = ResponseBuilder::default().build_error_response(&query.header, Rcode::ServFail);
        assert_eq!(response, vec![0x00, 0x01, 0x85, 0x02, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_message_counts_are_hints() {
        // ANCOUNT claims 5 records but the message ends after the question.
        let mut packet = QUERY.to_vec();
        packet[7] = 5;
        let message = Message::decode(&packet).unwrap();
        assert!(message.answers.is_empty());

        // A record cut short is still an error.
        packet.extend_from_slice(b"\x03www\x00\x00\x01");
        assert_eq!(Message::decode(&packet), Err(WireError::TruncatedRecord));
    }
}

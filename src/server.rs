//! A blocking UDP responder driving the codec.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

use tracing::{debug, error, info, warn};

use crate::error::WireError;
use crate::header::Rcode;
use crate::message::{Query, ResponseBuilder};
use crate::resolve::Resolve;

/// Classic DNS limit for a UDP payload.
pub const MAX_DATAGRAM_LEN: usize = 512;

const RECV_BUFFER_LEN: usize = 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Largest response that will be sent.
    pub max_datagram: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 1053)),
            max_datagram: MAX_DATAGRAM_LEN,
        }
    }
}

pub struct Responder<R> {
    socket: UdpSocket,
    resolver: R,
    builder: ResponseBuilder,
    max_datagram: usize,
}

impl<R: Resolve> Responder<R> {
    pub fn bind(config: &ServerConfig, resolver: R) -> io::Result<Self> {
        let socket = UdpSocket::bind(config.bind)?;
        let builder = ResponseBuilder::new(resolver.recursion_available());
        Ok(Responder {
            socket,
            resolver,
            builder,
            max_datagram: config.max_datagram,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Produces the reply to one datagram, or `None` to stay silent.
    ///
    /// Undecodable datagrams and datagrams that are themselves responses
    /// are dropped. A response that cannot be encoded, or that would not
    /// fit in `max_datagram`, is replaced by a header-only ServFail.
    pub fn handle_datagram(&self, data: &[u8]) -> Option<Vec<u8>> {
        let query = match Query::decode(data) {
            Ok(query) => query,
            Err(e) => {
                debug!(len = data.len(), error = %e, "dropping undecodable datagram");
                return None;
            }
        };
        if query.header.response {
            debug!(id = query.header.id, "dropping unsolicited response");
            return None;
        }

        info!(
            id = query.header.id,
            name = %query.question.qname,
            qtype = query.question.qtype,
            qclass = query.question.qclass,
            "query received"
        );

        let resolution = self.resolver.resolve(&query.question);
        let response = match self.builder.build_resolved(&query, &resolution) {
            Ok(response) => response,
            Err(e) => {
                warn!(id = query.header.id, error = %e, "failed to encode answer");
                return Some(self.builder.build_error_response(&query.header, Rcode::ServFail));
            }
        };
        if response.len() > self.max_datagram {
            let e = WireError::ResponseTooLarge {
                len: response.len(),
                max: self.max_datagram,
            };
            warn!(id = query.header.id, error = %e, "answer does not fit a datagram");
            return Some(self.builder.build_error_response(&query.header, Rcode::ServFail));
        }
        Some(response)
    }

    /// Waits for one datagram and answers it.
    pub fn handle_query(&self) -> io::Result<()> {
        let mut data = [0u8; RECV_BUFFER_LEN];
        let (n, src) = self.socket.recv_from(&mut data)?;
        let data = &data[..n];
        debug!(len = n, client = %src, "datagram received");

        if let Some(response) = self.handle_datagram(data) {
            self.socket.send_to(&response, src)?;
            debug!(len = response.len(), client = %src, "response sent");
        }
        Ok(())
    }

    pub fn run(&self) -> ! {
        loop {
            if let Err(e) = self.handle_query() {
                error!(error = %e, "failed to handle datagram");
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::header::Header;
    use crate::message::Resolution;
    use crate::name::Name;
    use crate::question::Question;
    use crate::record::ResourceRecord;
    use crate::resolve::StaticResolver;

    const QUERY: &[u8] = include_bytes!("../testdata/query.example.dns");

    fn responder<R: Resolve>(resolver: R, max_datagram: usize) -> Responder<R> {
        let config = ServerConfig {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
            max_datagram,
        };
        Responder::bind(&config, resolver).unwrap()
    }

    struct Fixed(Vec<ResourceRecord>);

    impl Resolve for Fixed {
        fn resolve(&self, _question: &Question) -> Resolution {
            Resolution::answers(self.0.clone())
        }

        fn recursion_available(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_answers_query() {
        let responder = responder(StaticResolver::default(), MAX_DATAGRAM_LEN);
        let response = responder.handle_datagram(QUERY).unwrap();
        let header = Header::decode(&response).unwrap();
        assert_eq!(header.id, 1);
        assert_eq!(header.answers, 1);
        assert!(!header.recursion_available);
        assert_eq!(&response[response.len() - 4..], &[127, 0, 0, 1]);
    }

    #[test]
    fn test_drops_garbage_and_responses() {
        let responder = responder(StaticResolver::default(), MAX_DATAGRAM_LEN);
        assert_eq!(responder.handle_datagram(&QUERY[..7]), None);
        assert_eq!(responder.handle_datagram(&[]), None);

        let mut response = QUERY.to_vec();
        response[2] |= 0x80;
        assert_eq!(responder.handle_datagram(&response), None);
    }

    #[test]
    fn test_oversized_answer_becomes_servfail() {
        let name: Name = "www.example.com".parse().unwrap();
        let records = (0..40).map(|i| ResourceRecord::a(name.clone(), Ipv4Addr::new(10, 0, 0, i), 60)).collect();
        let responder = responder(Fixed(records), MAX_DATAGRAM_LEN);
        let response = responder.handle_datagram(QUERY).unwrap();
        assert_eq!(response.len(), 12);
        let header = Header::decode(&response).unwrap();
        assert_eq!(header.rcode, Rcode::ServFail);
        assert!(header.recursion_available);
        assert!(!header.truncated_message);
    }

    #[test]
    fn test_encode_failure_becomes_servfail() {
        let bad = ResourceRecord::a(Name::from_labels(vec![vec![b'z'; 99]]), Ipv4Addr::LOCALHOST, 1);
        let responder = responder(Fixed(vec![bad]), MAX_DATAGRAM_LEN);
        let response = responder.handle_datagram(QUERY).unwrap();
        assert_eq!(Header::decode(&response).unwrap().rcode, Rcode::ServFail);
        assert_eq!(response.len(), 12);
    }
}

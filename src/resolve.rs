//! Where answers come from.
//!
//! The codec does not care how a question gets answered. A [`Resolve`]
//! implementation is handed each decoded question and returns the records
//! to send back, or a status when there are none.

use std::net::{Ipv4Addr, Ipv6Addr};

use tracing::debug;

use crate::message::Resolution;
use crate::name::Name;
use crate::question::Question;
use crate::record::{class, rtype, ResourceRecord};

pub trait Resolve {
    fn resolve(&self, question: &Question) -> Resolution;

    /// Whether responses may advertise recursion (RA).
    fn recursion_available(&self) -> bool {
        false
    }
}

/// Answers every name with the same fixed addresses.
#[derive(Clone, Debug)]
pub struct StaticResolver {
    v4: Ipv4Addr,
    v6: Option<Ipv6Addr>,
    ttl: u32,
    nxdomain: Vec<Name>,
}

impl Default for StaticResolver {
    fn default() -> Self {
        StaticResolver {
            v4: Ipv4Addr::LOCALHOST,
            v6: None,
            ttl: 3600,
            nxdomain: vec![],
        }
    }
}

impl StaticResolver {
    pub fn new(v4: Ipv4Addr, ttl: u32) -> Self {
        StaticResolver { v4, ttl, ..StaticResolver::default() }
    }

    pub fn with_v6(mut self, v6: Ipv6Addr) -> Self {
        self.v6 = Some(v6);
        self
    }

    /// Reports `name` as nonexistent instead of answering it.
    pub fn with_nxdomain(mut self, name: Name) -> Self {
        self.nxdomain.push(name);
        self
    }

    fn is_nxdomain(&self, name: &Name) -> bool {
        self.nxdomain.iter().any(|n| n.eq_ignore_ascii_case(name))
    }
}

impl Resolve for StaticResolver {
    fn resolve(&self, question: &Question) -> Resolution {
        let name = &question.qname;
        if self.is_nxdomain(name) {
            debug!(name = %name, "configured as nonexistent");
            return Resolution::nxdomain();
        }
        if question.qclass != class::IN {
            return Resolution::no_data();
        }
        match (question.qtype, self.v6) {
            (rtype::A, _) => Resolution::answers(vec![ResourceRecord::a(name.clone(), self.v4, self.ttl)]),
            (rtype::AAAA, Some(v6)) => Resolution::answers(vec![ResourceRecord::aaaa(name.clone(), v6, self.ttl)]),
            (qtype, _) => {
                debug!(name = %name, qtype, "no static data for type");
                Resolution::no_data()
            }
        }
    }
}

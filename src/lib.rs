//! Parsing and serialising DNS messages for a minimal UDP responder.
//!
//! Incoming datagrams are decoded into a [`Query`], answered by a
//! [`Resolve`] implementation and turned back into wire format by a
//! [`ResponseBuilder`]. Names are never compressed, and only the first
//! question of a message is looked at.

pub mod error;
pub mod header;
pub mod message;
pub mod name;
pub mod question;
pub mod record;
pub mod resolve;
pub mod server;

pub use error::WireError;
pub use header::{Header, Opcode, Rcode};
pub use message::{Message, Query, Resolution, ResponseBuilder};
pub use name::Name;
pub use question::Question;
pub use record::ResourceRecord;
pub use resolve::{Resolve, StaticResolver};
pub use server::{Responder, ServerConfig};

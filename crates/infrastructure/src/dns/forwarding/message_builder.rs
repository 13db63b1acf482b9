//! DNS Message Builder
//!
//! Constructs the load-test query in wire format using `hickory-proto`:
//! one question, type A, class IN, recursion desired.

use super::WireError;
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name, RecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::str::FromStr;

/// Builds DNS query messages in wire format
pub struct MessageBuilder;

impl MessageBuilder {
    /// Build an A query with a random ID.
    ///
    /// Returns the ID alongside the bytes so the caller can match the reply.
    pub fn build_query(domain: &str) -> Result<(u16, Vec<u8>), WireError> {
        let id = fastrand::u16(..);
        let bytes = Self::build_query_with_id(domain, id)?;
        Ok((id, bytes))
    }

    /// Build an A query with a fixed ID. DoH uses ID 0 (RFC 8484 §4.1).
    pub fn build_query_with_id(domain: &str, id: u16) -> Result<Vec<u8>, WireError> {
        let name = Name::from_str(domain).map_err(|e| WireError::InvalidName {
            domain: domain.to_string(),
            reason: e.to_string(),
        })?;

        let mut query = Query::new();
        query.set_name(name);
        query.set_query_type(RecordType::A);
        query.set_query_class(DNSClass::IN);

        let mut message = Message::new(id, MessageType::Query, OpCode::Query);
        message.set_recursion_desired(true);
        message.add_query(query);

        Self::serialize_message(&message)
    }

    /// Frames a message for DNS over TCP: 2-byte big-endian length prefix.
    pub fn frame_for_tcp(message_bytes: &[u8]) -> Result<Vec<u8>, WireError> {
        let len = u16::try_from(message_bytes.len())
            .map_err(|_| WireError::Encode(format!("message too long: {} bytes", message_bytes.len())))?;

        let mut framed = Vec::with_capacity(2 + message_bytes.len());
        framed.extend_from_slice(&len.to_be_bytes());
        framed.extend_from_slice(message_bytes);
        Ok(framed)
    }

    fn serialize_message(message: &Message) -> Result<Vec<u8>, WireError> {
        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);

        message
            .emit(&mut encoder)
            .map_err(|e| WireError::Encode(e.to_string()))?;

        Ok(buf)
    }
}

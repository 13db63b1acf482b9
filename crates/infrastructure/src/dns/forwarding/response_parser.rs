use super::WireError;
use hickory_proto::op::{Message, ResponseCode};
use tracing::trace;

/// Minimal view of a resolver reply. The load generator only cares that a
/// well-formed response arrived, not what it says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    pub id: u16,
    pub rcode: ResponseCode,
    pub answers: usize,
    pub truncated: bool,
}

pub struct ResponseParser;

impl ResponseParser {
    /// Reads the message ID from the header without decoding the rest.
    pub fn peek_id(bytes: &[u8]) -> Option<u16> {
        match bytes {
            [hi, lo, ..] => Some(u16::from_be_bytes([*hi, *lo])),
            _ => None,
        }
    }

    /// QR flag: high bit of the third header byte.
    pub fn is_response(bytes: &[u8]) -> bool {
        bytes.get(2).is_some_and(|flags| flags & 0x80 != 0)
    }

    /// Decodes a full reply. A message that is not a response is an error.
    pub fn parse(bytes: &[u8]) -> Result<ParsedResponse, WireError> {
        let id = Self::peek_id(bytes).ok_or_else(|| WireError::Decode("short header".to_string()))?;
        if !Self::is_response(bytes) {
            return Err(WireError::Decode("QR bit not set".to_string()));
        }

        let message = Message::from_vec(bytes).map_err(|e| WireError::Decode(e.to_string()))?;

        let parsed = ParsedResponse {
            id,
            rcode: message.response_code(),
            answers: message.answers().len(),
            truncated: message.truncated(),
        };

        trace!(
            id = parsed.id,
            rcode = ?parsed.rcode,
            answers = parsed.answers,
            truncated = parsed.truncated,
            "DNS response parsed"
        );

        Ok(parsed)
    }
}

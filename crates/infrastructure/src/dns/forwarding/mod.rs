pub mod message_builder;
pub mod response_parser;

pub use message_builder::MessageBuilder;
pub use response_parser::{ParsedResponse, ResponseParser};

use thiserror::Error;

/// Local encode/decode failures. Both classify as a protocol error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("Invalid domain '{domain}': {reason}")]
    InvalidName { domain: String, reason: String },

    #[error("Failed to serialize DNS message: {0}")]
    Encode(String),

    #[error("Failed to parse DNS response: {0}")]
    Decode(String),
}

pub mod forwarding;
pub mod transport;

pub use forwarding::{MessageBuilder, ResponseParser, WireError};
pub use transport::{Transport, TransportBuilder};

pub mod dns_server_mock;

pub use dns_server_mock::{build_mock_response, MockDnsServer, MockMode};
pub use doh_server_mock::{DohMode, MockDohServer};

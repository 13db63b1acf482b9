#![allow(dead_code)]

pub mod fixtures;
pub mod test_server;

pub use fixtures::{controller_for, TestDomains};
pub use test_server::{ServerBehavior, TestResolver};

//! Unit tests for individual components

mod config_test;
mod error_test;
mod message_test;
mod util_test;
mod validator_test;

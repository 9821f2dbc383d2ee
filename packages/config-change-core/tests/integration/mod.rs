//! Integration tests for change sets and change requests.
//!
//! 1. Change set properties over snapshot pairs
//! 2. Single-backend change requests against files
//! 3. Compound change requests

pub mod change_set_tests;
pub mod compound_request_tests;
pub mod helpers;
pub mod request_tests;

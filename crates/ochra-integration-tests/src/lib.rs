//! Integration test crate for the Ochra protocol.
//!
//! This crate has no library code — it only contains integration tests
//! that exercise end-to-end protocol flows across multiple workspace crates.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p ochra-integration-tests -- --ignored
//! ```

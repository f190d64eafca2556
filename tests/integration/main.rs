//! Integration test harness entry point.
//!
//! Cargo only auto-discovers `tests/*.rs` files and `tests/<dir>/main.rs`
//! targets, so this file exists to pull in the test modules below.

mod api_tests;

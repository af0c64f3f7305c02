//! Unit tests for annotation codec implementations.
//!
//! These tests verify encoding, decoding, error reporting and the lossy
//! behavior of each format across round trips.

mod create_ml_tests;
mod roundtrip_tests;

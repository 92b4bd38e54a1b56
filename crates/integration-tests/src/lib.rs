//! Integration tests for Harborlight.
//!
//! The tests live in `tests/`; this library is intentionally empty.

#![cfg_attr(not(test), forbid(unsafe_code))]

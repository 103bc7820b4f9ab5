//! Acme Auth Library
//!
//! Exposes the auth module for use by the binary and integration tests.

pub mod auth;

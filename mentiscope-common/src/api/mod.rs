//! Shared HTTP API functionality
//!
//! Pure functions only (no HTTP framework dependencies). The service crate
//! wraps these with its axum handlers.

pub mod signature;

pub use signature::{calculate_signature, to_canonical_json, verify_signature, SignatureError};

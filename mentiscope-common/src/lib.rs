//! # Mentiscope Common Library
//!
//! Shared code for the Mentiscope services including:
//! - Database schema and row models
//! - Configuration loading
//! - Webhook signature helpers
//! - Scientific reference catalog

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod references;
pub mod time;

pub use error::{Error, Result};

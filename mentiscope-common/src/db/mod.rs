//! Database schema and row models

pub mod init;
pub mod models;

pub use init::*;
pub use models::*;

use crate::{Error, Result};
use uuid::Uuid;

/// Parse a TEXT id column into a `Uuid`
pub fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::Internal(format!("Invalid stored id '{}': {}", value, e)))
}

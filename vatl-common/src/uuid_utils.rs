//! UUID utilities

use crate::{Error, Result};
use uuid::Uuid;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse UUID from string
pub fn parse(s: &str) -> std::result::Result<Uuid, uuid::Error> {
    Uuid::parse_str(s)
}

/// Parse a guid column read back from the database
///
/// A malformed guid in a row means the database was written by something
/// other than VATL, so it is reported as an internal error.
pub fn parse_guid(column: &str, value: &str) -> Result<Uuid> {
    parse(value).map_err(|e| {
        Error::Internal(format!("Invalid guid in {}: {:?} ({})", column, value, e))
    })
}

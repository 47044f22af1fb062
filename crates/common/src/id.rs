//! ID generation utilities.

use ulid::Ulid;
use uuid::Uuid;

use crate::{AppError, AppResult};

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs are lexicographically sortable, so `ORDER BY id` follows creation order.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a new random UUID v4.
    ///
    /// Used for publicly shared identifiers such as certificate IDs.
    #[must_use]
    pub fn generate_uuid_v4(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

fn has_uppercase(id: &str) -> bool {
    id.bytes().any(|b| b.is_ascii_uppercase())
}

/// Reject identifiers that could never name a row.
///
/// Stored ids are lowercase ULIDs, so an uppercase spelling is rejected
/// rather than left to miss. `what` names the entity in the error message,
/// e.g. `"event"`.
pub fn ensure_valid_id(id: &str, what: &str) -> AppResult<()> {
    if id.len() == 26 && !has_uppercase(id) && Ulid::from_string(&id.to_ascii_uppercase()).is_ok()
    {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Invalid {what} ID")))
    }
}

/// Reject certificate identifiers that are not lowercase hyphenated UUIDs.
pub fn ensure_valid_uuid(id: &str) -> AppResult<()> {
    match Uuid::parse_str(id) {
        Ok(uuid) if uuid.hyphenated().to_string() == id => Ok(()),
        _ => Err(AppError::BadRequest("Invalid certificate ID".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ulid() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate();
        let id2 = id_gen.generate();

        assert_eq!(id1.len(), 26);
        assert_ne!(id1, id2);
        assert_eq!(id1, id1.to_lowercase());
    }

    #[test]
    fn test_generated_ids_are_valid() {
        let id_gen = IdGenerator::new();
        assert!(ensure_valid_id(&id_gen.generate(), "event").is_ok());
        assert!(ensure_valid_uuid(&id_gen.generate_uuid_v4()).is_ok());
    }

    #[test]
    fn test_malformed_ids_are_rejected() {
        assert!(matches!(
            ensure_valid_id("not-an-id", "event"),
            Err(AppError::BadRequest(_))
        ));
        assert!(ensure_valid_id("", "user").is_err());
        assert!(ensure_valid_uuid("12345").is_err());
    }

    #[test]
    fn test_uppercase_ids_are_rejected() {
        let id = IdGenerator::new().generate();
        assert!(ensure_valid_id(&id.to_uppercase(), "event").is_err());

        let uuid = IdGenerator::new().generate_uuid_v4();
        assert!(ensure_valid_uuid(&uuid.to_uppercase()).is_err());
        assert!(ensure_valid_uuid(&uuid.replace('-', "")).is_err());
    }
}

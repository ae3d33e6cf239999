//! Row identifier generation.
//!
//! Identifiers are random UUIDs, matching what the hosted backend hands out
//! for new rows.

use uuid::Uuid;

/// Generate a new row identifier (e.g., "3f2b9c1e-8d4a-4c7e-9a10-5b6d7e8f9a0b").
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_id_format() {
        let id = new_id();
        assert_eq!(id.len(), 36, "ID should be 36 chars: {id}");
        let parsed = Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn test_uniqueness() {
        let mut ids: HashSet<String> = HashSet::new();
        for _ in 0..100 {
            let id = new_id();
            assert!(ids.insert(id.clone()), "Generated duplicate ID: {id}");
        }
    }
}

// SPDX-License-Identifier: GPL-3.0-only
use crate::registry::error::{DiscoveryError, DiscoveryResult};
use crate::registry::models::{REGISTRATION_ID_KEY, Record};

/// A record that passed validation for the operation it was checked for.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRecord(Record);

impl ValidRecord {
    pub fn into_inner(self) -> Record {
        self.0
    }
}

fn check_shape(record: &Record) -> DiscoveryResult<()> {
    if record.service_type.trim().is_empty() {
        return Err(DiscoveryError::InvalidRecord("record type must not be empty".to_string()));
    }

    if record.metadata.contains_key(REGISTRATION_ID_KEY) {
        return Err(DiscoveryError::InvalidRecord(format!(
            "metadata key '{}' is reserved for the registry",
            REGISTRATION_ID_KEY
        )));
    }

    Ok(())
}

/// Validate a fresh record on its way to `publish`
pub fn validate_for_publish(record: Record) -> DiscoveryResult<ValidRecord> {
    if let Some(id) = record.id() {
        return Err(DiscoveryError::AlreadyPublished(id.to_string()));
    }
    check_shape(&record)?;
    Ok(ValidRecord(record))
}

/// Validate a record on its way to `update`; returns the id it targets.
///
/// Whether the id is still registered is decided by the store.
pub fn validate_for_update(record: Record) -> DiscoveryResult<(String, ValidRecord)> {
    let id = record
        .id()
        .map(str::to_string)
        .ok_or_else(|| DiscoveryError::InvalidRecord("record has no registration id".to_string()))?;
    check_shape(&record)?;
    Ok((id, ValidRecord(record)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_accepts_fresh_record() {
        let record = Record::new("orders", "http-endpoint").with_metadata("env", "prod");
        let valid = validate_for_publish(record.clone()).unwrap();
        assert_eq!(valid.into_inner(), record);
    }

    #[test]
    fn test_publish_rejects_empty_type() {
        let result = validate_for_publish(Record::new("orders", "  "));
        assert!(matches!(result, Err(DiscoveryError::InvalidRecord(_))));
    }

    #[test]
    fn test_publish_rejects_assigned_id() {
        let mut record = Record::new("orders", "http-endpoint");
        record.registration_id = Some("R1".to_string());

        match validate_for_publish(record) {
            Err(DiscoveryError::AlreadyPublished(id)) => assert_eq!(id, "R1"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_publish_treats_empty_id_as_fresh() {
        let mut record = Record::new("orders", "http-endpoint");
        record.registration_id = Some(String::new());
        assert!(validate_for_publish(record).is_ok());
    }

    #[test]
    fn test_reserved_metadata_key() {
        let record = Record::new("orders", "http-endpoint").with_metadata("registrationId", "spoof");
        assert!(matches!(
            validate_for_publish(record),
            Err(DiscoveryError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_update_requires_id() {
        let result = validate_for_update(Record::new("orders", "http-endpoint"));
        assert!(matches!(result, Err(DiscoveryError::InvalidRecord(_))));
    }

    #[test]
    fn test_update_returns_target_id() {
        let mut record = Record::new("orders", "http-endpoint");
        record.registration_id = Some("R7".to_string());

        let (id, valid) = validate_for_update(record).unwrap();
        assert_eq!(id, "R7");
        assert_eq!(valid.into_inner().id(), Some("R7"));
    }
}

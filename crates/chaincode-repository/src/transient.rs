//! # Transient Data Extractor
//!
//! Collects mapped fields of domain-object parameters into the proposal's
//! transient data map. Failures on a single field are logged and skipped;
//! the partial map is still submitted.

use crate::conversion::ConversionRegistry;
use crate::domain::criteria::TransientData;
use crate::domain::parameters::ParamValue;
use crate::mapping::MappingContext;
use std::sync::Arc;
use tracing::{debug, error};

/// Extractor bound to one repository's mapping and converters.
#[derive(Clone, Debug)]
pub struct TransientDataExtractor {
    mapping: Arc<MappingContext>,
    conversions: Arc<ConversionRegistry>,
}

impl TransientDataExtractor {
    /// Creates an extractor.
    #[must_use]
    pub fn new(mapping: Arc<MappingContext>, conversions: Arc<ConversionRegistry>) -> Self {
        Self {
            mapping,
            conversions,
        }
    }

    /// Builds the transient map for one call.
    #[must_use]
    pub fn extract(&self, params: &[ParamValue]) -> TransientData {
        let mut data = TransientData::new();

        for entity in params.iter().filter_map(ParamValue::as_entity) {
            let Some(persistent) = self.mapping.persistent_entity_of(entity) else {
                continue;
            };

            for (field, key) in persistent.transient_mappings() {
                match persistent.read_field(field, entity.as_any()) {
                    Ok(Some(value)) => {
                        let text = self.conversions.convert_to_string(&value);
                        data.insert(key.clone(), text.into_bytes());
                    }
                    Ok(None) => {}
                    Err(e) => {
                        error!(
                            entity = persistent.name(),
                            field = %field,
                            key = %key,
                            error = %e,
                            "Failed to read transient field, skipping"
                        );
                    }
                }
            }
        }

        if !data.is_empty() {
            debug!(keys = ?data.keys().collect::<Vec<_>>(), "Extracted transient data");
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::EntityMapping;
    use chrono::{TimeZone, Utc};
    use serde::Serialize;

    #[derive(Debug, Serialize)]
    struct Marble {
        name: String,
        owner: Option<String>,
        price: i64,
        #[serde(skip)]
        sold_at: Option<chrono::DateTime<Utc>>,
    }

    #[derive(Debug, Serialize)]
    struct Unmapped {
        x: u8,
    }

    fn extractor() -> TransientDataExtractor {
        let mapping = MappingContext::new().with_entity(
            EntityMapping::<Marble>::new()
                .transient("owner", "marble_owner", |m| m.owner.clone())
                .transient("price", "marble_price", |m| Some(m.price))
                .transient("sold_at", "marble_sold_at", |m| m.sold_at)
                .transient_key("name", "marble_name")
                .build(),
        );
        TransientDataExtractor::new(Arc::new(mapping), Arc::new(ConversionRegistry::with_defaults()))
    }

    fn marble(owner: Option<&str>) -> Marble {
        Marble {
            name: "m1".into(),
            owner: owner.map(str::to_string),
            price: 99,
            sold_at: Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
        }
    }

    #[test]
    fn test_extracts_mapped_fields() {
        let data = extractor().extract(&[ParamValue::from("scalar"), ParamValue::entity(marble(Some("tom")))]);

        assert_eq!(data.get("marble_owner"), Some(&b"tom".to_vec()));
        assert_eq!(data.get("marble_price"), Some(&b"99".to_vec()));
        assert_eq!(
            data.get("marble_sold_at"),
            Some(&b"2024-01-02T03:04:05.000Z".to_vec())
        );
    }

    #[test]
    fn test_null_value_skipped() {
        let data = extractor().extract(&[ParamValue::entity(marble(None))]);
        assert!(!data.contains_key("marble_owner"));
        assert!(data.contains_key("marble_price"));
    }

    #[test]
    fn test_missing_accessor_keeps_partial_map() {
        chaincode_telemetry::init_test_logging();
        let data = extractor().extract(&[ParamValue::entity(marble(Some("tom")))]);
        assert!(!data.contains_key("marble_name"));
        assert_eq!(data.len(), 3);
    }

    #[test]
    fn test_scalars_and_unmapped_ignored() {
        let data = extractor().extract(&[
            ParamValue::Null,
            ParamValue::from(1),
            ParamValue::entity(Unmapped { x: 1 }),
        ]);
        assert!(data.is_empty());
    }
}

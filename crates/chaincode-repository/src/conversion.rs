//! # Conversion Registry
//!
//! String converters for transient data values, keyed by field kind. Owned by
//! the repository and handed to the extractor; there is no global instance.

use crate::mapping::{FieldKind, FieldValue};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Converter from a field value to its transient string form.
pub type Converter = Arc<dyn Fn(&FieldValue) -> String + Send + Sync>;

/// Format used for zone-less timestamps.
pub const LOCAL_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Kind-indexed converter table.
#[derive(Clone, Default)]
pub struct ConversionRegistry {
    converters: HashMap<FieldKind, Converter>,
}

impl ConversionRegistry {
    /// Registry with no converters; every value uses its default form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the date and time converters.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new()
            .register(FieldKind::DateTime, |value| match value {
                FieldValue::DateTime(dt) => dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                other => other.to_string(),
            })
            .register(FieldKind::LocalDateTime, |value| match value {
                FieldValue::LocalDateTime(dt) => dt.format(LOCAL_DATE_TIME_FORMAT).to_string(),
                other => other.to_string(),
            })
    }

    /// Registers (or replaces) the converter for `kind`.
    #[must_use]
    pub fn register<F>(mut self, kind: FieldKind, converter: F) -> Self
    where
        F: Fn(&FieldValue) -> String + Send + Sync + 'static,
    {
        self.converters.insert(kind, Arc::new(converter));
        self
    }

    /// Returns true if a converter exists for `kind`.
    #[must_use]
    pub fn can_convert(&self, kind: FieldKind) -> bool {
        self.converters.contains_key(&kind)
    }

    /// Converts with the registered converter, else the default string form.
    #[must_use]
    pub fn convert_to_string(&self, value: &FieldValue) -> String {
        match self.converters.get(&value.kind()) {
            Some(converter) => converter(value),
            None => value.to_string(),
        }
    }
}

impl fmt::Debug for ConversionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionRegistry")
            .field("kinds", &self.converters.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn test_default_string_form() {
        let registry = ConversionRegistry::new();
        assert_eq!(registry.convert_to_string(&FieldValue::Integer(7)), "7");
        assert_eq!(registry.convert_to_string(&FieldValue::Text("abc".into())), "abc");
        assert!(!registry.can_convert(FieldKind::DateTime));
    }

    #[test]
    fn test_date_time_converters() {
        let registry = ConversionRegistry::with_defaults();
        let utc = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(
            registry.convert_to_string(&FieldValue::DateTime(utc)),
            "2024-03-01T12:30:00.000Z"
        );

        let local = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 5, 9)
            .unwrap();
        assert_eq!(
            registry.convert_to_string(&FieldValue::LocalDateTime(local)),
            "2024-03-01T08:05:09.000"
        );
    }

    #[test]
    fn test_custom_converter_overrides() {
        let registry = ConversionRegistry::new()
            .register(FieldKind::Bool, |v| if v.to_string() == "true" { "Y".into() } else { "N".into() });
        assert_eq!(registry.convert_to_string(&FieldValue::Bool(true)), "Y");
        assert_eq!(registry.convert_to_string(&FieldValue::Bool(false)), "N");
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One upstream record, as delivered by the data feed.
///
/// Only the key and label are typed; every other field is kept as raw JSON so
/// metrics can be selected by name at configuration time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "countryISO")]
    pub key: String,
    #[serde(rename = "country", default)]
    pub label: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl Entity {
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, name: &str, value: f64) -> Self {
        self.fields
            .insert(name.to_string(), serde_json::Value::from(value));
        self
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.fields
            .insert(name.to_string(), serde_json::Value::from(value));
        self
    }

    /// Numeric field by name. `null`, strings and non-finite values read as absent.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.fields
            .get(name)
            .and_then(|value| value.as_f64())
            .filter(|value| value.is_finite())
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|value| value.as_str())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Ratio metric computed per draw: `name = numerator / denominator`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetric {
    pub name: String,
    pub numerator: String,
    pub denominator: String,
}

impl DerivedMetric {
    pub fn ratio(name: &str, numerator: &str, denominator: &str) -> Self {
        Self {
            name: name.to_string(),
            numerator: numerator.to_string(),
            denominator: denominator.to_string(),
        }
    }

    pub fn evaluate(&self, entity: &Entity) -> Option<f64> {
        let numerator = entity.metric(&self.numerator)?;
        let denominator = entity.metric(&self.denominator)?;
        if denominator == 0.0 {
            return None;
        }
        Some(numerator / denominator).filter(|value| value.is_finite())
    }
}

/// Per-draw record: raw metrics plus derived ratios and the resolved group.
///
/// Built from an [`Entity`] without touching it, so the same input slice can
/// be drawn repeatedly with different configurations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedEntity {
    pub key: String,
    pub label: String,
    pub group: Option<String>,
    pub metrics: BTreeMap<String, f64>,
}

impl PreparedEntity {
    pub fn from_entity(entity: &Entity, derived: &[DerivedMetric], group: Option<String>) -> Self {
        let mut metrics: BTreeMap<String, f64> = entity
            .fields
            .keys()
            .filter_map(|name| entity.metric(name).map(|value| (name.clone(), value)))
            .collect();
        for metric in derived {
            match metric.evaluate(entity) {
                Some(value) => {
                    metrics.insert(metric.name.clone(), value);
                }
                None => {
                    metrics.remove(&metric.name);
                }
            }
        }
        Self {
            key: entity.key.clone(),
            label: entity.label.clone(),
            group,
            metrics,
        }
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

//! Country classification collaborator.
//!
//! The chart needs a region and an income group per country code; where
//! those come from is up to the caller. [`StaticMetadata`] is a table-backed
//! implementation for files and tests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryProfile {
    pub region: String,
    pub income_group: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("no metadata for country code `{code}`")]
    NotFound { code: String },
    #[error("failed to parse metadata table: {0}")]
    Parse(#[from] serde_json::Error),
}

pub trait MetadataLookup {
    fn lookup(&self, code: &str) -> Result<CountryProfile, LookupError>;
}

impl<L: MetadataLookup + ?Sized> MetadataLookup for &L {
    fn lookup(&self, code: &str) -> Result<CountryProfile, LookupError> {
        (**self).lookup(code)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticMetadata {
    profiles: BTreeMap<String, CountryProfile>,
}

impl StaticMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: &str, region: &str, income_group: &str) {
        self.profiles.insert(
            code.to_string(),
            CountryProfile {
                region: region.to_string(),
                income_group: income_group.to_string(),
            },
        );
    }

    pub fn from_json(raw: &str) -> Result<Self, LookupError> {
        let profiles: BTreeMap<String, CountryProfile> = serde_json::from_str(raw)?;
        Ok(Self { profiles })
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl MetadataLookup for StaticMetadata {
    fn lookup(&self, code: &str) -> Result<CountryProfile, LookupError> {
        self.profiles
            .get(code)
            .cloned()
            .ok_or_else(|| LookupError::NotFound {
                code: code.to_string(),
            })
    }
}

pub fn load_metadata(path: &Path) -> anyhow::Result<StaticMetadata> {
    use anyhow::Context;
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading metadata {}", path.display()))?;
    let table = StaticMetadata::from_json(&contents)
        .with_context(|| format!("parsing metadata {}", path.display()))?;
    log::debug!("loaded {} country profiles", table.len());
    Ok(table)
}

/// Which profile attribute a group field name refers to, if any.
pub fn profile_field<'a>(profile: &'a CountryProfile, field: &str) -> Option<&'a str> {
    match field {
        "region" => Some(profile.region.as_str()),
        "IncomeGroup" | "incomeGroup" | "income_group" => Some(profile.income_group.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_code_is_not_found() {
        let mut table = StaticMetadata::new();
        table.insert("FRA", "Europe & Central Asia", "High income");
        assert_eq!(table.lookup("FRA").unwrap().income_group, "High income");
        match table.lookup("XXX") {
            Err(LookupError::NotFound { code }) => assert_eq!(code, "XXX"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_profile_table() {
        let table = StaticMetadata::from_json(
            r#"{ "KEN": { "region": "Sub-Saharan Africa", "incomeGroup": "Lower middle income" } }"#,
        )
        .unwrap();
        let profile = table.lookup("KEN").unwrap();
        assert_eq!(profile_field(&profile, "region"), Some("Sub-Saharan Africa"));
        assert_eq!(profile_field(&profile, "IncomeGroup"), Some("Lower middle income"));
        assert_eq!(profile_field(&profile, "population"), None);
    }
}

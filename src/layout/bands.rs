use std::collections::{BTreeMap, BTreeSet};

use crate::config::{BandOrder, LayoutConfig};

use super::Band;

/// Equal-width horizontal slices, one per distinct group key.
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale {
    bands: Vec<Band>,
    index: BTreeMap<String, usize>,
}

impl BandScale {
    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn band(&self, key: &str) -> Option<&Band> {
        self.index.get(key).map(|&idx| &self.bands[idx])
    }

    pub fn center(&self, key: &str) -> Option<f64> {
        self.band(key).map(Band::center)
    }

    pub fn bandwidth(&self) -> f64 {
        self.bands.first().map(Band::height).unwrap_or(0.0)
    }
}

/// Distinct keys in first-seen order, or in `preferred` order when given.
///
/// Preferred keys absent from the data are skipped; present keys the
/// preferred list does not mention follow in first-seen order.
pub(super) fn ordered_groups<'a>(
    keys: impl IntoIterator<Item = &'a str>,
    preferred: Option<&[String]>,
) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut first_seen = Vec::new();
    for key in keys {
        if seen.insert(key) {
            first_seen.push(key.to_string());
        }
    }
    let Some(preferred) = preferred else {
        return first_seen;
    };
    let mut ordered: Vec<String> = Vec::with_capacity(first_seen.len());
    for key in preferred {
        if seen.contains(key.as_str()) && !ordered.contains(key) {
            ordered.push(key.clone());
        }
    }
    for key in first_seen {
        if !ordered.contains(&key) {
            ordered.push(key);
        }
    }
    ordered
}

pub(super) fn build_band_scale(groups: &[String], config: &LayoutConfig) -> BandScale {
    let (top, bottom) = config.y_range();
    let count = groups.len().max(1) as f64;
    let step = (bottom - top) / count;
    let last = groups.len().saturating_sub(1);

    let mut bands = Vec::with_capacity(groups.len());
    let mut index = BTreeMap::new();
    for (idx, key) in groups.iter().enumerate() {
        // slot 0 is the topmost slice
        let slot = match config.band_order {
            BandOrder::TopDown => idx,
            BandOrder::BottomUp => last - idx,
        };
        let band_top = top + step * slot as f64;
        let band_bottom = if slot == last {
            bottom
        } else {
            top + step * (slot + 1) as f64
        };
        index.insert(key.clone(), idx);
        bands.push(Band {
            key: key.clone(),
            top: band_top,
            bottom: band_bottom,
        });
    }
    BandScale { bands, index }
}

use crate::ir::DerivedMetric;
use crate::layout::ConfigurationError;
use crate::theme::Theme;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 20.0,
            right: 20.0,
            bottom: 25.0,
            left: 30.0,
        }
    }
}

/// Where the x scale takes its domain from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum XDomain {
    /// `[min, max]` of the x metric over the dataset.
    Extent,
    /// A fixed axis, e.g. `[0, 0.7]` for a percentage-of-population axis.
    Fixed([f64; 2]),
}

/// Where the radius scale takes its domain from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RadiusDomain {
    /// `[min, max]`: the smallest value maps to `minRadius`.
    Extent,
    /// `[0, max]`: a zero value maps to `minRadius`.
    Zero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BandOrder {
    /// First group at the bottom of the plot.
    BottomUp,
    TopDown,
}

/// Scalar parameters consumed by the layout engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfig {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
    pub min_radius: f64,
    pub max_radius: f64,
    pub padding: f64,
    pub x_domain: XDomain,
    pub radius_domain: RadiusDomain,
    pub band_order: BandOrder,
    pub group_order: Option<Vec<String>>,
    pub iterations: usize,
    pub cell_margin: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        ChartConfig::default().layout_config()
    }
}

impl LayoutConfig {
    /// Horizontal pixel range of the x axis.
    pub fn x_range(&self) -> (f64, f64) {
        (self.margin.left, self.width - self.margin.right)
    }

    /// Vertical pixel range covered by bands, top to bottom.
    pub fn y_range(&self) -> (f64, f64) {
        (self.margin.top, self.height - self.margin.bottom)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let scalars = [
            ("width", self.width),
            ("height", self.height),
            ("minRadius", self.min_radius),
            ("maxRadius", self.max_radius),
            ("padding", self.padding),
            ("cellMargin", self.cell_margin),
            ("margin.top", self.margin.top),
            ("margin.right", self.margin.right),
            ("margin.bottom", self.margin.bottom),
            ("margin.left", self.margin.left),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(ConfigurationError::NonFinite {
                    name: name.to_string(),
                });
            }
        }
        if self.min_radius < 0.0 || self.min_radius > self.max_radius {
            return Err(ConfigurationError::RadiusBounds {
                min: self.min_radius,
                max: self.max_radius,
            });
        }
        let (left, right) = self.x_range();
        let (top, bottom) = self.y_range();
        if right <= left || bottom <= top {
            return Err(ConfigurationError::PlotTooSmall {
                width: self.width,
                height: self.height,
            });
        }
        if let XDomain::Fixed([min, max]) = self.x_domain {
            if !min.is_finite() || !max.is_finite() || min >= max {
                return Err(ConfigurationError::InvalidDomain { min, max });
            }
        }
        Ok(())
    }
}

/// Built-in chart variants: one engine, different defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Variant {
    VaccinatedByRegion,
    VaccinatedByIncome,
    FullyVaccinatedByRegion,
    DosesByIncome,
}

/// Every knob of a chart draw. Deserialises from partial JSON; missing keys
/// keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartConfig {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
    pub min_radius: f64,
    pub max_radius: f64,
    pub padding: f64,
    pub r_metric: String,
    pub x_metric: String,
    pub y_metric: String,
    pub x_domain: XDomain,
    pub radius_domain: RadiusDomain,
    pub band_order: BandOrder,
    pub group_order: Option<Vec<String>>,
    pub iterations: usize,
    pub cell_margin: f64,
    pub name_padding: f64,
    pub name_padding_bottom: f64,
    pub tick_step: f64,
    pub tick_text: String,
    pub derived: Vec<DerivedMetric>,
    pub theme: Theme,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 700.0,
            margin: Margin::default(),
            min_radius: 1.0,
            max_radius: 35.0,
            padding: 1.0,
            r_metric: "peopleVaccinated".to_string(),
            x_metric: "peopleVaccinatedPerPopulation".to_string(),
            y_metric: "region".to_string(),
            x_domain: XDomain::Fixed([0.0, 0.7]),
            radius_domain: RadiusDomain::Extent,
            band_order: BandOrder::BottomUp,
            group_order: None,
            iterations: 500,
            cell_margin: 1.0,
            name_padding: 5.0,
            name_padding_bottom: 15.0,
            tick_step: 0.2,
            tick_text: "% of population".to_string(),
            derived: vec![
                DerivedMetric::ratio(
                    "peopleVaccinatedPerPopulation",
                    "peopleVaccinated",
                    "population",
                ),
                DerivedMetric::ratio(
                    "peopleFullyVaccinatedPerPopulation",
                    "peopleFullyVaccinated",
                    "population",
                ),
                DerivedMetric::ratio("dosesPerPopulation", "totalDoses", "population"),
            ],
            theme: Theme::default(),
        }
    }
}

impl ChartConfig {
    pub fn for_variant(variant: Variant) -> Self {
        let base = Self::default();
        match variant {
            Variant::VaccinatedByRegion => base,
            Variant::VaccinatedByIncome => Self {
                y_metric: "IncomeGroup".to_string(),
                group_order: Some(vec![
                    "Low income".to_string(),
                    "Lower middle income".to_string(),
                    "Upper middle income".to_string(),
                    "High income".to_string(),
                ]),
                height: 500.0,
                ..base
            },
            Variant::FullyVaccinatedByRegion => Self {
                r_metric: "peopleFullyVaccinated".to_string(),
                x_metric: "peopleFullyVaccinatedPerPopulation".to_string(),
                ..base
            },
            Variant::DosesByIncome => Self {
                r_metric: "totalDoses".to_string(),
                x_metric: "dosesPerPopulation".to_string(),
                y_metric: "IncomeGroup".to_string(),
                x_domain: XDomain::Extent,
                tick_step: 0.5,
                tick_text: " doses per 100 people".to_string(),
                height: 500.0,
                ..base
            },
        }
    }

    pub fn layout_config(&self) -> LayoutConfig {
        LayoutConfig {
            width: self.width,
            height: self.height,
            margin: self.margin,
            min_radius: self.min_radius,
            max_radius: self.max_radius,
            padding: self.padding,
            x_domain: self.x_domain,
            radius_domain: self.radius_domain,
            band_order: self.band_order,
            group_order: self.group_order.clone(),
            iterations: self.iterations,
            cell_margin: self.cell_margin,
        }
    }

    /// Deep-merge a partial JSON override onto this config.
    pub fn merged(&self, patch: Value) -> Result<Self, serde_json::Error> {
        let mut base = serde_json::to_value(self)?;
        merge_values(&mut base, patch);
        serde_json::from_value(base)
    }
}

/// Objects merge key-wise; arrays, scalars and `null` replace outright.
pub fn merge_values(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, patch_value) in patch_map {
                match base_map.get_mut(&key) {
                    Some(base_value) => merge_values(base_value, patch_value),
                    None => {
                        base_map.insert(key, patch_value);
                    }
                }
            }
        }
        (base, patch) => *base = patch,
    }
}

/// Load a JSON/JSON5 config file and merge it onto the chosen variant.
///
/// A `"variant"` key inside the file selects the base preset unless
/// `variant` is given explicitly.
pub fn load_config(path: Option<&Path>, variant: Option<Variant>) -> anyhow::Result<ChartConfig> {
    let Some(path) = path else {
        return Ok(ChartConfig::for_variant(
            variant.unwrap_or(Variant::VaccinatedByRegion),
        ));
    };

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let mut patch: Value = json5::from_str(&contents)
        .with_context(|| format!("parsing config {}", path.display()))?;

    let file_variant = match patch.as_object_mut().and_then(|map| map.remove("variant")) {
        Some(raw) => Some(serde_json::from_value::<Variant>(raw).context("unknown variant")?),
        None => None,
    };
    let base = ChartConfig::for_variant(
        variant
            .or(file_variant)
            .unwrap_or(Variant::VaccinatedByRegion),
    );
    let config = base
        .merged(patch)
        .with_context(|| format!("applying config {}", path.display()))?;
    log::debug!(
        "config: r={} x={} y={} iterations={}",
        config.r_metric,
        config.x_metric,
        config.y_metric,
        config.iterations
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_objects_merge_key_wise() {
        let config = ChartConfig::default()
            .merged(json!({ "margin": { "left": 50 }, "maxRadius": 20 }))
            .unwrap();
        assert_eq!(config.margin.left, 50.0);
        assert_eq!(config.margin.top, 20.0);
        assert_eq!(config.margin.bottom, 25.0);
        assert_eq!(config.max_radius, 20.0);
        assert_eq!(config.r_metric, "peopleVaccinated");
    }

    #[test]
    fn arrays_replace_outright() {
        let config = ChartConfig::default()
            .merged(json!({
                "derived": [{ "name": "share", "numerator": "a", "denominator": "b" }],
                "xDomain": { "fixed": [0, 1] }
            }))
            .unwrap();
        assert_eq!(config.derived, vec![DerivedMetric::ratio("share", "a", "b")]);
        assert_eq!(config.x_domain, XDomain::Fixed([0.0, 1.0]));
    }

    #[test]
    fn domain_modes_parse_from_strings() {
        let config = ChartConfig::default()
            .merged(json!({ "xDomain": "extent", "radiusDomain": "zero", "bandOrder": "topDown" }))
            .unwrap();
        assert_eq!(config.x_domain, XDomain::Extent);
        assert_eq!(config.radius_domain, RadiusDomain::Zero);
        assert_eq!(config.band_order, BandOrder::TopDown);
    }

    #[test]
    fn theme_merges_inside_config() {
        let config = ChartConfig::default()
            .merged(json!({ "theme": { "highlightFill": "red" } }))
            .unwrap();
        assert_eq!(config.theme.highlight_fill, "red");
        assert_eq!(config.theme.fill, Theme::dark().fill);
    }

    #[test]
    fn stale_tooltip_text_key_is_ignored() {
        let config = ChartConfig::default()
            .merged(json!({ "tooltipText": "of population", "padding": 3 }))
            .unwrap();
        assert_eq!(config.padding, 3.0);
        let value = serde_json::to_value(&config).unwrap();
        assert!(value.get("tooltipText").is_none());
    }

    #[test]
    fn variants_share_the_engine_defaults() {
        let income = ChartConfig::for_variant(Variant::VaccinatedByIncome);
        assert_eq!(income.y_metric, "IncomeGroup");
        assert_eq!(income.max_radius, 35.0);
        let doses = ChartConfig::for_variant(Variant::DosesByIncome);
        assert_eq!(doses.x_domain, XDomain::Extent);
        assert_eq!(doses.iterations, 500);
    }

    #[test]
    fn rejects_inverted_radius_bounds() {
        let mut layout = LayoutConfig::default();
        layout.min_radius = 40.0;
        assert!(matches!(
            layout.validate(),
            Err(ConfigurationError::RadiusBounds { .. })
        ));
    }

    #[test]
    fn rejects_plot_smaller_than_margins() {
        let mut layout = LayoutConfig::default();
        layout.width = 40.0;
        assert!(matches!(
            layout.validate(),
            Err(ConfigurationError::PlotTooSmall { .. })
        ));
    }

    #[test]
    fn loads_json5_file_with_variant() {
        let dir = std::env::temp_dir().join(format!("bubble-swarm-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("chart.json5");
        std::fs::write(
            &path,
            "{\n  // income bands\n  variant: 'vaccinatedByIncome',\n  padding: 2,\n}\n",
        )
        .unwrap();
        let config = load_config(Some(&path), None).unwrap();
        assert_eq!(config.y_metric, "IncomeGroup");
        assert_eq!(config.padding, 2.0);

        let config = load_config(Some(&path), Some(Variant::DosesByIncome)).unwrap();
        assert_eq!(config.x_metric, "dosesPerPopulation");
        assert_eq!(config.padding, 2.0);
        std::fs::remove_dir_all(&dir).ok();
    }
}

use bubble_swarm::layout_dump::LayoutDump;
use bubble_swarm::{BubbleChart, BubbleLayout, ChartConfig, Entity, StaticMetadata, Variant, render_svg};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BubbleOptions {
    variant: Option<Variant>,
    /// Partial chart config merged over the variant defaults.
    config: Option<serde_json::Value>,
    drop_incomplete: Option<bool>,
}

fn parse_options(options_json: Option<String>) -> Result<BubbleOptions, String> {
    match options_json {
        Some(raw) => serde_json::from_str(&raw).map_err(|error| error.to_string()),
        None => Ok(BubbleOptions::default()),
    }
}

fn build_config(options: &BubbleOptions) -> Result<ChartConfig, String> {
    let base = ChartConfig::for_variant(options.variant.unwrap_or(Variant::VaccinatedByRegion));
    match options.config.clone() {
        Some(patch) => base.merged(patch).map_err(|error| error.to_string()),
        None => Ok(base),
    }
}

fn draw(
    records_json: &str,
    metadata_json: Option<String>,
    options: &BubbleOptions,
) -> Result<(BubbleLayout, ChartConfig), String> {
    let entities: Vec<Entity> =
        serde_json::from_str(records_json).map_err(|error| error.to_string())?;
    let metadata = metadata_json
        .map(|raw| StaticMetadata::from_json(&raw))
        .transpose()
        .map_err(|error| error.to_string())?;
    let config = build_config(options)?;

    let mut chart = BubbleChart::new(config.clone());
    if let Some(table) = metadata.as_ref() {
        chart = chart.with_lookup(table);
    }
    let mut prepared = chart.prepare(&entities).map_err(|error| error.to_string())?;
    if options.drop_incomplete.unwrap_or(false) {
        prepared = chart.filter_complete(prepared);
    }
    let layout = chart.layout(&prepared).map_err(|error| error.to_string())?;
    Ok((layout, config))
}

#[wasm_bindgen]
pub fn layout_bubbles_json(
    records_json: &str,
    metadata_json: Option<String>,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    let options = parse_options(options_json).map_err(|error| JsValue::from_str(&error))?;
    let (layout, _) =
        draw(records_json, metadata_json, &options).map_err(|error| JsValue::from_str(&error))?;
    serde_json::to_string(&LayoutDump::from_layout(&layout))
        .map_err(|error| JsValue::from_str(&error.to_string()))
}

#[wasm_bindgen]
pub fn render_bubbles_svg(
    records_json: &str,
    metadata_json: Option<String>,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    let options = parse_options(options_json).map_err(|error| JsValue::from_str(&error))?;
    let (layout, config) =
        draw(records_json, metadata_json, &options).map_err(|error| JsValue::from_str(&error))?;
    Ok(render_svg(&layout, &config))
}

#[cfg(test)]
mod tests {
    use crate::{draw, parse_options};

    const RECORDS: &str = r#"[
        {"countryISO": "AAA", "country": "Alpha", "peopleVaccinated": 600, "population": 1000},
        {"countryISO": "BBB", "country": "Beta", "peopleVaccinated": 50, "population": 1000},
        {"countryISO": "CCC", "country": "Gamma", "peopleVaccinated": null, "population": 1000}
    ]"#;

    const METADATA: &str = r#"{
        "AAA": {"region": "Europe", "incomeGroup": "High income"},
        "BBB": {"region": "Africa", "incomeGroup": "Low income"},
        "CCC": {"region": "Africa", "incomeGroup": "Low income"}
    }"#;

    #[test]
    fn draws_with_options_and_metadata() {
        let options = parse_options(Some(
            r#"{"variant": "vaccinatedByIncome", "dropIncomplete": true, "config": {"width": 600}}"#
                .to_string(),
        ))
        .unwrap();
        let (layout, config) = draw(RECORDS, Some(METADATA.to_string()), &options).unwrap();
        assert_eq!(config.width, 600.0);
        assert_eq!(layout.bubbles.len(), 2);
        assert_eq!(layout.bands[0].key, "Low income");
    }

    #[test]
    fn incomplete_records_fail_without_the_flag() {
        let options = parse_options(None).unwrap();
        let err = draw(RECORDS, Some(METADATA.to_string()), &options).unwrap_err();
        assert!(err.contains("CCC"));
    }
}

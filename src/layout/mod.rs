mod bands;
mod error;
mod relax;
mod scale;
pub(crate) mod types;
mod voronoi;
pub use bands::BandScale;
pub use error::*;
pub use relax::{Body, RelaxReport, Simulation};
pub use scale::{LinearScale, SqrtScale};
pub use types::*;
pub use voronoi::Tessellation;
use bands::*;
use scale::*;
use voronoi::*;

use crate::config::LayoutConfig;
use std::collections::BTreeSet;

/// Residual overlap above which a finished run is worth a warning.
const OVERLAP_TOLERANCE: f64 = 0.5;

struct Record {
    key: String,
    label: String,
    group: String,
    radius_value: f64,
    x_value: f64,
}

/// Scale, band, relax and tessellate `items` in one synchronous pass.
///
/// Every input is checked before the simulation starts, so a failed draw
/// never leaves partial positions behind.
pub fn compute_layout<T>(
    items: &[T],
    encoding: &Encoding<'_, T>,
    config: &LayoutConfig,
) -> Result<BubbleLayout, LayoutError> {
    config.validate()?;
    if items.is_empty() {
        return Err(ConfigurationError::EmptyDataset.into());
    }
    let records = collect_records(items, encoding)?;

    let radius_values: Vec<f64> = records.iter().map(|r| r.radius_value).collect();
    let x_values: Vec<f64> = records.iter().map(|r| r.x_value).collect();
    let radius_scale = build_radius_scale(&radius_values, config)?;
    let x_scale = build_x_scale(&x_values, config)?;
    log::debug!(
        "scales: radius {:?} -> {:?}, x {:?} -> {:?}",
        radius_scale.domain,
        radius_scale.range,
        x_scale.domain,
        x_scale.range
    );

    let groups = ordered_groups(
        records.iter().map(|r| r.group.as_str()),
        config.group_order.as_deref(),
    );
    let band_scale = build_band_scale(&groups, config);
    log::debug!(
        "{} bands of height {:.2}",
        band_scale.bands().len(),
        band_scale.bandwidth()
    );

    let mut radii = Vec::with_capacity(records.len());
    let mut bodies = Vec::with_capacity(records.len());
    for record in &records {
        let radius = radius_scale.apply(record.radius_value);
        let target_y = band_scale.center(&record.group).unwrap_or(f64::NAN);
        bodies.push(Body::new(
            &record.key,
            x_scale.apply(record.x_value),
            target_y,
            radius + config.padding,
        ));
        radii.push(radius);
    }

    let (bodies, report) = Simulation::new(bodies)?.run(config.iterations);
    log::debug!(
        "relaxed {} bubbles in {} steps, max overlap {:.4}",
        bodies.len(),
        report.iterations,
        report.max_overlap
    );
    if report.max_overlap > OVERLAP_TOLERANCE {
        log::warn!(
            "bubbles still overlap by up to {:.2} after {} steps",
            report.max_overlap,
            report.iterations
        );
    }

    let centers: Vec<(f64, f64)> = bodies.iter().map(|body| (body.x, body.y)).collect();
    let keys: Vec<String> = records.iter().map(|r| r.key.clone()).collect();
    let margin = config.cell_margin;
    let bounds = Rect::new(-margin, -margin, config.width + margin, config.height + margin);
    let tessellation = build_tessellation(&centers, &keys, bounds)?;

    let bubbles = assemble_bubbles(records, bodies, radii, &tessellation.sites);

    Ok(BubbleLayout {
        width: config.width,
        height: config.height,
        bubbles,
        bands: band_scale.bands().to_vec(),
        tessellation,
        radius_scale,
        x_scale,
        report,
    })
}

/// Bubbles sit on their tessellation sites, so a nudged duplicate reports
/// the center its own cell was built around.
fn assemble_bubbles(
    records: Vec<Record>,
    bodies: Vec<Body>,
    radii: Vec<f64>,
    sites: &[(f64, f64)],
) -> Vec<Bubble> {
    records
        .into_iter()
        .zip(bodies)
        .zip(radii)
        .zip(sites)
        .map(|(((record, body), radius), &(x, y))| Bubble {
            key: record.key,
            label: record.label,
            group: record.group,
            radius_value: record.radius_value,
            x_value: record.x_value,
            radius,
            target_x: body.target_x,
            target_y: body.target_y,
            x,
            y,
        })
        .collect()
}

fn collect_records<T>(items: &[T], encoding: &Encoding<'_, T>) -> Result<Vec<Record>, LayoutError> {
    let mut seen = BTreeSet::new();
    let mut records = Vec::with_capacity(items.len());
    for item in items {
        let key = (encoding.key)(item);
        let invalid = |field| LayoutError::InvalidInput {
            key: key.clone(),
            field,
        };
        let radius_value = (encoding.radius)(item)
            .filter(|v| v.is_finite())
            .ok_or_else(|| invalid(Field::Radius))?;
        let x_value = (encoding.x)(item)
            .filter(|v| v.is_finite())
            .ok_or_else(|| invalid(Field::X))?;
        let group = (encoding.group)(item)
            .filter(|g| !g.trim().is_empty())
            .ok_or_else(|| invalid(Field::Group))?;
        if !seen.insert(key.clone()) {
            return Err(LayoutError::DuplicateKey { key });
        }
        records.push(Record {
            label: (encoding.label)(item),
            key,
            group,
            radius_value,
            x_value,
        });
    }
    Ok(records)
}

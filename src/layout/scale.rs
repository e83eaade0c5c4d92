use serde::Serialize;

use crate::config::{LayoutConfig, RadiusDomain, XDomain};

use super::ConfigurationError;

/// Upper bound on axis ticks, before the closing tick at `hi`.
const MAX_TICKS: f64 = 20.0;

/// Square-root scale: visual area, not radius, grows linearly with the value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SqrtScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl SqrtScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self {
            domain: widen_point_domain(domain),
            range,
        }
    }

    pub fn apply(&self, value: f64) -> f64 {
        let (d0, d1) = (signed_sqrt(self.domain.0), signed_sqrt(self.domain.1));
        let t = if d1 == d0 {
            0.0
        } else {
            (signed_sqrt(value) - d0) / (d1 - d0)
        };
        clamp_to_range(lerp(self.range, t), self.range)
    }
}

/// Linear scale clamped to its range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self {
            domain: widen_point_domain(domain),
            range,
        }
    }

    pub fn apply(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let t = if d1 == d0 { 0.0 } else { (value - d0) / (d1 - d0) };
        clamp_to_range(lerp(self.range, t), self.range)
    }

    /// Domain values at multiples of `step` inside the domain.
    ///
    /// A domain wider than `MAX_TICKS` steps widens the step to a 1/2/5 multiple
    /// of itself, so every tick is still a multiple of `step`.
    pub fn ticks(&self, step: f64) -> Vec<f64> {
        if !(step.is_finite() && step > 0.0) {
            return Vec::new();
        }
        let (lo, hi) = (
            self.domain.0.min(self.domain.1),
            self.domain.0.max(self.domain.1),
        );
        if !(lo.is_finite() && hi.is_finite()) {
            return Vec::new();
        }
        let step = step * nice_multiple((hi - lo) / step / MAX_TICKS);
        let first = (lo / step - 1e-9).ceil() as i64;
        let last = (hi / step + 1e-9).floor() as i64;
        (first..=last)
            .map(|k| ((k as f64 * step) * 1e9).round() / 1e9)
            .collect()
    }
}

/// Smallest 1, 2 or 5 times a power of ten that is at least `ratio`.
fn nice_multiple(ratio: f64) -> f64 {
    if !(ratio > 1.0) || !ratio.is_finite() {
        return 1.0;
    }
    let magnitude = 10f64.powi(ratio.log10().floor() as i32);
    let fraction = ratio / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn signed_sqrt(value: f64) -> f64 {
    if value < 0.0 {
        -(-value).sqrt()
    } else {
        value.sqrt()
    }
}

fn lerp(range: (f64, f64), t: f64) -> f64 {
    range.0 + (range.1 - range.0) * t
}

fn clamp_to_range(value: f64, range: (f64, f64)) -> f64 {
    value.clamp(range.0.min(range.1), range.0.max(range.1))
}

/// A zero-width domain `[v, v]` becomes `[0, v]` (or `[v, 0]` for negative v).
/// `[0, 0]` stays degenerate and maps everything to the range start.
fn widen_point_domain(domain: (f64, f64)) -> (f64, f64) {
    if domain.0 != domain.1 {
        return domain;
    }
    let value = domain.0;
    (value.min(0.0), value.max(0.0))
}

fn extent(values: &[f64]) -> Result<(f64, f64), ConfigurationError> {
    let mut iter = values.iter().copied();
    let first = iter.next().ok_or(ConfigurationError::EmptyDataset)?;
    Ok(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

pub(super) fn build_radius_scale(
    values: &[f64],
    config: &LayoutConfig,
) -> Result<SqrtScale, ConfigurationError> {
    let (lo, hi) = extent(values)?;
    let domain = match config.radius_domain {
        RadiusDomain::Extent => (lo, hi),
        RadiusDomain::Zero => (0.0_f64.min(lo), hi.max(0.0)),
    };
    Ok(SqrtScale::new(domain, (config.min_radius, config.max_radius)))
}

pub(super) fn build_x_scale(
    values: &[f64],
    config: &LayoutConfig,
) -> Result<LinearScale, ConfigurationError> {
    let domain = match config.x_domain {
        XDomain::Fixed([min, max]) => (min, max),
        XDomain::Extent => extent(values)?,
    };
    Ok(LinearScale::new(domain, config.x_range()))
}

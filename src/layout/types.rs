use serde::Serialize;

use super::{LinearScale, RelaxReport, SqrtScale, Tessellation};

/// One horizontal slice of the plot, keyed by a group value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Band {
    pub key: String,
    pub top: f64,
    pub bottom: f64,
}

impl Band {
    pub fn center(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn contains_y(&self, y: f64) -> bool {
        y >= self.top && y <= self.bottom
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn contains(&self, point: (f64, f64)) -> bool {
        point.0 >= self.x0 && point.0 <= self.x1 && point.1 >= self.y0 && point.1 <= self.y1
    }

    pub fn including(self, point: (f64, f64)) -> Self {
        Self {
            x0: self.x0.min(point.0),
            y0: self.y0.min(point.1),
            x1: self.x1.max(point.0),
            y1: self.y1.max(point.1),
        }
    }

    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.x0, self.y0),
            (self.x1, self.y0),
            (self.x1, self.y1),
            (self.x0, self.y1),
        ]
    }
}

/// Hover target for one bubble: its Voronoi cell, clipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HitCell {
    pub index: usize,
    pub key: String,
    /// Ordered vertices; the closing edge back to the first vertex is implied.
    pub polygon: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bubble {
    pub key: String,
    pub label: String,
    pub group: String,
    pub radius_value: f64,
    pub x_value: f64,
    pub radius: f64,
    pub target_x: f64,
    pub target_y: f64,
    pub x: f64,
    pub y: f64,
}

/// Everything one draw produces. Rebuilt from scratch on every draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BubbleLayout {
    pub width: f64,
    pub height: f64,
    pub bubbles: Vec<Bubble>,
    pub bands: Vec<Band>,
    pub tessellation: Tessellation,
    pub radius_scale: SqrtScale,
    pub x_scale: LinearScale,
    pub report: RelaxReport,
}

impl BubbleLayout {
    pub fn cells(&self) -> &[HitCell] {
        &self.tessellation.cells
    }

    pub fn bubble(&self, key: &str) -> Option<&Bubble> {
        self.bubbles.iter().find(|bubble| bubble.key == key)
    }

    pub fn band(&self, key: &str) -> Option<&Band> {
        self.bands.iter().find(|band| band.key == key)
    }

    /// Index of the bubble whose hover cell contains `point`.
    pub fn locate(&self, point: (f64, f64)) -> Option<usize> {
        self.tessellation.locate(point)
    }
}

/// Accessors that select which fields of `T` drive the layout.
pub struct Encoding<'a, T> {
    pub key: Box<dyn Fn(&T) -> String + 'a>,
    pub label: Box<dyn Fn(&T) -> String + 'a>,
    pub radius: Box<dyn Fn(&T) -> Option<f64> + 'a>,
    pub x: Box<dyn Fn(&T) -> Option<f64> + 'a>,
    pub group: Box<dyn Fn(&T) -> Option<String> + 'a>,
}

impl<'a> Encoding<'a, crate::ir::PreparedEntity> {
    /// Encoding for prepared records with metrics selected by name.
    pub fn named(radius_metric: &'a str, x_metric: &'a str) -> Self {
        Self {
            key: Box::new(|entity| entity.key.clone()),
            label: Box::new(|entity| entity.label.clone()),
            radius: Box::new(move |entity| entity.metric(radius_metric)),
            x: Box::new(move |entity| entity.metric(x_metric)),
            group: Box::new(|entity| entity.group.clone()),
        }
    }
}

//! Pointer highlighting over the hit-cell overlay.
//!
//! The dispatcher maps a cell index to the visual changes for its bubble. It
//! keeps no highlight register; the renderer applies each update as it comes.

use serde::Serialize;

use crate::config::ChartConfig;
use crate::layout::{Bubble, BubbleLayout};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HighlightState {
    Normal,
    Highlighted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverLabel {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoverUpdate {
    pub index: usize,
    pub key: String,
    pub state: HighlightState,
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    pub name: HoverLabel,
    pub value: HoverLabel,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HoverError {
    #[error("cell {index} does not exist (layout has {count} cells)")]
    UnknownCell { index: usize, count: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct HoverStyle {
    pub name_padding: f64,
    pub name_padding_bottom: f64,
    pub fill: String,
    pub stroke: String,
    pub highlight_fill: String,
    pub highlight_stroke: String,
    pub highlight_stroke_width: f64,
    pub group_fills: std::collections::BTreeMap<String, String>,
}

impl HoverStyle {
    pub fn from_config(config: &ChartConfig) -> Self {
        let theme = &config.theme;
        Self {
            name_padding: config.name_padding,
            name_padding_bottom: config.name_padding_bottom,
            fill: theme.fill.clone(),
            stroke: theme.stroke.clone(),
            highlight_fill: theme.highlight_fill.clone(),
            highlight_stroke: theme.highlight_stroke.clone(),
            highlight_stroke_width: theme.highlight_stroke_width,
            group_fills: theme.group_fills.clone(),
        }
    }
}

pub struct HoverDispatcher<'a> {
    layout: &'a BubbleLayout,
    style: HoverStyle,
}

impl<'a> HoverDispatcher<'a> {
    pub fn new(layout: &'a BubbleLayout, style: HoverStyle) -> Self {
        Self { layout, style }
    }

    pub fn pointer_enter(&self, index: usize) -> Result<HoverUpdate, HoverError> {
        let bubble = self.bubble(index)?;
        let offset = bubble.radius;
        Ok(HoverUpdate {
            index,
            key: bubble.key.clone(),
            state: HighlightState::Highlighted,
            fill: self.style.highlight_fill.clone(),
            stroke: self.style.highlight_stroke.clone(),
            stroke_width: self.style.highlight_stroke_width,
            name: HoverLabel {
                text: bubble.label.clone(),
                x: bubble.x,
                y: bubble.y - offset - self.style.name_padding,
            },
            value: HoverLabel {
                text: format_share(bubble.x_value),
                x: bubble.x,
                y: bubble.y + offset + self.style.name_padding_bottom,
            },
        })
    }

    pub fn pointer_leave(&self, index: usize) -> Result<HoverUpdate, HoverError> {
        let bubble = self.bubble(index)?;
        let fill = self
            .style
            .group_fills
            .get(&bubble.group)
            .unwrap_or(&self.style.fill)
            .clone();
        Ok(HoverUpdate {
            index,
            key: bubble.key.clone(),
            state: HighlightState::Normal,
            fill,
            stroke: self.style.stroke.clone(),
            stroke_width: 1.0,
            name: HoverLabel {
                text: String::new(),
                x: bubble.x,
                y: bubble.y,
            },
            value: HoverLabel {
                text: String::new(),
                x: bubble.x,
                y: bubble.y,
            },
        })
    }

    /// Highlight whichever bubble owns the cell under `point`.
    pub fn pointer_at(&self, point: (f64, f64)) -> Option<HoverUpdate> {
        let index = self.layout.locate(point)?;
        self.pointer_enter(index).ok()
    }

    fn bubble(&self, index: usize) -> Result<&'a Bubble, HoverError> {
        self.layout
            .bubbles
            .get(index)
            .ok_or(HoverError::UnknownCell {
                index,
                count: self.layout.bubbles.len(),
            })
    }
}

/// Share as a percentage truncated to one decimal: `0.4567` -> `45.6%`.
pub fn format_share(value: f64) -> String {
    let tenths = (value * 1000.0).trunc() / 10.0;
    format!("{tenths}%")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::BubbleChart;
    use crate::ir::Entity;

    fn layout() -> (BubbleLayout, ChartConfig) {
        let config = ChartConfig::default();
        let entities = vec![
            Entity::new("AAA", "Alpha")
                .with_metric("peopleVaccinated", 450.0)
                .with_metric("population", 1000.0)
                .with_attribute("region", "North"),
            Entity::new("BBB", "Beta")
                .with_metric("peopleVaccinated", 120.0)
                .with_metric("population", 1000.0)
                .with_attribute("region", "South"),
        ];
        let layout = BubbleChart::new(config.clone()).draw(&entities).unwrap();
        (layout, config)
    }

    #[test]
    fn formats_truncated_percentages() {
        assert_eq!(format_share(0.4567), "45.6%");
        assert_eq!(format_share(0.5), "50%");
        assert_eq!(format_share(0.0), "0%");
        assert_eq!(format_share(0.12999), "12.9%");
    }

    #[test]
    fn enter_reveals_labels_around_the_bubble() {
        let (layout, config) = layout();
        let dispatcher = HoverDispatcher::new(&layout, HoverStyle::from_config(&config));
        let update = dispatcher.pointer_enter(0).unwrap();
        let bubble = &layout.bubbles[0];
        assert_eq!(update.state, HighlightState::Highlighted);
        assert_eq!(update.key, "AAA");
        assert_eq!(update.name.text, "Alpha");
        assert_eq!(update.value.text, "45%");
        assert_eq!(update.name.y, bubble.y - bubble.radius - 5.0);
        assert_eq!(update.value.y, bubble.y + bubble.radius + 15.0);
        assert_eq!(update.fill, config.theme.highlight_fill);
    }

    #[test]
    fn leave_clears_labels() {
        let (layout, config) = layout();
        let dispatcher = HoverDispatcher::new(&layout, HoverStyle::from_config(&config));
        dispatcher.pointer_enter(1).unwrap();
        let update = dispatcher.pointer_leave(1).unwrap();
        assert_eq!(update.state, HighlightState::Normal);
        assert!(update.name.text.is_empty());
        assert!(update.value.text.is_empty());
        assert_eq!(update.fill, config.theme.fill);
    }

    #[test]
    fn pointer_resolves_through_cells() {
        let (layout, config) = layout();
        let dispatcher = HoverDispatcher::new(&layout, HoverStyle::from_config(&config));
        let beta = &layout.bubbles[1];
        let update = dispatcher.pointer_at((beta.x + 1.0, beta.y)).unwrap();
        assert_eq!(update.key, "BBB");
        assert!(dispatcher.pointer_at((-500.0, -500.0)).is_none());
    }

    #[test]
    fn unknown_cell_is_an_error() {
        let (layout, config) = layout();
        let dispatcher = HoverDispatcher::new(&layout, HoverStyle::from_config(&config));
        assert_eq!(
            dispatcher.pointer_leave(9),
            Err(HoverError::UnknownCell { index: 9, count: 2 })
        );
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f64,
    pub fill: String,
    pub stroke: String,
    pub highlight_fill: String,
    pub highlight_stroke: String,
    pub highlight_stroke_width: f64,
    pub text_color: String,
    pub grid_color: String,
    pub background: String,
    /// Per-group fill overrides; groups not listed use `fill`.
    pub group_fills: BTreeMap<String, String>,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            font_family: "Source Sans Pro, Helvetica, Arial, sans-serif".to_string(),
            font_size: 12.0,
            fill: "rgba(163, 190, 140, 0.5)".to_string(),
            stroke: "none".to_string(),
            highlight_fill: "rgba(163, 190, 140, 1)".to_string(),
            highlight_stroke: "white".to_string(),
            highlight_stroke_width: 1.0,
            text_color: "hsla(0,0%,100%,.75)".to_string(),
            grid_color: "hsla(0,0%,100%,.2)".to_string(),
            background: "#2E3440".to_string(),
            group_fills: BTreeMap::new(),
        }
    }

    pub fn light() -> Self {
        Self {
            font_family: "Source Sans Pro, Helvetica, Arial, sans-serif".to_string(),
            font_size: 12.0,
            fill: "rgba(94, 129, 172, 0.5)".to_string(),
            stroke: "none".to_string(),
            highlight_fill: "rgba(94, 129, 172, 1)".to_string(),
            highlight_stroke: "#2E3440".to_string(),
            highlight_stroke_width: 1.0,
            text_color: "#333333".to_string(),
            grid_color: "#DDDDDD".to_string(),
            background: "#FFFFFF".to_string(),
            group_fills: BTreeMap::new(),
        }
    }

    pub fn fill_for(&self, group: &str) -> &str {
        self.group_fills
            .get(group)
            .map(String::as_str)
            .unwrap_or(&self.fill)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

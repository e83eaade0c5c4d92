use crate::layout::{BubbleLayout, RelaxReport};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub width: f64,
    pub height: f64,
    pub bubbles: Vec<BubbleDump>,
    pub bands: Vec<BandDump>,
    pub cells: Vec<CellDump>,
    pub report: RelaxReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BubbleDump {
    pub key: String,
    pub label: String,
    pub group: String,
    pub radius_value: f64,
    pub x_value: f64,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub target_x: f64,
    pub target_y: f64,
}

#[derive(Debug, Serialize)]
pub struct BandDump {
    pub key: String,
    pub top: f64,
    pub bottom: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellDump {
    pub key: String,
    pub nudged: bool,
    pub points: Vec<[f64; 2]>,
}

impl LayoutDump {
    pub fn from_layout(layout: &BubbleLayout) -> Self {
        let bubbles = layout
            .bubbles
            .iter()
            .map(|bubble| BubbleDump {
                key: bubble.key.clone(),
                label: bubble.label.clone(),
                group: bubble.group.clone(),
                radius_value: bubble.radius_value,
                x_value: bubble.x_value,
                x: bubble.x,
                y: bubble.y,
                radius: bubble.radius,
                target_x: bubble.target_x,
                target_y: bubble.target_y,
            })
            .collect();

        let bands = layout
            .bands
            .iter()
            .map(|band| BandDump {
                key: band.key.clone(),
                top: band.top,
                bottom: band.bottom,
            })
            .collect();

        let nudged = &layout.tessellation.nudged;
        let cells = layout
            .cells()
            .iter()
            .map(|cell| CellDump {
                key: cell.key.clone(),
                nudged: nudged.contains(&cell.index),
                points: cell.polygon.iter().map(|(x, y)| [*x, *y]).collect(),
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            bubbles,
            bands,
            cells,
            report: layout.report,
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &BubbleLayout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

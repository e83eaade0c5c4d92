use crate::config::ChartConfig;
use crate::hover::HoverUpdate;
use crate::layout::{BubbleLayout, HitCell};
use anyhow::Result;
use std::path::Path;

pub fn render_svg(layout: &BubbleLayout, config: &ChartConfig) -> String {
    render_svg_with_hover(layout, config, None)
}

/// SVG preview of a layout; `hover` bakes one pointer update into the output.
pub fn render_svg_with_hover(
    layout: &BubbleLayout,
    config: &ChartConfig,
    hover: Option<&HoverUpdate>,
) -> String {
    let theme = &config.theme;
    let mut svg = String::new();
    let width = layout.width;
    let height = layout.height;

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    svg.push_str("<g class=\"axis x\">");
    let ticks = layout.x_scale.ticks(config.tick_step);
    let grid_bottom = height - config.margin.bottom;
    for (idx, tick) in ticks.iter().enumerate() {
        let x = layout.x_scale.apply(*tick);
        let mut label = format_tick(*tick);
        if idx + 1 == ticks.len() {
            label.push_str(&config.tick_text);
        }
        svg.push_str(&format!(
            "<line x1=\"{x:.2}\" y1=\"{:.2}\" x2=\"{x:.2}\" y2=\"{grid_bottom:.2}\" stroke=\"{}\" stroke-width=\"1\"/>",
            config.margin.top,
            theme.grid_color
        ));
        svg.push_str(&format!(
            "<text x=\"{x:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            config.margin.top - 6.0,
            theme.font_family,
            theme.font_size,
            theme.text_color,
            escape_xml(&label)
        ));
    }
    svg.push_str("</g>");

    svg.push_str("<g class=\"axis y\">");
    for band in &layout.bands {
        svg.push_str(&format!(
            "<text x=\"10\" y=\"{:.2}\" dominant-baseline=\"hanging\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            band.top + 10.0,
            theme.font_family,
            theme.font_size,
            theme.text_color,
            escape_xml(&band.key)
        ));
    }
    svg.push_str("</g>");

    svg.push_str("<g class=\"nodes\">");
    for (idx, bubble) in layout.bubbles.iter().enumerate() {
        let highlighted = hover.filter(|update| update.index == idx);
        let (fill, stroke, stroke_width) = match highlighted {
            Some(update) => (update.fill.as_str(), update.stroke.as_str(), update.stroke_width),
            None => (theme.fill_for(&bubble.group), theme.stroke.as_str(), 1.0),
        };
        svg.push_str(&format!(
            "<circle class=\"i-{}\" cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>",
            escape_xml(&bubble.key),
            bubble.x,
            bubble.y,
            bubble.radius,
            fill,
            stroke,
            stroke_width
        ));
    }
    svg.push_str("</g>");

    svg.push_str("<g class=\"cell-group\">");
    for cell in layout.cells() {
        svg.push_str(&format!(
            "<path class=\"cell\" data-key=\"{}\" d=\"{}\" fill=\"transparent\" style=\"opacity:0\"/>",
            escape_xml(&cell.key),
            cell_path(cell)
        ));
    }
    svg.push_str("</g>");

    let (name, value) = match hover {
        Some(update) => (Some(&update.name), Some(&update.value)),
        None => (None, None),
    };
    for (class, label) in [("hover-name", name), ("hover-population-number", value)] {
        let (x, y, text) = label
            .map(|l| (l.x, l.y, l.text.as_str()))
            .unwrap_or((0.0, 0.0, ""));
        svg.push_str(&format!(
            "<text class=\"{class}\" x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            theme.font_family,
            theme.font_size,
            theme.text_color,
            escape_xml(text)
        ));
    }

    svg.push_str("</svg>");
    svg
}

fn format_tick(value: f64) -> String {
    format!("{}", (value * 100.0).round())
}

fn cell_path(cell: &HitCell) -> String {
    let Some((first, rest)) = cell.polygon.split_first() else {
        return String::new();
    };
    let mut d = String::new();
    d.push_str(&format!("M{:.2},{:.2}", first.0, first.1));
    for point in rest {
        d.push_str(&format!("L{:.2},{:.2}", point.0, point.1));
    }
    d.push('Z');
    d
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, config: &ChartConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Source Sans Pro".to_string();
    opt.default_size = usvg::Size::from_wh(config.width as f32, config.height as f32)
        .or_else(|| usvg::Size::from_wh(800.0, 600.0))
        .ok_or_else(|| anyhow::anyhow!("Invalid default size"))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::BubbleChart;
    use crate::hover::{HoverDispatcher, HoverStyle};
    use crate::ir::Entity;

    fn sample() -> (BubbleLayout, ChartConfig) {
        let config = ChartConfig::default();
        let entities = vec![
            Entity::new("AAA", "Alpha & Co")
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
    fn render_svg_basic() {
        let (layout, config) = sample();
        let svg = render_svg(&layout, &config);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<circle").count(), 2);
        assert_eq!(svg.matches("class=\"cell\"").count(), 2);
        assert!(svg.contains("60% of population"));
        assert!(svg.contains(">North</text>"));
    }

    #[test]
    fn hover_state_is_baked_in() {
        let (layout, config) = sample();
        let dispatcher = HoverDispatcher::new(&layout, HoverStyle::from_config(&config));
        let update = dispatcher.pointer_enter(0).unwrap();
        let svg = render_svg_with_hover(&layout, &config, Some(&update));
        assert!(svg.contains("Alpha &amp; Co"));
        assert!(svg.contains(">45%</text>"));
        assert!(svg.contains(&format!("fill=\"{}\"", config.theme.highlight_fill)));
    }

    #[test]
    fn wide_extent_axis_draws_a_bounded_grid() {
        let config = ChartConfig::default()
            .merged(serde_json::json!({ "xMetric": "population", "xDomain": "extent" }))
            .unwrap();
        let entities = vec![
            Entity::new("AAA", "Alpha")
                .with_metric("peopleVaccinated", 450.0)
                .with_metric("population", 1_000.0)
                .with_attribute("region", "North"),
            Entity::new("BBB", "Beta")
                .with_metric("peopleVaccinated", 120.0)
                .with_metric("population", 2_000_000.0)
                .with_attribute("region", "South"),
        ];
        let layout = BubbleChart::new(config.clone()).draw(&entities).unwrap();
        let svg = render_svg(&layout, &config);
        let lines = svg.matches("<line").count();
        assert!((2..=21).contains(&lines), "{lines} grid lines");
    }

    #[test]
    fn cell_paths_are_closed() {
        let cell = HitCell {
            index: 0,
            key: "A".to_string(),
            polygon: vec![(0.0, 0.0), (10.0, 0.0), (10.0, 5.0)],
        };
        assert_eq!(cell_path(&cell), "M0.00,0.00L10.00,0.00L10.00,5.00Z");
    }
}

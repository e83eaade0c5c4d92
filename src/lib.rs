pub mod chart;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod hover;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod metadata;
pub mod render;
pub mod theme;

pub use chart::{BubbleChart, ChartError};
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{ChartConfig, LayoutConfig, Variant, load_config};
pub use hover::{HoverDispatcher, HoverStyle, HoverUpdate};
pub use ir::{Entity, PreparedEntity};
pub use layout::{BubbleLayout, Encoding, LayoutError, compute_layout};
pub use metadata::{MetadataLookup, StaticMetadata};
pub use render::render_svg;

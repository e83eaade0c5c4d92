use std::fmt;

/// Input attribute a layout run depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Radius,
    X,
    Group,
    TargetX,
    TargetY,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Radius => "the radius metric",
            Field::X => "the x metric",
            Field::Group => "the group key",
            Field::TargetX => "its target x",
            Field::TargetY => "its target y",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("minRadius {min} must be non-negative and not exceed maxRadius {max}")]
    RadiusBounds { min: f64, max: f64 },
    #[error("no entities to infer a scale domain from")]
    EmptyDataset,
    #[error("plot {width}x{height} leaves no room inside its margins")]
    PlotTooSmall { width: f64, height: f64 },
    #[error("fixed domain [{min}, {max}] is empty or non-finite")]
    InvalidDomain { min: f64, max: f64 },
    #[error("`{name}` must be finite")]
    NonFinite { name: String },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("entity `{key}` has no finite value for {field}")]
    InvalidInput { key: String, field: Field },
    #[error("entity key `{key}` appears more than once")]
    DuplicateKey { key: String },
    #[error("entities `{key}` and `{other}` cannot be separated at ({x}, {y})")]
    DegenerateGeometry {
        key: String,
        other: String,
        x: f64,
        y: f64,
    },
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

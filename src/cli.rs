use crate::chart::BubbleChart;
use crate::config::{Variant, load_config};
use crate::hover::{HoverDispatcher, HoverStyle};
use crate::ir::Entity;
use crate::layout_dump::{LayoutDump, write_layout_dump};
use crate::metadata::{StaticMetadata, load_metadata};
use crate::render::{render_svg_with_hover, write_output_svg};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{LevelFilter, Log, Metadata, Record};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "bswarm",
    version,
    about = "Banded bubble swarm layout with Voronoi hit regions"
)]
pub struct Args {
    /// Input JSON array of records, or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Country metadata JSON (code -> {region, incomeGroup})
    #[arg(short = 'm', long = "metadata")]
    pub metadata: Option<PathBuf>,

    /// Config JSON/JSON5 file merged over the variant defaults
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Built-in chart preset
    #[arg(long = "variant", value_enum)]
    pub variant: Option<Variant>,

    /// Width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f64>,

    /// Height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f64>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Output file. Defaults to stdout for SVG and JSON if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Skip records missing a metric or group instead of failing
    #[arg(long = "drop-incomplete")]
    pub drop_incomplete: bool,

    /// Render the bubble with this key in its hovered state
    #[arg(long = "highlight")]
    pub highlight: Option<String>,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = load_config(args.config.as_deref(), args.variant)?;
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }

    let entities = parse_entities(&read_input(args.input.as_deref())?)?;
    log::info!("read {} records", entities.len());

    let metadata: Option<StaticMetadata> = args
        .metadata
        .as_deref()
        .map(load_metadata)
        .transpose()?;
    let mut chart = BubbleChart::new(config.clone());
    if let Some(table) = metadata.as_ref() {
        chart = chart.with_lookup(table);
    }

    let mut prepared = chart.prepare(&entities)?;
    if args.drop_incomplete {
        prepared = chart.filter_complete(prepared);
    }
    let layout = chart.layout(&prepared)?;

    if args.output_format == OutputFormat::Json {
        match args.output.as_deref() {
            Some(path) => write_layout_dump(path, &layout)?,
            None => println!(
                "{}",
                serde_json::to_string_pretty(&LayoutDump::from_layout(&layout))?
            ),
        }
        return Ok(());
    }

    let hover = match args.highlight.as_deref() {
        Some(key) => {
            let index = layout
                .bubbles
                .iter()
                .position(|bubble| bubble.key == key)
                .ok_or_else(|| anyhow::anyhow!("no bubble with key `{key}`"))?;
            let dispatcher = HoverDispatcher::new(&layout, HoverStyle::from_config(&config));
            Some(dispatcher.pointer_enter(index)?)
        }
        None => None,
    };
    let svg = render_svg_with_hover(&layout, &config, hover.as_ref());

    match args.output_format {
        OutputFormat::Svg | OutputFormat::Json => write_output_svg(&svg, args.output.as_deref())?,
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_png(&svg, &output, &config)?;
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, config: &crate::config::ChartConfig) -> Result<()> {
    crate::render::write_output_png(svg, output, config)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _config: &crate::config::ChartConfig) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("reading input {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

/// Records arrive as a bare array or wrapped in `{"data": [...]}`.
fn parse_entities(raw: &str) -> Result<Vec<Entity>> {
    let value: serde_json::Value = serde_json::from_str(raw).context("input is not JSON")?;
    let records = match value {
        serde_json::Value::Object(mut map) => map
            .remove("data")
            .ok_or_else(|| anyhow::anyhow!("input object has no `data` array"))?,
        other => other,
    };
    serde_json::from_value(records).context("input records are malformed")
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs the stderr logger. `log` accepts one logger per process, so a
/// repeated call (a second `run` in tests or an embedding host) keeps the
/// first logger and its level instead of failing.
fn init_logging(verbose: u8) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level_for(verbose));
    }
    log::debug!("log level {}", level_for(verbose));
}

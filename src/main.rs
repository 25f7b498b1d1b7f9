extern crate log;
pub mod attributes;
pub mod convert;
pub mod error;
pub mod geofile;
pub mod geometry;
pub mod kml;
use crate::convert::assemble::NullGeometryPolicy;
use crate::convert::{convert, ConversionOptions};
use crate::geofile::gdal_geofile::WriterOptions;
use anyhow::{anyhow, Context};
use clap::Parser;
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

/// Convert KMZ/KML files to ESRI Shapefiles.
///
/// Attributes are read from the HTML table in each placemark description and from
/// ExtendedData. Output is split by geometry type into <base>_point.shp,
/// <base>_line.shp and <base>_polygon.shp.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input KMZ or KML file.
    input: PathBuf,

    /// Base path of the output files. Defaults to the input path without extension.
    output_base: Option<PathBuf>,

    /// Keep placemarks without geometry, written to <base>_nogeom.dbf.
    #[arg(long)]
    include_null_geometry: bool,

    /// Verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// Path to an optional YAML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Deserialize, Debug)]
#[serde(default, deny_unknown_fields)]
struct Config {
    /// Directory for output files when no output base is given.
    output_dir: Option<PathBuf>,
    include_null_geometry: bool,
    min_string_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: None,
            include_null_geometry: false,
            min_string_width: WriterOptions::default().min_string_width,
        }
    }
}

fn read_config(config_filepath: &Path) -> anyhow::Result<Config> {
    if !config_filepath.exists() {
        return Err(anyhow!("Config file {:?} not found", config_filepath));
    }
    let config_contents = read_to_string(config_filepath)?;
    serde_yaml::from_str(&config_contents)
        .map_err(|err| error::ConvertError::Config(err.to_string()))
        .with_context(|| format!("Reading config file {:?}", config_filepath))
}

fn resolve_output_base(input: &Path, output_base: Option<&Path>, config: &Config) -> PathBuf {
    match (output_base, &config.output_dir) {
        (Some(output_base), _) => output_base.to_path_buf(),
        (None, Some(output_dir)) => output_dir.join(input.file_stem().unwrap_or_default()),
        (None, None) => input.with_extension(""),
    }
}

fn conversion_options(args: &Args, config: &Config) -> ConversionOptions {
    let null_geometry = if args.include_null_geometry || config.include_null_geometry {
        NullGeometryPolicy::Keep
    } else {
        NullGeometryPolicy::Drop
    };
    ConversionOptions {
        input_path: args.input.clone(),
        output_base: resolve_output_base(&args.input, args.output_base.as_deref(), config),
        null_geometry,
        writer: WriterOptions {
            min_string_width: config.min_string_width,
        },
    }
}

fn try_main(args: &Args) -> anyhow::Result<()> {
    if !args.input.exists() {
        return Err(anyhow!("Input file {:?} not found", &args.input));
    }
    let config = match &args.config {
        Some(config_filepath) => read_config(config_filepath)?,
        None => Config::default(),
    };
    log::debug!("Using {:?}", config);

    let options = conversion_options(args, &config);
    let report = convert(&options)?;

    log::info!(
        "Created {} Shapefile(s) from {} features in {} placemarks",
        report.written.len(),
        report.feature_count,
        report.placemark_count
    );
    for written in &report.written {
        log::debug!(
            "{} {} features: {:?}",
            written.group.file_suffix(),
            written.feature_count,
            written.files
        );
        println!("{}", written.main_file.display());
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_module(env!("CARGO_CRATE_NAME"), log::LevelFilter::Debug);
    }
    builder.init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);
    if let Err(e) = try_main(&args) {
        eprintln!("Error: {:?}", e);
        std::process::exit(1)
    }
}

//! Command-line wiring for the Placemill extraction pipeline.
#![forbid(unsafe_code)]

use std::path::PathBuf;

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use placemill_core::AssociationPolicy;
use placemill_data::{
    BoundingBox, ExtractError, ExtractReader, Inspector, PipelineError, PlaceSink, PlaceStream,
    SinkOpenError, SqlitePlaceSink, TaxonomyAssetError, load_taxonomy,
};

/// Errors surfaced to the process exit handler.
#[derive(Debug, Error)]
pub enum CliError {
    /// Command-line arguments did not parse.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// The taxonomy assets could not be loaded.
    #[error(transparent)]
    Assets(#[from] TaxonomyAssetError),
    /// The extract could not be opened.
    #[error(transparent)]
    Extract(#[from] ExtractError),
    /// The place database could not be opened.
    #[error(transparent)]
    Sink(#[from] SinkOpenError),
    /// The run aborted on a fatal source error.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

#[derive(Debug, Parser)]
#[command(
    name = "placemill",
    about = "Extract classified places from an OpenStreetMap extract",
    version
)]
struct Cli {
    /// Path to the `.osm.pbf` extract.
    #[arg(long, value_name = "path")]
    file: PathBuf,

    /// Directory holding the taxonomy vocabulary assets.
    #[arg(long, value_name = "dir")]
    assets: Utf8PathBuf,

    /// SQLite database receiving the extracted places.
    #[arg(long, value_name = "path")]
    output: Utf8PathBuf,

    /// Restrict points to a box given as `left,top,right,bottom` degrees;
    /// corners may be supplied in any order.
    #[arg(long, value_name = "L,T,R,B", value_parser = parse_bbox)]
    bbox: Option<BoundingBox>,

    /// Require association-rule values to also be allow-listed, matching the
    /// behaviour of older rule tables.
    #[arg(long)]
    legacy_associations: bool,
}

impl Cli {
    fn association_policy(&self) -> AssociationPolicy {
        if self.legacy_associations {
            AssociationPolicy::RequireAllowList
        } else {
            AssociationPolicy::ValueSetOnly
        }
    }
}

/// Run the pipeline with the current process arguments and environment.
///
/// # Errors
/// Returns a [`CliError`] for any fatal condition: bad arguments, missing
/// assets, an unreadable extract, an unopenable database, or a source file
/// violating the stream invariants.
pub fn run() -> Result<(), CliError> {
    install_logger();

    let cli = Cli::try_parse()?;
    let taxonomy = load_taxonomy(&cli.assets)?;
    let reader = ExtractReader::from_path(&cli.file)?;
    let inspector = Inspector::with_policy(&taxonomy, cli.association_policy());
    let mut stream = PlaceStream::new(reader, inspector, cli.bbox.unwrap_or_default());
    let mut sink = SqlitePlaceSink::open(&cli.output)?;

    info!("processing {}", cli.file.display());

    let mut stored: u64 = 0;
    while let Some(outcome) = stream.next() {
        sink.consume(outcome?);
        stored += 1;
    }
    sink.complete();

    info!(
        "finished {}: {} entities processed, {} place(s) stored",
        cli.file.display(),
        stream.processed(),
        stored
    );
    Ok(())
}

fn install_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Also captures records emitted through the `log` facade.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn parse_bbox(value: &str) -> Result<BoundingBox, String> {
    let coordinates: Vec<f64> = value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid coordinate {:?}", part.trim()))
        })
        .collect::<Result<_, _>>()?;

    match coordinates.as_slice() {
        [left, top, right, bottom] => Ok(BoundingBox::new(*left, *top, *right, *bottom)),
        _ => Err(format!(
            "expected four comma-separated coordinates, got {}",
            coordinates.len()
        )),
    }
}

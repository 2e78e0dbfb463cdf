//! Reads a CSV or XLSX table of addresses, geocodes every row through a
//! remote geocoding API, and writes a GeoJSON file with one point feature
//! per resolved address.
//!
//! The input must contain a column named exactly `Adress` (the spelling is
//! a compatibility contract with existing files). The output lands beside
//! the input with the extension replaced by `.geojson`; rows whose address
//! cannot be resolved are dropped from it, in input order.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use log::info;

pub mod batch;
pub mod config;
pub mod geocode;
pub mod output;
pub mod table;

pub use batch::{resolve_all, BatchReport};
pub use config::Config;
pub use geocode::{GeocodeClient, Resolution, ResolveAddress, ResolveFailure};
pub use table::{Table, ADDRESS_COLUMN};

/// Convert a table of addresses (CSV or XLSX) to a GeoJSON point collection.
///
/// Reads the `Adress` column of the input, resolves each address to
/// coordinates through the configured geocoding API, and writes a
/// FeatureCollection next to the input file.
///
/// The API credential is taken from `GEOCODING_API_KEY`; the endpoint,
/// worker-pool width, and per-request timeout can be overridden with
/// `GEOCODING_ENDPOINT`, `GEOCODING_POOL_WIDTH`, and
/// `GEOCODING_TIMEOUT_SECS`.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Input filename, `.csv` (`;`-delimited) or `.xlsx`
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

/// Run the command-line interface.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let table = Table::load(&cli.input)?;
    let Some(address_column) = table.column(ADDRESS_COLUMN) else {
        bail!("The file does not contain a column named {ADDRESS_COLUMN:?}.");
    };
    info!(
        "Loaded {} addresses from {}",
        table.len(),
        cli.input.display()
    );

    let config = Config::from_env()?;
    let client = Arc::new(GeocodeClient::new(&config)?);

    let outcomes = resolve_all(
        client,
        table.column_strings(address_column),
        config.pool_width,
    )
    .await;
    let report = BatchReport::tally(&outcomes);
    info!(
        "Resolved {} of {} addresses ({} dropped)",
        report.resolved, report.total, report.unresolved
    );

    let features = output::merge_features(&table, &outcomes);
    let destination = output::output_path(&cli.input);
    output::write_collection(&destination, features)?;
    info!("GeoJSON data written to {}", destination.display());

    Ok(())
}

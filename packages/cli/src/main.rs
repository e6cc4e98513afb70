#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the firespread toolchain.
//!
//! Runs the API server, a single prediction, or the spread model over an
//! offline batch of cells. Configuration comes from `FIRESPREAD_CONFIG`
//! or the built-in defaults.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use firespread_predict::{FirespreadConfig, PredictionOutcome, Predictor};
use firespread_spread::{BiasCorrector, process_batch, read_cells_path, records_to_json};

#[derive(Parser)]
#[command(name = "firespread", about = "Wildfire directional spread prediction")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server (`BIND_ADDR`, `PORT`)
    Serve,
    /// Run one prediction around a point and print the summary
    Predict {
        /// Latitude of the point of interest
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude of the point of interest
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Search radius in km (defaults to `search.radius_km`)
        #[arg(long)]
        radius: Option<f64>,
        /// Do not send records to the prediction service
        #[arg(long)]
        no_transmit: bool,
    },
    /// Derive and print the per-direction correction weights
    Weights {
        /// Reference CSV (defaults to `data.reference_csv`)
        #[arg(long)]
        reference: Option<PathBuf>,
    },
    /// Run spread and correction over an offline CSV of assembled cells
    Spread {
        /// CSV with one row per cell and the twenty input columns
        #[arg(long)]
        input: PathBuf,
        /// Reference CSV (defaults to `data.reference_csv`)
        #[arg(long)]
        reference: Option<PathBuf>,
        /// Dominant slope direction in degrees
        #[arg(long)]
        slope_dir: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();
    let config = FirespreadConfig::load()?;

    match cli.command {
        Commands::Serve => {
            // The server uses actix-web's runtime, so we need to run it
            // on a dedicated thread with its own system.
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(firespread_server::run_server())
            })
            .await??;
        }
        Commands::Predict {
            lat,
            lon,
            radius,
            no_transmit,
        } => {
            let mut predictor = Predictor::from_config(config)?;
            if no_transmit {
                predictor = predictor.without_transmission();
            }

            match predictor.predict(lat, lon, radius).await? {
                PredictionOutcome::NoGrids { radius_km } => {
                    println!("No grid cells within {radius_km} km of ({lat}, {lon})");
                }
                PredictionOutcome::Completed(summary) => {
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                }
            }
        }
        Commands::Weights { reference } => {
            let path = reference.unwrap_or(config.data.reference_csv);
            let weights = BiasCorrector::from_reference_path(path).weights()?;
            println!("{}", serde_json::to_string_pretty(&weights)?);
        }
        Commands::Spread {
            input,
            reference,
            slope_dir,
        } => {
            let mut params = config.spread;
            if let Some(slope_dir) = slope_dir {
                params.slope_dir_deg = slope_dir;
            }
            params.validate()?;

            let path = reference.unwrap_or(config.data.reference_csv);
            let weights = BiasCorrector::from_reference_path(path).weights()?;
            let cells = read_cells_path(&input)?;
            let batch = process_batch(cells, &params, &weights);

            log::info!(
                "{} cells retained, {} excluded",
                batch.retained,
                batch.excluded
            );
            println!("{}", serde_json::to_string_pretty(&records_to_json(&batch.records)?)?);
        }
    }

    Ok(())
}

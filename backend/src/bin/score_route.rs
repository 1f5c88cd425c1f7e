use std::path::PathBuf;

use clap::Parser;
use safepath::{
    incidents::InMemoryIncidentStore,
    models::Coordinate,
    planner, scoring, zones,
};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Score a route polyline against a file of incident reports"
)]
struct Args {
    /// Route as a JSON array of [lng, lat] pairs
    #[arg(long)]
    route: PathBuf,

    /// Incident reports as a JSON array
    #[arg(long)]
    incidents: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let raw: Vec<[f64; 2]> = serde_json::from_reader(std::fs::File::open(&args.route)?)?;
    let route: Vec<Coordinate> = raw.into_iter().map(Coordinate::from_lng_lat).collect();
    let store = InMemoryIncidentStore::from_file(&args.incidents)?;
    let incidents = store.incidents();
    tracing::info!(
        "scoring {} point(s) against {} incident(s)",
        route.len(),
        incidents.len()
    );

    let analysis = scoring::score(&route, incidents);

    let waypoints = match (route.first(), route.last()) {
        (Some(&origin), Some(&destination)) if route.len() >= 2 => {
            let zones = zones::build_zones(incidents);
            planner::plan(origin, destination, &zones)
        }
        _ => Vec::new(),
    };

    let output = json!({
        "safetyAnalysis": analysis,
        "waypoints": waypoints.iter().map(|w| w.to_lng_lat()).collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

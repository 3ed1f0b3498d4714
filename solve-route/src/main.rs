use anyhow::Result;
use clap::Parser;
use log::info;
use url::Url;

use solve_route::route_between;
use trail_router::{ArcGisRouteClient, GeoPoint, MapConfig, DEFAULT_ROUTE_URL};

/// Route between two points with the routing service and write what the map would show as
/// GeoJSON.
#[derive(Parser)]
struct Args {
    /// Origin, as "lat,lon"
    #[arg(long, allow_hyphen_values = true)]
    from: GeoPoint,

    /// Destination, as "lat,lon"
    #[arg(long, allow_hyphen_values = true)]
    to: GeoPoint,

    /// The route service. Requests go to <endpoint>/solve
    #[arg(long, default_value = DEFAULT_ROUTE_URL)]
    endpoint: Url,

    /// ArcGIS API key
    #[arg(long, env = "ARCGIS_API_KEY")]
    api_key: Option<String>,

    /// Output file to write
    #[arg(long, default_value = "route.geojson")]
    output: String,
}

fn main() -> Result<()> {
    simple_logger::init_with_level(log::Level::Info)?;
    let args = Args::parse();

    let config = MapConfig {
        route_url: args.endpoint,
        ..Default::default()
    };
    let client = ArcGisRouteClient::new(args.api_key)?;

    // The controller is single-threaded; one solve is the only thing that ever waits
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let output = runtime.block_on(route_between(config, &client, args.from, args.to))?;

    for (idx, step) in output.directions.iter().enumerate() {
        println!("{:>3}. {} ({:.2} mi)", idx + 1, step.text, step.length_miles);
    }

    std::fs::write(&args.output, serde_json::to_string_pretty(&output.geojson)?)?;
    info!("Wrote {}", args.output);
    Ok(())
}

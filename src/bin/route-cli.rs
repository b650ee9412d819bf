use std::path::PathBuf;

use bike_route_engine::zones::ZoneCategory;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "route-cli")]
#[command(about = "Command-line client for the bike route engine", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check engine status and loaded zone counts
    Health,
    /// Plan a route between two points
    Route {
        /// Start point as lon,lat
        #[arg(long, value_parser = parse_point)]
        from: (f64, f64),
        /// End point as lon,lat
        #[arg(long, value_parser = parse_point)]
        to: (f64, f64),
        /// Hazard categories to route around, comma-separated
        #[arg(long, value_delimiter = ',')]
        avoid: Vec<ZoneCategory>,
        /// Force monsoon mode (avoid waterlogging)
        #[arg(long)]
        monsoon: bool,
    },
    /// Hazards at and around a point
    Nearby {
        /// Point as lon,lat
        #[arg(long, value_parser = parse_point)]
        at: (f64, f64),
    },
    /// Reload zone data on the server
    Refresh,
    /// Replace one category's zones (server must run in development)
    SetZones {
        category: ZoneCategory,
        /// GeoJSON FeatureCollection or feature array
        file: PathBuf,
    },
}

fn parse_point(raw: &str) -> Result<(f64, f64), String> {
    let (lon, lat) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected lon,lat, got '{}'", raw))?;
    let lon = lon.trim().parse::<f64>().map_err(|e| format!("longitude: {}", e))?;
    let lat = lat.trim().parse::<f64>().map_err(|e| format!("latitude: {}", e))?;
    Ok((lon, lat))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
        Commands::Route {
            from,
            to,
            avoid,
            monsoon,
        } => {
            let mut body = json!({
                "start_lon": from.0,
                "start_lat": from.1,
                "end_lon": to.0,
                "end_lat": to.1,
                "avoid": avoid,
            });
            if monsoon {
                body["monsoon_mode"] = json!(true);
            }
            client
                .post(format!("{}/api/v1/routes", base))
                .json(&body)
                .send()
                .await?
        }
        Commands::Nearby { at } => {
            client
                .get(format!("{}/api/v1/hazards/nearby", base))
                .query(&[("lon", at.0), ("lat", at.1)])
                .send()
                .await?
        }
        Commands::Refresh => {
            client
                .post(format!("{}/api/v1/zones/refresh", base))
                .send()
                .await?
        }
        Commands::SetZones { category, file } => {
            let features: Value = serde_json::from_str(&std::fs::read_to_string(&file)?)?;
            client
                .put(format!("{}/api/v1/zones/{}", base, category))
                .json(&features)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: engine returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

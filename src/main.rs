use clap::Parser;
use std::path::PathBuf;
use tracing::{info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use veolia_consumption::client::VeoliaClient;
use veolia_consumption::config::Config;
use veolia_consumption::importers::ConsumptionImporter;
use veolia_consumption::models::{DailyConsumption, StatementType};

#[derive(Parser, Debug)]
#[command(name = "veolia-consumption")]
#[command(about = "Download daily water consumption from the Veolia Eau customer portal", long_about = None)]
struct Cli {
    /// Portal account username, overrides VEOLIA_USERNAME
    #[arg(long)]
    username: Option<String>,

    /// Portal account password, overrides VEOLIA_PASSWORD
    #[arg(long)]
    password: Option<String>,

    /// Portal base URL, overrides VEOLIA_HOST
    #[arg(long)]
    host: Option<String>,

    /// HTTP timeout for each portal request, overrides VEOLIA_TIMEOUT_SECONDS
    #[arg(long)]
    timeout_seconds: Option<u64>,

    /// Parse a previously saved export instead of contacting the portal
    #[arg(long)]
    file: Option<PathBuf>,

    /// Also write the downloaded export to this path
    #[arg(long, conflicts_with = "file")]
    save: Option<PathBuf>,

    /// Print readings as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing with environment filter support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,veolia_consumption=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_writer(std::io::stderr),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Parse a saved export or download a fresh one

    let readings = match &cli.file {
        Some(path) => {
            info!("Reading consumption export from {}", path.display());
            ConsumptionImporter::new().parse_file(path)?
        }
        None => fetch_from_portal(&cli).await?,
    };

    log_summary(&readings);

    // Print readings
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&readings)?);
    } else {
        for reading in &readings {
            println!(
                "{} {:>8} {:>5} {}",
                reading.day, reading.index, reading.consumption, reading.statement_type
            );
        }
    }

    Ok(())
}

async fn fetch_from_portal(cli: &Cli) -> Result<Vec<DailyConsumption>, Box<dyn std::error::Error>> {
    // Load configuration
    let config = load_config(cli)?;
    info!("Fetching consumption with config: {:?}", config);

    // Create portal client
    let client = VeoliaClient::new(config);
    let export = client.fetch_export().await?;

    if let Some(path) = &cli.save {
        std::fs::write(path, &export)?;
        info!("Saved raw export to {}", path.display());
    }

    Ok(ConsumptionImporter::new().parse_bytes(&export)?)
}

/// Environment configuration with command-line flags taking precedence
fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match (&cli.username, &cli.password) {
        (Some(username), Some(password)) => {
            Config::new(username.clone(), password.clone()).with_env_overrides()
        }
        _ => Config::from_env().map_err(|e| {
            format!("missing credentials (--username/--password or VEOLIA_USERNAME/VEOLIA_PASSWORD): {e}")
        })?,
    };

    if let Some(username) = &cli.username {
        config.username = username.clone();
    }
    if let Some(password) = &cli.password {
        config.password = password.clone();
    }
    if let Some(host) = &cli.host {
        config = config.with_host(host.clone());
    }
    if let Some(seconds) = cli.timeout_seconds {
        config = config.with_timeout_seconds(seconds);
    }

    Ok(config)
}

fn log_summary(readings: &[DailyConsumption]) {
    let total: i64 = readings.iter().map(|r| r.consumption).sum();
    let estimated = readings
        .iter()
        .filter(|r| r.statement_type == StatementType::Estimated)
        .count();

    match (readings.first(), readings.last()) {
        (Some(first), Some(last)) => info!(
            "{} days from {} to {}: total consumption {}, {} estimated",
            readings.len(),
            first.day,
            last.day,
            total,
            estimated
        ),
        _ => info!("Export contains no consumption rows"),
    }
}

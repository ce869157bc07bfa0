//! ecobee command-line tool - Entry Point
//!
//! Registers the application with an account via the PIN workflow, then queries
//! thermostats with the stored credentials.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ecobee_client::auth::PinAuthenticator;
use ecobee_client::config::{api, env};
use ecobee_client::models::Selection;
use ecobee_client::{Config, EcobeeClient};

#[derive(Parser, Debug)]
#[command(name = "ecobee")]
#[command(about = "Command-line client for the ecobee thermostat API")]
#[command(version)]
struct Cli {
    /// Application id registered in the ecobee developer portal
    #[arg(long = "app", env = env::APP_ID, hide_env_values = true)]
    app_id: Option<String>,

    /// Durable credential store path
    #[arg(long = "store", env = env::STORE_PATH)]
    store_path: Option<PathBuf>,

    /// API base URL
    #[arg(long, default_value = api::BASE_URL, env = env::API_URL)]
    api_url: String,

    /// Retries for transient data-request failures
    #[arg(long, default_value_t = api::MAX_RETRIES, env = env::MAX_RETRIES)]
    max_retries: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Authorize this application with a PIN and create the credential store
    Register,
    /// Show how long the stored access token remains valid (no network access)
    Status,
    /// List registered thermostats and their revision numbers
    Summary,
    /// Show thermostat details
    Thermostats {
        /// Thermostat identifiers; all registered thermostats if omitted
        #[arg(long = "id")]
        ids: Vec<String>,

        /// Include remote sensor readings
        #[arg(long)]
        sensors: bool,
    },
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::new(self.app_id.clone().unwrap_or_default());
        config.api_url = self.api_url.trim_end_matches('/').to_string();
        config.store_path = self.store_path.clone();
        config.max_retries = self.max_retries;
        config
    }
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), command = ?cli.command, "Starting");

    let config = cli.config();
    match &cli.command {
        Command::Register => register(&config).await,
        Command::Status => status(&config).await,
        Command::Summary => summary(&config).await,
        Command::Thermostats { ids, sensors } => thermostats(&config, ids, *sensors).await,
    }
}

async fn register(config: &Config) -> anyhow::Result<()> {
    let app_id = config.require_app_id()?;
    let store = config.open_store()?;

    let http = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout)
        .build()?;
    let mut authenticator = PinAuthenticator::new(http, &config.api_url, app_id);

    let pin = authenticator.request_pin().await?;
    println!("Register with this PIN in the ecobee portal (My Apps > Add Application): {pin}");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        wait_for_approval(&mut stdin).await?;

        match authenticator.finalize(&store).await {
            Ok(()) => break,
            Err(e) if e.is_pending() => {
                let wait = authenticator.poll_interval();
                println!("The PIN has not been approved yet; retrying in {}s.", wait.as_secs());
                tokio::time::sleep(wait).await;
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!("Created credential store at {}", store.path().display());
    Ok(())
}

/// Block until the user confirms approval. Closed input aborts registration.
async fn wait_for_approval<R: AsyncBufRead + Unpin>(lines: &mut Lines<R>) -> anyhow::Result<()> {
    println!("Press Enter once the PIN has been approved.");
    if lines.next_line().await?.is_none() {
        anyhow::bail!("stdin closed before the PIN was approved");
    }
    Ok(())
}

async fn status(config: &Config) -> anyhow::Result<()> {
    let store = config.open_store()?;
    if !store.is_initialized().await? {
        anyhow::bail!(
            "credential store {} is not initialized; run `ecobee register` first",
            store.path().display()
        );
    }

    let record = store.snapshot().await?;
    let remaining = record.valid_for(chrono::Utc::now());
    println!("store:          {}", store.path().display());
    println!("valid until:    {}", record.valid_until.to_rfc3339());
    if remaining > chrono::Duration::zero() {
        println!("access token:   valid for {}s", remaining.num_seconds());
    } else {
        println!("access token:   expired (will be refreshed on next request)");
    }
    println!("refresh token:  {}", if record.refresh_token.is_empty() { "missing" } else { "present" });
    Ok(())
}

fn client(config: &Config) -> anyhow::Result<EcobeeClient> {
    let store = config.open_store()?;
    Ok(EcobeeClient::new(config, Arc::new(store))?)
}

async fn summary(config: &Config) -> anyhow::Result<()> {
    let summary = client(config)?.thermostat_summary().await?;

    println!("{} thermostat(s)", summary.thermostat_count);
    for revision in summary.revisions() {
        println!(
            "{}  {:<20} connected={} thermostat={} runtime={}",
            revision.identifier,
            revision.name,
            revision.connected,
            revision.thermostat_revision,
            revision.runtime_revision
        );
    }
    Ok(())
}

async fn thermostats(config: &Config, ids: &[String], sensors: bool) -> anyhow::Result<()> {
    let mut selection =
        if ids.is_empty() { Selection::registered() } else { Selection::thermostats(ids) };
    selection = selection.with_runtime().with_equipment_status();
    if sensors {
        selection = selection.with_sensors();
    }

    for thermostat in client(config)?.thermostats(&selection).await? {
        let temperature = thermostat
            .runtime
            .as_ref()
            .map(|r| format!("{:.1}°F", r.temperature_f()))
            .unwrap_or_else(|| "-".to_string());
        let equipment =
            if thermostat.equipment_status.is_empty() { "idle" } else { &thermostat.equipment_status };
        println!("{}  {:<20} {temperature:>8}  {equipment}", thermostat.identifier, thermostat.name);

        for sensor in &thermostat.remote_sensors {
            let reading = sensor.capability_value("temperature").unwrap_or("-");
            let occupied = sensor.capability_value("occupancy").unwrap_or("-");
            println!("    {:<24} temperature={reading} occupancy={occupied}", sensor.name);
        }
    }
    Ok(())
}

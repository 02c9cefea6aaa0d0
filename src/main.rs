use clap::Parser;
use sectorpulse::cli::commands::{Cli, Commands};
use sectorpulse::config::PulseConfig;
use sectorpulse::domain::ports::market_store::NewsFilter;
use sectorpulse::domain::values::news_subject::NewsSubject;
use sectorpulse::domain::values::stream::StreamKind;
use sectorpulse::SectorPulse;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sectorpulse=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var("SECTORPULSE_CONFIG").ok())
        .unwrap_or_else(|| "./sectorpulse.json".into());

    if let Commands::InitConfig { path, force } = &cli.command {
        if let Err(e) = init_config(path, *force) {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
        return;
    }

    let config = match PulseConfig::load(Path::new(&config_path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            std::process::exit(1);
        }
    };
    let db_path = std::env::var("SECTORPULSE_DB").unwrap_or_else(|_| "./sectorpulse.db".into());

    let pulse = match SectorPulse::new(config, &db_path) {
        Ok(pulse) => pulse,
        Err(e) => {
            eprintln!("Error initializing SectorPulse: {e}");
            std::process::exit(1);
        }
    };

    let result = run_command(pulse, cli.command).await;
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_config(path: &str, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if Path::new(path).exists() && !force {
        return Err(format!("{path} already exists (use --force to overwrite)").into());
    }
    std::fs::write(path, PulseConfig::default().to_json_pretty()?)?;
    println!("Wrote default config to {path}");
    Ok(())
}

async fn run_command(pulse: SectorPulse, cmd: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::Run => {
            let handle = pulse.start_scheduler();
            tokio::signal::ctrl_c().await?;
            tracing::info!("shutdown requested");
            let summary = handle.stop().await;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Ingest { stream } => {
            let kind: StreamKind = stream.parse().map_err(|e: String| e)?;
            let report = pulse.ingest(kind).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Score { text, source } => {
            let scores = pulse.score(&text, &source)?;
            println!("{}", serde_json::to_string_pretty(&scores)?);
        }
        Commands::Sectors { name, days } => {
            let names: Vec<String> = match name {
                Some(n) => vec![n],
                None => pulse.sectors().iter().map(|s| s.name.clone()).collect(),
            };
            let mut reports = Vec::with_capacity(names.len());
            for n in &names {
                reports.push(pulse.sector_report(n, days)?);
            }
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        Commands::Correlation { symbol, days } => {
            let report = pulse.correlation(&symbol, days)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Alerts { limit } => {
            let alerts = pulse.recent_alerts(limit)?;
            println!("{}", serde_json::to_string_pretty(&alerts)?);
        }
        Commands::News { subject, hours, limit } => {
            let subject = subject
                .map(|s| s.parse::<NewsSubject>())
                .transpose()
                .map_err(|e: String| e)?;
            let since = hours
                .map(|h| sectorpulse::hours_ago(h).ok_or_else(|| format!("--hours {h} is out of range")))
                .transpose()?;
            let filter = NewsFilter {
                subject,
                since,
                limit: Some(limit),
            };
            let news = pulse.news(&filter)?;
            println!("{}", serde_json::to_string_pretty(&news)?);
        }
        Commands::Quotes { symbol, limit } => {
            let quotes = pulse.latest_quotes(&symbol, limit)?;
            println!("{}", serde_json::to_string_pretty(&quotes)?);
        }
        Commands::Prune { days } => {
            let stats = pulse.prune(days)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::InitConfig { path, force } => init_config(&path, force)?,
    }
    Ok(())
}

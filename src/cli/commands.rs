use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "sectorpulse",
    about = "Scheduled quote and news ingestion with impact scoring and threshold alerts"
)]
pub struct Cli {
    /// Config file (JSON). Falls back to SECTORPULSE_CONFIG, then ./sectorpulse.json
    #[arg(long, global = true)]
    pub config: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run both ingestion streams on their schedules until Ctrl-C
    Run,
    /// Run a single batch of one stream now
    Ingest {
        /// Stream to run (quotes, news)
        stream: String,
    },
    /// Score a piece of text for sentiment and impact
    Score {
        text: String,
        /// Publishing source, used for the credibility weight
        #[arg(long, default_value = "unknown")]
        source: String,
    },
    /// Sector report (all sectors when no name is given)
    Sectors {
        name: Option<String>,
        /// News window in days
        #[arg(long, default_value = "7")]
        days: u32,
    },
    /// Daily price change against news sentiment for a symbol
    Correlation {
        symbol: String,
        #[arg(long, default_value = "30")]
        days: u32,
    },
    /// Show recent alerts
    Alerts {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Show stored news
    News {
        /// Subject filter, e.g. symbol:LMT or sector:defense
        #[arg(long)]
        subject: Option<String>,
        /// Only news published in the last N hours
        #[arg(long)]
        hours: Option<u32>,
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Show the latest stored bars for a symbol
    Quotes {
        symbol: String,
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Delete stored records older than the retention window
    Prune {
        #[arg(long, default_value = "30")]
        days: u32,
    },
    /// Write the default configuration to a file
    InitConfig {
        #[arg(long, default_value = "./sectorpulse.json")]
        path: String,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

//! respondr - safety document ingestion.
//!
//! Runs uploaded PDFs through text detection and metadata inference, and
//! reads back what was stored.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use respondr::categorizer::DocumentType;
use respondr::logging::LogFormat;

#[derive(Parser)]
#[command(name = "respondr")]
#[command(about = "Safety document ingestion and metadata inference")]
#[command(version)]
pub struct Cli {
    /// Config file path (JSON or YAML; defaults to ~/.respondr/config.yaml)
    #[arg(short, long, global = true, env = "RESPONDR_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format: text or json (overrides config file)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one stored object through the pipeline
    Process {
        /// Container holding the upload
        container: String,
        /// Object key, e.g. acme/evacuation_plan.pdf
        key: String,
    },

    /// Handle a storage notification document ("-" reads stdin)
    HandleEvent {
        input: String,
    },

    /// Read newline-delimited notifications from stdin and process them on a worker pool
    Worker {
        /// Number of worker threads (overrides config file)
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Process every PDF already stored in a container
    Backfill {
        container: String,
        /// Only keys starting with this prefix
        #[arg(long)]
        prefix: Option<String>,
        /// Number of worker threads (overrides config file)
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Print every stored record and a summary
    Verify,

    /// Aggregate statistics and document listing
    Report {
        /// Organization id filter
        #[arg(long)]
        org: Option<String>,
        /// Document type filter (emergency_plan, sop, policy, incident_report, training, unknown)
        #[arg(long)]
        doctype: Option<DocumentType>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the stored full text of a document
    Text {
        document_id: String,
    },

    /// Write sample PDFs for manual testing
    MakeFixtures {
        /// Output directory
        dir: PathBuf,
        /// Also store the samples in this container of the object store
        #[arg(long)]
        upload: Option<String>,
        /// Organization prefix used with --upload
        #[arg(long, default_value = "org1")]
        org: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = respondr::config::load_or_default(cli.config.as_deref())?;
    let format = cli.log_format.unwrap_or(config.log_format);
    if let Err(e) = respondr::logging::init(format) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    commands::run(cli.command, config)
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use indexer::coordinator::{build, BuildConfig};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a TF-IDF search index over crawled web documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build (or resume) the index from a directory of crawled JSON documents
    Build {
        /// Directory containing the crawled `.json` documents
        #[arg(long)]
        source: PathBuf,
        /// Output directory for the index artifacts
        #[arg(long, default_value = "./indices")]
        output: PathBuf,
        /// Number of worker threads
        #[arg(long, default_value_t = num_cpus::get())]
        workers: usize,
        /// Discard any previous build instead of resuming it
        #[arg(long, default_value_t = false)]
        restart: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { source, output, workers, restart } => {
            let summary = build(&BuildConfig { source, index_dir: output, workers, restart })?;
            tracing::info!(
                docs = summary.docs_registered,
                workers = summary.workers,
                "index build complete"
            );
            Ok(())
        }
    }
}

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tagtally::{CombinePolicy, JobConfig, JobKind};
use tracing::{debug, error, trace};
use tracing_subscriber::EnvFilter;

/// Count tagged fields in bibliography dumps and rank the results
#[derive(Parser)]
#[command(name = "tagtally", version)]
#[command(about = "Count tagged fields in bibliography dumps and rank the results", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace); RUST_LOG wins when set
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML job configuration
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Number of partitions for parallel runs
    #[arg(long, global = true)]
    partitions: Option<usize>,

    /// Size of a dedicated worker pool
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Combiner policy: never, once or spill:N
    #[arg(long, global = true)]
    combine: Option<CombinePolicy>,

    /// Run as one partition on the calling thread
    #[arg(long, global = true)]
    sequential: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct IoArgs {
    /// Input files, directories or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output directory (must not exist)
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Count the contents of a field tag per distinct value
    AuthorCount {
        #[command(flatten)]
        io: IoArgs,

        /// Field tag to count (default: author)
        #[arg(long)]
        tag: Option<String>,
    },
    /// Count publications per type from their closing tags
    PublicationCount {
        #[command(flatten)]
        io: IoArgs,

        /// Comma-separated end tags to count
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Rank the output of a count job and keep the K highest
    TopK {
        #[command(flatten)]
        io: IoArgs,

        /// Number of entries to keep (default: 5)
        #[arg(short, long)]
        k: Option<usize>,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose))
        .with_writer(std::io::stderr)
        .with_target(cli.verbose >= 2)
        .with_thread_ids(cli.verbose >= 2)
        .init();

    debug!("tagtally started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    if let Err(e) = run(cli) {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` when set, otherwise a level picked by the `-v` count.
fn log_filter(verbose: u8) -> EnvFilter {
    let log_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => JobConfig::load(path)?,
        None => JobConfig::default(),
    };
    if cli.partitions.is_some() {
        config.partitions = cli.partitions;
    }
    if cli.threads.is_some() {
        config.threads = cli.threads;
    }
    if let Some(policy) = cli.combine {
        config.combine = policy;
    }
    config.sequential |= cli.sequential;

    let (kind, io) = match cli.command {
        Commands::AuthorCount { io, tag } => {
            if let Some(tag) = tag {
                config.tag = tag;
            }
            (JobKind::author_count(&config), io)
        }
        Commands::PublicationCount { io, tags } => {
            if !tags.is_empty() {
                config.publication_tags = tags;
            }
            (JobKind::publication_count(&config), io)
        }
        Commands::TopK { io, k } => {
            if let Some(k) = k {
                config.k = k;
            }
            (JobKind::top_k(&config), io)
        }
    };

    tagtally::run(&kind, &io.inputs, &io.output, &config)?;
    Ok(())
}

mod cli;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use case_digest::config::DigestConfig;

#[derive(Parser)]
#[command(name = "case-digest", version, about = "Case Digest — support ticket threads and AI case summaries")]
struct App {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG still wins)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tickets in an export
    Tickets {
        /// Ticket-history HTML export
        export: PathBuf,
    },
    /// Show one ticket as JSON
    Show {
        export: PathBuf,
        ticket: String,
    },
    /// Show the timeline and reconstructed thread of one ticket
    Thread {
        export: PathBuf,
        ticket: String,
    },
    /// Summarize tickets into case records
    Summarize {
        export: PathBuf,
        /// Only this ticket
        #[arg(long)]
        ticket: Option<String>,
        /// Process at most N tickets (0 means all)
        #[arg(long)]
        limit: Option<usize>,
        /// Write the batch report (JSON) here
        #[arg(long)]
        output: Option<PathBuf>,
        /// Skip the model and build fallback summaries only
        #[arg(long)]
        offline: bool,
    },
    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Display the effective configuration
    Show,
    /// Print the config file path
    Path,
}

fn load_config(explicit: Option<&PathBuf>) -> anyhow::Result<DigestConfig> {
    let config = match explicit {
        Some(path) => DigestConfig::load_from(path)?,
        None => DigestConfig::load()?,
    };
    Ok(config)
}

fn run(app: App) -> anyhow::Result<()> {
    // `config path` must work even when the file is broken
    if let Commands::Config { action: ConfigAction::Path } = &app.command {
        return cli::config::run_path(app.config.as_deref());
    }

    let config = load_config(app.config.as_ref())?;
    case_digest::tracing_init::init_tracing(&config.logging, app.verbose);

    match app.command {
        Commands::Tickets { export } => cli::tickets::list(&export),
        Commands::Show { export, ticket } => cli::tickets::show(&export, &ticket),
        Commands::Thread { export, ticket } => cli::thread::run(&export, &ticket, &config),
        Commands::Summarize { export, ticket, limit, output, offline } => {
            let opts = cli::summarize::SummarizeOptions {
                ticket,
                limit,
                output,
                offline,
            };
            cli::summarize::run(&export, &opts, config)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::config::run_show(&config),
            ConfigAction::Path => cli::config::run_path(app.config.as_deref()),
        },
    }
}

fn main() {
    let app = App::parse();
    if let Err(e) = run(app) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

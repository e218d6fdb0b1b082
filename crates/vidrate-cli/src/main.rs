//! vidrate CLI, the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod console;
mod player;

#[derive(Parser)]
#[command(
    name = "vidrate",
    version,
    about = "Subjective video quality rating sessions"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run or resume a rating session on this terminal
    Session {
        /// Treat every clip as finished as soon as it starts
        #[arg(long)]
        auto_play: bool,
    },

    /// Show the saved session progress
    Status,

    /// Forget the saved session and start over with a new tester
    Reset,

    /// Check the playlists of a tester
    Validate {
        /// Tester id whose playlists to check
        #[arg(long)]
        tester: u32,
    },

    /// Copy the ratings log to the export directory
    Export,

    /// List recorded ratings
    Ratings {
        /// Only show ratings of this tester
        #[arg(long)]
        tester: Option<u32>,

        /// Include the rows that mark the start of each real test
        #[arg(long)]
        include_markers: bool,
    },

    /// Create starter config and example playlists
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vidrate=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Session { auto_play } => commands::session::execute(config, auto_play),
        Commands::Status => commands::status::execute(config),
        Commands::Reset => commands::reset::execute(config),
        Commands::Validate { tester } => commands::validate::execute(config, tester),
        Commands::Export => commands::export::execute(config),
        Commands::Ratings {
            tester,
            include_markers,
        } => commands::ratings::execute(config, tester, include_markers),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

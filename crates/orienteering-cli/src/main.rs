use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "orienteering-cli", version, about = "School orienteering race CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Course beacons
    Beacon {
        #[command(subcommand)]
        action: commands::beacon::BeaconAction,
    },
    /// Competing groups
    Group {
        #[command(subcommand)]
        action: commands::group::GroupAction,
    },
    /// Saved class rosters
    Class {
        #[command(subcommand)]
        action: commands::class::ClassAction,
    },
    /// Run control
    Run {
        #[command(subcommand)]
        action: commands::run::RunAction,
    },
    /// Print the leaderboard as JSON
    Standings,
    /// Print race statistics as JSON
    Stats,
    /// Drop every run and zero every group total
    ResetScores,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("ORIENTEERING_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Beacon { action } => commands::beacon::run(action),
        Commands::Group { action } => commands::group::run(action),
        Commands::Class { action } => commands::class::run(action),
        Commands::Run { action } => commands::run::run(action),
        Commands::Standings => commands::race::standings(),
        Commands::Stats => commands::race::stats(),
        Commands::ResetScores => commands::race::reset_scores(),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

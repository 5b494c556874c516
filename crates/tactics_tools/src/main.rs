//! Grid Tactics - Development Tools

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tactics_core::components::{EntityId, PlayerId};
use tactics_core::config::EngineConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tactics_tools::{ascii, simulate, validate};

#[derive(Parser)]
#[command(name = "tactics-tools")]
#[command(about = "Development tools for Grid Tactics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate rulesets, engine configs and maps
    Validate {
        /// File or directory to check
        #[arg(default_value = "assets")]
        path: PathBuf,
    },
    /// Play a headless match with every seat AI-controlled
    Simulate {
        /// Map file (`*.map.ron` or ASCII)
        map: PathBuf,
        /// Engine config in RON
        #[arg(long)]
        config: Option<PathBuf>,
        /// Number of seats
        #[arg(long, default_value_t = 2)]
        players: usize,
        /// Rounds to play
        #[arg(long, default_value_t = 10)]
        turns: u32,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the opening position as one player sees it
    View {
        /// Map file (`*.map.ron` or ASCII)
        map: PathBuf,
        /// Engine config in RON
        #[arg(long)]
        config: Option<PathBuf>,
        /// Number of seats
        #[arg(long, default_value_t = 2)]
        players: usize,
        /// Seat to view from
        #[arg(long, default_value_t = 0)]
        player: u8,
        /// Mark where this unit can move
        #[arg(long)]
        unit: Option<u32>,
    },
}

fn load_config(path: Option<&PathBuf>) -> tactics_tools::Result<EngineConfig> {
    path.map_or_else(|| Ok(EngineConfig::default()), |p| validate::load_config(p))
}

fn run(command: Commands) -> tactics_tools::Result<bool> {
    match command {
        Commands::Validate { path } => {
            tracing::info!("Validating data files in: {}", path.display());
            let reports = validate::validate_path(&path)?;
            for report in &reports {
                if report.is_ok() {
                    println!("ok      {}", report.path.display());
                } else {
                    println!("FAILED  {}", report.path.display());
                    for error in &report.errors {
                        println!("        {error}");
                    }
                }
            }
            Ok(reports.iter().all(validate::FileReport::is_ok))
        }
        Commands::Simulate {
            map,
            config,
            players,
            turns,
            json,
        } => {
            let config = load_config(config.as_ref())?;
            let map = validate::load_map(&map)?;
            let game = simulate::run_match(config, &map, players, turns)?;
            let summary = simulate::MatchSummary::of(&game);
            if json {
                println!("{}", summary.to_json()?);
            } else {
                println!(
                    "turn {}  phase {}  hash {:016x}",
                    summary.turn, summary.phase, summary.state_hash
                );
                print!("{}", ascii::render_players(&game));
            }
            Ok(true)
        }
        Commands::View {
            map,
            config,
            players,
            player,
            unit,
        } => {
            let config = load_config(config.as_ref())?;
            let map = validate::load_map(&map)?;
            let game = tactics_core::turn::TurnController::new(
                config,
                &map,
                &simulate::all_ai_setup(players),
            )?;
            print!(
                "{}",
                ascii::render_view(&game, PlayerId(player), unit.map(EntityId))
            );
            print!("{}", ascii::render_players(&game));
            Ok(true)
        }
    }
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli.command) {
        Ok(true) => {}
        Ok(false) => {
            tracing::error!("Validation failed");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    }
}

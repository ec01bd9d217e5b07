use clap::{Parser, Subcommand};
use std::io::Write;

use eqlog::commands::{self, StatsArgs};
use eqlog::{AppState, logging, readline};

#[tokio::main]
async fn main() -> Result<(), String> {
    let _guard = logging::init();
    let state = AppState::new().map_err(|e| {
        tracing::error!(error = ?e, "Reference data could not be loaded");
        e.to_string()
    })?;

    loop {
        let line = readline()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &state).await {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                writeln!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(version, about = "EverQuest combat event aggregation")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a JSON-lines event file
    Load {
        #[arg(short, long)]
        path: String,
    },
    /// Read an event file and keep following it
    Tail {
        #[arg(short, long)]
        path: String,
    },
    /// Ranked damage, tanking and healing
    Stats {
        #[arg(long)]
        reset: bool,
        /// Cumulative window in seconds, 0 for the fight timeout
        #[arg(short, long)]
        timeout: Option<u32>,
        #[arg(short, long)]
        rows: Option<usize>,
        #[arg(short, long)]
        class: Option<String>,
    },
    /// Tracked fights with start time and deaths
    Fights,
    Spells,
    Taunts,
    /// Set the name that replaces "you"
    Player {
        #[arg(short, long)]
        name: String,
    },
    Signals,
    Clear,
    Exit,
}

async fn respond(line: &str, state: &AppState) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "eqlog".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match cli.command {
        Some(Commands::Load { path }) => {
            commands::load_file(&path, state).await?;
        }
        Some(Commands::Tail { path }) => commands::tail_file(&path, state).await?,
        Some(Commands::Stats {
            reset,
            timeout,
            rows,
            class,
        }) => {
            let args = StatsArgs {
                reset,
                timeout,
                rows,
                class,
            };
            commands::show_stats(args, state).await;
        }
        Some(Commands::Fights) => commands::show_fights(state),
        Some(Commands::Spells) => commands::show_spells(state),
        Some(Commands::Taunts) => commands::show_taunts(state),
        Some(Commands::Player { name }) => commands::set_player(&name, state).await,
        Some(Commands::Signals) => commands::show_signals(state),
        Some(Commands::Clear) => commands::clear(state).await,
        Some(Commands::Exit) => {
            commands::exit();
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}

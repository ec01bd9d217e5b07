use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use eqlog_core::{
    AppConfigExt, SpellCountData, StatsRequest, SummaryBuilder, format_fights, format_taunts,
};
use eqlog_types::StatKind;

use crate::app_state::AppState;
use crate::reader::{read_event_file, tail_event_file};

/// Optional overrides of the configured overlay settings
#[derive(Debug, Default)]
pub struct StatsArgs {
    pub reset: bool,
    pub timeout: Option<u32>,
    pub rows: Option<usize>,
    pub class: Option<String>,
}

/// Read a whole event file into the session. Returns the byte offset reached.
pub async fn load_file(path: &str, state: &AppState) -> Result<u64, String> {
    state.stop_tail().await;
    let timer = Instant::now();
    let (events, end_pos) = read_event_file(path).map_err(|e| e.to_string())?;
    let count = events.len();
    state.session.process_events(events);

    println!(
        "loaded {} events in {}ms ({} fights open)",
        count,
        timer.elapsed().as_millis(),
        state.session.fight_count()
    );
    Ok(end_pos)
}

/// Load a file, then keep following it in the background
pub async fn tail_file(path: &str, state: &AppState) -> Result<(), String> {
    let end_pos = load_file(path, state).await?;
    let path = PathBuf::from(path);
    let session = Arc::clone(&state.session);

    println!("tailing file: {}", path.display());
    let handle = tokio::spawn(async move {
        tail_event_file(path, end_pos, session).await.ok();
    });
    *state.tail_task.lock().await = Some(handle);
    Ok(())
}

pub async fn show_stats(args: StatsArgs, state: &AppState) {
    let mut request = StatsRequest::from_settings(&state.config.read().await.overlay);
    request.reset = args.reset;
    if let Some(timeout) = args.timeout {
        request.timeout_override = (timeout > 0).then_some(timeout);
    }
    if let Some(rows) = args.rows {
        request.max_rows = rows;
    }
    if let Some(class) = args.class {
        request.class_filter = class;
    }

    let Some(stats) = state.session.compute_stats(&request) else {
        println!("No fresh stats");
        return;
    };

    let builder = SummaryBuilder::default();
    for kind in StatKind::ALL {
        if let Some(combined) = stats.get(kind) {
            println!("{}\n", builder.to_table(combined));
            println!("{}\n", builder.build(combined, None).to_shareable());
        }
    }
}

fn print_spell_counts(data: &SpellCountData) {
    let players = data.unique_players();
    if players.is_empty() {
        println!("No spells cast or received");
        return;
    }

    for player in players {
        println!("{player}");
        if let Some(casts) = data.player_cast_counts.get(&player) {
            let mut casts: Vec<_> = casts.iter().collect();
            casts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            for (id, count) in casts {
                let name = data
                    .unique_spells
                    .get(id)
                    .map(|s| s.name.as_str())
                    .unwrap_or(id.as_str());
                println!("    cast     {count:>4}  {name}");
            }
        }
        if let Some(interrupted) = data.player_interrupted_counts.get(&player) {
            for (abbrv, count) in interrupted {
                println!("    fizzled  {count:>4}  {abbrv}");
            }
        }
        if let Some(received) = data.player_received_counts.get(&player) {
            for (id, count) in received {
                let name = data
                    .unique_spells
                    .get(id)
                    .map(|s| s.name.as_str())
                    .unwrap_or(id.as_str());
                println!("    received {count:>4}  {name}");
            }
        }
    }
}

pub fn show_spells(state: &AppState) {
    print_spell_counts(&state.session.spell_counts(None));
}

pub fn show_taunts(state: &AppState) {
    let taunts = state.session.taunt_stats();
    if taunts.is_empty() {
        println!("No taunts recorded");
    } else {
        print!("{}", format_taunts(&taunts));
    }
}

pub fn show_fights(state: &AppState) {
    let fights = state.session.fight_overview();
    if fights.is_empty() {
        println!("No fights tracked");
    } else {
        print!("{}", format_fights(&fights));
    }
}

pub async fn set_player(name: &str, state: &AppState) {
    state.session.set_player_name(name);
    let mut config = state.config.write().await;
    config.player_name = name.trim().to_string();
    if let Err(e) = config.save() {
        tracing::warn!(error = %e, "Player name not saved");
    }
    println!("player set to {}", config.player_name);
}

pub fn show_signals(state: &AppState) {
    let Ok(signals) = state.signals.lock() else {
        return;
    };
    let mut shown = 0;
    for signal in signals.try_iter() {
        println!("{signal:?}");
        shown += 1;
    }
    if shown == 0 {
        println!("No new signals");
    }
}

pub async fn clear(state: &AppState) {
    state.stop_tail().await;
    state.session.clear();
    println!("cleared active data");
}

pub fn exit() {
    let mut stdout = std::io::stdout();
    write!(stdout, "quitting...").ok();
    stdout.flush().ok();
}

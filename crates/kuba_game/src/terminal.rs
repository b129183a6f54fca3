//! Hot-seat terminal front end.
//!
//! Both players share one terminal. Moves are played for whichever identity
//! holds the color on move, so the manager's turn checks still apply.

use anyhow::Result;
use kuba_game::{Color, GameConfig, GameHooks, GameManager, Move, Status};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

const WHITE_ID: &str = "white";
const BLACK_ID: &str = "black";

const HELP: &str = "commands: x y DIRECTION (e.g. `0 0 down`), moves, resign, rematch, help, quit";

/// Runs an interactive game until stdin closes or `quit` is entered.
#[instrument(skip(config))]
pub async fn play(config: GameConfig, json: bool) -> Result<()> {
    let (tx, mut updates) = mpsc::unbounded_channel::<&'static str>();
    let hooks = {
        let (on_update, on_over, on_rematch) = (tx.clone(), tx.clone(), tx);
        GameHooks::new()
            .on_async_update(move || {
                let _ = on_update.send("clock");
            })
            .on_game_over(move || {
                let _ = on_over.send("game over");
            })
            .on_rematch(move || {
                let _ = on_rematch.send("rematch");
            })
    };

    let manager = GameManager::new(&config, WHITE_ID, BLACK_ID, hooks)?;
    info!("Hot-seat game started");
    println!("{HELP}");
    render(&manager, json)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle(&manager, line.trim(), json)? {
                    break;
                }
            }
            Some(event) = updates.recv() => {
                debug!(event, "Game changed");
                if event == "clock" {
                    println!("* time ran out");
                    render(&manager, json)?;
                }
            }
        }
    }
    manager.state().teardown();
    Ok(())
}

/// Handles one command. Returns false when the session should end.
fn handle(manager: &GameManager, command: &str, json: bool) -> Result<bool> {
    let state = manager.state();
    let on_move = manager
        .player_for(state.whose_turn())
        .map(|p| p.id().clone())
        .unwrap_or_default();

    match command {
        "" => {}
        "quit" | "exit" => return Ok(false),
        "help" => println!("{HELP}"),
        "moves" => {
            let moves = state.valid_moves();
            if moves.is_empty() {
                println!("no legal moves");
            }
            for counted in moves {
                println!("  {} ({} marbles)", counted.mv, counted.marbles_moved);
            }
        }
        "resign" => {
            if manager.try_resign(&on_move) {
                render(manager, json)?;
            } else {
                println!("! game is already over");
            }
        }
        "rematch" => {
            for id in [WHITE_ID, BLACK_ID] {
                match manager.offer_rematch(id) {
                    Ok(true) => println!("* rematch started, colors swapped"),
                    Ok(false) => println!("* {id} offered a rematch"),
                    Err(e) => println!("! {e}"),
                }
            }
            render(manager, json)?;
        }
        text => match text.parse::<Move>() {
            Ok(mv) => match manager.try_move(mv, &on_move) {
                Ok(_) => render(manager, json)?,
                Err(e) => println!("! {e}"),
            },
            Err(e) => println!("! {e}\n{HELP}"),
        },
    }
    Ok(true)
}

fn render(manager: &GameManager, json: bool) -> Result<()> {
    let view = manager.view();
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let state = manager.state();
    println!();
    for row in view.game().board().rows() {
        let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
        println!("  {}", cells.join(" "));
    }
    for color in Color::ALL {
        let player = view
            .color_to_player()
            .get(&color)
            .map(|p| p.id().as_str())
            .unwrap_or("?");
        println!(
            "  {color} ({player}): score {}/{}, clock {}",
            state.score(color),
            view.game().win_threshold(),
            format_clock(state.time_left(color)),
        );
    }
    match view.game().status() {
        Status::Ongoing => println!("  {} to move", view.game().whose_turn()),
        status => println!("  {status}"),
    }
    Ok(())
}

fn format_clock(left: Duration) -> String {
    let secs = left.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

//! Tests for the game state machine: moves, status resolution, and timers.

use kuba_game::{
    Board, Color, Direction, GameConfig, GameHooks, GameState, Move, MoveError, Status,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use Direction::{Down, Left, Right};

/// Counts hook invocations.
#[derive(Clone, Default)]
struct Counts {
    updates: Arc<AtomicUsize>,
    game_overs: Arc<AtomicUsize>,
}

impl Counts {
    fn hooks(&self) -> GameHooks {
        let updates = Arc::clone(&self.updates);
        let game_overs = Arc::clone(&self.game_overs);
        GameHooks::new()
            .on_async_update(move || {
                updates.fetch_add(1, Ordering::SeqCst);
            })
            .on_game_over(move || {
                game_overs.fetch_add(1, Ordering::SeqCst);
            })
    }

    fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    fn game_overs(&self) -> usize {
        self.game_overs.load(Ordering::SeqCst)
    }
}

fn board(text: &str) -> Board {
    text.parse().expect("valid test board")
}

fn minutes(n: u64) -> GameConfig {
    GameConfig::new(Duration::from_secs(60 * n))
}

#[tokio::test(start_paused = true)]
async fn test_create_default_game_state() {
    let state = GameState::new(&minutes(1), GameHooks::new()).unwrap();
    assert_eq!(state.status(), Status::Ongoing);
    assert_eq!(state.whose_turn(), Color::White);
    assert_eq!(state.history_len(), 1);
    assert_eq!(state.current().board(), &Board::standard());
    assert!(state.current().last_move().is_none());
    assert!(!state.valid_moves().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_invalid_time_control() {
    for time_control in [Duration::ZERO, Duration::from_secs(24 * 60 * 60)] {
        let config = GameConfig::new(time_control);
        assert!(
            GameState::new(&config, GameHooks::new()).is_err(),
            "{time_control:?} should be rejected"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_execute_move_sequence_until_timeout() {
    let config = GameConfig::new(Duration::from_millis(500))
        .with_first_move_timeout(Duration::from_secs(30));
    let counts = Counts::default();
    let state = GameState::new(&config, counts.hooks()).unwrap();

    let step = Duration::from_millis(50);
    let plays: [(Move, Result<(), MoveError>); 9] = [
        (Move::new(0, 0, Right), Ok(())),
        (Move::new(6, 0, Left), Ok(())),
        (Move::new(1, 0, Right), Ok(())),
        (Move::new(5, 0, Left), Ok(())),
        (Move::new(1, 0, Right), Err(MoveError::Ko)),
        (Move::new(4, 0, Left), Err(MoveError::NotInTurn)),
        (Move::new(1, 0, Down), Ok(())),
        (Move::new(3, 0, Down), Ok(())),
        (Move::new(0, 1, Right), Ok(())),
    ];

    for (idx, (mv, expected)) in plays.into_iter().enumerate() {
        tokio::time::sleep(step).await;
        let result = state.execute_move(mv).map(|_| ());
        assert_eq!(result, expected, "plays[{idx}]: {mv}");
        if expected.is_ok() {
            let last = state.current().last_move().expect("last move recorded");
            assert_eq!(last.mv, mv, "plays[{idx}]");
        }
        assert_eq!(state.score(Color::White), 0);
        assert_eq!(state.score(Color::Black), 0);
    }

    // Black has used 150ms of 500ms; sitting out the rest loses on time.
    tokio::time::sleep(Duration::from_millis(450)).await;
    assert_eq!(
        state.execute_move(Move::new(3, 1, Down)),
        Err(MoveError::GameOver)
    );
    assert_eq!(state.status(), Status::WhiteWon);
    assert_eq!(counts.updates(), 1);
    assert_eq!(counts.game_overs(), 1);
    assert!(!state.clock_running(Color::White));
    assert!(!state.clock_running(Color::Black));
}

#[tokio::test(start_paused = true)]
async fn test_ko_clears_after_next_move() {
    let state = GameState::new(&minutes(1), GameHooks::new()).unwrap();
    for mv in [
        Move::new(0, 0, Right),
        Move::new(6, 0, Left),
        Move::new(1, 0, Right),
        Move::new(5, 0, Left),
    ] {
        state.execute_move(mv).unwrap();
    }
    let ko = Move::new(1, 0, Right);
    assert_eq!(state.ko(), Some(ko));
    assert_eq!(state.validate_move(ko), Err(MoveError::Ko));
    assert!(!state.valid_moves().iter().any(|m| m.mv == ko));

    state.execute_move(Move::new(1, 0, Down)).unwrap();
    assert_eq!(state.ko(), None);
}

#[tokio::test(start_paused = true)]
async fn test_validate_does_not_play() {
    let state = GameState::new(&minutes(1), GameHooks::new()).unwrap();
    let counted = state.validate_move(Move::new(0, 0, Right)).unwrap();
    assert_eq!(counted.marbles_moved, 2);
    assert_eq!(state.history_len(), 1);
    assert_eq!(
        state.validate_move(Move::new(0, 1, Right)),
        Err(MoveError::Blocked)
    );
    assert_eq!(
        state.validate_move(Move::new(-1, 0, Right)),
        Err(MoveError::OutOfBounds)
    );
}

#[tokio::test(start_paused = true)]
async fn test_draw_by_repetition() {
    let config = minutes(1).with_win_threshold(1);
    let counts = Counts::default();
    let state = GameState::from_position(
        board("R../.B./W.."),
        Color::White,
        &config,
        counts.hooks(),
    )
    .unwrap();

    let cycle = [
        Move::new(0, 2, Right),
        Move::new(1, 1, Left),
        Move::new(1, 2, Left),
        Move::new(0, 1, Right),
    ];
    // Two full cycles bring every position up to two occurrences.
    for mv in cycle.iter().chain(cycle.iter()) {
        state.execute_move(*mv).unwrap();
        assert_eq!(state.status(), Status::Ongoing, "{mv}");
    }
    state.execute_move(cycle[0]).unwrap();

    assert_eq!(state.status(), Status::Draw);
    assert_eq!(state.history_len(), 10);
    assert!(state.valid_moves().is_empty());
    assert_eq!(counts.game_overs(), 1);
    assert_eq!(counts.updates(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_win_by_score() {
    let config = minutes(1).with_win_threshold(1);
    let counts = Counts::default();
    let state =
        GameState::from_position(board(".WR/.../B.."), Color::White, &config, counts.hooks())
            .unwrap();

    let counted = state.execute_move(Move::new(1, 0, Right)).unwrap();
    assert_eq!(counted.marbles_moved, 2);
    assert_eq!(state.score(Color::White), 1);
    assert_eq!(state.status(), Status::WhiteWon);
    assert_eq!(counts.game_overs(), 1);
    assert!(!state.clock_running(Color::Black));
}

#[tokio::test(start_paused = true)]
async fn test_score_below_threshold_keeps_playing() {
    let config = minutes(1).with_win_threshold(2);
    let state =
        GameState::from_position(board(".WR/.../B.."), Color::White, &config, GameHooks::new())
            .unwrap();
    state.execute_move(Move::new(1, 0, Right)).unwrap();
    assert_eq!(state.score(Color::White), 1);
    assert_eq!(state.status(), Status::Ongoing);
    assert!(state.clock_running(Color::Black));
}

#[tokio::test(start_paused = true)]
async fn test_pushing_opponent_off_does_not_score() {
    let state =
        GameState::from_position(board("WBB/.../..."), Color::White, &minutes(1), GameHooks::new())
            .unwrap();
    state.execute_move(Move::new(0, 0, Right)).unwrap();
    assert_eq!(state.current().board(), &board(".WB/.../..."));
    assert_eq!(state.score(Color::White), 0);
    assert_eq!(state.score(Color::Black), 0);
    assert_eq!(state.status(), Status::Ongoing);
    assert_eq!(state.ko(), Some(Move::new(2, 0, Left)));
}

#[tokio::test(start_paused = true)]
async fn test_win_by_entrapment() {
    let counts = Counts::default();
    let state =
        GameState::from_position(board("WB/.."), Color::White, &minutes(1), counts.hooks())
            .unwrap();
    state.execute_move(Move::new(0, 0, Right)).unwrap();

    // Black has no marbles left, which is a loss rather than a draw.
    assert_eq!(state.status(), Status::WhiteWon);
    assert_eq!(counts.game_overs(), 1);
    assert!(state.view().valid_moves().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_resign() {
    for color in Color::ALL {
        let counts = Counts::default();
        let state = GameState::new(&minutes(1), counts.hooks()).unwrap();
        assert!(state.resign(color));
        assert_eq!(state.status(), Status::win_for(color.opponent()));
        assert_eq!(counts.game_overs(), 1);
        assert_eq!(counts.updates(), 0);

        // Sticky from here on.
        assert!(!state.resign(color.opponent()));
        assert_eq!(
            state.execute_move(Move::new(0, 0, Down)),
            Err(MoveError::GameOver)
        );
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(state.status(), Status::win_for(color.opponent()));
        assert_eq!(counts.game_overs(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_notify_out_of_time() {
    let counts = Counts::default();
    let state = GameState::new(&GameConfig::new(Duration::from_millis(2)), counts.hooks()).unwrap();
    state.execute_move(Move::new(0, 0, Down)).unwrap();

    // Nothing to do but wait on Black's clock.
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(state.status(), Status::WhiteWon);
    assert_eq!(counts.updates(), 1);
    assert_eq!(counts.game_overs(), 1);
    assert_eq!(state.time_left(Color::Black), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_first_move_deadline() {
    let config = minutes(1).with_first_move_timeout(Duration::from_secs(1));
    let counts = Counts::default();
    let state = GameState::new(&config, counts.hooks()).unwrap();
    assert!(state.view().first_move_deadline().is_some());

    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(state.status(), Status::Aborted);
    assert_eq!(counts.updates(), 1);
    assert_eq!(counts.game_overs(), 1);
    assert_eq!(state.history_len(), 1);
    assert!(state.view().first_move_deadline().is_none());
    for color in Color::ALL {
        assert!(!state.clock_running(color));
        assert_eq!(state.time_left(color), Duration::from_secs(60));
    }
    assert_eq!(
        state.execute_move(Move::new(0, 0, Down)),
        Err(MoveError::GameOver)
    );
}

#[tokio::test(start_paused = true)]
async fn test_first_move_cancels_deadline() {
    let config = minutes(1).with_first_move_timeout(Duration::from_secs(1));
    let counts = Counts::default();
    let state = GameState::new(&config, counts.hooks()).unwrap();
    state.execute_move(Move::new(0, 0, Down)).unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(state.status(), Status::Ongoing);
    assert_eq!(counts.updates(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_clock_banks_unused_time() {
    let state = GameState::new(&minutes(1), GameHooks::new()).unwrap();
    state.execute_move(Move::new(0, 0, Down)).unwrap();

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(state.time_left(Color::Black), Duration::from_secs(50));
    state.execute_move(Move::new(6, 0, Down)).unwrap();

    assert!(!state.clock_running(Color::Black));
    assert!(state.clock_running(Color::White));
    assert_eq!(state.time_left(Color::Black), Duration::from_secs(50));
    // White's first move was free.
    assert_eq!(state.time_left(Color::White), Duration::from_secs(60));

    let view = state.view();
    let black = view.clock(Color::Black).unwrap();
    assert_eq!(*black.remaining_ms(), 50_000);
    assert!(black.deadline().is_none());
    assert!(view.clock(Color::White).unwrap().deadline().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_teardown_stops_timers() {
    let counts = Counts::default();
    let state = GameState::new(&GameConfig::new(Duration::from_secs(1)), counts.hooks()).unwrap();
    state.execute_move(Move::new(0, 0, Down)).unwrap();
    state.teardown();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(state.status(), Status::Ongoing);
    assert_eq!(counts.updates(), 0);
    assert!(!state.clock_running(Color::Black));
}

#[tokio::test(start_paused = true)]
async fn test_view_serializes() {
    let state = GameState::new(&minutes(5), GameHooks::new()).unwrap();
    state.execute_move(Move::new(0, 0, Down)).unwrap();
    let json = serde_json::to_value(state.view()).unwrap();

    assert_eq!(json["status"], "ONGOING");
    assert_eq!(json["whoseTurn"], "BLACK");
    assert_eq!(json["timeControlMs"], 300_000);
    assert_eq!(json["winThreshold"], 7);
    assert_eq!(json["history"].as_array().unwrap().len(), 2);
    assert_eq!(json["history"][0]["lastMove"], serde_json::Value::Null);
    assert_eq!(json["history"][1]["lastMove"]["d"], "DOWN");
    assert_eq!(json["history"][1]["lastMove"]["marblesMoved"], 2);
    assert_eq!(json["board"][0][0], " ");
    assert_eq!(json["clocks"]["WHITE"]["score"], 0);
    assert_eq!(
        json["validMoves"].as_array().unwrap().len(),
        state.valid_moves().len()
    );
}

#[tokio::test]
async fn test_moves_from_thread_outside_runtime() {
    let counts = Counts::default();
    let config = GameConfig::new(Duration::from_millis(50));
    let state = GameState::new(&config, counts.hooks()).unwrap();

    let player = state.clone();
    let reply = std::thread::spawn(move || player.execute_move(Move::new(0, 0, Down)))
        .join()
        .expect("move from plain thread");
    assert!(reply.is_ok(), "{reply:?}");
    assert_eq!(state.history_len(), 2);
    assert_eq!(state.whose_turn(), Color::Black);
    assert!(state.clock_running(Color::Black));

    let player = state.clone();
    std::thread::spawn(move || player.execute_move(Move::new(6, 0, Down)))
        .join()
        .expect("move from plain thread")
        .unwrap();
    assert!(state.clock_running(Color::White));

    // White's timer was spawned on the game's runtime and still fires.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(state.status(), Status::BlackWon);
    assert_eq!(counts.game_overs(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_move_and_timeout_race_settles_once() {
    for round in 0..20 {
        let counts = Counts::default();
        let config = GameConfig::new(Duration::from_millis(5));
        let state = GameState::new(&config, counts.hooks()).unwrap();
        state.execute_move(Move::new(0, 0, Down)).unwrap();

        let racer = state.clone();
        let reply = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            racer.execute_move(Move::new(6, 0, Down))
        })
        .await
        .unwrap();

        // Whoever is on move after the race runs out of time too.
        tokio::time::sleep(Duration::from_millis(100)).await;

        match reply {
            Ok(_) => assert_eq!(state.status(), Status::BlackWon, "round {round}"),
            Err(e) => {
                assert_eq!(e, MoveError::GameOver, "round {round}");
                assert_eq!(state.status(), Status::WhiteWon, "round {round}");
            }
        }
        assert_eq!(counts.game_overs(), 1, "round {round}");
        assert_eq!(counts.updates(), 1, "round {round}");
    }
}

//! Player identity and turn ownership.
//!
//! The rules only check that the pushed marble belongs to the side on move.
//! The manager adds the other half: that the caller actually plays that side.
//! It also owns rematch negotiation, which replaces the game and swaps
//! colors.
//!
//! Lock order is always manager, then game. The manager never holds its own
//! lock while a move runs, so a timer firing on the game can never wait on
//! the manager.

use crate::config::GameConfig;
use crate::error::GameError;
use crate::hooks::GameHooks;
use crate::state::GameState;
use crate::view::{ClientView, PlayerView, millis};
use derive_getters::Getters;
use kuba_rules::{Color, Move, MoveWithCount};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

/// Opaque player identity, e.g. a session cookie value.
pub type PlayerId = String;

/// A player bound to a color.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Player {
    /// Player identity.
    id: PlayerId,
    /// Color this player plays in the current game.
    color: Color,
    /// Whether the player has offered a rematch.
    wants_rematch: bool,
}

#[derive(Debug)]
struct Roster {
    state: GameState,
    players: HashMap<PlayerId, Player>,
    by_color: [PlayerId; 2],
}

impl Roster {
    fn at(&self, color: Color) -> Option<&Player> {
        self.players.get(&self.by_color[color.index()])
    }
}

/// One game between two identified players, and any rematches they agree to.
#[derive(Debug, Clone)]
pub struct GameManager {
    roster: Arc<Mutex<Roster>>,
    config: GameConfig,
    hooks: GameHooks,
}

impl GameManager {
    /// Starts a game with `white` playing White. Later moves and rematches
    /// may come from any thread.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[instrument(skip(config, white, black, hooks))]
    pub fn new(
        config: &GameConfig,
        white: impl Into<PlayerId>,
        black: impl Into<PlayerId>,
        hooks: GameHooks,
    ) -> Result<Self, GameError> {
        let (white, black) = (white.into(), black.into());
        if white.is_empty() || black.is_empty() {
            return Err(GameError::InvalidPlayers("missing player identity".to_string()));
        }
        if white == black {
            return Err(GameError::InvalidPlayers(
                "a player cannot play against themselves".to_string(),
            ));
        }

        let state = GameState::new(config, hooks.clone())?;
        let players = [(white.clone(), Color::White), (black.clone(), Color::Black)]
            .into_iter()
            .map(|(id, color)| {
                let player = Player {
                    id: id.clone(),
                    color,
                    wants_rematch: false,
                };
                (id, player)
            })
            .collect();

        info!(%white, %black, "Game manager created");
        Ok(Self {
            roster: Arc::new(Mutex::new(Roster {
                state,
                players,
                by_color: [white, black],
            })),
            config: config.clone(),
            hooks,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Roster> {
        self.roster.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handle to the current game.
    pub fn state(&self) -> GameState {
        self.lock().state.clone()
    }

    /// Looks up a player by identity.
    pub fn player(&self, id: &str) -> Option<Player> {
        self.lock().players.get(id).cloned()
    }

    /// The player currently playing `color`.
    pub fn player_for(&self, color: Color) -> Option<Player> {
        self.lock().at(color).cloned()
    }

    /// Plays a move for the player identified by `id`.
    ///
    /// Fails if the identity is unknown or plays the color that is not on
    /// move, before the rules are consulted.
    #[instrument(skip(self), fields(x = mv.x, y = mv.y, direction = %mv.direction))]
    pub fn try_move(&self, mv: Move, id: &str) -> Result<MoveWithCount, GameError> {
        let (state, color) = {
            let roster = self.lock();
            let player = roster.players.get(id).ok_or_else(|| {
                warn!(player_id = id, "Unknown player attempted move");
                GameError::UnknownPlayer(id.to_string())
            })?;
            (roster.state.clone(), player.color)
        };
        state.execute_move_for(color, mv)
    }

    /// Resigns for the player identified by `id`. Returns false if the
    /// identity is unknown or the game was already over.
    #[instrument(skip(self))]
    pub fn try_resign(&self, id: &str) -> bool {
        let Some((state, color)) = ({
            let roster = self.lock();
            roster
                .players
                .get(id)
                .map(|player| (roster.state.clone(), player.color))
        }) else {
            warn!(player_id = id, "Unknown player attempted to resign");
            return false;
        };
        state.resign(color)
    }

    /// Records a rematch offer from `id`.
    ///
    /// Returns true if the opponent had already offered, in which case a new
    /// game has started with colors swapped. Returns false if the offer was
    /// recorded and is waiting for the opponent.
    #[instrument(skip(self))]
    pub fn offer_rematch(&self, id: &str) -> Result<bool, GameError> {
        let mut roster = self.lock();
        if !roster.state.status().is_terminal() {
            debug!(player_id = id, "Rematch offered during a game");
            return Err(GameError::GameNotOver);
        }
        let player = roster
            .players
            .get(id)
            .ok_or_else(|| GameError::UnknownPlayer(id.to_string()))?;
        if player.wants_rematch {
            return Err(GameError::RematchAlreadyOffered);
        }
        let opponent_color = player.color.opponent();
        let opponent_ready = roster.at(opponent_color).is_some_and(|p| p.wants_rematch);

        if !opponent_ready {
            if let Some(player) = roster.players.get_mut(id) {
                player.wants_rematch = true;
            }
            info!(player_id = id, "Rematch offered");
            return Ok(false);
        }

        let state = roster.state.rematch(&self.config)?;
        roster.state.teardown();
        roster.state = state;
        for player in roster.players.values_mut() {
            player.color = player.color.opponent();
            player.wants_rematch = false;
        }
        roster.by_color.swap(0, 1);
        info!(
            white = %roster.by_color[Color::White.index()],
            black = %roster.by_color[Color::Black.index()],
            "Rematch started"
        );
        drop(roster);

        self.hooks.rematch();
        Ok(true)
    }

    /// Copy of the current game with both players attached.
    pub fn view(&self) -> ClientView {
        let roster = self.lock();
        let game = roster.state.view();

        let mut color_to_player = BTreeMap::new();
        let mut id_to_player = BTreeMap::new();
        for color in Color::ALL {
            let Some(player) = roster.at(color) else {
                continue;
            };
            let clock = game.clock(color);
            let view = PlayerView {
                id: player.id.clone(),
                color,
                score: clock.map_or(0, |c| *c.score()),
                remaining_ms: clock.map_or(millis(*self.config.time_control()), |c| {
                    *c.remaining_ms()
                }),
                deadline: clock.and_then(|c| *c.deadline()),
                wants_rematch: player.wants_rematch,
            };
            id_to_player.insert(player.id.clone(), view.clone());
            color_to_player.insert(color, view);
        }

        ClientView {
            game,
            color_to_player,
            id_to_player,
        }
    }
}

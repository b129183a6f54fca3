//! Notification hooks.
//!
//! The engine never shapes notification payloads. It only signals that
//! something changed; the transport layer re-reads the view and decides what
//! to publish.

use std::fmt;
use std::sync::Arc;

/// A shareable callback.
pub type Hook = Arc<dyn Fn() + Send + Sync>;

/// Callbacks the engine invokes on state changes that have no synchronous
/// caller waiting for them.
///
/// Hooks always run after the game's lock has been released, so a hook may
/// call straight back into the game or its manager.
#[derive(Clone, Default)]
pub struct GameHooks {
    on_async_update: Option<Hook>,
    on_game_over: Option<Hook>,
    on_rematch: Option<Hook>,
}

impl GameHooks {
    /// Hooks that do nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Called when a timer changes the game.
    pub fn on_async_update(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_async_update = Some(Arc::new(hook));
        self
    }

    /// Called exactly once per game, when it first reaches a terminal status.
    pub fn on_game_over(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_game_over = Some(Arc::new(hook));
        self
    }

    /// Called when both players have accepted a rematch and the new game
    /// has been installed.
    pub fn on_rematch(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_rematch = Some(Arc::new(hook));
        self
    }

    pub(crate) fn async_update(&self) {
        if let Some(hook) = &self.on_async_update {
            hook();
        }
    }

    pub(crate) fn game_over(&self) {
        if let Some(hook) = &self.on_game_over {
            hook();
        }
    }

    pub(crate) fn rematch(&self) {
        if let Some(hook) = &self.on_rematch {
            hook();
        }
    }
}

impl fmt::Debug for GameHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameHooks")
            .field("on_async_update", &self.on_async_update.is_some())
            .field("on_game_over", &self.on_game_over.is_some())
            .field("on_rematch", &self.on_rematch.is_some())
            .finish()
    }
}

//! Host arbiter.
//!
//! Host identity is positional: the participant at roster index 0 is the host
//! of record for the lifetime of the game. There is no host migration; if the
//! player at index 0 disconnects, no instance drives the clock and the game
//! stalls until they return.

use crate::model::Game;

/// Whether the local participant is the host of record.
pub fn is_host(game: &Game, local_uid: &str) -> bool {
    game.players.first().is_some_and(|p| p.uid == local_uid)
}

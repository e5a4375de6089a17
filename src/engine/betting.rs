//! Betting ledger: applies one player's wagering action to the shared state.
//!
//! The ledger is pure. It takes the observed game snapshot, validates the
//! action against the acting player and the current phase, and returns the
//! replacement roster together with the recomputed pot. The pot is always
//! recomputed from the whole roster rather than adjusted incrementally, so a
//! partial prior write cannot leave it out of sync with the bets.

use thiserror::Error;

use crate::model::{Game, Phase, Player};

/// A wagering action a player can take during a hint phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BetAction {
    /// Give up the round; bet and balance stay as they are.
    Fold,
    /// Match the big blind, paying what the stack allows.
    Call,
    /// Raise the committed bet to the given total.
    Raise(u32),
    /// Commit the entire remaining stack.
    AllIn,
}

/// Rejection of a wagering action. No state is mutated when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BetError {
    /// The acting uid is not part of the roster.
    #[error("player `{uid}` is not part of this game")]
    UnknownPlayer {
        /// The rejected uid.
        uid: String,
    },
    /// The player folded earlier this round.
    #[error("player `{uid}` has already folded")]
    AlreadyFolded {
        /// The rejected uid.
        uid: String,
    },
    /// The player is all-in and can take no further action this round.
    #[error("player `{uid}` is already all-in")]
    AlreadyAllIn {
        /// The rejected uid.
        uid: String,
    },
    /// Wagering is only open during the hint phases.
    #[error("betting is closed during the `{phase}` phase")]
    BettingClosed {
        /// The phase the game was in.
        phase: Phase,
    },
    /// The requested raise does not exceed the player's committed bet.
    #[error("raise to {amount} does not exceed the current bet of {current_bet}")]
    RaiseTooLow {
        /// Requested total bet.
        amount: u32,
        /// The player's committed bet.
        current_bet: u32,
    },
}

/// Replacement roster and pot produced by a successful action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetOutcome {
    /// Full roster with the acting player's state updated.
    pub players: Vec<Player>,
    /// Pot recomputed as the sum of every committed bet.
    pub pot: u32,
}

/// Apply `action` for `uid` against the observed snapshot.
pub fn apply(game: &Game, uid: &str, action: BetAction) -> Result<BetOutcome, BetError> {
    if !game.phase.allows_betting() {
        return Err(BetError::BettingClosed { phase: game.phase });
    }

    let actor = game
        .player(uid)
        .ok_or_else(|| BetError::UnknownPlayer { uid: uid.into() })?;
    if actor.has_folded {
        return Err(BetError::AlreadyFolded { uid: uid.into() });
    }
    if actor.is_all_in {
        return Err(BetError::AlreadyAllIn { uid: uid.into() });
    }

    let mut players = game.players.clone();
    for player in players.iter_mut().filter(|p| p.uid == uid) {
        match action {
            BetAction::Fold => {
                player.has_folded = true;
            }
            BetAction::Call => {
                // A short stack calls for whatever it can pay; the bet rises
                // only by the amount actually paid.
                let owed = game.big_blind.saturating_sub(player.current_bet);
                let paid = owed.min(player.quizinos);
                player.quizinos -= paid;
                player.current_bet += paid;
            }
            BetAction::Raise(amount) => {
                // Raises are capped at the stack; chips can never go negative
                // and the committed total never exceeds what the player owns.
                let ceiling = player.current_bet + player.quizinos;
                let target = amount.min(ceiling);
                if target <= player.current_bet {
                    return Err(BetError::RaiseTooLow {
                        amount,
                        current_bet: player.current_bet,
                    });
                }
                let paid = target - player.current_bet;
                player.quizinos -= paid;
                player.current_bet = target;
            }
            BetAction::AllIn => {
                player.current_bet += player.quizinos;
                player.quizinos = 0;
                player.is_all_in = true;
            }
        }
    }

    let pot = players.iter().map(|p| p.current_bet).sum();
    Ok(BetOutcome { players, pot })
}

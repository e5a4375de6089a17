//! Crate-level error taxonomy.

use thiserror::Error;

use crate::engine::betting::BetError;
use crate::engine::phases::TransitionError;
use crate::model::Phase;
use crate::store::StoreError;

/// Errors surfaced by engine operations. Precondition failures reject the
/// operation without mutating any state; store failures leave the document
/// as it was and are never retried.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The referenced game document does not exist.
    #[error("game `{0}` not found")]
    GameNotFound(String),
    /// A host-only operation was attempted by a non-host participant.
    #[error("only the host may perform this action")]
    NotHost,
    /// The acting uid is not part of the game's roster.
    #[error("player `{uid}` is not part of this game")]
    NotAParticipant {
        /// The rejected uid.
        uid: String,
    },
    /// Answers are only accepted while the question is open.
    #[error("answers are closed during the `{phase}` phase")]
    AnswersClosed {
        /// The phase the game was in.
        phase: Phase,
    },
    /// A wagering action was rejected by the betting ledger.
    #[error("invalid bet: {0}")]
    Bet(#[from] BetError),
    /// A phase transition was rejected by the state machine.
    #[error("invalid transition: {0}")]
    Transition(#[from] TransitionError),
    /// The document store failed.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
    /// A document could not be encoded or decoded.
    #[error("document encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

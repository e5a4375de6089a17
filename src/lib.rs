//! Engine for a round-based multiplayer trivia game with poker-style betting.
//!
//! Players answer questions revealed progressively through hints while
//! betting quizinos on each reveal. All clients share one replicated game
//! document; the host of record drives timed phase advancement while every
//! participant bets and answers by writing to the same document.

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod store;

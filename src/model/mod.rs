//! Shared document model for a running match.
//!
//! These types mirror the wire shape of the replicated `games` document:
//! camelCase keys, millisecond epoch timestamps, and nullable round-scoped
//! question state. Every connected client reads and writes this exact shape.

pub mod patch;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::store::Document;

/// Lifecycle status of a match. Never reverts to `Waiting` once playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Created but not yet started by the host.
    Waiting,
    /// The host started the game; rounds are cycling.
    Playing,
}

/// One discrete stage of a round's lifecycle, in cyclic order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Pre-game waiting room; never revisited after the first lap.
    Start,
    /// Countdown into the round, category already on display.
    Opening,
    /// The question is shown and answers are open.
    Question,
    /// First hint revealed; betting open.
    Hint1,
    /// Second hint revealed; betting open.
    Hint2,
    /// Third hint revealed; betting open.
    Hint3,
    /// The answer is shown.
    Reveal,
    /// Short pause before the next round begins.
    Elimination,
}

impl Phase {
    /// Successor in the fixed cyclic order. `Start` feeds into the cycle once
    /// and is never produced again.
    pub fn next(self) -> Phase {
        match self {
            Phase::Start => Phase::Opening,
            Phase::Opening => Phase::Question,
            Phase::Question => Phase::Hint1,
            Phase::Hint1 => Phase::Hint2,
            Phase::Hint2 => Phase::Hint3,
            Phase::Hint3 => Phase::Reveal,
            Phase::Reveal => Phase::Elimination,
            Phase::Elimination => Phase::Opening,
        }
    }

    /// Index into `currentHints` introduced by this phase, if it is a hint
    /// phase: hint N reveals hint index N-1.
    pub fn hint_index(self) -> Option<u32> {
        match self {
            Phase::Hint1 => Some(0),
            Phase::Hint2 => Some(1),
            Phase::Hint3 => Some(2),
            _ => None,
        }
    }

    /// Whether wagering actions are accepted during this phase.
    pub fn allows_betting(self) -> bool {
        matches!(self, Phase::Hint1 | Phase::Hint2 | Phase::Hint3)
    }

    /// Whether answer submissions are accepted during this phase.
    pub fn allows_answers(self) -> bool {
        matches!(
            self,
            Phase::Question | Phase::Hint1 | Phase::Hint2 | Phase::Hint3
        )
    }

    /// Wire representation of the phase.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Start => "start",
            Phase::Opening => "opening",
            Phase::Question => "question",
            Phase::Hint1 => "hint1",
            Phase::Hint2 => "hint2",
            Phase::Hint3 => "hint3",
            Phase::Reveal => "reveal",
            Phase::Elimination => "elimination",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected answer format for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// Free-text answer.
    Text,
    /// Numeric answer.
    Number,
}

/// A catalog question with its progressively revealed hints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Catalog identifier.
    pub id: String,
    /// Identifier of the category this question belongs to.
    pub category: String,
    /// The question text shown to players.
    pub question: String,
    /// The expected answer.
    pub answer: String,
    /// Hints revealed one per hint phase.
    pub hints: Vec<String>,
    /// Expected answer format.
    #[serde(rename = "type")]
    pub kind: QuestionType,
}

/// A catalog category grouping questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Catalog identifier, referenced by [`Question::category`].
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional description shown in category pickers.
    #[serde(default)]
    pub description: Option<String>,
}

/// Identity of a participant, as supplied by the lobby layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProfile {
    /// Stable user identifier.
    pub uid: String,
    /// Display name.
    pub name: String,
}

/// Per-player state embedded in the game document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Stable user identifier.
    pub uid: String,
    /// Display name.
    pub name: String,
    /// Cross-round score. Reserved; the engine carries it untouched.
    #[serde(default)]
    pub score: i64,
    /// Chip balance. Never negative.
    #[serde(default)]
    pub quizinos: u32,
    /// Chips committed during the active betting round.
    #[serde(default)]
    pub current_bet: u32,
    /// Free-text answer for the active question, if submitted.
    #[serde(default)]
    pub current_answer: Option<String>,
    /// The player folded and takes no further betting action this round.
    #[serde(default)]
    pub has_folded: bool,
    /// The player committed their whole stack this round.
    #[serde(default)]
    pub is_all_in: bool,
}

impl Player {
    /// Stake a fresh player from a lobby profile.
    pub fn staked(profile: PlayerProfile, quizinos: u32) -> Self {
        Self {
            uid: profile.uid,
            name: profile.name,
            score: 0,
            quizinos,
            current_bet: 0,
            current_answer: None,
            has_folded: false,
            is_all_in: false,
        }
    }

    /// Reset the round-scoped fields for a new round, keeping identity,
    /// score, and chip balance.
    pub fn round_reset(&self) -> Self {
        Self {
            current_bet: 0,
            current_answer: None,
            has_folded: false,
            is_all_in: false,
            ..self.clone()
        }
    }
}

/// The shared game document, one per match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    /// Document identifier, immutable after creation.
    pub id: String,
    /// Identifier of the lobby this match was created from.
    pub lobby_id: String,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Current position in the round cycle.
    pub phase: Phase,
    /// Round counter, incremented only on the elimination → opening
    /// transition.
    pub current_round: u32,
    /// Participants in join order. Index 0 is the host of record.
    pub players: Vec<Player>,
    /// Reserved turn pointer; betting is simultaneous.
    #[serde(default)]
    pub current_player_index: u32,
    /// Aggregate of all committed bets this round.
    pub pot: u32,
    /// Small blind for the current blind level.
    pub small_blind: u32,
    /// Big blind for the current blind level; the call target.
    pub big_blind: u32,
    /// Escalation level for the blinds. Reserved.
    pub blind_level: u32,
    /// Index into `currentHints` of the most recently revealed hint.
    pub current_hint_index: u32,
    /// Creation timestamp, epoch milliseconds.
    pub created_at: u64,
    /// Timestamp of the last blind escalation, epoch milliseconds. Reserved.
    pub last_blind_increase: u64,
    /// Entry instant of the current phase, epoch milliseconds. Rewritten on
    /// every transition; all clients derive their deadlines from it.
    pub round_start_time: u64,
    /// Category selected for the active round.
    #[serde(default)]
    pub selected_category: Option<String>,
    /// Question text for the active round.
    #[serde(default)]
    pub current_question: Option<String>,
    /// Expected answer for the active round.
    #[serde(default)]
    pub current_answer: Option<String>,
    /// Hints for the active round, revealed one per hint phase.
    #[serde(default)]
    pub current_hints: Option<Vec<String>>,
    /// Answer format of the active question.
    #[serde(default)]
    pub current_question_type: Option<QuestionType>,
}

impl Game {
    /// Build a fresh match document in the waiting room state, staking every
    /// player with the configured starting balance. Roster order is
    /// significant: the first entry becomes the host of record.
    pub fn new(
        id: String,
        lobby_id: String,
        roster: Vec<PlayerProfile>,
        config: &EngineConfig,
        now_ms: u64,
    ) -> Self {
        let players = roster
            .into_iter()
            .map(|profile| Player::staked(profile, config.starting_quizinos))
            .collect();

        Self {
            id,
            lobby_id,
            status: GameStatus::Waiting,
            phase: Phase::Start,
            current_round: 1,
            players,
            current_player_index: 0,
            pot: 0,
            small_blind: config.small_blind,
            big_blind: config.big_blind,
            blind_level: 1,
            current_hint_index: 0,
            created_at: now_ms,
            last_blind_increase: now_ms,
            round_start_time: now_ms,
            selected_category: None,
            current_question: None,
            current_answer: None,
            current_hints: None,
            current_question_type: None,
        }
    }

    /// Look up a participant by uid.
    pub fn player(&self, uid: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.uid == uid)
    }

    /// Encode the document for the store.
    pub fn to_document(&self) -> serde_json::Result<Document> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(serde::ser::Error::custom("game must encode to an object")),
        }
    }

    /// Decode a document received from the store.
    pub fn from_document(document: Document) -> serde_json::Result<Self> {
        serde_json::from_value(serde_json::Value::Object(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_cycle_matches_round_order() {
        let mut phase = Phase::Start;
        let expected = [
            Phase::Opening,
            Phase::Question,
            Phase::Hint1,
            Phase::Hint2,
            Phase::Hint3,
            Phase::Reveal,
            Phase::Elimination,
            Phase::Opening,
        ];
        for want in expected {
            phase = phase.next();
            assert_eq!(phase, want);
        }
    }

    #[test]
    fn hint_phases_reveal_their_own_hint() {
        assert_eq!(Phase::Hint1.hint_index(), Some(0));
        assert_eq!(Phase::Hint2.hint_index(), Some(1));
        assert_eq!(Phase::Hint3.hint_index(), Some(2));
        assert_eq!(Phase::Question.hint_index(), None);
    }

    #[test]
    fn phase_serializes_to_wire_names() {
        for phase in [
            Phase::Start,
            Phase::Opening,
            Phase::Question,
            Phase::Hint1,
            Phase::Hint2,
            Phase::Hint3,
            Phase::Reveal,
            Phase::Elimination,
        ] {
            let json = serde_json::to_value(phase).unwrap();
            assert_eq!(json, serde_json::Value::String(phase.as_str().into()));
        }
    }

    #[test]
    fn game_document_round_trip_uses_camel_case() {
        let config = EngineConfig::default();
        let game = Game::new(
            "g1".into(),
            "l1".into(),
            vec![
                PlayerProfile {
                    uid: "u1".into(),
                    name: "Mia".into(),
                },
                PlayerProfile {
                    uid: "u2".into(),
                    name: "Jonas".into(),
                },
            ],
            &config,
            1_000,
        );

        let document = game.to_document().unwrap();
        assert!(document.contains_key("roundStartTime"));
        assert!(document.contains_key("lobbyId"));
        assert_eq!(document["phase"], serde_json::json!("start"));
        assert_eq!(document["status"], serde_json::json!("waiting"));

        let decoded = Game::from_document(document).unwrap();
        assert_eq!(decoded, game);
        assert_eq!(decoded.players[0].quizinos, config.starting_quizinos);
    }

    #[test]
    fn player_round_reset_keeps_identity_and_stack() {
        let player = Player {
            uid: "u1".into(),
            name: "Mia".into(),
            score: 3,
            quizinos: 850,
            current_bet: 150,
            current_answer: Some("Oslo".into()),
            has_folded: true,
            is_all_in: false,
        };

        let reset = player.round_reset();
        assert_eq!(reset.uid, "u1");
        assert_eq!(reset.score, 3);
        assert_eq!(reset.quizinos, 850);
        assert_eq!(reset.current_bet, 0);
        assert_eq!(reset.current_answer, None);
        assert!(!reset.has_folded);
        assert!(!reset.is_all_in);
    }
}

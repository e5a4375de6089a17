//! Typed builder for partial game-document updates.
//!
//! The store merges named top-level fields only, so every mutation in the
//! engine is expressed as a patch carrying exactly the fields it touches.
//! Cleared question state is written as explicit nulls; untouched fields are
//! absent from the patch entirely.

use serde_json::Value;

use crate::model::{GameStatus, Phase, Player, Question};
use crate::store::Document;

#[derive(Debug, Clone)]
enum QuestionFields {
    Set(Question),
    Clear,
}

/// Accumulates the top-level fields of one partial game-document write.
#[derive(Debug, Clone, Default)]
pub struct GamePatch {
    phase: Option<Phase>,
    status: Option<GameStatus>,
    round_start_time: Option<u64>,
    current_round: Option<u32>,
    current_hint_index: Option<u32>,
    selected_category: Option<String>,
    question: Option<QuestionFields>,
    players: Option<Vec<Player>>,
    pot: Option<u32>,
}

impl GamePatch {
    /// Start an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the phase.
    pub fn phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Set the lifecycle status.
    pub fn status(mut self, status: GameStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restamp the phase-entry instant.
    pub fn round_start_time(mut self, now_ms: u64) -> Self {
        self.round_start_time = Some(now_ms);
        self
    }

    /// Set the round counter.
    pub fn current_round(mut self, round: u32) -> Self {
        self.current_round = Some(round);
        self
    }

    /// Set the index of the most recently revealed hint.
    pub fn current_hint_index(mut self, index: u32) -> Self {
        self.current_hint_index = Some(index);
        self
    }

    /// Set the category for the active round.
    pub fn selected_category(mut self, category: impl Into<String>) -> Self {
        self.selected_category = Some(category.into());
        self
    }

    /// Populate all question fields from one catalog question. Written
    /// together so no client can observe a phase change with a stale
    /// question.
    pub fn question(mut self, question: Question) -> Self {
        self.question = Some(QuestionFields::Set(question));
        self
    }

    /// Null out every question field for the next round.
    pub fn clear_question(mut self) -> Self {
        self.question = Some(QuestionFields::Clear);
        self
    }

    /// Replace the whole roster. Array fields are never patched element-wise.
    pub fn players(mut self, players: Vec<Player>) -> Self {
        self.players = Some(players);
        self
    }

    /// Set the pot.
    pub fn pot(mut self, pot: u32) -> Self {
        self.pot = Some(pot);
        self
    }

    /// Encode the touched fields as a store document.
    pub fn into_document(self) -> serde_json::Result<Document> {
        let mut fields = Document::new();

        if let Some(phase) = self.phase {
            fields.insert("phase".into(), Value::String(phase.as_str().into()));
        }
        if let Some(status) = self.status {
            fields.insert("status".into(), serde_json::to_value(status)?);
        }
        if let Some(now_ms) = self.round_start_time {
            fields.insert("roundStartTime".into(), Value::from(now_ms));
        }
        if let Some(round) = self.current_round {
            fields.insert("currentRound".into(), Value::from(round));
        }
        if let Some(index) = self.current_hint_index {
            fields.insert("currentHintIndex".into(), Value::from(index));
        }
        if let Some(category) = self.selected_category {
            fields.insert("selectedCategory".into(), Value::String(category));
        }
        match self.question {
            Some(QuestionFields::Set(question)) => {
                fields.insert("currentQuestion".into(), Value::String(question.question));
                fields.insert("currentAnswer".into(), Value::String(question.answer));
                fields.insert("currentHints".into(), serde_json::to_value(question.hints)?);
                fields.insert(
                    "currentQuestionType".into(),
                    serde_json::to_value(question.kind)?,
                );
            }
            Some(QuestionFields::Clear) => {
                fields.insert("currentQuestion".into(), Value::Null);
                fields.insert("currentAnswer".into(), Value::Null);
                fields.insert("currentHints".into(), Value::Null);
                fields.insert("currentQuestionType".into(), Value::Null);
            }
            None => {}
        }
        if let Some(players) = self.players {
            fields.insert("players".into(), serde_json::to_value(players)?);
        }
        if let Some(pot) = self.pot {
            fields.insert("pot".into(), Value::from(pot));
        }

        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionType;

    #[test]
    fn patch_contains_only_touched_fields() {
        let fields = GamePatch::new()
            .phase(Phase::Reveal)
            .round_start_time(42)
            .into_document()
            .unwrap();

        assert_eq!(fields.len(), 2);
        assert_eq!(fields["phase"], serde_json::json!("reveal"));
        assert_eq!(fields["roundStartTime"], serde_json::json!(42));
    }

    #[test]
    fn question_fields_are_written_together() {
        let question = Question {
            id: "q1".into(),
            category: "sport".into(),
            question: "Hvem vant?".into(),
            answer: "Norge".into(),
            hints: vec!["a".into(), "b".into(), "c".into()],
            kind: QuestionType::Text,
        };

        let fields = GamePatch::new()
            .phase(Phase::Question)
            .question(question)
            .into_document()
            .unwrap();

        assert_eq!(fields["currentQuestion"], serde_json::json!("Hvem vant?"));
        assert_eq!(fields["currentAnswer"], serde_json::json!("Norge"));
        assert_eq!(fields["currentHints"], serde_json::json!(["a", "b", "c"]));
        assert_eq!(fields["currentQuestionType"], serde_json::json!("text"));
    }

    #[test]
    fn clear_question_writes_explicit_nulls() {
        let fields = GamePatch::new().clear_question().into_document().unwrap();

        for key in [
            "currentQuestion",
            "currentAnswer",
            "currentHints",
            "currentQuestionType",
        ] {
            assert_eq!(fields[key], Value::Null, "{key} must be nulled");
        }
    }
}

//! Phase state machine: plans transitions and builds their document patches.
//!
//! Planning is a pure function of the observed game snapshot, so invoking it
//! twice on the same snapshot yields the same patch; the elimination round
//! reset in particular cannot be applied twice by a duplicated trigger.
//! Every patch restamps `roundStartTime`, the synchronization point all
//! clients derive their deadlines from.

use thiserror::Error;

use crate::model::patch::GamePatch;
use crate::model::{Game, GameStatus, Phase, Question};

/// Side effect required to complete a planned transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceEffect {
    /// Leave the waiting room: mark the game playing and pick the first
    /// category.
    BeginGame,
    /// Draw the round's question for the selected category (picking a
    /// category first if none was chosen).
    DrawQuestion {
        /// Category already selected for the round, if any.
        category: Option<String>,
    },
    /// Reveal the hint introduced by the phase being entered.
    RevealHint {
        /// Index into `currentHints` to expose.
        index: u32,
    },
    /// Phase and timestamp only.
    PhaseOnly,
    /// Close the round: bump the round counter, wipe question and betting
    /// state, and pick the next category.
    ResetRound,
}

/// A validated transition: where the game is, where it goes next, and what
/// has to happen on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvancePlan {
    /// Phase the snapshot is in.
    pub from: Phase,
    /// Phase being entered.
    pub to: Phase,
    /// Side effect to perform with the phase write.
    pub effect: AdvanceEffect,
}

/// Rejection of a transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The cycle cannot advance before the host starts the game.
    #[error("the game has not been started")]
    NotStarted,
    /// The game already left the waiting room.
    #[error("the game has already been started")]
    AlreadyStarted,
}

/// Plan the next transition from the observed snapshot.
pub fn plan(game: &Game) -> Result<AdvancePlan, TransitionError> {
    let from = game.phase;
    if from != Phase::Start && game.status == GameStatus::Waiting {
        return Err(TransitionError::NotStarted);
    }

    let to = from.next();
    let effect = match from {
        Phase::Start => AdvanceEffect::BeginGame,
        Phase::Opening => AdvanceEffect::DrawQuestion {
            category: game.selected_category.clone(),
        },
        Phase::Question => AdvanceEffect::RevealHint { index: 0 },
        Phase::Hint1 => AdvanceEffect::RevealHint { index: 1 },
        Phase::Hint2 => AdvanceEffect::RevealHint { index: 2 },
        Phase::Hint3 | Phase::Reveal => AdvanceEffect::PhaseOnly,
        Phase::Elimination => AdvanceEffect::ResetRound,
    };

    Ok(AdvancePlan { from, to, effect })
}

/// Patch for `start → opening`: the game becomes live with its first
/// category on display.
pub fn begin_game_patch(now_ms: u64, category: String) -> GamePatch {
    GamePatch::new()
        .phase(Phase::Opening)
        .status(GameStatus::Playing)
        .selected_category(category)
        .round_start_time(now_ms)
}

/// Patch for `opening → question`. The question fields ride in the same
/// write as the phase so no client can observe `question` without them.
pub fn draw_question_patch(now_ms: u64, question: Question) -> GamePatch {
    GamePatch::new()
        .phase(Phase::Question)
        .selected_category(question.category.clone())
        .question(question)
        .round_start_time(now_ms)
}

/// Patch entering a hint phase, exposing that phase's hint.
pub fn reveal_hint_patch(now_ms: u64, to: Phase, index: u32) -> GamePatch {
    GamePatch::new()
        .phase(to)
        .current_hint_index(index)
        .round_start_time(now_ms)
}

/// Patch for transitions with no extra state change.
pub fn phase_only_patch(now_ms: u64, to: Phase) -> GamePatch {
    GamePatch::new().phase(to).round_start_time(now_ms)
}

/// Patch for `elimination → opening`: one round ends and the next begins.
/// Round-scoped question and betting state is wiped for every player, the
/// pot returns to zero, and the next category is installed.
pub fn reset_round_patch(game: &Game, now_ms: u64, category: String) -> GamePatch {
    let players = game.players.iter().map(|p| p.round_reset()).collect();
    GamePatch::new()
        .phase(Phase::Opening)
        .round_start_time(now_ms)
        .current_round(game.current_round + 1)
        .current_hint_index(0)
        .clear_question()
        .selected_category(category)
        .players(players)
        .pot(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::model::PlayerProfile;

    fn game_in(phase: Phase) -> Game {
        let mut game = Game::new(
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
            &EngineConfig::default(),
            1_000,
        );
        if phase != Phase::Start {
            game.status = GameStatus::Playing;
        }
        game.phase = phase;
        game
    }

    #[test]
    fn every_phase_advances_to_its_cyclic_successor() {
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
            let plan = plan(&game_in(phase)).unwrap();
            assert_eq!(plan.from, phase);
            assert_eq!(plan.to, phase.next());
        }
    }

    #[test]
    fn waiting_game_cannot_advance_mid_cycle() {
        let mut game = game_in(Phase::Opening);
        game.status = GameStatus::Waiting;
        assert_eq!(plan(&game).unwrap_err(), TransitionError::NotStarted);
    }

    #[test]
    fn entering_a_hint_phase_reveals_that_hint() {
        for (from, index) in [(Phase::Question, 0), (Phase::Hint1, 1), (Phase::Hint2, 2)] {
            let plan = plan(&game_in(from)).unwrap();
            assert_eq!(plan.effect, AdvanceEffect::RevealHint { index });
            assert_eq!(plan.to.hint_index(), Some(index));
        }
    }

    #[test]
    fn opening_carries_the_selected_category_into_the_draw() {
        let mut game = game_in(Phase::Opening);
        game.selected_category = Some("sport".into());

        let plan = plan(&game).unwrap();
        assert_eq!(
            plan.effect,
            AdvanceEffect::DrawQuestion {
                category: Some("sport".into())
            }
        );
    }

    #[test]
    fn round_reset_clears_every_round_scoped_field() {
        let mut game = game_in(Phase::Elimination);
        game.current_round = 3;
        game.pot = 160;
        game.selected_category = Some("film".into());
        game.current_question = Some("Hvem regisserte?".into());
        game.current_answer = Some("Ivo Caprino".into());
        game.current_hints = Some(vec!["a".into(), "b".into(), "c".into()]);
        game.players[0].current_bet = 100;
        game.players[0].has_folded = true;
        game.players[1].current_bet = 60;
        game.players[1].is_all_in = true;
        game.players[1].current_answer = Some("Flåklypa".into());

        let fields = reset_round_patch(&game, 2_000, "musikk".into())
            .into_document()
            .unwrap();

        assert_eq!(fields["phase"], serde_json::json!("opening"));
        assert_eq!(fields["currentRound"], serde_json::json!(4));
        assert_eq!(fields["pot"], serde_json::json!(0));
        assert_eq!(fields["selectedCategory"], serde_json::json!("musikk"));
        assert_eq!(fields["currentQuestion"], serde_json::Value::Null);
        assert_eq!(fields["currentHints"], serde_json::Value::Null);

        let players = fields["players"].as_array().unwrap();
        for player in players {
            assert_eq!(player["currentBet"], serde_json::json!(0));
            assert_eq!(player["hasFolded"], serde_json::json!(false));
            assert_eq!(player["isAllIn"], serde_json::json!(false));
            assert_eq!(player["currentAnswer"], serde_json::Value::Null);
        }
    }

    #[test]
    fn duplicate_reset_plans_produce_identical_patches() {
        let mut game = game_in(Phase::Elimination);
        game.current_round = 3;

        let first = reset_round_patch(&game, 2_000, "sport".into())
            .into_document()
            .unwrap();
        let second = reset_round_patch(&game, 2_000, "sport".into())
            .into_document()
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first["currentRound"], serde_json::json!(4));
    }

    #[test]
    fn question_rides_in_the_same_patch_as_the_phase() {
        let question = Question {
            id: "q9".into(),
            category: "sport".into(),
            question: "Hvem vant gull?".into(),
            answer: "Norge".into(),
            hints: vec!["h0".into(), "h1".into(), "h2".into()],
            kind: crate::model::QuestionType::Text,
        };

        let fields = draw_question_patch(5_000, question).into_document().unwrap();
        assert_eq!(fields["phase"], serde_json::json!("question"));
        assert_eq!(fields["currentQuestion"], serde_json::json!("Hvem vant gull?"));
        assert_eq!(fields["currentAnswer"], serde_json::json!("Norge"));
        assert_eq!(fields["selectedCategory"], serde_json::json!("sport"));
        assert_eq!(fields["roundStartTime"], serde_json::json!(5_000));
    }
}

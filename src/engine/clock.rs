//! Phase clock: turns `(phase, roundStartTime)` into remaining time.
//!
//! Every connected client derives the same deadline from the shared
//! `roundStartTime`, so a countdown computed here agrees across instances to
//! within clock skew. The deferred advancement trigger itself lives in the
//! engine run loop; this module only does the arithmetic.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config::PhaseDurations;
use crate::model::{Game, GameStatus};

/// Current wall-clock time as epoch milliseconds, the unit `roundStartTime`
/// is stored in.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

/// Deadline calculator bound to a set of phase durations.
#[derive(Debug, Clone)]
pub struct PhaseClock {
    durations: PhaseDurations,
}

impl PhaseClock {
    /// Build a clock over the configured durations.
    pub fn new(durations: PhaseDurations) -> Self {
        Self { durations }
    }

    /// Time left in the current phase, or `None` when the phase is untimed
    /// or the game has not started.
    pub fn remaining(&self, game: &Game, now_ms: u64) -> Option<Duration> {
        if game.status != GameStatus::Playing {
            return None;
        }
        let duration = self.durations.duration_of(game.phase)?;
        let deadline = game.round_start_time + duration.as_millis() as u64;
        Some(Duration::from_millis(deadline.saturating_sub(now_ms)))
    }

    /// Whole seconds left for display, rounded up; zero for untimed phases.
    pub fn countdown_seconds(&self, game: &Game, now_ms: u64) -> u32 {
        match self.remaining(game, now_ms) {
            Some(remaining) => remaining.as_millis().div_ceil(1000) as u32,
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::model::{Phase, PlayerProfile};

    fn playing_game(phase: Phase, round_start_time: u64) -> Game {
        let mut game = Game::new(
            "g1".into(),
            "l1".into(),
            vec![PlayerProfile {
                uid: "u1".into(),
                name: "Mia".into(),
            }],
            &EngineConfig::default(),
            round_start_time,
        );
        game.status = GameStatus::Playing;
        game.phase = phase;
        game.round_start_time = round_start_time;
        game
    }

    #[test]
    fn remaining_counts_down_from_the_phase_entry() {
        let clock = PhaseClock::new(PhaseDurations::default());
        let game = playing_game(Phase::Opening, 10_000);

        assert_eq!(
            clock.remaining(&game, 10_000),
            Some(Duration::from_secs(10))
        );
        assert_eq!(clock.remaining(&game, 16_000), Some(Duration::from_secs(4)));
    }

    #[test]
    fn remaining_floors_at_zero_after_expiry() {
        let clock = PhaseClock::new(PhaseDurations::default());
        let game = playing_game(Phase::Elimination, 1_000);

        assert_eq!(clock.remaining(&game, 60_000), Some(Duration::ZERO));
        assert_eq!(clock.countdown_seconds(&game, 60_000), 0);
    }

    #[test]
    fn start_phase_is_untimed() {
        let clock = PhaseClock::new(PhaseDurations::default());
        let mut game = playing_game(Phase::Start, 0);
        assert_eq!(clock.remaining(&game, 0), None);

        game.status = GameStatus::Waiting;
        game.phase = Phase::Opening;
        assert_eq!(clock.remaining(&game, 0), None, "waiting games never tick");
    }

    #[test]
    fn countdown_rounds_partial_seconds_up() {
        let clock = PhaseClock::new(PhaseDurations::default());
        let game = playing_game(Phase::Opening, 0);

        assert_eq!(clock.countdown_seconds(&game, 9_001), 1);
        assert_eq!(clock.countdown_seconds(&game, 0), 10);
    }
}

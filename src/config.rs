//! Engine configuration: phase durations, starting stack, and blinds.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::model::Phase;

/// Default location on disk where the engine looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/engine.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZINO_ENGINE_CONFIG_PATH";

/// Quizinos every player is staked with at game creation.
const DEFAULT_STARTING_QUIZINOS: u32 = 1000;
/// Default small blind.
const DEFAULT_SMALL_BLIND: u32 = 10;
/// Default big blind; the call target during betting.
const DEFAULT_BIG_BLIND: u32 = 20;

/// Fixed duration of every timed phase, in milliseconds. `start` has no
/// duration and never auto-advances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseDurations {
    /// Countdown into the round.
    pub opening_ms: u64,
    /// Time to read the question and answer.
    pub question_ms: u64,
    /// Betting window after each hint reveal.
    pub hint_ms: u64,
    /// Time the answer stays on display.
    pub reveal_ms: u64,
    /// Pause before the next round begins.
    pub elimination_ms: u64,
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            opening_ms: 10_000,
            question_ms: 60_000,
            hint_ms: 30_000,
            reveal_ms: 10_000,
            elimination_ms: 5_000,
        }
    }
}

impl PhaseDurations {
    /// Configured duration of a phase, or `None` for the unbounded `start`
    /// phase.
    pub fn duration_of(&self, phase: Phase) -> Option<Duration> {
        let millis = match phase {
            Phase::Start => return None,
            Phase::Opening => self.opening_ms,
            Phase::Question => self.question_ms,
            Phase::Hint1 | Phase::Hint2 | Phase::Hint3 => self.hint_ms,
            Phase::Reveal => self.reveal_ms,
            Phase::Elimination => self.elimination_ms,
        };
        Some(Duration::from_millis(millis))
    }
}

/// Immutable runtime configuration shared by every engine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Starting chip balance per player.
    pub starting_quizinos: u32,
    /// Small blind at blind level 1.
    pub small_blind: u32,
    /// Big blind at blind level 1.
    pub big_blind: u32,
    /// Per-phase durations driving the phase clock.
    pub phase_durations: PhaseDurations,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            starting_quizinos: DEFAULT_STARTING_QUIZINOS,
            small_blind: DEFAULT_SMALL_BLIND,
            big_blind: DEFAULT_BIG_BLIND,
            phase_durations: PhaseDurations::default(),
        }
    }
}

impl EngineConfig {
    /// Load the configuration from disk, falling back to the built-in
    /// defaults when the file is absent or unreadable.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded engine config");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at
/// [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    starting_quizinos: u32,
    small_blind: u32,
    big_blind: u32,
    phase_durations_ms: RawDurations,
}

#[derive(Debug, Deserialize)]
/// JSON representation of the per-phase durations, in milliseconds.
struct RawDurations {
    opening: u64,
    question: u64,
    hint: u64,
    reveal: u64,
    elimination: u64,
}

impl From<RawConfig> for EngineConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            starting_quizinos: value.starting_quizinos,
            small_blind: value.small_blind,
            big_blind: value.big_blind,
            phase_durations: PhaseDurations {
                opening_ms: value.phase_durations_ms.opening,
                question_ms: value.phase_durations_ms.question,
                hint_ms: value.phase_durations_ms.hint,
                reveal_ms: value.phase_durations_ms.reveal,
                elimination_ms: value.phase_durations_ms.elimination,
            },
        }
    }
}

/// Resolve the configuration path taking the environment override into
/// account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_published_durations() {
        let config = EngineConfig::default();
        assert_eq!(config.starting_quizinos, 1000);
        assert_eq!(config.small_blind, 10);
        assert_eq!(config.big_blind, 20);

        let durations = &config.phase_durations;
        assert_eq!(
            durations.duration_of(Phase::Opening),
            Some(Duration::from_secs(10))
        );
        assert_eq!(
            durations.duration_of(Phase::Question),
            Some(Duration::from_secs(60))
        );
        for hint in [Phase::Hint1, Phase::Hint2, Phase::Hint3] {
            assert_eq!(durations.duration_of(hint), Some(Duration::from_secs(30)));
        }
        assert_eq!(
            durations.duration_of(Phase::Reveal),
            Some(Duration::from_secs(10))
        );
        assert_eq!(
            durations.duration_of(Phase::Elimination),
            Some(Duration::from_secs(5))
        );
        assert_eq!(durations.duration_of(Phase::Start), None);
    }

    #[test]
    fn raw_config_maps_every_field() {
        let raw: RawConfig = serde_json::from_str(
            r#"{
                "starting_quizinos": 500,
                "small_blind": 5,
                "big_blind": 10,
                "phase_durations_ms": {
                    "opening": 1,
                    "question": 2,
                    "hint": 3,
                    "reveal": 4,
                    "elimination": 5
                }
            }"#,
        )
        .unwrap();

        let config: EngineConfig = raw.into();
        assert_eq!(config.starting_quizinos, 500);
        assert_eq!(config.big_blind, 10);
        assert_eq!(config.phase_durations.hint_ms, 3);
    }
}

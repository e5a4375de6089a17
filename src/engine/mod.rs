//! Per-client game engine.
//!
//! Every connected client runs one [`GameEngine`] over the shared game
//! document. The engine subscribes to the document, republishes each observed
//! version on a `watch` channel, and — on the host instance only — schedules
//! a single deferred trigger that advances the phase when its duration
//! elapses. Any instance, host or not, may place bets and submit answers by
//! writing directly to the shared document; there is no cross-client mutual
//! exclusion beyond the store's last-write-wins ordering.

pub mod betting;
pub mod clock;
pub mod host;
pub mod phases;
pub mod selector;

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::config::EngineConfig;
use crate::engine::betting::BetAction;
use crate::engine::clock::{PhaseClock, now_ms};
use crate::engine::phases::{AdvanceEffect, TransitionError};
use crate::engine::selector::QuestionSelector;
use crate::error::EngineError;
use crate::model::patch::GamePatch;
use crate::model::{Game, Phase, PlayerProfile};
use crate::store::{DocumentStore, DocumentStream, GAMES_COLLECTION, StoreError};

struct EngineInner {
    store: Arc<dyn DocumentStore>,
    clock: PhaseClock,
    selector: QuestionSelector,
    game_id: String,
    uid: String,
    game_rx: watch::Receiver<Game>,
    countdown_rx: watch::Receiver<u32>,
}

impl EngineInner {
    /// Latest observed version of the game document.
    fn snapshot(&self) -> Game {
        self.game_rx.borrow().clone()
    }
}

/// Handle to one client's engine instance.
///
/// Dropping the handle tears the engine down; [`GameEngine::shutdown`] does
/// the same but waits until the background task has stopped. Teardown cancels
/// the document subscription and any pending advancement trigger together,
/// and closes the watch channels handed out by [`GameEngine::watch_game`] and
/// [`GameEngine::watch_countdown`] — as it also does if the subscription
/// itself fails.
pub struct GameEngine {
    inner: Arc<EngineInner>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameEngine").finish_non_exhaustive()
    }
}

impl GameEngine {
    /// Create the shared game document for a fresh match. Roster order is
    /// significant: the first entry becomes the host of record.
    pub async fn initialize(
        store: &Arc<dyn DocumentStore>,
        config: &EngineConfig,
        game_id: &str,
        lobby_id: &str,
        roster: Vec<PlayerProfile>,
    ) -> Result<Game, EngineError> {
        let game = Game::new(game_id.into(), lobby_id.into(), roster, config, now_ms());
        let document = game.to_document()?;
        store.create(GAMES_COLLECTION, game_id, document).await?;
        info!(game = %game_id, players = game.players.len(), "game created");
        Ok(game)
    }

    /// Join an existing game as `uid` and start observing it. Returns once
    /// the current document version has been received.
    pub async fn join(
        store: Arc<dyn DocumentStore>,
        config: EngineConfig,
        game_id: impl Into<String>,
        uid: impl Into<String>,
    ) -> Result<Self, EngineError> {
        let game_id = game_id.into();
        let uid = uid.into();

        let mut stream = store
            .subscribe(GAMES_COLLECTION, &game_id)
            .await
            .map_err(|err| match err {
                StoreError::NotFound { .. } => EngineError::GameNotFound(game_id.clone()),
                other => EngineError::Store(other),
            })?;
        let Some(first) = stream.next().await else {
            return Err(EngineError::GameNotFound(game_id));
        };
        let game = Game::from_document(first?)?;

        let clock = PhaseClock::new(config.phase_durations.clone());
        let seconds = clock.countdown_seconds(&game, now_ms());
        let (game_tx, game_rx) = watch::channel(game);
        let (countdown_tx, countdown_rx) = watch::channel(seconds);

        let inner = Arc::new(EngineInner {
            selector: QuestionSelector::new(store.clone()),
            store,
            clock,
            game_id,
            uid,
            game_rx,
            countdown_rx,
        });

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run(
            inner.clone(),
            game_tx,
            countdown_tx,
            stream,
            shutdown_rx,
        ));

        Ok(Self {
            inner,
            shutdown_tx,
            task,
        })
    }

    /// Identifier of the observed game document.
    pub fn game_id(&self) -> &str {
        &self.inner.game_id
    }

    /// Local participant uid.
    pub fn uid(&self) -> &str {
        &self.inner.uid
    }

    /// Whether the local participant is the host of record in the latest
    /// observed snapshot.
    pub fn is_host(&self) -> bool {
        host::is_host(&self.inner.snapshot(), &self.inner.uid)
    }

    /// Observe every version of the game document as it arrives.
    pub fn watch_game(&self) -> watch::Receiver<Game> {
        self.inner.game_rx.clone()
    }

    /// Observe the 1 Hz countdown of seconds left in the current phase.
    /// Non-host instances receive this for display only.
    pub fn watch_countdown(&self) -> watch::Receiver<u32> {
        self.inner.countdown_rx.clone()
    }

    /// Host action: leave the waiting room and begin the first round.
    pub async fn start_game(&self) -> Result<(), EngineError> {
        let game = self.inner.snapshot();
        if !host::is_host(&game, &self.inner.uid) {
            return Err(EngineError::NotHost);
        }
        if game.phase != Phase::Start {
            return Err(TransitionError::AlreadyStarted.into());
        }
        advance(&self.inner).await
    }

    /// Host action: advance to the next phase immediately. The clock calls
    /// this automatically when a phase duration elapses.
    pub async fn advance_phase(&self) -> Result<(), EngineError> {
        advance(&self.inner).await
    }

    /// Apply a wagering action for the local participant and write the
    /// updated roster and pot.
    pub async fn place_bet(&self, action: BetAction) -> Result<(), EngineError> {
        let game = self.inner.snapshot();
        let outcome = betting::apply(&game, &self.inner.uid, action)?;
        let patch = GamePatch::new().players(outcome.players).pot(outcome.pot);
        write_patch(&self.inner, patch).await
    }

    /// Record the local participant's answer to the active question.
    pub async fn submit_answer(&self, answer: &str) -> Result<(), EngineError> {
        let game = self.inner.snapshot();
        if !game.phase.allows_answers() {
            return Err(EngineError::AnswersClosed { phase: game.phase });
        }
        if game.player(&self.inner.uid).is_none() {
            return Err(EngineError::NotAParticipant {
                uid: self.inner.uid.clone(),
            });
        }

        let players = game
            .players
            .iter()
            .map(|player| {
                let mut player = player.clone();
                if player.uid == self.inner.uid {
                    player.current_answer = Some(answer.to_owned());
                }
                player
            })
            .collect();
        write_patch(&self.inner, GamePatch::new().players(players)).await
    }

    /// Host action: override the category for the upcoming question.
    pub async fn set_selected_category(&self, category: &str) -> Result<(), EngineError> {
        let game = self.inner.snapshot();
        if !host::is_host(&game, &self.inner.uid) {
            return Err(EngineError::NotHost);
        }
        write_patch(&self.inner, GamePatch::new().selected_category(category)).await
    }

    /// Tear the engine down, waiting for the background task to stop.
    pub async fn shutdown(self) {
        let Self {
            inner: _,
            shutdown_tx,
            task,
        } = self;
        let _ = shutdown_tx.send(true);
        if let Err(err) = task.await {
            if !err.is_cancelled() {
                warn!(error = %err, "engine task ended abnormally");
            }
        }
    }
}

/// Compute and write the next phase from the latest observed snapshot.
async fn advance(inner: &EngineInner) -> Result<(), EngineError> {
    let game = inner.snapshot();
    if !host::is_host(&game, &inner.uid) {
        return Err(EngineError::NotHost);
    }

    let plan = phases::plan(&game)?;
    let now = now_ms();
    let patch = match plan.effect {
        AdvanceEffect::BeginGame => {
            let category = inner.selector.random_category().await;
            phases::begin_game_patch(now, category)
        }
        AdvanceEffect::DrawQuestion { category } => {
            let category = match category {
                Some(category) => category,
                None => inner.selector.random_category().await,
            };
            let question = inner.selector.random_question(&category).await;
            phases::draw_question_patch(now, question)
        }
        AdvanceEffect::RevealHint { index } => phases::reveal_hint_patch(now, plan.to, index),
        AdvanceEffect::PhaseOnly => phases::phase_only_patch(now, plan.to),
        AdvanceEffect::ResetRound => {
            let category = inner.selector.random_category().await;
            phases::reset_round_patch(&game, now, category)
        }
    };

    write_patch(inner, patch).await?;
    info!(game = %inner.game_id, from = %plan.from, to = %plan.to, "phase advanced");
    Ok(())
}

async fn write_patch(inner: &EngineInner, patch: GamePatch) -> Result<(), EngineError> {
    let fields = patch.into_document()?;
    inner
        .store
        .update(GAMES_COLLECTION, &inner.game_id, fields)
        .await?;
    Ok(())
}

/// Re-arm the deferred advancement trigger from the latest snapshot. Armed
/// only on the host instance while the current phase is timed; every observed
/// document change lands here, so a stale deadline can never fire.
fn rearm(inner: &EngineInner, trigger: Pin<&mut time::Sleep>, armed: &mut bool) {
    let (hosting, remaining) = {
        let game = inner.game_rx.borrow();
        (
            host::is_host(&game, &inner.uid),
            inner.clock.remaining(&game, now_ms()),
        )
    };

    match remaining {
        Some(remaining) if hosting => {
            trigger.reset(time::Instant::now() + remaining);
            *armed = true;
        }
        _ => *armed = false,
    }
}

/// Per-client event loop: document changes, the advancement trigger, and the
/// display countdown are the only things that wake it. The loop owns the
/// watch senders, so observers see their channels close when it stops.
async fn run(
    inner: Arc<EngineInner>,
    game_tx: watch::Sender<Game>,
    countdown_tx: watch::Sender<u32>,
    mut stream: DocumentStream,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let trigger = time::sleep(Duration::ZERO);
    tokio::pin!(trigger);
    let mut armed = false;

    let mut countdown = time::interval(Duration::from_secs(1));
    countdown.set_missed_tick_behavior(MissedTickBehavior::Skip);

    rearm(&inner, trigger.as_mut(), &mut armed);

    loop {
        tokio::select! {
            // Resolves on an explicit shutdown or when the handle is dropped.
            _ = shutdown_rx.changed() => break,
            item = stream.next() => match item {
                Some(Ok(document)) => match Game::from_document(document) {
                    Ok(game) => {
                        let seconds = inner.clock.countdown_seconds(&game, now_ms());
                        game_tx.send_replace(game);
                        countdown_tx.send_replace(seconds);
                        rearm(&inner, trigger.as_mut(), &mut armed);
                    }
                    Err(err) => warn!(error = %err, "ignoring malformed game document"),
                },
                Some(Err(err)) => {
                    error!(error = %err, "game subscription failed");
                    break;
                }
                None => {
                    warn!(game = %inner.game_id, "game subscription ended");
                    break;
                }
            },
            () = trigger.as_mut(), if armed => {
                armed = false;
                if let Err(err) = advance(&inner).await {
                    warn!(error = %err, "automatic phase advance failed");
                }
            }
            _ = countdown.tick() => {
                let seconds = {
                    let game = inner.game_rx.borrow();
                    inner.clock.countdown_seconds(&game, now_ms())
                };
                countdown_tx.send_replace(seconds);
            }
        }
    }
}

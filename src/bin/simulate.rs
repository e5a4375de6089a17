//! Headless match simulation over the in-memory store.
//!
//! Seeds a small catalog, creates a game with bot players, and lets the
//! engines run a few compressed rounds: the first bot hosts and drives the
//! clock, every bot answers and bets during the hint phases. Useful for
//! watching the phase flow and pot accounting end to end.
//!
//! Environment:
//! - `QUIZINO_SIM_PLAYERS` — number of bots (default 3)
//! - `QUIZINO_SIM_ROUNDS` — rounds to play before stopping (default 2)

use std::{env, sync::Arc};

use anyhow::Context;
use rand::Rng;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use quizino_engine::config::{EngineConfig, PhaseDurations};
use quizino_engine::engine::GameEngine;
use quizino_engine::engine::betting::BetAction;
use quizino_engine::model::{Phase, PlayerProfile};
use quizino_engine::store::memory::MemoryStore;
use quizino_engine::store::{CATEGORIES_COLLECTION, Document, DocumentStore, QUESTIONS_COLLECTION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let players = env_or("QUIZINO_SIM_PLAYERS", 3usize);
    let rounds = env_or("QUIZINO_SIM_ROUNDS", 2u32);

    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    seed_catalog(&store).await.context("seeding catalog")?;

    // Compressed durations so a full round takes about two seconds.
    let config = EngineConfig {
        phase_durations: PhaseDurations {
            opening_ms: 300,
            question_ms: 500,
            hint_ms: 400,
            reveal_ms: 300,
            elimination_ms: 200,
        },
        ..EngineConfig::default()
    };

    let game_id = Uuid::new_v4().to_string();
    let lobby_id = Uuid::new_v4().to_string();
    let roster = (1..=players)
        .map(|i| PlayerProfile {
            uid: format!("bot-{i}"),
            name: format!("Bot {i}"),
        })
        .collect();
    GameEngine::initialize(&store, &config, &game_id, &lobby_id, roster)
        .await
        .context("creating game")?;
    info!(game = %game_id, players, rounds, "simulation starting");

    let mut engines = Vec::with_capacity(players);
    for i in 1..=players {
        let engine = GameEngine::join(
            store.clone(),
            config.clone(),
            game_id.as_str(),
            format!("bot-{i}"),
        )
        .await
        .with_context(|| format!("joining as bot-{i}"))?;
        engines.push(engine);
    }

    let mut observer = engines[0].watch_game();
    engines[0].start_game().await.context("starting game")?;

    let mut bots = Vec::with_capacity(engines.len());
    for engine in engines {
        bots.push(tokio::spawn(run_bot(engine, rounds)));
    }
    for bot in bots {
        bot.await.context("bot task panicked")?;
    }

    let final_state = observer.borrow_and_update().clone();
    info!(round = final_state.current_round, "simulation finished");
    for player in &final_state.players {
        info!(
            uid = %player.uid,
            quizinos = player.quizinos,
            answer = player.current_answer.as_deref().unwrap_or("-"),
            "final stack"
        );
    }

    Ok(())
}

/// One bot: answer when the question opens, wager once per hint phase, stop
/// after the configured number of rounds.
async fn run_bot(engine: GameEngine, rounds: u32) {
    let uid = engine.uid().to_owned();
    let mut games = engine.watch_game();
    let mut acted = (0u32, Phase::Start);

    loop {
        let game = games.borrow_and_update().clone();
        if game.current_round > rounds {
            break;
        }

        let key = (game.current_round, game.phase);
        if key != acted {
            acted = key;
            match game.phase {
                Phase::Question => {
                    if let Err(err) = engine.submit_answer("42").await {
                        debug!(uid = %uid, error = %err, "answer rejected");
                    }
                }
                Phase::Hint1 | Phase::Hint2 | Phase::Hint3 => {
                    let action = pick_action(game.big_blind);
                    if let Err(err) = engine.place_bet(action).await {
                        debug!(uid = %uid, error = %err, "bet rejected");
                    }
                }
                _ => {}
            }
        }

        if games.changed().await.is_err() {
            break;
        }
    }

    info!(uid = %uid, "bot leaving");
    engine.shutdown().await;
}

fn pick_action(big_blind: u32) -> BetAction {
    let mut rng = rand::rng();
    match rng.random_range(0..10u32) {
        0 => BetAction::Fold,
        1 => BetAction::AllIn,
        2 | 3 => BetAction::Raise(big_blind * rng.random_range(2..5)),
        _ => BetAction::Call,
    }
}

async fn seed_catalog(store: &Arc<dyn DocumentStore>) -> anyhow::Result<()> {
    let categories = [
        ("sport", "Sport"),
        ("historie", "Historie"),
        ("musikk", "Musikk"),
    ];
    for (id, name) in categories {
        store
            .create(
                CATEGORIES_COLLECTION,
                id,
                object(serde_json::json!({ "id": id, "name": name })),
            )
            .await?;
    }

    let questions = [
        serde_json::json!({
            "id": "q-sport-1",
            "category": "sport",
            "question": "Hvilket år ble OL arrangert på Lillehammer?",
            "answer": "1994",
            "hints": ["Det var på 90-tallet", "Norge tok 26 medaljer", "Partallsår"],
            "type": "number",
        }),
        serde_json::json!({
            "id": "q-historie-1",
            "category": "historie",
            "question": "Hvem var Norges første konge etter 1905?",
            "answer": "Haakon VII",
            "hints": ["Han var dansk prins", "Han valgte et gammelt norsk kongenavn", "Far til Olav V"],
            "type": "text",
        }),
        serde_json::json!({
            "id": "q-musikk-1",
            "category": "musikk",
            "question": "Hvilken norsk gruppe ga ut «Take On Me»?",
            "answer": "a-ha",
            "hints": ["Trio fra Oslo", "Gjennombrudd i 1985", "Navnet har tre bokstaver"],
            "type": "text",
        }),
    ];
    for question in questions {
        let id = question["id"].as_str().unwrap_or_default().to_owned();
        store
            .create(QUESTIONS_COLLECTION, &id, object(question))
            .await?;
    }

    Ok(())
}

fn object(value: serde_json::Value) -> Document {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Document::new(),
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

//! Question selector: picks a category and a question for a round.
//!
//! Catalog lookups go through the document store. Failures and empty results
//! never surface to the caller: a round must always be playable, so the
//! selector degrades to fixed fallback data instead.

use std::sync::Arc;

use indexmap::IndexMap;
use rand::Rng;
use tracing::warn;

use crate::model::{Category, Question, QuestionType};
use crate::store::{CATEGORIES_COLLECTION, DocumentStore, QUESTIONS_COLLECTION};

/// Categories offered when the catalog holds none.
const FALLBACK_CATEGORIES: [&str; 6] = [
    "Sport",
    "Historie",
    "Musikk",
    "Film",
    "Vitenskap",
    "Geografi",
];

/// Category used when the catalog cannot be read at all.
const ERROR_FALLBACK_CATEGORY: &str = "sport";

/// Picks round content from the catalog collections.
#[derive(Clone)]
pub struct QuestionSelector {
    store: Arc<dyn DocumentStore>,
}

impl QuestionSelector {
    /// Build a selector over the given store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Pick a random category id. Falls back to the built-in list when the
    /// catalog is empty and to a fixed id when it cannot be read.
    pub async fn random_category(&self) -> String {
        let documents = match self.store.list(CATEGORIES_COLLECTION).await {
            Ok(documents) => documents,
            Err(err) => {
                warn!(error = %err, "failed to read category catalog; using fallback");
                return ERROR_FALLBACK_CATEGORY.into();
            }
        };

        // Keyed by id so duplicate documents cannot skew the draw; insertion
        // order keeps iteration deterministic for a given catalog state.
        let categories: IndexMap<String, Category> = documents
            .into_iter()
            .filter_map(|document| {
                match serde_json::from_value::<Category>(serde_json::Value::Object(document)) {
                    Ok(category) => Some((category.id.clone(), category)),
                    Err(err) => {
                        warn!(error = %err, "skipping malformed category document");
                        None
                    }
                }
            })
            .collect();

        if categories.is_empty() {
            let mut rng = rand::rng();
            let pick = rng.random_range(0..FALLBACK_CATEGORIES.len());
            return FALLBACK_CATEGORIES[pick].into();
        }

        let mut rng = rand::rng();
        let pick = rng.random_range(0..categories.len());
        categories
            .get_index(pick)
            .map(|(id, _)| id.clone())
            .unwrap_or_else(|| ERROR_FALLBACK_CATEGORY.into())
    }

    /// Pick a random question for a category. An empty category yields the
    /// fixed fallback question; a failing catalog yields the error fallback.
    pub async fn random_question(&self, category: &str) -> Question {
        let documents = match self.store.list(QUESTIONS_COLLECTION).await {
            Ok(documents) => documents,
            Err(err) => {
                warn!(error = %err, category, "failed to read question catalog; using fallback");
                return error_fallback_question(category);
            }
        };

        let candidates: Vec<Question> = documents
            .into_iter()
            .filter_map(|document| {
                match serde_json::from_value::<Question>(serde_json::Value::Object(document)) {
                    Ok(question) => Some(question),
                    Err(err) => {
                        warn!(error = %err, "skipping malformed question document");
                        None
                    }
                }
            })
            .filter(|question| question.category == category)
            .collect();

        if candidates.is_empty() {
            return fallback_question(category);
        }

        let mut rng = rand::rng();
        let pick = rng.random_range(0..candidates.len());
        candidates
            .into_iter()
            .nth(pick)
            .unwrap_or_else(|| fallback_question(category))
    }
}

/// Fixed question substituted when a category has no stored questions.
fn fallback_question(category: &str) -> Question {
    Question {
        id: "fallback_1".into(),
        category: category.into(),
        question: "Hva er 2 + 2?".into(),
        answer: "4".into(),
        hints: vec![
            "Det er et enkelt regnestykke".into(),
            "Svaret er mindre enn 10".into(),
            "Det er et partall".into(),
        ],
        kind: QuestionType::Number,
    }
}

/// Fixed question substituted when the catalog cannot be read.
fn error_fallback_question(category: &str) -> Question {
    Question {
        id: "error_fallback".into(),
        category: category.into(),
        question: "Hva er hovedstaden i Norge?".into(),
        answer: "Oslo".into(),
        hints: vec![
            "Det er den største byen i Norge".into(),
            "Kongen bor her".into(),
            "Byen ligger ved Oslofjorden".into(),
        ],
        kind: QuestionType::Text,
    }
}

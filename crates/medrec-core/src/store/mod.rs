//! Profile store: patient profiles in, saved recommendations out.
//!
//! The engine never touches storage. [`recommend_for_user`] is the only
//! place the two meet, and store failures there never change what the
//! engine returns.

mod profiles;
mod recommendations;
mod schema;

pub use schema::SCHEMA;

use std::path::Path;

use rusqlite::Connection;
use thiserror::Error;
use tracing::{debug, warn};

use crate::engine::RecommendationEngine;
use crate::models::{PatientProfile, RecommendationDecision, RecommendationResult};

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence collaborator for patient profiles and recommendations.
pub trait ProfileStore {
    /// `Ok(None)` when the user has no profile.
    fn get_patient_profile(&self, user_id: &str) -> StoreResult<Option<PatientProfile>>;

    /// Persist results for a treatment; returns one id per result.
    fn save_recommendations(
        &self,
        results: &[RecommendationResult],
        user_id: &str,
        treatment_id: &str,
    ) -> StoreResult<Vec<String>>;

    fn update_recommendation_status(
        &self,
        recommendation_id: &str,
        decision: &RecommendationDecision,
    ) -> StoreResult<()>;
}

/// SQLite-backed profile store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the store at path, creating it if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// In-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> StoreResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl ProfileStore for SqliteStore {
    fn get_patient_profile(&self, user_id: &str) -> StoreResult<Option<PatientProfile>> {
        self.patient_profile(user_id)
    }

    fn save_recommendations(
        &self,
        results: &[RecommendationResult],
        user_id: &str,
        treatment_id: &str,
    ) -> StoreResult<Vec<String>> {
        self.insert_recommendations(results, user_id, treatment_id)
    }

    fn update_recommendation_status(
        &self,
        recommendation_id: &str,
        decision: &RecommendationDecision,
    ) -> StoreResult<()> {
        self.set_recommendation_status(recommendation_id, decision)
    }
}

/// Free-text recommendations for a stored user.
///
/// A missing profile, or a store that cannot produce one, means the
/// configured default profile. With a `treatment_id` and a non-empty result
/// the list is saved; a failed save is logged and the list returned as is.
pub fn recommend_for_user<S: ProfileStore + ?Sized>(
    engine: &RecommendationEngine<'_>,
    store: &S,
    user_id: &str,
    treatment_id: Option<&str>,
    treatment_name: &str,
    description: &str,
) -> Vec<RecommendationResult> {
    let profile = match store.get_patient_profile(user_id) {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            debug!(user_id, "no stored profile, using default");
            engine.config().default_profile.clone()
        }
        Err(e) => {
            warn!(user_id, error = %e, "profile lookup failed, using default");
            engine.config().default_profile.clone()
        }
    };

    let results = engine.generate_from_text(treatment_name, description, &profile);

    if let Some(treatment_id) = treatment_id {
        if !results.is_empty() {
            if let Err(e) = store.save_recommendations(&results, user_id, treatment_id) {
                warn!(user_id, treatment_id, error = %e, "failed to save recommendations");
            }
        }
    }

    results
}

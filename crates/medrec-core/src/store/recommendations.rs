//! Saved recommendation operations.

use rusqlite::params;
use uuid::Uuid;

use super::{SqliteStore, StoreError, StoreResult};
use crate::models::{RecommendationDecision, RecommendationResult, RecommendationStatus, SavedRecommendation};

impl SqliteStore {
    /// Save one row per result in a single transaction; returns the new ids
    /// in input order.
    pub fn insert_recommendations(
        &self,
        results: &[RecommendationResult],
        user_id: &str,
        treatment_id: &str,
    ) -> StoreResult<Vec<String>> {
        let recommended_at = chrono::Utc::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;
        let mut ids = Vec::with_capacity(results.len());

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO medicine_recommendations (
                    id, user_id, treatment_id, name, confidence, safe,
                    recommendation, recommended_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )?;

            for result in results {
                let id = Uuid::new_v4().to_string();
                stmt.execute(params![
                    id,
                    user_id,
                    treatment_id,
                    result.name,
                    result.confidence,
                    result.safe,
                    serde_json::to_string(result)?,
                    recommended_at,
                ])?;
                ids.push(id);
            }
        }

        tx.commit()?;
        Ok(ids)
    }

    /// Record an accept/reject decision.
    pub fn set_recommendation_status(&self, id: &str, decision: &RecommendationDecision) -> StoreResult<()> {
        let rows_affected = match decision {
            RecommendationDecision::Accepted => self.conn.execute(
                r#"
                UPDATE medicine_recommendations SET
                    is_accepted = 1,
                    is_rejected = 0,
                    rejection_reason = NULL,
                    accepted_at = ?2
                WHERE id = ?1
                "#,
                params![id, chrono::Utc::now().to_rfc3339()],
            )?,
            RecommendationDecision::Rejected { reason } => self.conn.execute(
                r#"
                UPDATE medicine_recommendations SET
                    is_accepted = 0,
                    is_rejected = 1,
                    rejection_reason = ?2,
                    accepted_at = NULL
                WHERE id = ?1
                "#,
                params![id, reason],
            )?,
        };

        if rows_affected == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Saved recommendations for a treatment, highest confidence first.
    pub fn list_recommendations(&self, treatment_id: &str) -> StoreResult<Vec<SavedRecommendation>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, user_id, treatment_id, recommendation, recommended_at,
                   is_accepted, is_rejected, rejection_reason, accepted_at
            FROM medicine_recommendations
            WHERE treatment_id = ?
            ORDER BY confidence DESC, rowid ASC
            "#,
        )?;

        let rows = stmt.query_map([treatment_id], |row| {
            Ok(RecommendationRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                treatment_id: row.get(2)?,
                recommendation: row.get(3)?,
                recommended_at: row.get(4)?,
                is_accepted: row.get(5)?,
                is_rejected: row.get(6)?,
                rejection_reason: row.get(7)?,
                accepted_at: row.get(8)?,
            })
        })?;

        let mut saved = Vec::new();
        for row in rows {
            saved.push(row?.try_into()?);
        }
        Ok(saved)
    }
}

/// Raw row for mapping.
struct RecommendationRow {
    id: String,
    user_id: String,
    treatment_id: String,
    recommendation: String,
    recommended_at: String,
    is_accepted: bool,
    is_rejected: bool,
    rejection_reason: Option<String>,
    accepted_at: Option<String>,
}

impl TryFrom<RecommendationRow> for SavedRecommendation {
    type Error = StoreError;

    fn try_from(row: RecommendationRow) -> Result<Self, Self::Error> {
        let recommendation: RecommendationResult = serde_json::from_str(&row.recommendation)?;
        let status = match (row.is_accepted, row.is_rejected) {
            (true, _) => RecommendationStatus::Accepted {
                accepted_at: row.accepted_at.unwrap_or_default(),
            },
            (false, true) => RecommendationStatus::Rejected {
                reason: row.rejection_reason,
            },
            (false, false) => RecommendationStatus::Pending,
        };

        Ok(SavedRecommendation {
            id: row.id,
            user_id: row.user_id,
            treatment_id: row.treatment_id,
            recommendation,
            status,
            recommended_at: row.recommended_at,
        })
    }
}

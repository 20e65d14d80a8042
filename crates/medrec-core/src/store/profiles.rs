//! Patient profile operations.

use rusqlite::{params, OptionalExtension};

use super::{SqliteStore, StoreError, StoreResult};
use crate::models::{MedicalCondition, PatientProfile};

impl SqliteStore {
    /// Insert or replace the profile for a user.
    pub fn upsert_patient_profile(&self, user_id: &str, profile: &PatientProfile) -> StoreResult<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            r#"
            INSERT INTO patient_profiles (
                user_id, age, weight, height, allergies, current_medications,
                medical_history, conditions, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            ON CONFLICT(user_id) DO UPDATE SET
                age = excluded.age,
                weight = excluded.weight,
                height = excluded.height,
                allergies = excluded.allergies,
                current_medications = excluded.current_medications,
                medical_history = excluded.medical_history,
                conditions = excluded.conditions,
                updated_at = excluded.updated_at
            "#,
            params![
                user_id,
                profile.age,
                profile.weight,
                profile.height,
                serde_json::to_string(&profile.allergies)?,
                serde_json::to_string(&profile.current_medications)?,
                serde_json::to_string(&profile.medical_history)?,
                serde_json::to_string(&profile.conditions)?,
                now,
            ],
        )?;
        Ok(())
    }

    /// Profile for a user, if one was stored.
    pub fn patient_profile(&self, user_id: &str) -> StoreResult<Option<PatientProfile>> {
        self.conn
            .query_row(
                r#"
                SELECT age, weight, height, allergies, current_medications,
                       medical_history, conditions
                FROM patient_profiles
                WHERE user_id = ?
                "#,
                [user_id],
                |row| {
                    Ok(ProfileRow {
                        age: row.get(0)?,
                        weight: row.get(1)?,
                        height: row.get(2)?,
                        allergies: row.get(3)?,
                        current_medications: row.get(4)?,
                        medical_history: row.get(5)?,
                        conditions: row.get(6)?,
                    })
                },
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Delete a user's profile.
    pub fn delete_patient_profile(&self, user_id: &str) -> StoreResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM patient_profiles WHERE user_id = ?", [user_id])?;
        Ok(rows_affected > 0)
    }
}

/// Raw row; JSON columns still encoded.
struct ProfileRow {
    age: u32,
    weight: Option<f64>,
    height: Option<f64>,
    allergies: String,
    current_medications: String,
    medical_history: String,
    conditions: String,
}

impl TryFrom<ProfileRow> for PatientProfile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let conditions: Vec<MedicalCondition> = serde_json::from_str(&row.conditions)?;
        Ok(PatientProfile {
            age: row.age,
            weight: row.weight,
            height: row.height,
            allergies: serde_json::from_str(&row.allergies)?,
            current_medications: serde_json::from_str(&row.current_medications)?,
            medical_history: serde_json::from_str(&row.medical_history)?,
            conditions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    fn setup_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_upsert_and_get() {
        let store = setup_store();

        let mut profile = PatientProfile::new(52);
        profile.weight = Some(81.5);
        profile.allergies = vec!["Penicillin".into()];
        profile.conditions = vec![MedicalCondition::new("hypertension", Severity::Moderate)];

        store.upsert_patient_profile("user-1", &profile).unwrap();

        let retrieved = store.patient_profile("user-1").unwrap().unwrap();
        assert_eq!(retrieved, profile);
    }

    #[test]
    fn test_upsert_replaces() {
        let store = setup_store();

        let mut profile = PatientProfile::new(52);
        store.upsert_patient_profile("user-1", &profile).unwrap();

        profile.age = 53;
        profile.current_medications = vec!["warfarin".into()];
        store.upsert_patient_profile("user-1", &profile).unwrap();

        let retrieved = store.patient_profile("user-1").unwrap().unwrap();
        assert_eq!(retrieved.age, 53);
        assert_eq!(retrieved.current_medications, vec!["warfarin"]);
    }

    #[test]
    fn test_missing_profile() {
        let store = setup_store();
        assert!(store.patient_profile("nobody").unwrap().is_none());
        assert!(!store.delete_patient_profile("nobody").unwrap());
    }
}

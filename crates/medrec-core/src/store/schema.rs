//! SQLite schema for the profile store.

/// Complete schema, applied idempotently on open.
pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patient Profiles
-- ============================================================================

CREATE TABLE IF NOT EXISTS patient_profiles (
    user_id TEXT PRIMARY KEY,
    age INTEGER NOT NULL,
    weight REAL,
    height REAL,
    allergies TEXT NOT NULL DEFAULT '[]',             -- JSON array of strings
    current_medications TEXT NOT NULL DEFAULT '[]',   -- JSON array of strings
    medical_history TEXT NOT NULL DEFAULT '[]',       -- JSON array of strings
    conditions TEXT NOT NULL DEFAULT '[]',            -- JSON array of MedicalCondition
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- ============================================================================
-- Medicine Recommendations
-- ============================================================================

CREATE TABLE IF NOT EXISTS medicine_recommendations (
    id TEXT PRIMARY KEY,                              -- UUID v4
    user_id TEXT NOT NULL,
    treatment_id TEXT NOT NULL,
    name TEXT NOT NULL,
    confidence INTEGER NOT NULL,
    safe INTEGER NOT NULL DEFAULT 1,
    recommendation TEXT NOT NULL,                     -- JSON RecommendationResult
    recommended_at TEXT NOT NULL,                     -- RFC 3339
    is_accepted INTEGER NOT NULL DEFAULT 0,
    is_rejected INTEGER NOT NULL DEFAULT 0,
    rejection_reason TEXT,
    accepted_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_recommendations_treatment ON medicine_recommendations(treatment_id);
CREATE INDEX IF NOT EXISTS idx_recommendations_user ON medicine_recommendations(user_id);
"#;

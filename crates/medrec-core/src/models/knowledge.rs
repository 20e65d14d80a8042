//! Knowledge base record models.

use serde::{Deserialize, Serialize};

/// Age band used to pick a dosage description.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AgeBand {
    Adult,
    Elderly,
    Child,
}

/// A single dosage description for one age band.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DosageBand {
    /// Display text (e.g., "10-20mg once daily")
    pub dose: String,
    /// Machine-usable frequency; derived from `dose` when absent
    #[serde(default)]
    pub frequency: Option<String>,
}

impl DosageBand {
    /// Create a band with an explicit frequency.
    pub fn new(dose: impl Into<String>, frequency: impl Into<String>) -> Self {
        Self {
            dose: dose.into(),
            frequency: Some(frequency.into()),
        }
    }
}

/// Dosage descriptions keyed by age band. The adult band is mandatory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DosageBands {
    pub adult: DosageBand,
    #[serde(default)]
    pub elderly: Option<DosageBand>,
    #[serde(default)]
    pub child: Option<DosageBand>,
}

impl DosageBands {
    /// Get the band for an age group, if the catalog defines one.
    pub fn band(&self, band: AgeBand) -> Option<&DosageBand> {
        match band {
            AgeBand::Adult => Some(&self.adult),
            AgeBand::Elderly => self.elderly.as_ref(),
            AgeBand::Child => self.child.as_ref(),
        }
    }
}

/// A medicine in the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicineRecord {
    /// Canonical lowercase key
    pub id: String,
    /// Display name (e.g., "Lisinopril")
    pub name: String,
    /// Generic (non-brand) name
    pub generic_name: String,
    /// Therapeutic category (e.g., "NSAIDs", "Antibiotics")
    pub category: String,
    /// Conditions and symptoms this medicine treats
    pub indications: Vec<String>,
    /// Dosage text per age band
    pub dosage: DosageBands,
    /// Maximum daily dose, free text
    #[serde(default)]
    pub max_daily_dose: Option<String>,
    /// Fixed course length (antibiotics)
    #[serde(default)]
    pub duration: Option<String>,
    /// Drugs known to interact
    #[serde(default)]
    pub interactions: Vec<String>,
    /// Conditions/substances that rule this medicine out
    #[serde(default)]
    pub contraindications: Vec<String>,
    /// Side effects, most common first
    #[serde(default)]
    pub side_effects: Vec<String>,
    /// FDA pregnancy category letter
    pub pregnancy_category: String,
}

impl MedicineRecord {
    /// Check whether a condition is literally one of this medicine's indications.
    pub fn is_indicated_for(&self, condition: &str) -> bool {
        let condition_lower = condition.to_lowercase();
        self.indications
            .iter()
            .any(|i| i.to_lowercase() == condition_lower)
    }

    /// Check whether any indication mentions the given symptom.
    pub fn mentions_symptom(&self, symptom: &str) -> bool {
        let symptom_lower = symptom.to_lowercase();
        self.indications
            .iter()
            .any(|i| i.to_lowercase().contains(&symptom_lower))
    }
}

/// Protocol tier, in decreasing order of association strength.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolTier {
    FirstLine,
    SecondLine,
    Supportive,
}

/// Condition → medicine treatment protocol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProtocolRecord {
    /// Canonical condition key
    pub condition_key: String,
    #[serde(default)]
    pub first_line: Vec<String>,
    #[serde(default)]
    pub second_line: Vec<String>,
    #[serde(default)]
    pub supportive: Vec<String>,
}

impl ProtocolRecord {
    /// All medicine ids in tier order: first-line, second-line, supportive.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        self.first_line
            .iter()
            .chain(&self.second_line)
            .chain(&self.supportive)
            .map(String::as_str)
    }

    /// First- and second-line ids only (used for the fallback protocol).
    pub fn primary_candidates(&self) -> impl Iterator<Item = &str> {
        self.first_line
            .iter()
            .chain(&self.second_line)
            .map(String::as_str)
    }

    /// Tier a medicine appears in, checking the strongest tier first.
    pub fn tier_of(&self, medicine_id: &str) -> Option<ProtocolTier> {
        let medicine_id = medicine_id.to_lowercase();
        let has = |tier: &[String]| tier.iter().any(|m| m.to_lowercase() == medicine_id);
        if has(&self.first_line) {
            Some(ProtocolTier::FirstLine)
        } else if has(&self.second_line) {
            Some(ProtocolTier::SecondLine)
        } else if has(&self.supportive) {
            Some(ProtocolTier::Supportive)
        } else {
            None
        }
    }
}

/// Keyword-driven relevance for the free-text and keyword scoring modes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelevanceRule {
    pub medicine_id: String,
    /// Any of these in the search text selects `boosted`
    pub keywords: Vec<String>,
    pub boosted: u8,
    pub base: u8,
}

impl RelevanceRule {
    /// Relevance for a lowercased search text.
    pub fn relevance(&self, search_text: &str) -> u8 {
        if self.keywords.iter().any(|k| search_text.contains(k.as_str())) {
            self.boosted
        } else {
            self.base
        }
    }
}

/// Keyword → suggested medicines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeywordSuggestion {
    pub keyword: String,
    pub medicines: Vec<String>,
}

/// Condition name with the trigger words that indicate it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConditionKeywords {
    pub condition: String,
    pub triggers: Vec<String>,
}

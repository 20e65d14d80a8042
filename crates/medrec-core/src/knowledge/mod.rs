//! Immutable medicine knowledge base.
//!
//! The catalog is data, not code: it is deserialized from a versioned JSON
//! document (`data/knowledge_base.json` is embedded as the default) and
//! never mutated after construction. Lookups are case-insensitive on ids
//! and condition keys.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    ConditionKeywords, KeywordSuggestion, MedicineRecord, ProtocolRecord, RelevanceRule,
};

/// Embedded default catalog.
const BUILTIN_KNOWLEDGE_BASE: &str = include_str!("../../data/knowledge_base.json");

/// Knowledge base loading errors.
#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid knowledge base: {0}")]
    Invalid(String),
}

pub type KnowledgeResult<T> = Result<T, KnowledgeError>;

/// On-disk shape of the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    #[serde(default)]
    pub version: Option<String>,
    pub medicines: Vec<MedicineRecord>,
    /// Ordered; partial matches are unioned in this order
    pub protocols: Vec<ProtocolRecord>,
    /// Used when no protocol key matches
    pub fallback_protocol: ProtocolRecord,
    /// Condition phrasing → canonical protocol key
    #[serde(default)]
    pub synonyms: BTreeMap<String, String>,
    #[serde(default)]
    pub relevance: Vec<RelevanceRule>,
    #[serde(default)]
    pub keyword_suggestions: Vec<KeywordSuggestion>,
    #[serde(default)]
    pub condition_keywords: Vec<ConditionKeywords>,
}

/// Validated, indexed knowledge base.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    document: KnowledgeDocument,
    medicine_index: HashMap<String, usize>,
    relevance_index: HashMap<String, usize>,
}

impl KnowledgeBase {
    /// Parse and validate a knowledge base from JSON.
    pub fn from_json(json: &str) -> KnowledgeResult<Self> {
        let document: KnowledgeDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    /// Load a knowledge base file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> KnowledgeResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Validate a document and build lookup indexes.
    pub fn from_document(mut document: KnowledgeDocument) -> KnowledgeResult<Self> {
        let mut medicine_index = HashMap::new();
        for (i, medicine) in document.medicines.iter_mut().enumerate() {
            medicine.id = medicine.id.trim().to_lowercase();
            if medicine.id.is_empty() {
                return Err(KnowledgeError::Invalid(format!(
                    "medicine '{}' has an empty id",
                    medicine.name
                )));
            }
            if medicine_index.insert(medicine.id.clone(), i).is_some() {
                return Err(KnowledgeError::Invalid(format!(
                    "duplicate medicine id: {}",
                    medicine.id
                )));
            }
        }

        let mut seen_keys = HashSet::new();
        for protocol in document.protocols.iter_mut() {
            protocol.condition_key = protocol.condition_key.trim().to_lowercase();
            if protocol.condition_key.is_empty() {
                return Err(KnowledgeError::Invalid(
                    "protocol with empty condition key".into(),
                ));
            }
            if !seen_keys.insert(protocol.condition_key.clone()) {
                return Err(KnowledgeError::Invalid(format!(
                    "duplicate protocol key: {}",
                    protocol.condition_key
                )));
            }
        }

        let fallback = &mut document.fallback_protocol;
        fallback.condition_key = fallback.condition_key.trim().to_lowercase();
        if !fallback
            .primary_candidates()
            .any(|id| medicine_index.contains_key(&id.trim().to_lowercase()))
        {
            return Err(KnowledgeError::Invalid(format!(
                "fallback protocol '{}' lists no catalogued first- or second-line medicine",
                fallback.condition_key
            )));
        }

        document.synonyms = document
            .synonyms
            .into_iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_lowercase()))
            .collect();

        for suggestion in document.keyword_suggestions.iter_mut() {
            suggestion.keyword = suggestion.keyword.to_lowercase();
        }
        for rule in document.relevance.iter_mut() {
            rule.keywords = rule.keywords.iter().map(|k| k.to_lowercase()).collect();
        }

        let relevance_index = document
            .relevance
            .iter()
            .enumerate()
            .map(|(i, rule)| (rule.medicine_id.to_lowercase(), i))
            .collect();

        Ok(Self {
            document,
            medicine_index,
            relevance_index,
        })
    }

    /// The embedded default catalog, parsed once per process.
    pub fn builtin() -> Arc<KnowledgeBase> {
        static BUILTIN: OnceLock<Arc<KnowledgeBase>> = OnceLock::new();
        BUILTIN
            .get_or_init(|| {
                // The embedded document is a compile-time asset validated by tests.
                Arc::new(
                    KnowledgeBase::from_json(BUILTIN_KNOWLEDGE_BASE)
                        .expect("embedded knowledge base is valid"),
                )
            })
            .clone()
    }

    pub fn version(&self) -> Option<&str> {
        self.document.version.as_deref()
    }

    /// Look up a medicine by id.
    pub fn medicine(&self, id: &str) -> Option<&MedicineRecord> {
        self.medicine_index
            .get(&id.to_lowercase())
            .map(|&i| &self.document.medicines[i])
    }

    pub fn medicines(&self) -> &[MedicineRecord] {
        &self.document.medicines
    }

    /// Look up a protocol by exact canonical key.
    pub fn protocol(&self, condition_key: &str) -> Option<&ProtocolRecord> {
        self.document
            .protocols
            .iter()
            .find(|p| p.condition_key == condition_key)
    }

    /// All protocols in catalog order.
    pub fn protocols(&self) -> &[ProtocolRecord] {
        &self.document.protocols
    }

    pub fn fallback_protocol(&self) -> &ProtocolRecord {
        &self.document.fallback_protocol
    }

    /// Canonical key for a known phrasing.
    pub fn synonym(&self, phrase: &str) -> Option<&str> {
        self.document.synonyms.get(phrase).map(String::as_str)
    }

    /// Relevance rule for a medicine, if listed.
    pub fn relevance_rule(&self, medicine_id: &str) -> Option<&RelevanceRule> {
        self.relevance_index
            .get(&medicine_id.to_lowercase())
            .map(|&i| &self.document.relevance[i])
    }

    pub fn keyword_suggestions(&self) -> &[KeywordSuggestion] {
        &self.document.keyword_suggestions
    }

    pub fn condition_keywords(&self) -> &[ConditionKeywords] {
        &self.document.condition_keywords
    }
}

//! Condition text normalizer.
//!
//! Handles:
//! - Case/whitespace folding ("  Hypertension " → "hypertension")
//! - Synonym expansion ("high blood pressure" → "hypertension")
//! - Protocol key discovery inside free text
//! - Condition keyword extraction from descriptions

use std::collections::HashMap;

use crate::knowledge::KnowledgeBase;

/// Normalizer for condition and treatment descriptions.
pub struct Normalizer<'a> {
    kb: &'a KnowledgeBase,
    /// Caller-supplied synonyms, checked before the catalog's
    extra_synonyms: HashMap<String, String>,
}

impl<'a> Normalizer<'a> {
    /// Create a normalizer over a knowledge base.
    pub fn new(kb: &'a KnowledgeBase) -> Self {
        Self {
            kb,
            extra_synonyms: HashMap::new(),
        }
    }

    /// Map free text to a canonical condition key.
    ///
    /// Unknown conditions pass through lowercased and trimmed; whether they
    /// name a protocol is decided later by the protocol resolver.
    pub fn normalize(&self, text: &str) -> String {
        let lower = text.trim().to_lowercase();
        if let Some(canonical) = self.extra_synonyms.get(&lower) {
            return canonical.clone();
        }
        self.kb
            .synonym(&lower)
            .map(str::to_string)
            .unwrap_or(lower)
    }

    /// Add a custom synonym mapping.
    pub fn add_synonym(&mut self, phrase: &str, canonical: &str) {
        self.extra_synonyms
            .insert(phrase.trim().to_lowercase(), canonical.trim().to_lowercase());
    }

    /// Protocol keys related to `text` by substring in either direction,
    /// in catalog order. Blank text is contained in every key.
    pub fn protocol_keys_in(&self, text: &str) -> Vec<&'a str> {
        let lower = text.trim().to_lowercase();
        self.kb
            .protocols()
            .iter()
            .map(|p| p.condition_key.as_str())
            .filter(|key| lower.contains(key) || key.contains(lower.as_str()))
            .collect()
    }

    /// Conditions whose trigger words appear in a description, in table order.
    pub fn extract_conditions(&self, description: &str) -> Vec<&'a str> {
        let lower = description.to_lowercase();
        self.kb
            .condition_keywords()
            .iter()
            .filter(|c| c.triggers.iter().any(|t| lower.contains(&t.to_lowercase())))
            .map(|c| c.condition.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_synonyms() {
        let kb = KnowledgeBase::builtin();
        let normalizer = Normalizer::new(&kb);

        assert_eq!(normalizer.normalize("high blood pressure"), "hypertension");
        assert_eq!(normalizer.normalize("High Blood Pressure"), "hypertension");
        assert_eq!(normalizer.normalize("  Type 2 Diabetes "), "diabetes");
        assert_eq!(normalizer.normalize("Bacterial Infection"), "infection");
    }

    #[test]
    fn test_unknown_passes_through() {
        let kb = KnowledgeBase::builtin();
        let normalizer = Normalizer::new(&kb);

        assert_eq!(normalizer.normalize("  Gout Flare "), "gout flare");
        assert_eq!(
            normalizer.normalize("High Blood Pressure (Hypertension)"),
            "high blood pressure (hypertension)"
        );
    }

    #[test]
    fn test_custom_synonym() {
        let kb = KnowledgeBase::builtin();
        let mut normalizer = Normalizer::new(&kb);
        normalizer.add_synonym("HTN", "Hypertension");

        assert_eq!(normalizer.normalize("htn"), "hypertension");
    }

    #[test]
    fn test_protocol_keys_in_text() {
        let kb = KnowledgeBase::builtin();
        let normalizer = Normalizer::new(&kb);

        let keys = normalizer.protocol_keys_in("Respiratory infection follow-up");
        assert_eq!(keys, vec!["respiratory", "respiratory infection", "infection"]);

        // Text contained in a key also counts
        assert_eq!(normalizer.protocol_keys_in("hyperten"), vec!["hypertension"]);
        assert_eq!(normalizer.protocol_keys_in("   ").len(), kb.protocols().len());
    }

    #[test]
    fn test_extract_conditions() {
        let kb = KnowledgeBase::builtin();
        let normalizer = Normalizer::new(&kb);

        let conditions = normalizer.extract_conditions("Sore throat with a mild fever");
        assert_eq!(conditions, vec!["pain", "infection", "cough"]);
        assert!(normalizer.extract_conditions("routine checkup").is_empty());
    }
}

//! Condition → candidate medicine expansion.

use std::collections::HashSet;

use tracing::debug;

use crate::config::EngineConfig;
use crate::knowledge::KnowledgeBase;
use crate::models::{ProtocolRecord, ProtocolTier};

use super::Normalizer;

/// How a condition was matched to protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPath {
    /// The canonical key is a protocol key
    Exact,
    /// One or more keys relate to the condition by substring
    Partial,
    /// Keys were found only inside the accompanying description
    TextExtracted,
    /// Nothing matched; the generic protocol was used
    Fallback,
}

/// Ordered candidate ids and the protocols they came from.
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    pub path: ResolutionPath,
    /// Matched protocols in catalog order; empty for the fallback
    pub protocols: Vec<&'a ProtocolRecord>,
    /// Tier-ordered ids; may contain duplicates
    pub medicine_ids: Vec<&'a str>,
}

impl<'a> Resolution<'a> {
    pub fn is_exact(&self) -> bool {
        self.path == ResolutionPath::Exact
    }

    /// Whether any matched protocol lists the medicine as first-line.
    pub fn is_first_line(&self, medicine_id: &str) -> bool {
        self.protocols
            .iter()
            .any(|p| p.tier_of(medicine_id) == Some(ProtocolTier::FirstLine))
    }

    /// Candidates for an entry point, capped per its mode.
    pub fn candidates(&self, mode: CandidateMode, config: &EngineConfig) -> Vec<&'a str> {
        mode.select(&self.medicine_ids, config)
    }
}

/// Candidate selection rules, one per patient-aware entry point.
///
/// The two modes cap and deduplicate differently. Both are kept as
/// observed; unifying them needs sign-off from the knowledge base owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateMode {
    /// First `structured_candidate_cap` ids as resolved, duplicates kept
    Structured,
    /// Deduplicated (first occurrence wins), then `free_text_candidate_cap`
    FreeText,
    /// Deduplicated, then `keyword_candidate_cap`
    Keyword,
}

impl CandidateMode {
    pub fn cap(self, config: &EngineConfig) -> usize {
        match self {
            CandidateMode::Structured => config.structured_candidate_cap,
            CandidateMode::FreeText => config.free_text_candidate_cap,
            CandidateMode::Keyword => config.keyword_candidate_cap,
        }
    }

    /// Apply this mode's dedup and cap to resolved ids.
    pub fn select<'a>(self, ids: &[&'a str], config: &EngineConfig) -> Vec<&'a str> {
        let cap = self.cap(config);
        match self {
            CandidateMode::Structured => ids.iter().copied().take(cap).collect(),
            CandidateMode::FreeText | CandidateMode::Keyword => {
                dedup_preserving_order(ids.iter().copied())
                    .into_iter()
                    .take(cap)
                    .collect()
            }
        }
    }
}

/// Remove case-insensitive duplicates, keeping first occurrences.
pub(crate) fn dedup_preserving_order<'a>(ids: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(id.to_lowercase()))
        .collect()
}

/// Expands canonical condition keys into ordered medicine ids.
pub struct ProtocolResolver<'a> {
    kb: &'a KnowledgeBase,
}

impl<'a> ProtocolResolver<'a> {
    pub fn new(kb: &'a KnowledgeBase) -> Self {
        Self { kb }
    }

    /// Resolve a canonical key: exact key, else every substring-related key
    /// (first match's tiers first), else the fallback protocol.
    pub fn resolve(&self, canonical_key: &str) -> Resolution<'a> {
        if let Some(protocol) = self.kb.protocol(canonical_key) {
            debug!(condition = canonical_key, "exact protocol match");
            return Resolution {
                path: ResolutionPath::Exact,
                protocols: vec![protocol],
                medicine_ids: protocol.candidates().collect(),
            };
        }

        let partial = self.partial_matches(canonical_key);
        if !partial.is_empty() {
            debug!(
                condition = canonical_key,
                matches = partial.len(),
                "partial protocol match"
            );
            return Self::union(ResolutionPath::Partial, partial);
        }

        self.fallback(canonical_key)
    }

    /// Resolve a treatment name with its description.
    ///
    /// After the exact and partial checks on the name, protocol keys found
    /// in `name + " " + description` are added before falling back.
    pub fn resolve_text(&self, canonical_name: &str, description: &str) -> Resolution<'a> {
        let by_name = match self.resolve_partial_first(canonical_name) {
            Some(resolution) if resolution.is_exact() => return resolution,
            other => other,
        };

        let full_text = format!("{} {}", canonical_name, description);
        let extracted: Vec<&'a ProtocolRecord> = Normalizer::new(self.kb)
            .protocol_keys_in(&full_text)
            .into_iter()
            .filter_map(|key| self.kb.protocol(key))
            .collect();

        match by_name {
            Some(mut resolution) => {
                for protocol in extracted {
                    resolution.medicine_ids.extend(protocol.candidates());
                    if !resolution.protocols.iter().any(|p| p.condition_key == protocol.condition_key) {
                        resolution.protocols.push(protocol);
                    }
                }
                resolution
            }
            None if !extracted.is_empty() => {
                debug!(treatment = canonical_name, "protocols extracted from description");
                Self::union(ResolutionPath::TextExtracted, extracted)
            }
            None => self.fallback(canonical_name),
        }
    }

    /// Exact or partial resolution, without the fallback.
    fn resolve_partial_first(&self, canonical_key: &str) -> Option<Resolution<'a>> {
        if self.kb.protocol(canonical_key).is_some() {
            return Some(self.resolve(canonical_key));
        }
        let partial = self.partial_matches(canonical_key);
        (!partial.is_empty()).then(|| Self::union(ResolutionPath::Partial, partial))
    }

    fn partial_matches(&self, canonical_key: &str) -> Vec<&'a ProtocolRecord> {
        Normalizer::new(self.kb)
            .protocol_keys_in(canonical_key)
            .into_iter()
            .filter_map(|key| self.kb.protocol(key))
            .collect()
    }

    fn union(path: ResolutionPath, protocols: Vec<&'a ProtocolRecord>) -> Resolution<'a> {
        let medicine_ids = protocols
            .iter()
            .copied()
            .flat_map(|p| p.candidates())
            .collect();
        Resolution {
            path,
            protocols,
            medicine_ids,
        }
    }

    fn fallback(&self, canonical_key: &str) -> Resolution<'a> {
        debug!(condition = canonical_key, "no protocol match, using fallback");
        Resolution {
            path: ResolutionPath::Fallback,
            protocols: Vec::new(),
            medicine_ids: self.kb.fallback_protocol().primary_candidates().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_resolution() {
        let kb = KnowledgeBase::builtin();
        let resolver = ProtocolResolver::new(&kb);

        let resolution = resolver.resolve("hypertension");
        assert_eq!(resolution.path, ResolutionPath::Exact);
        assert_eq!(
            resolution.medicine_ids,
            vec!["lisinopril", "amlodipine", "hydrochlorothiazide", "losartan", "metoprolol"]
        );
        assert!(resolution.is_first_line("lisinopril"));
        assert!(!resolution.is_first_line("losartan"));
    }

    #[test]
    fn test_partial_resolution_unions_in_catalog_order() {
        let kb = KnowledgeBase::builtin();
        let resolver = ProtocolResolver::new(&kb);

        let resolution = resolver.resolve("chronic cough and asthma");
        assert_eq!(resolution.path, ResolutionPath::Partial);
        let keys: Vec<&str> = resolution
            .protocols
            .iter()
            .map(|p| p.condition_key.as_str())
            .collect();
        assert_eq!(keys, vec!["asthma", "cough"]);
        // asthma tiers first, duplicates kept
        assert_eq!(&resolution.medicine_ids[..4], &["albuterol", "fluticasone", "montelukast", "budesonide"]);
        assert_eq!(resolution.medicine_ids[4], "dextromethorphan");
    }

    #[test]
    fn test_fallback_excludes_supportive() {
        let kb = KnowledgeBase::builtin();
        let resolver = ProtocolResolver::new(&kb);

        let resolution = resolver.resolve("gout");
        assert_eq!(resolution.path, ResolutionPath::Fallback);
        assert_eq!(resolution.medicine_ids, vec!["acetaminophen", "ibuprofen", "multivitamin"]);
        assert!(!resolution.is_first_line("acetaminophen"));
    }

    #[test]
    fn test_blank_key_unions_every_protocol() {
        let kb = KnowledgeBase::builtin();
        let resolver = ProtocolResolver::new(&kb);

        let resolution = resolver.resolve("");
        assert_eq!(resolution.path, ResolutionPath::Partial);
        assert_eq!(resolution.protocols.len(), kb.protocols().len());
        assert_eq!(
            &resolution.medicine_ids[..6],
            &["lisinopril", "amlodipine", "hydrochlorothiazide", "losartan", "metoprolol", "metformin"]
        );
        assert!(resolution.is_first_line("amoxicillin"));

        let from_text = resolver.resolve_text("", "");
        assert_eq!(from_text.path, ResolutionPath::Partial);
        assert_eq!(from_text.protocols.len(), kb.protocols().len());
    }

    #[test]
    fn test_resolve_text_adds_description_protocols() {
        let kb = KnowledgeBase::builtin();
        let resolver = ProtocolResolver::new(&kb);

        let resolution = resolver.resolve_text("seasonal checkup", "persistent cough");
        assert_eq!(resolution.path, ResolutionPath::TextExtracted);
        assert_eq!(resolution.medicine_ids[0], "dextromethorphan");

        let exact = resolver.resolve_text("asthma", "with cough");
        assert_eq!(exact.path, ResolutionPath::Exact);
        assert!(!exact.medicine_ids.contains(&"honey"));
    }

    #[test]
    fn test_structured_mode_keeps_duplicates() {
        let config = EngineConfig::default();
        let ids = ["a", "b", "a", "c", "d", "e", "f", "g"];
        let selected = CandidateMode::Structured.select(&ids, &config);
        assert_eq!(selected, vec!["a", "b", "a", "c", "d", "e"]);
    }

    #[test]
    fn test_free_text_mode_dedups_before_cap() {
        let config = EngineConfig::default();
        let ids = ["a", "b", "A", "c", "d", "e", "f", "g", "h", "i"];
        let selected = CandidateMode::FreeText.select(&ids, &config);
        assert_eq!(selected, vec!["a", "b", "c", "d", "e", "f", "g", "h"]);
    }
}

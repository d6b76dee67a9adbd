//! Experience extraction: section segmentation, block splitting and the
//! per-block strategy order.
//!
//! Each block runs through the preferred extractors in order; the first
//! candidate the validation gate accepts wins. When none is accepted the
//! rule-based extractor produces the entry, accepted unconditionally, so
//! every block yields exactly one entry.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::models::{CandidateEntry, ExperienceEntry, ExtractionStats, RawExperienceBlock};

pub mod ai;
pub mod dates;
pub mod locality;
pub mod prompts;
pub mod rules;
pub mod segmenter;
pub mod skills;
pub mod splitter;
pub mod validation;

pub use ai::AiExtractor;
pub use dates::DurationNormalizer;
pub use locality::{CityDictionary, LocalityHints};
pub use rules::RuleBasedExtractor;
pub use skills::SkillDictionary;
pub use splitter::ExperienceBlockSplitter;
pub use validation::{validate, Verdict};

/// Turns one raw block into a candidate entry. Implementations never fail:
/// on any internal problem they return `CandidateEntry::empty`.
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract(&self, block: &RawExperienceBlock) -> CandidateEntry;
}

/// Which path produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOrigin {
    Accepted(&'static str),
    Fallback,
}

pub struct ExtractionStrategy {
    preferred: Vec<Arc<dyn FieldExtractor>>,
    fallback: RuleBasedExtractor,
}

impl ExtractionStrategy {
    pub fn new(preferred: Vec<Arc<dyn FieldExtractor>>, fallback: RuleBasedExtractor) -> Self {
        Self {
            preferred,
            fallback,
        }
    }

    pub fn rules_only(fallback: RuleBasedExtractor) -> Self {
        Self::new(Vec::new(), fallback)
    }

    pub fn extractor_names(&self) -> Vec<&'static str> {
        self.preferred.iter().map(|e| e.name()).collect()
    }

    pub async fn extract(&self, block: &RawExperienceBlock) -> (CandidateEntry, EntryOrigin) {
        for extractor in &self.preferred {
            let candidate = extractor.extract(block).await;
            match validate(&candidate) {
                Verdict::Accepted => {
                    debug!(extractor = extractor.name(), "Candidate accepted");
                    return (candidate, EntryOrigin::Accepted(extractor.name()));
                }
                Verdict::Rejected { missing } => {
                    info!(
                        extractor = extractor.name(),
                        ?missing,
                        "Candidate rejected, falling back"
                    );
                }
            }
        }
        (self.fallback.extract_block(block), EntryOrigin::Fallback)
    }

    /// Extracts every block in order and labels each entry's duration.
    pub async fn extract_all(
        &self,
        blocks: &[RawExperienceBlock],
        durations: &DurationNormalizer,
    ) -> (Vec<ExperienceEntry>, ExtractionStats) {
        let mut entries = Vec::with_capacity(blocks.len());
        let mut stats = ExtractionStats::default();

        for block in blocks {
            let (candidate, origin) = self.extract(block).await;
            match origin {
                EntryOrigin::Accepted(_) => stats.ai_accepted += 1,
                EntryOrigin::Fallback => stats.rule_fallbacks += 1,
            }
            let duration = durations.label(&candidate.dates);
            entries.push(candidate.into_entry(duration));
        }
        (entries, stats)
    }
}

/// Lowercases and strips Latin diacritics, one output char per input char.
pub fn fold_accents(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'à' | 'á' | 'â' | 'ä' | 'ã' | 'å' => 'a',
            'ç' => 'c',
            'è' | 'é' | 'ê' | 'ë' => 'e',
            'ì' | 'í' | 'î' | 'ï' => 'i',
            'ñ' => 'n',
            'ò' | 'ó' | 'ô' | 'ö' | 'õ' => 'o',
            'ù' | 'ú' | 'û' | 'ü' => 'u',
            'ý' | 'ÿ' => 'y',
            '’' => '\'',
            other => other,
        })
        .collect()
}

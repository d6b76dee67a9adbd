//! Record assembly: identity, experience, education and skills merged into
//! one `CvRecord`.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::extraction::splitter::strip_bullet;
use crate::extraction::{ExperienceBlockSplitter, LocalityHints, SkillDictionary};
use crate::models::{
    CvRecord, ExperienceEntry, ExtractionStats, RecordMetadata, SectionKind, SectionMap,
    SkillSets, SourceInfo,
};
use crate::ner::NameRecognizer;

pub mod education;
pub mod identity;

pub use identity::IdentityExtractor;

const ITEM_SEPARATORS: &[char] = &[',', ';', '|', '•', '·'];
const MAX_ITEM_CHARS: usize = 40;
const MAX_ITEM_WORDS: usize = 4;

/// Everything the earlier stages produced for one document.
pub struct AssemblyInput<'a> {
    pub source: &'a SourceInfo,
    pub sections: &'a SectionMap,
    pub full_text: String,
    pub experience: Vec<ExperienceEntry>,
    pub stats: ExtractionStats,
    pub ocr_used: bool,
    pub page_count: usize,
}

pub struct RecordAssembler {
    identity: IdentityExtractor,
    education_splitter: ExperienceBlockSplitter,
    skills: &'static SkillDictionary,
}

impl RecordAssembler {
    pub fn new(
        names: Arc<dyn NameRecognizer>,
        hints: Arc<dyn LocalityHints>,
        skills: &'static SkillDictionary,
    ) -> Self {
        Self {
            identity: IdentityExtractor::new(names),
            education_splitter: ExperienceBlockSplitter::new(hints),
            skills,
        }
    }

    pub fn assemble(&self, input: AssemblyInput<'_>) -> CvRecord {
        let sections = input.sections;
        let identity = self
            .identity
            .extract(&sections.text(SectionKind::Identity), &input.full_text);

        let education_blocks = self
            .education_splitter
            .split(&sections.text(SectionKind::Education));
        let education = education::extract_education(&education_blocks);

        let skills = self.skill_sets(
            &sections.text(SectionKind::Skills),
            &input.full_text,
            &input.experience,
        );

        CvRecord {
            metadata: RecordMetadata {
                record_id: Uuid::new_v4(),
                source_file_id: input.source.file_id.clone(),
                source_filename: input.source.file_name.clone(),
                ocr_used: input.ocr_used,
                page_count: input.page_count,
                processed_at: Utc::now(),
                extraction: input.stats,
                error: None,
            },
            identity,
            experience: input.experience,
            education,
            skills,
            raw_text: input.full_text,
        }
    }

    /// Technical skills: items listed in the skills section (dictionary
    /// names where one applies), then each entry's skills. Without a skills
    /// section the dictionary runs over the full text. Soft skills come from
    /// the dictionary over the full text.
    fn skill_sets(
        &self,
        skills_text: &str,
        full_text: &str,
        experience: &[ExperienceEntry],
    ) -> SkillSets {
        let mut technical: Vec<String> = Vec::new();
        if skills_text.is_empty() {
            technical.extend(self.skills.technical_in(full_text));
        }
        for item in listed_items(skills_text) {
            if !self.skills.soft_in(&item).is_empty() {
                continue;
            }
            let known = self.skills.technical_in(&item);
            if known.is_empty() {
                technical.push(item);
            } else {
                technical.extend(known);
            }
        }
        technical.extend(experience.iter().flat_map(|e| e.skills.iter().cloned()));

        SkillSets {
            technical: dedup_case_insensitive(technical),
            soft: dedup_case_insensitive(self.skills.soft_in(full_text)),
        }
    }
}

/// Short comma/pipe separated items of a skills listing. A "Label: a, b"
/// prefix is dropped; sentences are skipped.
fn listed_items(text: &str) -> Vec<String> {
    text.lines()
        .map(strip_bullet)
        .map(|line| line.rsplit_once(':').map_or(line, |(_, rest)| rest))
        .flat_map(|line| line.split(ITEM_SEPARATORS))
        .map(str::trim)
        .filter(|item| {
            item.chars().count() >= 2
                && item.chars().count() <= MAX_ITEM_CHARS
                && item.split_whitespace().count() <= MAX_ITEM_WORDS
                && !item.ends_with('.')
                && item.chars().any(char::is_alphabetic)
        })
        .map(str::to_string)
        .collect()
}

/// Keeps the first spelling of each skill, compared case-insensitively.
pub fn dedup_case_insensitive<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| !item.trim().is_empty())
        .filter(|item| seen.insert(item.to_lowercase()))
        .collect()
}

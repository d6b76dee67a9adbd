//! Deterministic extraction. Always produces a candidate with a title; it is
//! the terminal fallback and is accepted without validation.

use std::sync::Arc;

use async_trait::async_trait;

use super::dates::find_date_range;
use super::locality::LocalityHints;
use super::skills::SkillDictionary;
use super::splitter::{header_of, is_bullet, strip_bullet, TITLE_SEPARATORS};
use super::FieldExtractor;
use crate::models::{CandidateEntry, RawExperienceBlock};

pub const UNKNOWN_TITLE: &str = "Poste non précisé";

const EDGE_PUNCTUATION: &[char] = &[',', '|', '-', '–', '—', '@', '(', ')', ';', ':'];

pub struct RuleBasedExtractor {
    hints: Arc<dyn LocalityHints>,
    skills: &'static SkillDictionary,
}

impl RuleBasedExtractor {
    pub fn new(hints: Arc<dyn LocalityHints>, skills: &'static SkillDictionary) -> Self {
        Self { hints, skills }
    }

    pub fn extract_block(&self, block: &RawExperienceBlock) -> CandidateEntry {
        let full_text = block.text();
        let dates = block
            .date_range
            .clone()
            .or_else(|| {
                block
                    .lines
                    .iter()
                    .find_map(|l| find_date_range(l))
                    .map(str::to_string)
            })
            .unwrap_or_default();
        let date_ref = (!dates.is_empty()).then_some(dates.as_str());

        let header = header_of(&block.lines, date_ref);
        let (title, company, location) = match &header {
            Some((_, line)) => self.split_header(line, block.locality.as_deref()),
            None => (String::new(), String::new(), String::new()),
        };
        let header_index = header.as_ref().map(|(index, _)| *index);

        let tasks = collect_tasks(&block.lines, header_index, date_ref);
        let skills = self.skills.technical_in(&full_text);

        CandidateEntry {
            job_title: if title.is_empty() {
                UNKNOWN_TITLE.to_string()
            } else {
                title
            },
            company,
            location,
            dates,
            summary: String::new(),
            tasks,
            skills,
            full_text,
        }
    }

    /// Title, company and location from a header line. Without a separator
    /// the whole line is the title.
    fn split_header(&self, line: &str, locality: Option<&str>) -> (String, String, String) {
        let Some((title, rest)) = TITLE_SEPARATORS
            .iter()
            .find_map(|sep| line.split_once(sep))
        else {
            return (clean(line), String::new(), String::new());
        };

        let locality = locality
            .filter(|l| rest.contains(l))
            .map(str::to_string)
            .or_else(|| self.hints.locate(rest));

        let (company, location) = match locality.and_then(|l| rest.rfind(&l)) {
            Some(at) => (clean(&rest[..at]), clean(&rest[at..])),
            None => (clean(rest), String::new()),
        };
        (clean(title), company, location)
    }
}

#[async_trait]
impl FieldExtractor for RuleBasedExtractor {
    fn name(&self) -> &'static str {
        "rules"
    }

    async fn extract(&self, block: &RawExperienceBlock) -> CandidateEntry {
        self.extract_block(block)
    }
}

fn clean(s: &str) -> String {
    s.trim_matches(|c: char| c.is_whitespace() || EDGE_PUNCTUATION.contains(&c))
        .to_string()
}

/// Bullet lines become tasks. A block without bullets contributes its prose
/// lines instead, minus the header and the bare date line.
fn collect_tasks(lines: &[String], header_index: Option<usize>, dates: Option<&str>) -> Vec<String> {
    let bullets: Vec<String> = lines
        .iter()
        .filter(|l| is_bullet(l))
        .map(|l| strip_bullet(l).to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if !bullets.is_empty() {
        return bullets;
    }

    lines
        .iter()
        .enumerate()
        .filter(|(index, _)| Some(*index) != header_index)
        .map(|(_, line)| line.trim())
        .filter(|line| !line.is_empty())
        .filter(|line| dates.map_or(true, |d| !clean(&line.replacen(d, "", 1)).is_empty()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::locality::CityDictionary;

    fn extractor() -> RuleBasedExtractor {
        RuleBasedExtractor::new(
            Arc::new(CityDictionary::default()),
            SkillDictionary::standard(),
        )
    }

    fn block(text: &str, date_range: Option<&str>, locality: Option<&str>) -> RawExperienceBlock {
        RawExperienceBlock {
            lines: text.lines().map(str::to_string).collect(),
            date_range: date_range.map(str::to_string),
            locality: locality.map(str::to_string),
        }
    }

    #[test]
    fn test_title_company_location_and_bullets() {
        let b = block(
            "Devops Engineer – TechCorp, Lyon\nJan 2020 - Present\n- Managed K8s cluster",
            Some("Jan 2020 - Present"),
            Some("Lyon"),
        );
        let entry = extractor().extract_block(&b);
        assert_eq!(entry.job_title, "Devops Engineer");
        assert_eq!(entry.company, "TechCorp");
        assert_eq!(entry.location, "Lyon");
        assert_eq!(entry.dates, "Jan 2020 - Present");
        assert_eq!(entry.tasks, vec!["Managed K8s cluster"]);
        assert_eq!(entry.skills, vec!["Kubernetes"]);
        assert_eq!(entry.full_text, b.text());
    }

    #[test]
    fn test_same_input_same_output() {
        let b = block(
            "Data Engineer | Criteo | Paris\n2019 - 2021\n• Pipelines Spark\n• Airflow",
            None,
            None,
        );
        let first = extractor().extract_block(&b);
        assert_eq!(first, extractor().extract_block(&b));
        assert_eq!(first.job_title, "Data Engineer");
        assert_eq!(first.company, "Criteo");
        assert_eq!(first.location, "Paris");
        assert_eq!(first.dates, "2019 - 2021");
    }

    #[test]
    fn test_chez_separator() {
        let b = block("Développeur chez Orange, Rennes\n2015 - 2017\n- Java", None, None);
        let entry = extractor().extract_block(&b);
        assert_eq!(entry.job_title, "Développeur");
        assert_eq!(entry.company, "Orange");
        assert_eq!(entry.location, "Rennes");
        assert_eq!(entry.skills, vec!["Java"]);
    }

    #[test]
    fn test_no_separator_whole_line_is_title() {
        let b = block("Freelance\n2018 - 2019\n- Sites vitrines", None, None);
        let entry = extractor().extract_block(&b);
        assert_eq!(entry.job_title, "Freelance");
        assert_eq!(entry.company, "");
        assert_eq!(entry.tasks, vec!["Sites vitrines"]);
    }

    #[test]
    fn test_prose_lines_become_tasks_without_bullets() {
        let b = block(
            "Analyste – Banque X\n2016 - 2018\nAnalyse des risques de crédit.",
            Some("2016 - 2018"),
            None,
        );
        let entry = extractor().extract_block(&b);
        assert_eq!(entry.tasks, vec!["Analyse des risques de crédit."]);
        assert!(entry.skills.is_empty());
    }

    #[test]
    fn test_header_sharing_line_with_dates() {
        let b = block("Chef de projet – Thales (2012 - 2015)\n- Pilotage", None, None);
        let entry = extractor().extract_block(&b);
        assert_eq!(entry.job_title, "Chef de projet");
        assert_eq!(entry.company, "Thales");
        assert_eq!(entry.dates, "2012 - 2015");
    }

    #[test]
    fn test_block_without_header_gets_placeholder_title() {
        let b = block("2019 - 2020\n- Missions diverses", None, None);
        let entry = extractor().extract_block(&b);
        assert_eq!(entry.job_title, UNKNOWN_TITLE);
        assert_eq!(entry.tasks, vec!["Missions diverses"]);
    }

    #[test]
    fn test_empty_block_still_has_title() {
        let entry = extractor().extract_block(&block("", None, None));
        assert_eq!(entry.job_title, UNKNOWN_TITLE);
        assert!(entry.tasks.is_empty());
    }
}

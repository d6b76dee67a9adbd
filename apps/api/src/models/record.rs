use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw text of one job, bounded by detected date ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct RawExperienceBlock {
    /// Source lines, verbatim.
    pub lines: Vec<String>,
    /// The date-range substring that opened this block.
    pub date_range: Option<String>,
    /// Best-effort locality found on the header line.
    pub locality: Option<String>,
}

impl RawExperienceBlock {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }
}

/// Transient extractor output. Any field may be empty; only the validation
/// gate decides whether it becomes an [`ExperienceEntry`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateEntry {
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub dates: String,
    pub summary: String,
    pub tasks: Vec<String>,
    pub skills: Vec<String>,
    pub full_text: String,
}

impl CandidateEntry {
    /// The failure shape: only the source text survives.
    pub fn empty(full_text: String) -> Self {
        Self {
            full_text,
            ..Self::default()
        }
    }

    pub fn into_entry(self, duration: String) -> ExperienceEntry {
        ExperienceEntry {
            job_title: self.job_title,
            company: self.company,
            location: self.location,
            dates: self.dates,
            duration,
            summary: self.summary,
            tasks: self.tasks,
            skills: self.skills,
            full_text: self.full_text,
        }
    }
}

/// One job in the final record. The serialized shape is the fixed nine-key
/// contract consumed by the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub dates: String,
    pub duration: String,
    pub summary: String,
    pub tasks: Vec<String>,
    pub skills: Vec<String>,
    pub full_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub degree: String,
    pub institution: String,
    pub dates: String,
    pub full_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub links: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillSets {
    pub technical: Vec<String>,
    pub soft: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub ai_accepted: usize,
    pub rule_fallbacks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub record_id: Uuid,
    pub source_file_id: String,
    pub source_filename: String,
    pub ocr_used: bool,
    pub page_count: usize,
    pub processed_at: DateTime<Utc>,
    pub extraction: ExtractionStats,
    /// Set only when the document hit a catastrophic failure.
    pub error: Option<String>,
}

/// Where a document came from; carried into the record metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInfo {
    pub file_id: String,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvRecord {
    pub metadata: RecordMetadata,
    pub identity: Identity,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub skills: SkillSets,
    pub raw_text: String,
}

impl CvRecord {
    /// Record produced at the document boundary when the pipeline broke:
    /// metadata and whatever raw text was recovered, plus the error.
    pub fn failed(source: &SourceInfo, raw_text: String, ocr_used: bool, error: String) -> Self {
        Self {
            metadata: RecordMetadata {
                record_id: Uuid::new_v4(),
                source_file_id: source.file_id.clone(),
                source_filename: source.file_name.clone(),
                ocr_used,
                page_count: 0,
                processed_at: Utc::now(),
                extraction: ExtractionStats::default(),
                error: Some(error),
            },
            identity: Identity::default(),
            experience: Vec::new(),
            education: Vec::new(),
            skills: SkillSets::default(),
            raw_text,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.metadata.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experience_entry_wire_shape_has_nine_keys() {
        let entry = CandidateEntry::empty("raw".into()).into_entry(String::new());
        let value = serde_json::to_value(&entry).unwrap();
        let obj = value.as_object().unwrap();
        let mut keys: Vec<_> = obj.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "company",
                "dates",
                "duration",
                "full_text",
                "job_title",
                "location",
                "skills",
                "summary",
                "tasks"
            ]
        );
        assert!(obj["tasks"].is_array());
        assert!(obj["skills"].is_array());
    }

    #[test]
    fn test_failed_record_keeps_raw_text() {
        let source = SourceInfo {
            file_id: "abc".into(),
            file_name: "cv.pdf".into(),
        };
        let record = CvRecord::failed(&source, "text".into(), true, "boom".into());
        assert!(record.is_failed());
        assert_eq!(record.raw_text, "text");
        assert!(record.metadata.ocr_used);
        assert!(record.experience.is_empty());
    }
}

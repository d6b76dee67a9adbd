pub mod document;
pub mod record;
pub mod sections;

pub use document::{Document, DocumentKind, ExtractedText, PageProvenance, PageText};
pub use record::{
    CandidateEntry, CvRecord, EducationEntry, ExperienceEntry, ExtractionStats, Identity,
    RawExperienceBlock, RecordMetadata, SkillSets, SourceInfo,
};
pub use sections::{Section, SectionKind, SectionMap};

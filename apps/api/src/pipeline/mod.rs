//! Per-document pipeline: acquisition → normalization → segmentation →
//! block splitting → per-block extraction → assembly.
//!
//! Stages run strictly in order. Blocking acquisition work runs on the
//! blocking pool and the later stages on their own task, so anything that
//! breaks a document is caught here and turned into a failed record that
//! keeps the acquired text. It never reaches sibling documents.

use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{debug, error, info};

use crate::acquisition::normalize::normalize_text;
use crate::acquisition::TextAcquisitionSelector;
use crate::assembly::{AssemblyInput, RecordAssembler};
use crate::extraction::segmenter::segment;
use crate::extraction::{DurationNormalizer, ExperienceBlockSplitter, ExtractionStrategy};
use crate::models::{CvRecord, Document, PageText, SectionKind, SourceInfo};

pub mod batch;

pub use batch::{BatchRunner, DocumentReport, DocumentStatus};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("text acquisition aborted: {0}")]
    AcquisitionAborted(String),

    #[error("document worker aborted: {0}")]
    WorkerAborted(String),
}

impl PipelineError {
    fn from_join(e: JoinError) -> Self {
        PipelineError::WorkerAborted(join_message(e))
    }
}

/// Normalized text of one document plus what acquisition learned about it.
/// Kept outside the later stages so a failed record still carries it.
struct Acquired {
    full_text: String,
    ocr_used: bool,
    page_count: usize,
}

pub struct Pipeline {
    acquisition: Arc<TextAcquisitionSelector>,
    stages: Arc<Stages>,
}

/// Everything after acquisition: segmentation, splitting, extraction and
/// assembly.
struct Stages {
    splitter: ExperienceBlockSplitter,
    strategy: ExtractionStrategy,
    assembler: RecordAssembler,
}

impl Pipeline {
    pub fn new(
        acquisition: TextAcquisitionSelector,
        splitter: ExperienceBlockSplitter,
        strategy: ExtractionStrategy,
        assembler: RecordAssembler,
    ) -> Self {
        Self {
            acquisition: Arc::new(acquisition),
            stages: Arc::new(Stages {
                splitter,
                strategy,
                assembler,
            }),
        }
    }

    pub fn extractor_names(&self) -> Vec<&'static str> {
        self.stages.strategy.extractor_names()
    }

    /// Runs one document to a record. Never fails: a broken document comes
    /// back as `CvRecord::failed`, carrying whatever text was acquired.
    pub async fn process(&self, document: Document, source: &SourceInfo, today: NaiveDate) -> CvRecord {
        let acquired = match self.acquire(document, source).await {
            Ok(acquired) => acquired,
            Err(e) => {
                error!(file_id = %source.file_id, error = %e, "Document processing failed");
                return CvRecord::failed(source, String::new(), false, e.to_string());
            }
        };

        let raw_text = acquired.full_text.clone();
        let (ocr_used, page_count) = (acquired.ocr_used, acquired.page_count);
        let stages = Arc::clone(&self.stages);
        let task_source = source.clone();
        let handle =
            tokio::spawn(async move { stages.run(&task_source, acquired, today).await });

        match handle.await {
            Ok(record) => record,
            Err(e) => {
                let e = PipelineError::from_join(e);
                error!(file_id = %source.file_id, error = %e, "Document processing failed");
                let mut record = CvRecord::failed(source, raw_text, ocr_used, e.to_string());
                record.metadata.page_count = page_count;
                record
            }
        }
    }

    async fn acquire(&self, document: Document, source: &SourceInfo) -> Result<Acquired, PipelineError> {
        let declared_pages = document.page_count();
        let acquisition = Arc::clone(&self.acquisition);
        let extracted = tokio::task::spawn_blocking(move || acquisition.acquire(document))
            .await
            .map_err(|e| PipelineError::AcquisitionAborted(join_message(e)))?;

        debug!(
            file_id = %source.file_id,
            chars = extracted.pages().iter().map(PageText::char_count).sum::<usize>(),
            words = extracted.pages().iter().map(PageText::word_count).sum::<usize>(),
            "Text acquired"
        );

        Ok(Acquired {
            full_text: normalize_text(&extracted.full_text()),
            ocr_used: extracted.used_ocr(),
            page_count: declared_pages.max(extracted.pages().len()),
        })
    }
}

impl Stages {
    async fn run(&self, source: &SourceInfo, acquired: Acquired, today: NaiveDate) -> CvRecord {
        let Acquired {
            full_text,
            ocr_used,
            page_count,
        } = acquired;

        let sections = segment(&full_text);
        for section in sections.sections() {
            debug!(
                kind = ?section.kind,
                header = section.header.as_deref().unwrap_or(""),
                lines = ?(section.start_line..section.end_line()),
                "Section"
            );
        }
        if !sections.has(SectionKind::Experience) {
            info!(file_id = %source.file_id, "No experience section found");
        }
        let blocks = self.splitter.split(&sections.text(SectionKind::Experience));
        let durations = DurationNormalizer::new(today);
        let (experience, stats) = self.strategy.extract_all(&blocks, &durations).await;

        info!(
            file_id = %source.file_id,
            pages = page_count,
            ocr_used,
            blocks = blocks.len(),
            ai_accepted = stats.ai_accepted,
            rule_fallbacks = stats.rule_fallbacks,
            "Document extracted"
        );

        self.assembler.assemble(AssemblyInput {
            source,
            sections: &sections,
            full_text,
            experience,
            stats,
            ocr_used,
            page_count,
        })
    }
}

fn join_message(e: JoinError) -> String {
    if !e.is_panic() {
        return "worker cancelled".to_string();
    }
    let payload = e.into_panic();
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "worker panicked".to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::acquisition::{AcquisitionError, NativeTextBackend, OcrEngine, Thresholds};
    use crate::extraction::{AiExtractor, CityDictionary, RuleBasedExtractor, SkillDictionary};
    use crate::llm_client::{CompletionModel, LlmError};
    use crate::models::DocumentKind;
    use crate::ner::GazetteerNameModel;

    pub(crate) struct FixedPages(pub Vec<&'static str>);

    impl NativeTextBackend for FixedPages {
        fn page_texts(&self, bytes: &[u8]) -> Result<Vec<String>, AcquisitionError> {
            if bytes.starts_with(b"PANIC") {
                panic!("corrupt cross-reference table");
            }
            Ok(self.0.iter().map(|p| p.to_string()).collect())
        }
    }

    #[derive(Default)]
    pub(crate) struct CountingOcr {
        pub calls: AtomicUsize,
    }

    impl OcrEngine for CountingOcr {
        fn recognize_page(&self, _document: &Document, page_index: usize) -> Result<String, AcquisitionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AcquisitionError::Recognition {
                page: page_index,
                message: "no engine in tests".into(),
            })
        }
    }

    struct RejectedModel;

    #[async_trait]
    impl CompletionModel for RejectedModel {
        async fn complete(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            Ok(r#"{"job_title": "Devops Engineer", "company": "TechCorp", "location": "Lyon",
                   "dates": "Jan 2020 - Present", "duration": "", "summary": "",
                   "tasks": ["Managed K8s cluster"], "skills": [], "full_text": ""}"#
                .to_string())
        }

        fn model_name(&self) -> &str {
            "rejected"
        }
    }

    /// Stands in for an extractor whose dependency panics mid-document.
    pub(crate) struct PanickingExtractor;

    #[async_trait]
    impl crate::extraction::FieldExtractor for PanickingExtractor {
        fn name(&self) -> &'static str {
            "panicking"
        }

        async fn extract(&self, _block: &crate::models::RawExperienceBlock) -> crate::models::CandidateEntry {
            panic!("model adapter crashed");
        }
    }

    pub(crate) const TWO_JOBS_PAGE: &str = "Expérience\nDevops Engineer – TechCorp, Lyon\n\
                                  Jan 2020 - Present\n- Outils : Git, Docker\n\
                                  - Formation des utilisateurs\nDéveloppeur – Acme, Paris\n\
                                  2017 - 2019\n- Maintenance applicative";

    pub(crate) const IDENTITY_PAGE: &str = "Jean DUPONT\nIngénieur DevOps senior\njean.dupont@mail.fr\n\
                                 Lyon, France, disponible immédiatement";
    pub(crate) const EXPERIENCE_PAGE: &str = "Expérience\nDevops Engineer – TechCorp, Lyon\n\
                                   Jan 2020 - Present\n- Managed K8s cluster";

    pub(crate) fn pipeline_with(
        pages: Vec<&'static str>,
        ocr: Arc<CountingOcr>,
        preferred: Vec<Arc<dyn crate::extraction::FieldExtractor>>,
    ) -> Pipeline {
        let hints = Arc::new(CityDictionary::default());
        let skills = SkillDictionary::standard();
        let acquisition = TextAcquisitionSelector::new(
            Arc::new(FixedPages(pages)),
            ocr,
            Thresholds {
                min_chars: 50,
                max_symbol_ratio: 0.4,
            },
        );
        Pipeline::new(
            acquisition,
            ExperienceBlockSplitter::new(hints.clone()),
            ExtractionStrategy::new(preferred, RuleBasedExtractor::new(hints.clone(), skills)),
            RecordAssembler::new(Arc::new(GazetteerNameModel::load()), hints, skills),
        )
    }

    pub(crate) fn pdf(bytes: &[u8]) -> Document {
        Document::new(bytes.to_vec(), DocumentKind::Pdf)
    }

    pub(crate) fn source() -> SourceInfo {
        SourceInfo {
            file_id: "cv/jean_dupont.pdf".into(),
            file_name: "jean_dupont.pdf".into(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 3, 15).unwrap()
    }

    #[tokio::test]
    async fn test_two_page_native_document_rules_only() {
        let ocr = Arc::new(CountingOcr::default());
        let pipeline = pipeline_with(vec![IDENTITY_PAGE, EXPERIENCE_PAGE], ocr.clone(), Vec::new());
        let record = pipeline
            .process(pdf(b"%PDF-1.4 /Type /Page /Type /Page"), &source(), today())
            .await;

        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
        assert!(!record.metadata.ocr_used);
        assert_eq!(record.metadata.page_count, 2);
        assert_eq!(record.experience.len(), 1);
        let entry = &record.experience[0];
        assert_eq!(entry.job_title, "Devops Engineer");
        assert_eq!(entry.company, "TechCorp");
        assert_eq!(entry.location, "Lyon");
        assert_eq!(entry.tasks, vec!["Managed K8s cluster"]);
        assert_eq!(entry.skills, vec!["Kubernetes"]);
        assert_eq!(entry.duration, "3 ans 2 mois");
        assert_eq!(record.identity.name, "Jean DUPONT");
        assert_eq!(record.metadata.extraction.rule_fallbacks, 1);
    }

    #[tokio::test]
    async fn test_rejected_model_output_yields_one_rule_entry() {
        let ai: Arc<dyn crate::extraction::FieldExtractor> =
            Arc::new(AiExtractor::new(Arc::new(RejectedModel)));
        let pipeline = pipeline_with(
            vec![IDENTITY_PAGE, EXPERIENCE_PAGE],
            Arc::new(CountingOcr::default()),
            vec![ai],
        );
        let record = pipeline.process(pdf(b"%PDF-1.4"), &source(), today()).await;

        assert_eq!(record.experience.len(), 1);
        assert_eq!(record.experience[0].skills, vec!["Kubernetes"]);
        assert_eq!(record.metadata.extraction.ai_accepted, 0);
        assert_eq!(record.metadata.extraction.rule_fallbacks, 1);
    }

    #[tokio::test]
    async fn test_no_experience_header_gives_empty_list() {
        let pipeline = pipeline_with(
            vec![IDENTITY_PAGE, "Formation\nMaster Informatique – Université de Lyon\n2015 - 2017 en alternance"],
            Arc::new(CountingOcr::default()),
            Vec::new(),
        );
        let record = pipeline.process(pdf(b"%PDF-1.4"), &source(), today()).await;
        assert!(!record.is_failed());
        assert!(record.experience.is_empty());
        assert_eq!(record.education.len(), 1);
    }

    #[tokio::test]
    async fn test_sparse_page_goes_through_ocr_and_failure_is_recorded() {
        let ocr = Arc::new(CountingOcr::default());
        let pipeline = pipeline_with(vec![IDENTITY_PAGE, "   "], ocr.clone(), Vec::new());
        let record = pipeline.process(pdf(b"%PDF-1.4"), &source(), today()).await;
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);
        assert!(record.metadata.ocr_used);
        assert!(!record.is_failed());
    }

    #[tokio::test]
    async fn test_panicking_acquisition_becomes_failed_record() {
        let pipeline = pipeline_with(vec![IDENTITY_PAGE], Arc::new(CountingOcr::default()), Vec::new());
        let record = pipeline.process(pdf(b"PANIC"), &source(), today()).await;
        assert!(record.is_failed());
        assert_eq!(record.metadata.source_file_id, "cv/jean_dupont.pdf");
        assert!(record.experience.is_empty());
        assert!(record.raw_text.is_empty());
    }

    #[tokio::test]
    async fn test_panic_after_acquisition_keeps_raw_text() {
        let crashing: Arc<dyn crate::extraction::FieldExtractor> = Arc::new(PanickingExtractor);
        let pipeline = pipeline_with(
            vec![IDENTITY_PAGE, EXPERIENCE_PAGE],
            Arc::new(CountingOcr::default()),
            vec![crashing],
        );
        let record = pipeline.process(pdf(b"%PDF-1.4"), &source(), today()).await;

        assert!(record.is_failed());
        assert!(record.metadata.error.as_deref().unwrap_or("").contains("model adapter crashed"));
        assert!(record.raw_text.contains("Devops Engineer – TechCorp, Lyon"));
        assert!(record.raw_text.starts_with("Jean DUPONT"));
        assert_eq!(record.metadata.page_count, 2);
        assert!(!record.metadata.ocr_used);
    }

    #[tokio::test]
    async fn test_detail_lines_do_not_cut_later_jobs() {
        let pipeline = pipeline_with(
            vec![IDENTITY_PAGE, TWO_JOBS_PAGE],
            Arc::new(CountingOcr::default()),
            Vec::new(),
        );
        let record = pipeline.process(pdf(b"%PDF-1.4"), &source(), today()).await;

        assert!(!record.is_failed());
        assert!(record.education.is_empty());
        assert_eq!(record.experience.len(), 2);
        assert_eq!(record.experience[0].company, "TechCorp");
        assert!(record.experience[0]
            .tasks
            .iter()
            .any(|t| t == "Formation des utilisateurs"));
        assert_eq!(record.experience[1].job_title, "Développeur");
        assert_eq!(record.experience[1].company, "Acme");
    }
}

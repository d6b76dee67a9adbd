//! Model-assisted extraction of one experience block.
//!
//! The response must parse as exactly the nine-key entry shape; anything
//! else (extra keys, missing keys, wrong types) is a failure and yields an
//! empty candidate so the rule-based path takes over.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::prompts::{EXPERIENCE_PROMPT_TEMPLATE, EXPERIENCE_SYSTEM};
use super::FieldExtractor;
use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, JSON_ONLY_SYSTEM};
use crate::llm_client::{strip_json_fences, CompletionModel};
use crate::models::{CandidateEntry, RawExperienceBlock};

const MAX_TASKS: usize = 8;
const MAX_SKILLS: usize = 15;

/// Wire shape the model must return. `duration` and `full_text` are
/// required keys but their values are discarded.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModelEntry {
    job_title: String,
    company: String,
    location: String,
    dates: String,
    #[allow(dead_code)]
    duration: String,
    summary: String,
    tasks: Vec<String>,
    skills: Vec<String>,
    #[allow(dead_code)]
    full_text: String,
}

pub struct AiExtractor {
    model: Arc<dyn CompletionModel>,
}

impl AiExtractor {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    fn build_prompt(block_text: &str) -> String {
        EXPERIENCE_PROMPT_TEMPLATE
            .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
            .replace("{block_text}", block_text.trim())
    }
}

/// Strict parse of a model response into a candidate for `block_text`.
pub fn parse_response(raw: &str, block_text: &str) -> Result<CandidateEntry, serde_json::Error> {
    let entry: ModelEntry = serde_json::from_str(strip_json_fences(raw))?;
    Ok(CandidateEntry {
        job_title: entry.job_title.trim().to_string(),
        company: entry.company.trim().to_string(),
        location: entry.location.trim().to_string(),
        dates: entry.dates.trim().to_string(),
        summary: entry.summary.trim().to_string(),
        tasks: sanitize_list(entry.tasks, MAX_TASKS),
        skills: sanitize_list(entry.skills, MAX_SKILLS),
        full_text: block_text.to_string(),
    })
}

/// Trims items, drops blanks and exact duplicates, keeps at most `max`.
pub fn sanitize_list(items: Vec<String>, max: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len().min(max));
    for item in items {
        let item = item.trim();
        if item.is_empty() || out.iter().any(|existing| existing == item) {
            continue;
        }
        out.push(item.to_string());
        if out.len() == max {
            break;
        }
    }
    out
}

#[async_trait]
impl FieldExtractor for AiExtractor {
    fn name(&self) -> &'static str {
        "ai"
    }

    async fn extract(&self, block: &RawExperienceBlock) -> CandidateEntry {
        let text = block.text();
        if block.is_blank() {
            return CandidateEntry::empty(text);
        }

        let prompt = Self::build_prompt(&text);
        let system = format!("{EXPERIENCE_SYSTEM} {JSON_ONLY_SYSTEM}");

        let raw = match self.model.complete(&prompt, &system).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(model = self.model.model_name(), error = %e, "Model call failed for experience block");
                return CandidateEntry::empty(text);
            }
        };

        match parse_response(&raw, &text) {
            Ok(candidate) => {
                debug!(
                    title = %candidate.job_title,
                    tasks = candidate.tasks.len(),
                    skills = candidate.skills.len(),
                    "Model candidate parsed"
                );
                candidate
            }
            Err(e) => {
                warn!(error = %e, "Model response violated the entry contract");
                CandidateEntry::empty(text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedModel {
        reply: Result<String, ()>,
        calls: AtomicUsize,
    }

    impl ScriptedModel {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CompletionModel for ScriptedModel {
        async fn complete(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(LlmError::RetriesExhausted {
                    attempts: 3,
                    last: "timeout".into(),
                }),
            }
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn block() -> RawExperienceBlock {
        RawExperienceBlock {
            lines: vec![
                "Devops Engineer – TechCorp, Lyon".into(),
                "Jan 2020 - Present".into(),
                "- Managed K8s cluster".into(),
            ],
            date_range: Some("Jan 2020 - Present".into()),
            locality: Some("Lyon".into()),
        }
    }

    const VALID: &str = r#"{
        "job_title": " Devops Engineer ",
        "company": "TechCorp",
        "location": "Lyon",
        "dates": "Jan 2020 - Present",
        "duration": "10 ans",
        "summary": "",
        "tasks": ["Managed K8s cluster", "Managed K8s cluster", " "],
        "skills": ["Kubernetes"],
        "full_text": "invented"
    }"#;

    #[tokio::test]
    async fn test_valid_response_becomes_candidate() {
        let model = ScriptedModel::replying(VALID);
        let candidate = AiExtractor::new(model.clone()).extract(&block()).await;
        assert_eq!(candidate.job_title, "Devops Engineer");
        assert_eq!(candidate.company, "TechCorp");
        assert_eq!(candidate.tasks, vec!["Managed K8s cluster"]);
        assert_eq!(candidate.skills, vec!["Kubernetes"]);
        assert_eq!(candidate.full_text, block().text());
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fenced_response_accepted() {
        let model = ScriptedModel::replying(&format!("```json\n{VALID}\n```"));
        let candidate = AiExtractor::new(model).extract(&block()).await;
        assert_eq!(candidate.company, "TechCorp");
    }

    #[tokio::test]
    async fn test_extra_key_is_a_failure() {
        let reply = VALID.replacen("\"summary\": \"\",", "\"summary\": \"\", \"seniority\": \"senior\",", 1);
        let candidate = AiExtractor::new(ScriptedModel::replying(&reply))
            .extract(&block())
            .await;
        assert_eq!(candidate, CandidateEntry::empty(block().text()));
    }

    #[tokio::test]
    async fn test_missing_key_is_a_failure() {
        let reply = r#"{"job_title": "Devops Engineer", "company": "TechCorp"}"#;
        let candidate = AiExtractor::new(ScriptedModel::replying(reply))
            .extract(&block())
            .await;
        assert_eq!(candidate, CandidateEntry::empty(block().text()));
    }

    #[tokio::test]
    async fn test_prose_response_is_a_failure() {
        let candidate = AiExtractor::new(ScriptedModel::replying("Voici le JSON demandé :"))
            .extract(&block())
            .await;
        assert!(candidate.job_title.is_empty());
        assert_eq!(candidate.full_text, block().text());
    }

    #[tokio::test]
    async fn test_model_failure_yields_empty_candidate() {
        let candidate = AiExtractor::new(ScriptedModel::failing())
            .extract(&block())
            .await;
        assert_eq!(candidate, CandidateEntry::empty(block().text()));
    }

    #[tokio::test]
    async fn test_blank_block_skips_model() {
        let model = ScriptedModel::replying(VALID);
        let blank = RawExperienceBlock {
            lines: vec!["  ".into(), String::new()],
            date_range: None,
            locality: None,
        };
        let candidate = AiExtractor::new(model.clone()).extract(&blank).await;
        assert!(candidate.job_title.is_empty());
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_sanitize_list_caps_and_dedups() {
        let items: Vec<String> = (0..12).map(|i| format!("t{}", i % 10)).collect();
        let cleaned = sanitize_list(items, MAX_TASKS);
        assert_eq!(cleaned.len(), 8);
        assert_eq!(cleaned[0], "t0");
        assert_eq!(cleaned[7], "t7");
    }

    #[test]
    fn test_prompt_carries_block_and_grounding() {
        let prompt = AiExtractor::build_prompt("  Devops Engineer – TechCorp  ");
        assert!(prompt.contains("Devops Engineer – TechCorp"));
        assert!(prompt.contains(GROUNDING_INSTRUCTION));
        assert!(!prompt.contains("{block_text}"));
    }
}

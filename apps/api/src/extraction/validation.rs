use crate::models::CandidateEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected { missing: Vec<&'static str> },
}

/// Required-field check between a candidate and the final record. Pure:
/// looks only at the candidate.
pub fn validate(candidate: &CandidateEntry) -> Verdict {
    let mut missing = Vec::new();
    if candidate.job_title.trim().is_empty() {
        missing.push("job_title");
    }
    if candidate.company.trim().is_empty() {
        missing.push("company");
    }
    if candidate.dates.trim().is_empty() {
        missing.push("dates");
    }
    if !candidate.tasks.iter().any(|t| !t.trim().is_empty()) {
        missing.push("tasks");
    }
    if !candidate.skills.iter().any(|s| !s.trim().is_empty()) {
        missing.push("skills");
    }

    if missing.is_empty() {
        Verdict::Accepted
    } else {
        Verdict::Rejected { missing }
    }
}

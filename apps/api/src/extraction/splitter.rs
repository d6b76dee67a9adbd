//! Splits the experience section into one raw block per job.
//!
//! Every line carrying a date range opens a block. A job's title line usually
//! sits just above its dates, so up to two short header-looking lines above
//! a date line move into the new block with it.

use std::sync::Arc;

use tracing::debug;

use super::dates::find_date_range;
use super::locality::LocalityHints;
use crate::models::RawExperienceBlock;

/// Title/company separators, highest priority first.
pub const TITLE_SEPARATORS: &[&str] = &[" – ", " — ", " - ", " | ", " @ ", " chez ", " at ", ", "];

const BULLETS: &[char] = &[
    '-', '•', '*', '–', '—', '▪', '◦', '●', '○', '►', '➢', '➤', '✓', '·', '»', '>',
];

/// Header candidates longer than this are prose.
const MAX_HEADER_CHARS: usize = 80;
const MAX_LOOKBACK: usize = 2;

pub fn is_bullet(line: &str) -> bool {
    line.trim_start().starts_with(BULLETS)
}

pub fn strip_bullet(line: &str) -> &str {
    line.trim_start_matches(|c: char| c.is_whitespace() || BULLETS.contains(&c))
        .trim_end()
}

pub fn has_title_separator(line: &str) -> bool {
    TITLE_SEPARATORS.iter().any(|sep| line.contains(sep))
}

/// `line` with its date range (if any) and edge punctuation removed.
pub fn without_date(line: &str, date_range: Option<&str>) -> String {
    let stripped = match date_range {
        Some(range) if !range.is_empty() => line.replacen(range, " ", 1),
        _ => line.to_string(),
    };
    stripped
        .trim_matches(|c: char| {
            c.is_whitespace() || matches!(c, '|' | '-' | '–' | '—' | ',' | '(' | ')' | ':' | '/')
        })
        .to_string()
}

/// The first non-bullet line of a block that still has text once its date
/// range is removed: the job's title/company line. Returns its index and
/// the cleaned text.
pub fn header_of(lines: &[String], date_range: Option<&str>) -> Option<(usize, String)> {
    lines.iter().enumerate().find_map(|(index, line)| {
        if line.trim().is_empty() || is_bullet(line) {
            return None;
        }
        let cleaned = without_date(line, date_range);
        (!cleaned.is_empty()).then_some((index, cleaned))
    })
}

fn can_lead_block(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && !is_bullet(trimmed)
        && trimmed.chars().count() <= MAX_HEADER_CHARS
        && !trimmed.ends_with('.')
        && find_date_range(trimmed).is_none()
}

pub struct ExperienceBlockSplitter {
    hints: Arc<dyn LocalityHints>,
}

impl ExperienceBlockSplitter {
    pub fn new(hints: Arc<dyn LocalityHints>) -> Self {
        Self { hints }
    }

    pub fn split(&self, text: &str) -> Vec<RawExperienceBlock> {
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        if lines.iter().all(|l| l.trim().is_empty()) {
            return Vec::new();
        }

        let date_lines: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| find_date_range(line).is_some())
            .map(|(index, _)| index)
            .collect();

        let mut starts = Vec::with_capacity(date_lines.len().max(1));
        let mut floor = 0usize;
        for (n, &date_index) in date_lines.iter().enumerate() {
            let start = if n == 0 {
                0
            } else {
                self.lookback(&lines, date_index, floor)
            };
            starts.push(start);
            floor = date_index + 1;
        }
        if starts.is_empty() {
            starts.push(0);
        }

        let blocks: Vec<RawExperienceBlock> = starts
            .iter()
            .enumerate()
            .map(|(n, &start)| {
                let end = starts.get(n + 1).copied().unwrap_or(lines.len());
                self.build_block(trim_blank_edges(&lines[start..end]))
            })
            .filter(|block| !block.is_blank())
            .collect();

        debug!(
            date_lines = date_lines.len(),
            blocks = blocks.len(),
            "Experience section split"
        );
        blocks
    }

    /// Index where the block opened by `date_index` starts. Never reaches
    /// back to or above `floor` (the line after the previous date line).
    fn lookback(&self, lines: &[String], date_index: usize, floor: usize) -> usize {
        let date_line = &lines[date_index];
        if !without_date(date_line, find_date_range(date_line)).is_empty() {
            // Header and dates share a line.
            return date_index;
        }

        let mut start = date_index;
        for _ in 0..MAX_LOOKBACK {
            if start == 0 || start - 1 < floor {
                break;
            }
            let candidate = &lines[start - 1];
            if !can_lead_block(candidate) {
                break;
            }
            start -= 1;
            if has_title_separator(candidate) {
                break;
            }
        }
        start
    }

    fn build_block(&self, lines: &[String]) -> RawExperienceBlock {
        let date_range = lines
            .iter()
            .find_map(|line| find_date_range(line))
            .map(str::to_string);
        let locality = header_of(lines, date_range.as_deref())
            .and_then(|(_, header)| self.hints.locate(&header));
        RawExperienceBlock {
            lines: lines.to_vec(),
            date_range,
            locality,
        }
    }
}

fn trim_blank_edges(lines: &[String]) -> &[String] {
    let first = lines.iter().position(|l| !l.trim().is_empty());
    let last = lines.iter().rposition(|l| !l.trim().is_empty());
    match (first, last) {
        (Some(first), Some(last)) => &lines[first..=last],
        _ => &[],
    }
}

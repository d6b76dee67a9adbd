use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Identity,
    Experience,
    Education,
    Skills,
    Other,
}

/// A contiguous run of lines. `lines` includes the header line, if any, as
/// its first element so that consecutive sections cover the whole text.
#[derive(Debug, Clone)]
pub struct Section {
    pub kind: SectionKind,
    pub header: Option<String>,
    pub start_line: usize,
    pub lines: Vec<String>,
}

impl Section {
    /// Section content without its header line.
    pub fn body(&self) -> &[String] {
        if self.header.is_some() && !self.lines.is_empty() {
            &self.lines[1..]
        } else {
            &self.lines
        }
    }

    pub fn end_line(&self) -> usize {
        self.start_line + self.lines.len()
    }
}

/// Ordered, non-overlapping sections covering the normalized text.
#[derive(Debug, Clone, Default)]
pub struct SectionMap {
    sections: Vec<Section>,
}

impl SectionMap {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Body text of every section of `kind`, in document order.
    pub fn text(&self, kind: SectionKind) -> String {
        self.sections
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.body().join("\n").trim().to_string())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn has(&self, kind: SectionKind) -> bool {
        self.sections.iter().any(|s| s.kind == kind)
    }
}

use tracing::debug;

use super::fold_accents;
use super::splitter::is_bullet;
use crate::models::{Section, SectionKind, SectionMap};

/// Lines longer than this are prose, never headers.
const MAX_HEADER_LEN: usize = 60;

/// Header keywords, accent-folded and lowercase. The longest keyword that
/// matches a line decides its section.
const HEADER_KEYWORDS: &[(&str, SectionKind)] = &[
    ("experience", SectionKind::Experience),
    ("experiences", SectionKind::Experience),
    ("experience professionnelle", SectionKind::Experience),
    ("experiences professionnelles", SectionKind::Experience),
    ("professional experience", SectionKind::Experience),
    ("work experience", SectionKind::Experience),
    ("work history", SectionKind::Experience),
    ("employment history", SectionKind::Experience),
    ("parcours", SectionKind::Experience),
    ("parcours professionnel", SectionKind::Experience),
    ("emploi", SectionKind::Experience),
    ("emplois", SectionKind::Experience),
    ("career", SectionKind::Experience),
    ("education", SectionKind::Education),
    ("formation", SectionKind::Education),
    ("formations", SectionKind::Education),
    ("formation academique", SectionKind::Education),
    ("etudes", SectionKind::Education),
    ("cursus", SectionKind::Education),
    ("diplome", SectionKind::Education),
    ("diplomes", SectionKind::Education),
    ("academic background", SectionKind::Education),
    ("skills", SectionKind::Skills),
    ("technical skills", SectionKind::Skills),
    ("soft skills", SectionKind::Skills),
    ("competences", SectionKind::Skills),
    ("competences techniques", SectionKind::Skills),
    ("aptitudes", SectionKind::Skills),
    ("technologies", SectionKind::Skills),
    ("outils", SectionKind::Skills),
    ("languages", SectionKind::Other),
    ("langues", SectionKind::Other),
    ("summary", SectionKind::Other),
    ("profil", SectionKind::Other),
    ("profile", SectionKind::Other),
    ("objectif", SectionKind::Other),
    ("projects", SectionKind::Other),
    ("projets", SectionKind::Other),
    ("realisations", SectionKind::Other),
    ("certifications", SectionKind::Other),
    ("centres d'interet", SectionKind::Other),
    ("interests", SectionKind::Other),
    ("loisirs", SectionKind::Other),
    ("hobbies", SectionKind::Other),
    ("references", SectionKind::Other),
];

const DECORATION: &[char] = &[':', '#', '*', '•', '-', '_', '=', '|', '.'];

/// Joins in combined headers such as "Formation et certifications".
const HEADER_JOINERS: &[&str] = &[" et ", " & ", " and ", " / "];

/// Returns the section a line opens, if it reads as a header. The keyword
/// must be the whole line, or lead a combined header; bullet lines never
/// open a section.
pub fn match_header(line: &str) -> Option<SectionKind> {
    if is_bullet(line) {
        return None;
    }
    let cleaned = line.trim().trim_matches(|c: char| c.is_whitespace() || DECORATION.contains(&c));
    if cleaned.is_empty()
        || cleaned.chars().count() > MAX_HEADER_LEN
        || cleaned.chars().any(|c| c.is_ascii_digit())
    {
        return None;
    }
    let folded = fold_accents(cleaned);

    HEADER_KEYWORDS
        .iter()
        .filter(|(keyword, _)| keyword_matches(&folded, keyword))
        .max_by_key(|(keyword, _)| keyword.len())
        .map(|(_, kind)| *kind)
}

fn keyword_matches(folded: &str, keyword: &str) -> bool {
    match folded.strip_prefix(keyword) {
        Some("") => true,
        Some(rest) => HEADER_JOINERS.iter().any(|joiner| rest.starts_with(joiner)),
        None => false,
    }
}

/// Splits normalized text into consecutive sections. Every line lands in
/// exactly one section; header lines open theirs.
pub fn segment(text: &str) -> SectionMap {
    let mut sections: Vec<Section> = Vec::new();
    let mut current = Section {
        kind: SectionKind::Identity,
        header: None,
        start_line: 0,
        lines: Vec::new(),
    };
    let mut saw_header = false;

    for (index, line) in text.lines().enumerate() {
        if let Some(kind) = match_header(line) {
            saw_header = true;
            let next = Section {
                kind,
                header: Some(line.trim().to_string()),
                start_line: index,
                lines: vec![line.to_string()],
            };
            let finished = std::mem::replace(&mut current, next);
            if !finished.lines.is_empty() {
                sections.push(finished);
            }
        } else {
            current.lines.push(line.to_string());
        }
    }
    if !current.lines.is_empty() {
        sections.push(current);
    }

    if !saw_header {
        // No recognizable structure: everything is "other".
        for section in &mut sections {
            section.kind = SectionKind::Other;
        }
    }

    debug!(
        sections = sections.len(),
        kinds = ?sections.iter().map(|s| s.kind).collect::<Vec<_>>(),
        "Text segmented"
    );
    SectionMap::new(sections)
}

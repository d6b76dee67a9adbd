//! Education entries: date-anchored blocks, fields by keyword only.

use crate::extraction::fold_accents;
use crate::extraction::splitter::{is_bullet, without_date, TITLE_SEPARATORS};
use crate::models::{EducationEntry, RawExperienceBlock};

/// Accent-folded words that mark the school side of a header.
const INSTITUTION_MARKERS: &[&str] = &[
    "universite", "university", "univ", "ecole", "school", "institut", "institute", "iut",
    "lycee", "college", "faculte", "faculty", "academie", "academy", "conservatoire", "cnam",
    "insa", "polytechnique", "centrale", "hec", "essec", "escp", "edhec", "epitech", "epita",
    "sorbonne", "campus", "cegep",
];

const MAX_HEADER_LINES: usize = 2;

/// One entry per block, in block order. Degree falls back to the first
/// header text; institution stays empty when nothing marks one.
pub fn extract_education(blocks: &[RawExperienceBlock]) -> Vec<EducationEntry> {
    blocks.iter().filter(|b| !b.is_blank()).map(education_entry).collect()
}

fn education_entry(block: &RawExperienceBlock) -> EducationEntry {
    let dates = block.date_range.clone().unwrap_or_default();
    let date_ref = (!dates.is_empty()).then_some(dates.as_str());

    let parts: Vec<String> = block
        .lines
        .iter()
        .filter(|l| !l.trim().is_empty() && !is_bullet(l))
        .map(|l| without_date(l, date_ref))
        .filter(|l| !l.is_empty())
        .take(MAX_HEADER_LINES)
        .flat_map(|line| split_parts(&line))
        .collect();

    let institution_at = parts.iter().position(|p| is_institution(p));
    let degree = parts
        .iter()
        .enumerate()
        .find(|(i, _)| Some(*i) != institution_at)
        .map(|(_, p)| p.clone())
        .unwrap_or_default();
    let institution = match institution_at {
        Some(i) => parts[i].clone(),
        None => parts.get(1).cloned().unwrap_or_default(),
    };

    EducationEntry {
        degree,
        institution,
        dates,
        full_text: block.text(),
    }
}

fn split_parts(line: &str) -> Vec<String> {
    match TITLE_SEPARATORS.iter().find_map(|sep| line.split_once(sep)) {
        Some((left, right)) => [left, right]
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect(),
        None => vec![line.trim().to_string()],
    }
}

fn is_institution(part: &str) -> bool {
    fold_accents(part)
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| INSTITUTION_MARKERS.contains(&word))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::extraction::{CityDictionary, ExperienceBlockSplitter};

    fn blocks(text: &str) -> Vec<RawExperienceBlock> {
        ExperienceBlockSplitter::new(Arc::new(CityDictionary::default())).split(text)
    }

    #[test]
    fn test_degree_and_institution_on_one_line() {
        let entries = extract_education(&blocks("Master Informatique – Université de Lyon\n2015 - 2017"));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].degree, "Master Informatique");
        assert_eq!(entries[0].institution, "Université de Lyon");
        assert_eq!(entries[0].dates, "2015 - 2017");
    }

    #[test]
    fn test_institution_first_and_on_its_own_line() {
        let text = "Université Paris 8 – Licence Info\n2012 - 2015\n2010 - 2012\nBTS SIO\nLycée Jean Moulin";
        let entries = extract_education(&blocks(text));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].degree, "Licence Info");
        assert_eq!(entries[0].institution, "Université Paris 8");
        assert_eq!(entries[1].degree, "BTS SIO");
        assert_eq!(entries[1].institution, "Lycée Jean Moulin");
        assert_eq!(entries[1].dates, "2010 - 2012");
    }

    #[test]
    fn test_undated_education_is_one_entry() {
        let entries = extract_education(&blocks("Baccalauréat scientifique"));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].degree, "Baccalauréat scientifique");
        assert_eq!(entries[0].institution, "");
        assert_eq!(entries[0].dates, "");
    }

    #[test]
    fn test_no_blocks_no_entries() {
        assert!(extract_education(&blocks("")).is_empty());
    }
}

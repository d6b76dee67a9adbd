//! Person-name recognition for the identity block.
//!
//! Loaded once at startup, before the worker pool starts, and shared
//! read-only by every document worker.

use std::collections::HashSet;

use tracing::info;

use crate::extraction::fold_accents;

pub trait NameRecognizer: Send + Sync {
    /// The first person name found in `text`, as written.
    fn find_person_name(&self, text: &str) -> Option<String>;
}

const FIRST_NAMES: &[&str] = &[
    "adam", "adrien", "agathe", "alain", "alexandre", "alexandra", "alexis", "alice", "amandine",
    "amelie", "anais", "andre", "anne", "antoine", "arnaud", "arthur", "aurelie", "baptiste",
    "benjamin", "benoit", "bernard", "camille", "caroline", "catherine", "celine", "charles",
    "charlotte", "chloe", "christine", "christophe", "claire", "clement", "damien", "daniel",
    "david", "denis", "didier", "dominique", "elise", "elodie", "emilie", "emma", "emmanuel",
    "eric", "etienne", "fabien", "fanny", "fatima", "florian", "francois", "frederic", "gabriel",
    "guillaume", "hugo", "ines", "isabelle", "jacques", "jean", "jeanne", "jerome", "johan",
    "jonathan", "joseph", "julie", "julien", "justine", "karim", "kevin", "laura", "laurent",
    "lea", "leo", "louis", "louise", "lucas", "lucie", "manon", "marc", "marie", "marine",
    "mathieu", "matthieu", "maxime", "mehdi", "michel", "mohamed", "nadia", "nathalie",
    "nicolas", "noemie", "olivier", "pascal", "patrick", "paul", "pauline", "philippe",
    "pierre", "quentin", "raphael", "remi", "romain", "sarah", "sebastien", "simon", "sophie",
    "stephane", "sylvie", "theo", "thomas", "valentin", "valerie", "vincent", "virginie",
    "xavier", "yann", "yannick", "yasmine", "youssef", "zoe",
    "amanda", "andrew", "brian", "chris", "emily", "james", "jennifer", "jessica", "john",
    "kate", "mary", "michael", "robert", "sam", "steven", "william",
];

/// Lines that look like contact data or headings never hold the name.
const NOISE_MARKERS: &[&str] = &["@", "http", "www.", "curriculum", "cv ", "tel", "tél"];

const MAX_SCANNED_LINES: usize = 15;

/// First-name lexicon plus capitalization shape: a known first name next to
/// one or two capitalized words.
pub struct GazetteerNameModel {
    first_names: HashSet<String>,
}

impl GazetteerNameModel {
    pub fn load() -> Self {
        let model = Self::with_names(FIRST_NAMES.iter().copied());
        info!(first_names = model.first_names.len(), "Name model loaded");
        model
    }

    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            first_names: names
                .into_iter()
                .map(|n| fold_accents(n.as_ref()))
                .collect(),
        }
    }

    fn is_first_name(&self, token: &str) -> bool {
        is_capitalized(token)
            && token
                .split('-')
                .next()
                .is_some_and(|part| self.first_names.contains(&fold_accents(part)))
    }

    fn name_in_line(&self, line: &str) -> Option<String> {
        let lowered = line.to_lowercase();
        if NOISE_MARKERS.iter().any(|m| lowered.contains(m))
            || line.chars().any(|c| c.is_ascii_digit())
        {
            return None;
        }
        let tokens: Vec<&str> = line
            .split(|c: char| c.is_whitespace() || c == ',' || c == '|')
            .filter(|t| !t.is_empty())
            .collect();

        for (i, token) in tokens.iter().enumerate() {
            if !self.is_first_name(token) {
                continue;
            }
            // "Jean DUPONT", "Jean-Marc de la Tour" style: first name then surname words
            let after: Vec<&str> = tokens[i + 1..]
                .iter()
                .take(2)
                .take_while(|t| is_capitalized(t))
                .copied()
                .collect();
            if !after.is_empty() {
                let mut parts = vec![*token];
                parts.extend(after);
                return Some(parts.join(" "));
            }
            // "DUPONT Jean" style: uppercase surname first
            if i > 0 && is_upper_word(tokens[i - 1]) {
                return Some(format!("{} {}", tokens[i - 1], token));
            }
        }
        None
    }
}

impl NameRecognizer for GazetteerNameModel {
    fn find_person_name(&self, text: &str) -> Option<String> {
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(MAX_SCANNED_LINES)
            .find_map(|line| self.name_in_line(line))
    }
}

fn is_capitalized(token: &str) -> bool {
    let mut chars = token.chars();
    chars.next().is_some_and(char::is_uppercase)
        && chars.all(|c| c.is_alphabetic() || c == '-' || c == '\'')
}

fn is_upper_word(token: &str) -> bool {
    token.chars().count() >= 2 && token.chars().all(|c| c.is_uppercase() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_name_then_surname() {
        let model = GazetteerNameModel::load();
        assert_eq!(
            model.find_person_name("Curriculum Vitae\nJulien Martin\nDéveloppeur Rust"),
            Some("Julien Martin".to_string())
        );
    }

    #[test]
    fn test_uppercase_surname_first() {
        let model = GazetteerNameModel::load();
        assert_eq!(
            model.find_person_name("DUPONT Élodie"),
            Some("DUPONT Élodie".to_string())
        );
    }

    #[test]
    fn test_contact_lines_ignored() {
        let model = GazetteerNameModel::load();
        assert_eq!(model.find_person_name("marie.curie@mail.fr\nTél 06 12 34 56 78"), None);
    }

    #[test]
    fn test_unknown_first_name_not_recognized() {
        let model = GazetteerNameModel::with_names(["Zébulon"]);
        assert_eq!(model.find_person_name("Julien Martin"), None);
        assert_eq!(
            model.find_person_name("Zebulon Martin"),
            Some("Zebulon Martin".to_string())
        );
    }
}

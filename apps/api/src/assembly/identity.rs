//! Contact fields of the identity block: email, phone, links and name.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::extraction::dates::find_date_range;
use crate::extraction::segmenter::match_header;
use crate::models::Identity;
use crate::ner::NameRecognizer;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}\b").unwrap());

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[+(]?[0-9][0-9 .\-()]{8,}[0-9]").unwrap());

static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:https?://[^\s,;<>]+|www\.[^\s,;<>]+|(?:[a-z]{2,3}\.)?linkedin\.com/[^\s,;<>]+|github\.com/[^\s,;<>]+)",
    )
    .unwrap()
});

static NAME_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?:nom(?:\s+complet)?|full\s+name|name)\s*[:\-]\s*(?P<name>[^\n:@]{2,60}?)\s*$")
        .unwrap()
});

/// "Jean DUPONT", "Jean-Marc DE LA TOUR".
static FIRST_THEN_LAST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>\p{Lu}[\p{Ll}'’]+(?:-\p{Lu}[\p{Ll}'’]+)?(?:\s+\p{Lu}{2,}(?:[-'’]\p{Lu}{2,})*){1,3})$")
        .unwrap()
});

/// "DUPONT Jean".
static LAST_THEN_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>\p{Lu}{2,}(?:[-'’\s]\p{Lu}{2,}){0,2}\s+\p{Lu}[\p{Ll}'’]+(?:-\p{Lu}[\p{Ll}'’]+)?)$")
        .unwrap()
});

const MIN_PHONE_DIGITS: usize = 10;
const MAX_PHONE_DIGITS: usize = 15;
const MAX_NAME_LINES: usize = 10;
const NOT_A_NAME: &[&str] = &["CURRICULUM", "VITAE", "RESUME", "CV"];

pub struct IdentityExtractor {
    names: Arc<dyn NameRecognizer>,
}

impl IdentityExtractor {
    pub fn new(names: Arc<dyn NameRecognizer>) -> Self {
        Self { names }
    }

    /// Scans `identity_text`, or `full_text` when the identity section is
    /// empty. Contact fields missing from the identity section are looked
    /// up in the full text.
    pub fn extract(&self, identity_text: &str, full_text: &str) -> Identity {
        let scope = if identity_text.trim().is_empty() {
            full_text
        } else {
            identity_text
        };

        let email = find_email(scope)
            .or_else(|| find_email(full_text))
            .unwrap_or_default();
        let phone = find_phone(scope)
            .or_else(|| find_phone(full_text))
            .unwrap_or_default();
        let mut links = find_links(scope);
        if links.is_empty() {
            links = find_links(full_text);
        }
        let name = find_name(scope)
            .or_else(|| self.names.find_person_name(scope))
            .unwrap_or_default();

        Identity {
            name,
            email,
            phone,
            links,
        }
    }
}

pub fn find_email(text: &str) -> Option<String> {
    EMAIL.find(text).map(|m| m.as_str().to_string())
}

/// First run of digits and phone punctuation holding 10 to 15 digits that is
/// not a date range.
pub fn find_phone(text: &str) -> Option<String> {
    PHONE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .find(|candidate| {
            let digits = candidate.chars().filter(char::is_ascii_digit).count();
            (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits)
                && find_date_range(candidate).is_none()
        })
        .map(str::to_string)
}

/// Profile and web links in order of appearance, without duplicates.
pub fn find_links(text: &str) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();
    for m in LINK.find_iter(text) {
        let link = m.as_str().trim_end_matches(['.', ')', ']']);
        if !links.iter().any(|l| l.eq_ignore_ascii_case(link)) {
            links.push(link.to_string());
        }
    }
    links
}

/// Name by label ("Nom : Jean Dupont") or by the capitalization shape of a
/// standalone line near the top.
pub fn find_name(text: &str) -> Option<String> {
    if let Some(caps) = NAME_LABEL.captures(text) {
        return Some(caps["name"].trim().to_string());
    }
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(MAX_NAME_LINES)
        .filter(|l| match_header(l).is_none())
        .find_map(|line| {
            FIRST_THEN_LAST
                .captures(line)
                .or_else(|| LAST_THEN_FIRST.captures(line))
                .map(|caps| caps["name"].to_string())
                .filter(|name| {
                    !name
                        .split_whitespace()
                        .any(|word| NOT_A_NAME.contains(&word.to_uppercase().as_str()))
                })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ner::GazetteerNameModel;

    fn extractor() -> IdentityExtractor {
        IdentityExtractor::new(Arc::new(GazetteerNameModel::load()))
    }

    #[test]
    fn test_contact_fields() {
        let text = "Jean DUPONT\nDéveloppeur Rust\njean.dupont@mail.fr | +33 6 12 34 56 78\n\
                    linkedin.com/in/jdupont · https://github.com/jdupont.";
        let identity = extractor().extract(text, text);
        assert_eq!(identity.name, "Jean DUPONT");
        assert_eq!(identity.email, "jean.dupont@mail.fr");
        assert_eq!(identity.phone, "+33 6 12 34 56 78");
        assert_eq!(
            identity.links,
            vec!["linkedin.com/in/jdupont", "https://github.com/jdupont"]
        );
    }

    #[test]
    fn test_phone_rejects_short_runs_and_date_ranges() {
        assert_eq!(find_phone("Tél : 12 34 56"), None);
        assert_eq!(find_phone("2015 - 2017 - 2019"), None);
        assert_eq!(find_phone("06.12.34.56.78"), Some("06.12.34.56.78".to_string()));
    }

    #[test]
    fn test_labelled_name_wins() {
        assert_eq!(
            find_name("CURRICULUM VITAE\nNom : Marie Curie\n"),
            Some("Marie Curie".to_string())
        );
    }

    #[test]
    fn test_uppercase_surname_first() {
        assert_eq!(find_name("DUPONT Élodie\nParis"), Some("DUPONT Élodie".to_string()));
    }

    #[test]
    fn test_heading_is_not_a_name() {
        assert_eq!(find_name("CURRICULUM Vitae"), None);
    }

    #[test]
    fn test_name_model_used_when_shape_fails() {
        let identity = extractor().extract("Julien Martin\nDéveloppeur", "");
        assert_eq!(identity.name, "Julien Martin");
    }

    #[test]
    fn test_empty_identity_section_uses_full_text() {
        let full = "Expérience\nDev – Acme\ncontact: a.b@c.io";
        let identity = extractor().extract("  ", full);
        assert_eq!(identity.email, "a.b@c.io");
        assert!(identity.links.is_empty());
    }
}

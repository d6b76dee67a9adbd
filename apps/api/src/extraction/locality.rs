//! Best-effort geographic hints. The block splitter asks for a locality on a
//! job's header line; the rule extractor uses the answer to peel a trailing
//! location off the company name. Nothing downstream depends on a hint being
//! found.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::fold_accents;

/// A source of locality hints. Implementations must be cheap and side-effect
/// free; they are called once per experience block.
pub trait LocalityHints: Send + Sync {
    /// The locality mentioned at the end of `line`, as written in the line.
    fn locate(&self, line: &str) -> Option<String>;
}

const CITIES: &[&str] = &[
    // France
    "paris", "lyon", "marseille", "toulouse", "nice", "nantes", "strasbourg", "montpellier",
    "bordeaux", "lille", "rennes", "reims", "grenoble", "dijon", "angers", "nimes", "brest",
    "tours", "amiens", "limoges", "clermont-ferrand", "metz", "besancon", "orleans", "rouen",
    "mulhouse", "caen", "nancy", "sophia antipolis", "la defense", "boulogne-billancourt",
    "issy-les-moulineaux", "levallois-perret", "neuilly-sur-seine", "saint-denis", "nanterre",
    "villeurbanne", "aix-en-provence", "le mans", "annecy", "pau", "la rochelle", "poitiers",
    "perpignan", "toulon", "avignon",
    // Belgium, Switzerland, Luxembourg
    "bruxelles", "brussels", "liege", "namur", "charleroi", "anvers", "antwerp", "gand",
    "geneve", "geneva", "lausanne", "zurich", "berne", "bern", "bale", "basel", "luxembourg",
    // Canada
    "montreal", "quebec", "toronto", "ottawa", "vancouver", "calgary", "gatineau",
    "sherbrooke", "laval",
    // North Africa
    "casablanca", "rabat", "marrakech", "tanger", "tunis", "sfax", "alger", "oran",
    "dakar", "abidjan",
    // Elsewhere
    "london", "londres", "dublin", "berlin", "munich", "amsterdam", "madrid", "barcelona",
    "barcelone", "lisbonne", "lisbon", "milan", "rome", "new york", "san francisco",
    "singapore", "singapour", "remote", "teletravail", "full remote",
];

/// Trailing `City (XX)` or `City, XX` shape, e.g. "Lyon (69)", "Québec, QC".
static REGION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[,–—\-|@]\s*)(?P<place>\p{Lu}[\p{L}'’ \-]{1,40}?)\s*(?:\((?:\d{2,3}|\p{Lu}{2})\)|,\s*\p{Lu}{2})\s*$")
        .unwrap()
});

/// Dictionary of well-known cities plus the region-suffix shape.
pub struct CityDictionary {
    cities: HashSet<String>,
    longest: usize,
}

impl CityDictionary {
    pub fn new<I, S>(cities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cities: HashSet<String> = cities
            .into_iter()
            .map(|c| fold_accents(c.as_ref()))
            .collect();
        let longest = cities
            .iter()
            .map(|c| c.split_whitespace().count())
            .max()
            .unwrap_or(1);
        Self { cities, longest }
    }

    fn known_tail(&self, line: &str) -> Option<String> {
        // Take the last comma/dash-separated segment and try its trailing words.
        let segment = line
            .rsplit([',', '–', '—', '|', '(', '/'])
            .next()
            .unwrap_or(line)
            .trim()
            .trim_end_matches([')', '.', ';']);
        let words: Vec<&str> = segment.split_whitespace().collect();
        for take in (1..=self.longest.min(words.len())).rev() {
            let candidate = words[words.len() - take..].join(" ");
            if self.cities.contains(&fold_accents(&candidate)) {
                return Some(candidate);
            }
        }
        None
    }
}

impl Default for CityDictionary {
    fn default() -> Self {
        Self::new(CITIES.iter().copied())
    }
}

impl LocalityHints for CityDictionary {
    fn locate(&self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if let Some(city) = self.known_tail(line) {
            return Some(city);
        }
        REGION_SUFFIX
            .captures(line)
            .and_then(|caps| caps.name("place"))
            .map(|m| m.as_str().trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_city_after_comma() {
        let hints = CityDictionary::default();
        assert_eq!(
            hints.locate("Devops Engineer – TechCorp, Lyon"),
            Some("Lyon".to_string())
        );
    }

    #[test]
    fn test_multi_word_city_with_accents() {
        let hints = CityDictionary::default();
        assert_eq!(
            hints.locate("Consultant – Capgemini, Aix-en-Provence"),
            Some("Aix-en-Provence".to_string())
        );
        assert_eq!(
            hints.locate("Analyste – Desjardins – Montréal"),
            Some("Montréal".to_string())
        );
    }

    #[test]
    fn test_region_suffix_shape() {
        let hints = CityDictionary::default();
        assert_eq!(
            hints.locate("Technicien – Garage Martin, Vesoul (70)"),
            Some("Vesoul".to_string())
        );
    }

    #[test]
    fn test_no_locality() {
        let hints = CityDictionary::default();
        assert_eq!(hints.locate("Développeur Backend – Acme"), None);
        assert_eq!(hints.locate(""), None);
    }

    #[test]
    fn test_custom_dictionary() {
        let hints = CityDictionary::new(["Vesoul"]);
        assert_eq!(
            hints.locate("Mécanicien, Vesoul"),
            Some("Vesoul".to_string())
        );
    }
}

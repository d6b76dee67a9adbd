//! Date-range grammar shared by the block splitter and the duration label.
//!
//! A date token is `[<month> ]<year>`, `<MM>/<year>` or `<year>`, months in
//! French or English, full or abbreviated. A range is `<token> <sep> <token>`
//! or `<token> <sep> <ongoing>`; `Depuis <token>` / `Since <token>` is a
//! range ending in the ongoing state.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use super::fold_accents;

const MONTH_NAME: &str = r"(?:janv(?:ier)?|jan(?:uary)?|f[ée]vr?(?:ier)?|feb(?:ruary)?|mars|mar(?:ch)?|avr(?:il)?|apr(?:il)?|mai|may|juin|june?|juil(?:let)?|july?|ao[uû]t|aug(?:ust)?|sept?(?:embre|ember)?|oct(?:obre|ober)?|nov(?:embre|ember)?|d[ée]c(?:embre|ember)?)\.?";
const MONTH_NUMBER: &str = r"(?:0?[1-9]|1[0-2])";
const YEAR: &str = r"(?:19|20)\d{2}\b";
const SEPARATOR: &str = r"(?:\s*[-–—]\s*|\s+(?:to|à|au)\s+)";
const ONGOING: &str = r"(?:pr[ée]sent|current(?:ly)?|now|today|aujourd['’]hui|actuel(?:lement)?|en cours|maintenant|(?:à )?ce jour)";

fn date_token() -> String {
    format!(r"(?:(?:{MONTH_NAME}|{MONTH_NUMBER})[\s/.]+)?{YEAR}")
}

static DATE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    let token = date_token();
    Regex::new(&format!(
        r"(?i)\b(?P<start>{token}){SEPARATOR}(?P<end>{token}|{ONGOING})"
    ))
    .unwrap()
});

static SINCE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b(?:depuis|since)\s+(?P<start>{})", date_token())).unwrap()
});

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^(?:(?P<name>{MONTH_NAME})|(?P<number>{MONTH_NUMBER}))?[\s/.]*(?P<year>{YEAR})$"
    ))
    .unwrap()
});

static ONGOING_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)^{ONGOING}$")).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthYear {
    pub year: i32,
    /// `None` for a bare year.
    pub month: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeEnd {
    Date(MonthYear),
    Ongoing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: MonthYear,
    pub end: RangeEnd,
}

/// Returns the date-range substring of `line`, if it has one.
pub fn find_date_range(line: &str) -> Option<&str> {
    DATE_RANGE
        .find(line)
        .or_else(|| SINCE_RANGE.find(line))
        .map(|m| m.as_str().trim())
}

pub fn parse_range(raw: &str) -> Option<DateRange> {
    if let Some(caps) = DATE_RANGE.captures(raw) {
        let start = parse_token(&caps["start"])?;
        let end_raw = caps["end"].trim();
        let end = if is_ongoing(end_raw) {
            RangeEnd::Ongoing
        } else {
            RangeEnd::Date(parse_token(end_raw)?)
        };
        return Some(DateRange { start, end });
    }

    let caps = SINCE_RANGE.captures(raw)?;
    Some(DateRange {
        start: parse_token(&caps["start"])?,
        end: RangeEnd::Ongoing,
    })
}

pub fn parse_token(token: &str) -> Option<MonthYear> {
    let caps = TOKEN.captures(token.trim())?;
    let year = caps["year"].parse::<i32>().ok()?;
    let month = match (caps.name("name"), caps.name("number")) {
        (Some(name), _) => Some(month_from_name(name.as_str())?),
        (None, Some(number)) => Some(number.as_str().parse::<u32>().ok()?),
        (None, None) => None,
    };
    Some(MonthYear { year, month })
}

pub fn is_ongoing(token: &str) -> bool {
    ONGOING_TOKEN.is_match(token.trim())
}

fn month_from_name(name: &str) -> Option<u32> {
    let folded = fold_accents(name.trim_end_matches('.'));
    let month = match folded.as_str() {
        n if n.starts_with("juin") || n == "jun" || n == "june" => 6,
        n if n.starts_with("juil") || n.starts_with("jul") => 7,
        n if n.starts_with("jan") => 1,
        n if n.starts_with("fev") || n.starts_with("feb") => 2,
        n if n.starts_with("mar") => 3,
        n if n.starts_with("avr") || n.starts_with("apr") => 4,
        n if n.starts_with("mai") || n.starts_with("may") => 5,
        n if n.starts_with("aou") || n.starts_with("aug") => 8,
        n if n.starts_with("sep") => 9,
        n if n.starts_with("oct") => 10,
        n if n.starts_with("nov") => 11,
        n if n.starts_with("dec") => 12,
        _ => return None,
    };
    Some(month)
}

/// Whole months covered by `range`. The start is the first day of its month,
/// an explicit end includes its whole month, an ongoing end is `today`.
pub fn months_covered(range: &DateRange, today: NaiveDate) -> Option<i64> {
    let start = NaiveDate::from_ymd_opt(range.start.year, range.start.month.unwrap_or(1), 1)?;
    let end = match range.end {
        RangeEnd::Ongoing => today,
        RangeEnd::Date(end) => {
            let month = end.month.unwrap_or(12);
            if month == 12 {
                NaiveDate::from_ymd_opt(end.year + 1, 1, 1)?
            } else {
                NaiveDate::from_ymd_opt(end.year, month + 1, 1)?
            }
        }
    };
    let months = (end.year() - start.year()) as i64 * 12 + end.month() as i64
        - start.month() as i64;
    Some(months)
}

/// `"3 ans 2 mois"`, `"1 an"`, `"5 mois"`. Zero parts are omitted and a
/// non-positive span renders as an empty label.
pub fn format_duration(months: i64) -> String {
    if months <= 0 {
        return String::new();
    }
    let years = months / 12;
    let rest = months % 12;
    let mut parts = Vec::with_capacity(2);
    match years {
        0 => {}
        1 => parts.push("1 an".to_string()),
        y => parts.push(format!("{y} ans")),
    }
    if rest > 0 {
        parts.push(format!("{rest} mois"));
    }
    parts.join(" ")
}

/// Turns a raw date-range string into a duration label, relative to a fixed
/// processing date. Unparseable input gives an empty label ("unknown").
#[derive(Debug, Clone, Copy)]
pub struct DurationNormalizer {
    today: NaiveDate,
}

impl DurationNormalizer {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn label(&self, raw: &str) -> String {
        parse_range(raw)
            .and_then(|range| months_covered(&range, self.today))
            .map(format_duration)
            .unwrap_or_default()
    }
}

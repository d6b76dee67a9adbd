//! Cleanup applied to acquired text before segmentation. Text layers of
//! designed résumés are full of letter-spaced headings, double-encoded
//! accents and column gaps; none of it should reach the header matcher.

use std::sync::LazyLock;

use regex::Regex;

static SPACED_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([12]) ([0-9]) ([0-9]) ([0-9])\b").unwrap());

static SPACED_CAPITALS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:\p{Lu} ){2,}\p{Lu}\b").unwrap());

static WIDE_GAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{3,}").unwrap());

static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// UTF-8 read back as Latin-1, the usual culprits first.
const MOJIBAKE: &[(&str, &str)] = &[
    ("â€™", "'"),
    ("â€˜", "'"),
    ("â€œ", "\""),
    ("â€\u{9d}", "\""),
    ("â€“", "-"),
    ("â€”", "-"),
    ("â€¢", "•"),
    ("â€¦", "..."),
    ("Ã©", "é"),
    ("Ã¨", "è"),
    ("Ãª", "ê"),
    ("Ã«", "ë"),
    ("Ã§", "ç"),
    ("Ã´", "ô"),
    ("Ã®", "î"),
    ("Ã¯", "ï"),
    ("Ã»", "û"),
    ("Ã¹", "ù"),
    ("Ã¢", "â"),
    ("Ã‰", "É"),
    ("Ã€", "À"),
    ("Ã\u{a0}", "à"),
    ("Ã‡", "Ç"),
    ("Â\u{a0}", " "),
];

pub fn normalize_text(raw: &str) -> String {
    let mut text = raw.replace("\r\n", "\n").replace(['\r', '\u{c}'], "\n");

    // Before NBSP cleanup: "à" double-encodes to "Ã" + NBSP.
    for (broken, fixed) in MOJIBAKE {
        if text.contains(broken) {
            text = text.replace(broken, fixed);
        }
    }
    let text = text
        .replace(['\u{a0}', '\u{202f}'], " ")
        .replace('\u{200b}', "");

    let text = SPACED_YEAR.replace_all(&text, "$1$2$3$4");
    let text = SPACED_CAPITALS.replace_all(&text, |caps: &regex::Captures| caps[0].replace(' ', ""));
    let text = WIDE_GAP.replace_all(&text, " ");

    let trimmed = text
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");

    BLANK_RUN.replace_all(&trimmed, "\n\n").trim().to_string()
}

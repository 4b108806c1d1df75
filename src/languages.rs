use std::collections::HashMap;

use crate::domain::LanguageBreakdown;

pub const STAT_PANEL_LANGUAGES: usize = 4;
pub const CHART_LANGUAGES: usize = 10;

const DEFAULT_LANGUAGE_COLOR: [u8; 3] = [0x85, 0x85, 0x85];

const LANGUAGE_COLORS: &[(&str, [u8; 3])] = &[
    ("TypeScript", [0x31, 0x78, 0xC6]),
    ("JavaScript", [0xF7, 0xDF, 0x1E]),
    ("Python", [0x37, 0x76, 0xAB]),
    ("CSS", [0x56, 0x3D, 0x7C]),
    ("HTML", [0xE3, 0x4C, 0x26]),
    ("Java", [0x00, 0x73, 0x96]),
    ("Ruby", [0xCC, 0x34, 0x2D]),
    ("Go", [0x00, 0xAD, 0xD8]),
    ("Swift", [0xF0, 0x51, 0x38]),
    ("Kotlin", [0xA9, 0x7B, 0xFF]),
    ("Rust", [0xDE, 0xA5, 0x84]),
    ("C", [0x55, 0x55, 0x55]),
    ("C++", [0xF3, 0x4B, 0x7D]),
    ("C#", [0x17, 0x86, 0x00]),
    ("PHP", [0x77, 0x7B, 0xB4]),
    ("Shell", [0x89, 0xE0, 0x51]),
];

/// Sums repository sizes per language and ranks them by total bytes.
///
/// Percentages are taken against the total of every language before the
/// list is cut to `top_n`, so a truncated list may sum to less than 100.
/// Entries without a language or with a zero size are ignored.
pub fn aggregate_languages<'a, I>(repos: I, top_n: usize) -> Vec<LanguageBreakdown>
where
    I: IntoIterator<Item = (Option<&'a str>, u64)>,
{
    let mut totals: Vec<(String, u64, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (language, size) in repos {
        let Some(language) = language.filter(|name| !name.is_empty()) else {
            continue;
        };
        if size == 0 {
            continue;
        }
        match index.get(language) {
            Some(&slot) => {
                totals[slot].1 += size;
                totals[slot].2 += 1;
            }
            None => {
                index.insert(language.to_owned(), totals.len());
                totals.push((language.to_owned(), size, 1));
            }
        }
    }

    let total_size: u64 = totals.iter().map(|(_, size, _)| size).sum();
    if total_size == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<LanguageBreakdown> = totals
        .into_iter()
        .map(|(language, size, repositories)| LanguageBreakdown {
            percentage: (size as f64 / total_size as f64 * 100.0).round() as u8,
            language,
            size,
            repositories,
        })
        .collect();
    // stable: equal sizes keep first-seen order
    ranked.sort_by(|a, b| b.size.cmp(&a.size));
    ranked.truncate(top_n);
    ranked
}

pub fn language_color(language: &str) -> [u8; 3] {
    LANGUAGE_COLORS
        .iter()
        .find(|(name, _)| *name == language)
        .map(|(_, rgb)| *rgb)
        .unwrap_or(DEFAULT_LANGUAGE_COLOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate(repos: &[(Option<&str>, u64)], top_n: usize) -> Vec<LanguageBreakdown> {
        aggregate_languages(repos.iter().copied(), top_n)
    }

    #[test]
    fn empty_collection_yields_nothing() {
        assert!(aggregate(&[], 4).is_empty());
    }

    #[test]
    fn zero_total_size_yields_nothing() {
        let out = aggregate(&[(Some("Rust"), 0), (None, 500), (Some(""), 10)], 4);
        assert!(out.is_empty());
    }

    #[test]
    fn single_language_is_full_share() {
        let out = aggregate(&[(Some("Rust"), 10), (None, 90), (Some("Rust"), 30)], 4);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].language, "Rust");
        assert_eq!(out[0].size, 40);
        assert_eq!(out[0].percentage, 100);
        assert_eq!(out[0].repositories, 2);
    }

    #[test]
    fn sums_and_ranks_by_size() {
        let out = aggregate(
            &[
                (Some("TypeScript"), 300),
                (Some("TypeScript"), 100),
                (Some("Python"), 100),
            ],
            4,
        );
        let view: Vec<_> = out
            .iter()
            .map(|entry| (entry.language.as_str(), entry.size, entry.percentage))
            .collect();
        assert_eq!(view, [("TypeScript", 400, 80), ("Python", 100, 20)]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let out = aggregate(&[(Some("Go"), 5), (Some("C"), 5), (Some("Ruby"), 5)], 10);
        let names: Vec<_> = out.iter().map(|entry| entry.language.as_str()).collect();
        assert_eq!(names, ["Go", "C", "Ruby"]);
    }

    #[test]
    fn truncation_keeps_percentages_of_full_set() {
        let out = aggregate(
            &[
                (Some("A"), 40),
                (Some("B"), 30),
                (Some("C"), 20),
                (Some("D"), 10),
            ],
            2,
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].percentage, 40);
        assert_eq!(out[1].percentage, 30);
    }

    #[test]
    fn unknown_language_uses_default_color() {
        assert_eq!(language_color("Rust"), [0xDE, 0xA5, 0x84]);
        assert_eq!(language_color("Zig"), DEFAULT_LANGUAGE_COLOR);
    }
}

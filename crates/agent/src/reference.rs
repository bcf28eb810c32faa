//! Resolving "ملک ۲" / "the second one" / a project name to a listing id
//!
//! Resolution order: ordinal number against the last shown page, ordinal
//! word, title containment against everything shown this session, fuzzy
//! title match, then the last listing the user referenced. Catalog-wide
//! title scanning is a separate helper for flows that accept listings never
//! shown in this session.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use realty_config::similarity;
use realty_core::Listing;

use crate::memory::SessionMemory;

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Ordinal words in both languages, 1-based.
const ORDINAL_WORDS: &[(&str, usize)] = &[
    ("اول", 1),
    ("اولی", 1),
    ("دوم", 2),
    ("دومی", 2),
    ("سوم", 3),
    ("سومی", 3),
    ("چهارم", 4),
    ("پنجم", 5),
    ("first", 1),
    ("second", 2),
    ("third", 3),
    ("fourth", 4),
    ("fifth", 5),
];

/// Map Persian and Arabic-Indic digits to ASCII, leaving everything else.
pub fn normalize_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '۰'..='۹' => char::from(b'0' + (c as u32 - '۰' as u32) as u8),
            '٠'..='٩' => char::from(b'0' + (c as u32 - '٠' as u32) as u8),
            _ => c,
        })
        .collect()
}

/// Resolve one listing reference from the message, or fall back to the last
/// listing the user talked about.
pub fn resolve(memory: &SessionMemory, message: &str, fuzzy_threshold: f64) -> Option<u64> {
    let normalized = normalize_digits(message);

    if let Some(id) = by_ordinal(&memory.last_shown, &normalized) {
        return Some(id);
    }
    if let Some(id) = by_title(&memory.name_to_id, &normalized, fuzzy_threshold) {
        return Some(id);
    }
    memory.last_referenced
}

/// Resolve exactly two distinct references for a comparison.
pub fn resolve_pair(
    memory: &SessionMemory,
    message: &str,
    fuzzy_threshold: f64,
) -> Option<(u64, u64)> {
    let normalized = normalize_digits(message);

    let mut ids: Vec<u64> = NUMBER_RE
        .find_iter(&normalized)
        .filter_map(|m| m.as_str().parse::<usize>().ok())
        .filter_map(|n| nth_shown(&memory.last_shown, n))
        .collect();

    if ids.len() < 2 {
        let lower = normalized.to_lowercase();
        for (title, id) in &memory.name_to_id {
            if lower.contains(title.as_str()) && !ids.contains(id) {
                ids.push(*id);
            }
        }
    }

    ids.dedup();
    match ids.as_slice() {
        [a, b, ..] if a != b => Some((*a, *b)),
        _ => None,
    }
}

/// Scan free text for catalog titles by containment. Last resort for flows
/// where the user names a project that was never shown in this session.
pub fn find_titles_in_text(catalog: &[Listing], message: &str) -> Vec<u64> {
    let lower = normalize_digits(message).to_lowercase();
    catalog
        .iter()
        .filter(|listing| {
            let title = listing.title_lower();
            !title.is_empty() && lower.contains(title.as_str())
        })
        .map(|listing| listing.id)
        .collect()
}

fn by_ordinal(last_shown: &[Listing], normalized: &str) -> Option<u64> {
    if let Some(m) = NUMBER_RE.find(normalized) {
        if let Ok(n) = m.as_str().parse::<usize>() {
            if let Some(id) = nth_shown(last_shown, n) {
                return Some(id);
            }
        }
    }

    let lower = normalized.to_lowercase();
    for (word, n) in ORDINAL_WORDS {
        if lower.contains(word) {
            if let Some(id) = nth_shown(last_shown, *n) {
                return Some(id);
            }
        }
    }
    None
}

/// 1-based index into the shown listings. Numbers past the end are not a
/// reference (the user may be quoting a price).
fn nth_shown(last_shown: &[Listing], n: usize) -> Option<u64> {
    if n == 0 || n > last_shown.len() {
        return None;
    }
    Some(last_shown[n - 1].id)
}

fn by_title(
    name_to_id: &HashMap<String, u64>,
    normalized: &str,
    fuzzy_threshold: f64,
) -> Option<u64> {
    let lower = normalized.to_lowercase();

    // Exact containment beats any fuzzy score.
    for (title, id) in name_to_id {
        if lower.contains(title.as_str()) {
            return Some(*id);
        }
    }

    let mut best: Option<(f64, u64)> = None;
    for (title, id) in name_to_id {
        let score = similarity(&lower, title);
        if score >= fuzzy_threshold && best.map_or(true, |(b, _)| score > b) {
            best = Some((score, *id));
        }
    }
    best.map(|(_, id)| id)
}

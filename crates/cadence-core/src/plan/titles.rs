//! Section title derivation
//!
//! Upstream extraction sometimes labels a section "Page 3" or "Untitled". A
//! plan made of "Study: Page 3" entries is useless, so such titles are
//! replaced by one synthesized from the section's own signals.
//!
//! Synthesis walks an ordered list of signal sources, cleans and dedupes
//! terms case-insensitively, and stops as soon as enough terms are collected.

use std::collections::HashSet;

use super::units::Section;

/// Terms joined into a synthesized title
const MAX_TITLE_TERMS: usize = 3;

/// Longest single term kept in a synthesized title
const MAX_TERM_CHARS: usize = 48;

/// Leading words that mark a positional, non-descriptive label
const GENERIC_LABELS: &[&str] = &[
    "page", "pages", "pg", "chapter", "ch", "section", "sec", "part", "unit", "lesson", "module",
    "slide", "slides", "lecture", "topic", "item", "document", "untitled", "unnamed", "unknown",
    "n/a", "na",
];

/// Filler allowed after a generic label ("Page 3 of 10", "Section No. 2")
const GENERIC_FILLER: &[&str] = &["of", "no", "number", "and", "to"];

/// One signal source, tried in priority order
struct TitleSource {
    name: &'static str,
    terms: fn(&Section) -> &[String],
}

const SOURCES: [TitleSource; 5] = [
    TitleSource {
        name: "topic_tags",
        terms: topic_tags,
    },
    TitleSource {
        name: "key_concepts",
        terms: key_concepts,
    },
    TitleSource {
        name: "defined_terms",
        terms: defined_terms,
    },
    TitleSource {
        name: "learning_objectives",
        terms: learning_objectives,
    },
    TitleSource {
        name: "high_yield_points",
        terms: high_yield_points,
    },
];

fn topic_tags(s: &Section) -> &[String] {
    &s.topic_tags
}

fn key_concepts(s: &Section) -> &[String] {
    &s.key_concepts
}

fn defined_terms(s: &Section) -> &[String] {
    &s.defined_terms
}

fn learning_objectives(s: &Section) -> &[String] {
    &s.learning_objectives
}

fn high_yield_points(s: &Section) -> &[String] {
    &s.high_yield_points
}

/// Title shown for a section in the plan. `position` is the section's
/// zero-based index in the input, used for the `"Section N"` fallback.
pub fn derive_title(section: &Section, position: usize) -> String {
    let raw = collapse_whitespace(&section.title);
    if !is_generic_title(&raw) {
        return raw;
    }

    let mut seen = HashSet::new();
    let mut terms = Vec::with_capacity(MAX_TITLE_TERMS);
    'sources: for source in &SOURCES {
        for term in (source.terms)(section) {
            let term = clean_term(term);
            if term.is_empty() || is_generic_title(&term) {
                continue;
            }
            if seen.insert(term.to_lowercase()) {
                tracing::trace!(source = source.name, term = term.as_str(), "Title term");
                terms.push(term);
            }
            if terms.len() == MAX_TITLE_TERMS {
                break 'sources;
            }
        }
    }

    if terms.is_empty() {
        tracing::debug!(section_id = section.id.as_str(), "No title signal, using position");
        return format!("Section {}", position + 1);
    }
    terms.join(", ")
}

/// Whether a title carries no descriptive content: empty, a bare number, or
/// a positional label such as "Page 3", "Chapter II", "Untitled"
pub fn is_generic_title(title: &str) -> bool {
    let normalized: String = title
        .to_lowercase()
        .chars()
        .map(|c| if "#:.-_()[]|,".contains(c) { ' ' } else { c })
        .collect();
    let tokens: Vec<&str> = normalized.split_whitespace().collect();

    let Some((first, rest)) = tokens.split_first() else {
        return true;
    };

    // only bare numbers; a lone word such as "Mix" is a title
    if tokens.iter().all(|t| is_number_token(t)) {
        return true;
    }

    GENERIC_LABELS.contains(first)
        && rest.iter().all(|t| {
            is_ordinal_token(t) || GENERIC_LABELS.contains(t) || GENERIC_FILLER.contains(t)
        })
}

fn is_number_token(token: &str) -> bool {
    token.chars().all(|c| c.is_ascii_digit())
}

/// Digits, a roman numeral from i to xxxix, or a single letter
fn is_ordinal_token(token: &str) -> bool {
    if is_number_token(token) || is_roman_numeral(token) {
        return true;
    }
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic())
}

fn is_roman_numeral(token: &str) -> bool {
    const UNITS: [&str; 10] = ["", "i", "ii", "iii", "iv", "v", "vi", "vii", "viii", "ix"];
    let units = token.trim_start_matches('x');
    let tens = token.len() - units.len();
    !token.is_empty() && tens <= 3 && UNITS.contains(&units)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trim, collapse whitespace, strip trailing punctuation, and cut at a word
/// boundary when too long
fn clean_term(raw: &str) -> String {
    let term = collapse_whitespace(raw);
    let term = term.trim_end_matches(['.', ',', ';', ':']).trim();
    if term.chars().count() <= MAX_TERM_CHARS {
        return term.to_string();
    }

    let cut: String = term.chars().take(MAX_TERM_CHARS).collect();
    match cut.rfind(' ') {
        Some(space) if space > 0 => cut[..space].trim_end_matches([',', ';', ':']).to_string(),
        _ => cut,
    }
}

// ============================================================================
// TESTS
// ============================================================================

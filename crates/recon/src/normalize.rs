//! String canonicalization used before every identifier or name comparison.

use std::cmp::Ordering;

use icu_collator::{Collator, CollatorOptions, Strength};
use icu_locid::locale;
use unicode_normalization::UnicodeNormalization;

/// Characters dropped by [`normalize_str`] besides whitespace.
const STRIPPED: [char; 3] = ['"', '-', '.'];

fn is_stripped(c: char) -> bool {
    c.is_whitespace() || STRIPPED.contains(&c)
}

/// Canonicalize a value for tolerant comparison: whitespace, `"`, `-` and `.`
/// are removed and the rest is lower-cased. Absent stays absent.
pub fn normalize(value: Option<&str>) -> Option<String> {
    value.map(normalize_str)
}

pub fn normalize_str(s: &str) -> String {
    s.chars()
        .filter(|c| !is_stripped(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Symmetric containment between two already-normalized names.
///
/// Empty names never match: an empty string is contained in every name.
pub fn names_overlap(left: &str, right: &str) -> bool {
    if left.is_empty() || right.is_empty() {
        return false;
    }
    left.contains(right) || right.contains(left)
}

/// True when the two raw names share at least one whitespace-delimited word.
/// Case-sensitive, no normalization.
pub fn shares_word(a: &str, b: &str) -> bool {
    a.split_whitespace()
        .any(|word| b.split_whitespace().any(|other| other == word))
}

/// Hebrew final letters and the base letter each one collates with.
const FINAL_FORMS: [(char, char); 5] = [
    ('ך', 'כ'),
    ('ם', 'מ'),
    ('ן', 'נ'),
    ('ף', 'פ'),
    ('ץ', 'צ'),
];

fn fold_final_forms(s: &str) -> String {
    s.chars()
        .map(|c| {
            FINAL_FORMS
                .iter()
                .find(|(final_form, _)| *final_form == c)
                .map_or(c, |(_, base)| *base)
        })
        .collect()
}

/// Codepoint sort key used only when no collator could be built.
fn fallback_key(s: &str) -> String {
    fold_final_forms(s).nfc().flat_map(char::to_lowercase).collect()
}

/// Locale-aware name ordering (Hebrew tailoring of the Unicode collation
/// algorithm).
///
/// Names are compared first with Hebrew final letters folded onto their base
/// letters, then as written, then by raw codepoints so the order is total.
/// Absent names sort as empty.
pub struct NameCollator {
    collator: Option<Collator>,
}

impl NameCollator {
    pub fn new() -> Self {
        let mut options = CollatorOptions::new();
        options.strength = Some(Strength::Tertiary);
        let collator = match Collator::try_new(&locale!("he").into(), options) {
            Ok(collator) => Some(collator),
            Err(e) => {
                log::warn!("no collation data for 'he' ({e:?}); sorting names by codepoint");
                None
            }
        };
        Self { collator }
    }

    pub fn compare(&self, a: Option<&str>, b: Option<&str>) -> Ordering {
        let (a, b) = (a.unwrap_or(""), b.unwrap_or(""));
        let (folded_a, folded_b) = (fold_final_forms(a), fold_final_forms(b));
        let collated = match &self.collator {
            Some(collator) => collator
                .compare(&folded_a, &folded_b)
                .then_with(|| collator.compare(a, b)),
            None => fallback_key(a).cmp(&fallback_key(b)),
        };
        collated.then_with(|| a.cmp(b))
    }
}

impl Default for NameCollator {
    fn default() -> Self {
        Self::new()
    }
}

/// One-off comparison. Sorting code should build a [`NameCollator`] once.
pub fn compare_names(a: Option<&str>, b: Option<&str>) -> Ordering {
    NameCollator::new().compare(a, b)
}

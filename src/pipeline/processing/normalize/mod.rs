//! Header normalization: raw column label → field identifier.
//!
//! A header is first width-normalized (NFKC, whitespace collapsed), then
//! looked up case-insensitively in the translation table. Headers with no
//! entry go through a generic snake_case transform; the result need not be a
//! canonical field and is kept verbatim as an ad-hoc identifier.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

use crate::error::{IngestError, Result};

mod vocabulary;

pub use vocabulary::{CanonicalField, TRANSLATIONS};

static CAPITALIZED_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("static regex"));
static LOWER_UPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("static regex"));
static NON_WORD_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w]+").expect("static regex"));
static SEPARATOR_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").expect("static regex"));

/// Full-width to half-width (NFKC), collapse whitespace runs, trim.
pub fn normalize_text(text: &str) -> String {
    let folded: String = text.nfkc().collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fold_key(text: &str) -> String {
    normalize_text(text).to_lowercase()
}

/// Generic camelCase / symbol → snake_case transform. May return an empty
/// string when the input has no word characters.
pub fn to_identifier(text: &str) -> String {
    let s = CAPITALIZED_WORD.replace_all(text, "${1}_${2}");
    let s = LOWER_UPPER.replace_all(&s, "${1}_${2}").to_lowercase();
    let s = NON_WORD_RUN.replace_all(&s, "_");
    let s = SEPARATOR_RUN.replace_all(&s, "_");
    s.trim_matches('_').to_string()
}

/// Maps raw headers onto field identifiers using an immutable translation table.
#[derive(Debug, Clone)]
pub struct HeaderNormalizer {
    table: Vec<(String, String)>,
}

impl Default for HeaderNormalizer {
    fn default() -> Self {
        Self::standard()
    }
}

impl HeaderNormalizer {
    /// Normalizer over the built-in localized table.
    pub fn standard() -> Self {
        Self {
            table: TRANSLATIONS
                .iter()
                .map(|(label, field)| (fold_key(label), field.id().to_string()))
                .collect(),
        }
    }

    /// Normalizer over a custom table. Keys that collide after case folding
    /// are rejected.
    pub fn with_table<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut table = Vec::new();
        for (label, id) in entries {
            let key = fold_key(label.as_ref());
            if !seen.insert(key.clone()) {
                return Err(IngestError::DuplicateTranslationKey(label.as_ref().to_string()));
            }
            table.push((key, id.into()));
        }
        Ok(Self { table })
    }

    /// Returns the identifier for one raw header.
    pub fn normalize(&self, raw: &str) -> Result<String> {
        let text = normalize_text(raw);
        let key = text.to_lowercase();
        if let Some((_, id)) = self.table.iter().find(|(label, _)| *label == key) {
            return Ok(id.clone());
        }

        let id = to_identifier(&text);
        if id.is_empty() {
            return Err(IngestError::EmptyHeader {
                header: raw.to_string(),
            });
        }
        Ok(id)
    }

    /// Case-insensitive, width-insensitive equality used for literal label checks.
    pub fn labels_match(a: &str, b: &str) -> bool {
        fold_key(a) == fold_key(b)
    }
}

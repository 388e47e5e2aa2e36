//! Text analysis shared by indexing and querying.
//!
//! Tokens are maximal runs of Unicode alphanumeric characters, lower-cased.
//! There is no stop-word list and no diacritics folding: "Náměstí" and
//! "namesti" are different terms.

use std::collections::BTreeMap;

/// Stateless tokenizer shared by indexing and querying.
#[derive(Copy, Clone, Debug, Default)]
pub struct Analyzer;

impl Analyzer {
    /// Split `text` into normalized terms, in order of appearance.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect()
    }

    /// Term → frequency map for `text`, in term order.
    pub fn term_freqs(&self, text: &str) -> BTreeMap<String, u32> {
        let mut freqs = BTreeMap::new();
        for token in self.tokens(text) {
            *freqs.entry(token).or_insert(0) += 1;
        }
        freqs
    }
}

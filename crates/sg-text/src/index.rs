//! BM25 inverted index.
//!
//! Scoring:
//! - IDF: `ln(1 + (N - n + 0.5) / (n + 0.5))`, always positive
//! - Term: `IDF * tf * (k1 + 1) / (tf + k1 * (1 - b + b * doc_len / avg_doc_len))`
//!
//! Every matched query term adds a positive amount, so for a given document
//! the score grows with both the number of distinct query terms it contains
//! and their frequency.
//!
//! Scoring iterates posting lists (term → docs) rather than scanning all
//! documents, so query time is proportional to the matching postings.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use sg_core::PlaceKey;

use crate::Analyzer;

// ── Parameters ────────────────────────────────────────────────────────────────

/// BM25 scoring parameters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bm25Params {
    /// Term frequency saturation.
    pub k1: f64,
    /// Document length normalization.
    pub b:  f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

/// One ranked search hit.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScoredDoc {
    pub key:   PlaceKey,
    pub score: f64,
}

#[derive(Clone, Debug)]
struct DocEntry {
    /// (term, tf) pairs, kept so the document can be unindexed on update.
    terms:  Vec<(String, u32)>,
    length: u32,
}

// ── TextIndex ─────────────────────────────────────────────────────────────────

/// Inverted index keyed by normalized term.
#[derive(Clone, Debug, Default)]
pub struct TextIndex {
    params:   Bm25Params,
    analyzer: Analyzer,
    postings: FxHashMap<String, BTreeMap<PlaceKey, u32>>,
    docs:     BTreeMap<PlaceKey, DocEntry>,
    /// Sum of all document lengths, for the average.
    total_length: u64,
}

impl TextIndex {
    pub fn new(params: Bm25Params) -> Self {
        Self { params, ..Self::default() }
    }

    pub fn params(&self) -> Bm25Params {
        self.params
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn contains(&self, key: PlaceKey) -> bool {
        self.docs.contains_key(&key)
    }

    /// Number of distinct terms.
    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    // ── Maintenance ───────────────────────────────────────────────────────

    /// Index `text` under `key`, replacing any earlier text for that key.
    ///
    /// Returns `false` if `text` has no indexable tokens; the key is then
    /// absent from the index.
    pub fn upsert(&mut self, key: PlaceKey, text: &str) -> bool {
        self.remove(key);

        let freqs = self.analyzer.term_freqs(text);
        if freqs.is_empty() {
            return false;
        }

        let length: u32 = freqs.values().sum();
        for (term, &tf) in &freqs {
            self.postings.entry(term.clone()).or_default().insert(key, tf);
        }
        self.total_length += u64::from(length);
        self.docs.insert(key, DocEntry { terms: freqs.into_iter().collect(), length });
        true
    }

    /// Drop `key` from the index.  Returns `false` if it was not indexed.
    pub fn remove(&mut self, key: PlaceKey) -> bool {
        let Some(doc) = self.docs.remove(&key) else {
            return false;
        };
        for (term, _) in &doc.terms {
            if let Some(list) = self.postings.get_mut(term) {
                list.remove(&key);
                if list.is_empty() {
                    self.postings.remove(term);
                }
            }
        }
        self.total_length -= u64::from(doc.length);
        true
    }

    // ── Query ─────────────────────────────────────────────────────────────

    /// Top `limit` documents for `query`, score descending, ties by key
    /// ascending.  Documents sharing no term with the query are not returned.
    pub fn search(&self, query: &str, limit: usize) -> Vec<ScoredDoc> {
        if limit == 0 || self.docs.is_empty() {
            return Vec::new();
        }

        let total_docs = self.docs.len() as u64;
        let avg_len = self.total_length as f64 / total_docs as f64;

        // Query terms are visited in sorted order so float accumulation is
        // reproducible.
        let mut scores: BTreeMap<PlaceKey, f64> = BTreeMap::new();
        for term in self.analyzer.term_freqs(query).keys() {
            let Some(list) = self.postings.get(term) else {
                continue;
            };
            let idf = compute_idf(total_docs, list.len() as u64);
            for (key, &tf) in list {
                let doc_len = self.docs.get(key).map_or(0, |d| d.length);
                *scores.entry(*key).or_insert(0.0) +=
                    compute_term_score(f64::from(tf), idf, f64::from(doc_len), avg_len, &self.params);
            }
        }

        let mut ranked: Vec<ScoredDoc> = scores
            .into_iter()
            .map(|(key, score)| ScoredDoc { key, score })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.key.cmp(&b.key)));
        ranked.truncate(limit);
        ranked
    }
}

// ── Scoring ───────────────────────────────────────────────────────────────────

/// Inverse document frequency.
#[inline]
pub fn compute_idf(total_docs: u64, doc_freq: u64) -> f64 {
    let n = total_docs as f64;
    let df = doc_freq as f64;
    ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// BM25 contribution of one term to one document.
#[inline]
pub fn compute_term_score(
    tf: f64,
    idf: f64,
    doc_len: f64,
    avg_doc_len: f64,
    params: &Bm25Params,
) -> f64 {
    let len_norm = if avg_doc_len > 0.0 { doc_len / avg_doc_len } else { 1.0 };
    let numerator = tf * (params.k1 + 1.0);
    let denominator = tf + params.k1 * (1.0 - params.b + params.b * len_norm);
    idf * numerator / denominator
}

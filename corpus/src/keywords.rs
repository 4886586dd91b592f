use std::cmp::Ordering;
use std::collections::HashSet;
use thiserror::Error;

use crate::types::TermDictionary;
use crate::vocab::{CorpusInverseVocabulary, CorpusVocabulary};

pub const NUM_STOP_WORDS: usize = 200;
pub const NUM_MAX_KEYWORDS: usize = 5;
pub const TF_IDF_SCORE_THRESHOLD: f64 = 0.02;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeywordError {
    /// A document term absent from the corpus document frequencies is a
    /// broken aggregation invariant; scores would be meaningless.
    #[error("term `{0}` missing from corpus document frequencies")]
    MissingDocFrequency(String),
}

/// Top-N corpus terms by total occurrence count.
///
/// Ties at the cut are broken lexicographically so the set is
/// deterministic across runs.
pub fn stopwords(vocab: &CorpusVocabulary, n: usize) -> HashSet<String> {
    let mut ranked: Vec<(&String, u64)> = vocab.terms.iter().map(|(t, c)| (t, *c)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.into_iter().take(n).map(|(t, _)| t.clone()).collect()
}

/// Score every term of a document, sorted by descending TF-IDF.
///
/// tf(t) = count(t) / num_terms, idf(t) = ln(num_docs / df(t)).
/// Equal scores fall back to term order so the ranking is stable.
pub fn tf_idf_scores(
    inverse: &CorpusInverseVocabulary,
    doc: &TermDictionary,
) -> Result<Vec<(String, f64)>, KeywordError> {
    if doc.num_terms == 0 {
        return Ok(Vec::new());
    }
    let num_docs = inverse.num_docs as f64;
    let total = doc.num_terms as f64;

    let mut scores = Vec::with_capacity(doc.terms.len());
    for (term, count) in &doc.terms {
        let df = inverse
            .doc_frequency
            .get(term)
            .copied()
            .ok_or_else(|| KeywordError::MissingDocFrequency(term.clone()))?;
        let tf = *count as f64 / total;
        let idf = (num_docs / df as f64).ln();
        scores.push((term.clone(), tf * idf));
    }
    scores.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    Ok(scores)
}

/// Walk the ranked terms, skipping stopwords, accepting scores at or
/// above the threshold until `max_keywords` are taken. The first
/// below-threshold score ends selection: the list is sorted, so
/// nothing after it can qualify.
pub fn generate_keywords(
    inverse: &CorpusInverseVocabulary,
    stop_words: &HashSet<String>,
    doc: &TermDictionary,
    threshold: f64,
    max_keywords: usize,
) -> Result<Vec<String>, KeywordError> {
    let mut keywords = Vec::new();
    for (term, score) in tf_idf_scores(inverse, doc)? {
        if stop_words.contains(&term) {
            continue;
        }
        if score >= threshold {
            keywords.push(term);
            if keywords.len() >= max_keywords {
                break;
            }
        } else {
            break;
        }
    }
    Ok(keywords)
}

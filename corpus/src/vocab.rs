use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::TermDictionary;

/// Document frequencies: how many distinct documents contain each term.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusInverseVocabulary {
    pub num_docs: u64,
    pub doc_frequency: HashMap<String, u64>,
}

/// Corpus-wide term frequencies; `num_terms` counts distinct terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusVocabulary {
    pub num_terms: u64,
    pub terms: HashMap<String, u64>,
}

/// Reduce all per-document dictionaries into the two corpus maps.
///
/// Callers may load the dictionaries concurrently, but this fold runs
/// on one task so the accumulator maps see no interleaved mutation.
/// Always a full recompute; there is no merge mode.
pub fn aggregate(dicts: &[TermDictionary]) -> (CorpusInverseVocabulary, CorpusVocabulary) {
    let mut doc_frequency: HashMap<String, u64> = HashMap::new();
    for dict in dicts {
        for term in dict.terms.keys() {
            *doc_frequency.entry(term.clone()).or_insert(0) += 1;
        }
    }

    let mut terms: HashMap<String, u64> = HashMap::new();
    for dict in dicts {
        for (term, count) in &dict.terms {
            *terms.entry(term.clone()).or_insert(0) += count;
        }
    }

    (
        CorpusInverseVocabulary { num_docs: dicts.len() as u64, doc_frequency },
        CorpusVocabulary { num_terms: terms.len() as u64, terms },
    )
}

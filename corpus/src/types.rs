use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::normalize::normalize_term;
use crate::persist::CorpusPaths;

/// Immutable identity for one corpus item, created once at discovery.
#[derive(Debug, Clone)]
pub struct DocumentRef {
    pub material_id: u64,
    /// Full suffix chain including the leading dot, e.g. `.pdf` or `.tar.gz`.
    pub extension: String,
    pub doc_path: PathBuf,
    pub bow_path: PathBuf,
}

impl DocumentRef {
    /// Parse a `<material_id>.<extension...>` filename from the download
    /// directory. The extension chain is kept verbatim for extractor
    /// routing; the term artifact is always `<material_id>.json`.
    pub fn from_filename(paths: &CorpusPaths, filename: &str) -> Result<Self> {
        let (stem, extension) = match filename.find('.') {
            Some(i) => (&filename[..i], &filename[i..]),
            None => (filename, ""),
        };
        let material_id: u64 = stem
            .parse()
            .with_context(|| format!("`{filename}` does not start with a numeric material id"))?;
        Ok(Self {
            material_id,
            extension: extension.to_string(),
            doc_path: paths.download_dir().join(filename),
            bow_path: paths.bow_path(material_id),
        })
    }
}

/// Per-document bag of words: normalized term -> occurrence count.
///
/// `num_terms` is the total number of accepted token occurrences and
/// always equals the sum of the counts; no zero-count entries exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermDictionary {
    pub num_terms: u64,
    pub terms: HashMap<String, u64>,
}

impl TermDictionary {
    pub fn insert_term(&mut self, term: String) {
        *self.terms.entry(term).or_insert(0) += 1;
        self.num_terms += 1;
    }

    /// Normalize and count a stream of raw tokens.
    pub fn extend_tokens<'a>(&mut self, tokens: impl Iterator<Item = &'a str>) {
        for token in tokens {
            if let Some(term) = normalize_term(token) {
                self.insert_term(term);
            }
        }
    }

    pub fn from_text(text: &str) -> Self {
        let mut dict = Self::default();
        dict.extend_tokens(text.split_whitespace());
        dict
    }

    pub fn is_empty(&self) -> bool {
        self.num_terms == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_single_suffix() {
        let paths = CorpusPaths::new("/tmp/corpus");
        let doc = DocumentRef::from_filename(&paths, "4217.pdf").unwrap();
        assert_eq!(doc.material_id, 4217);
        assert_eq!(doc.extension, ".pdf");
        assert!(doc.doc_path.ends_with("downloaded/4217.pdf"));
        assert!(doc.bow_path.ends_with("bag_of_words/4217.json"));
    }

    #[test]
    fn filename_multi_suffix_chain() {
        let paths = CorpusPaths::new("/tmp/corpus");
        let doc = DocumentRef::from_filename(&paths, "88.tar.gz").unwrap();
        assert_eq!(doc.material_id, 88);
        assert_eq!(doc.extension, ".tar.gz");
        assert!(doc.bow_path.ends_with("bag_of_words/88.json"));
    }

    #[test]
    fn filename_non_numeric_stem_rejected() {
        let paths = CorpusPaths::new("/tmp/corpus");
        assert!(DocumentRef::from_filename(&paths, "readme.txt").is_err());
    }

    #[test]
    fn counts_match_total() {
        let dict = TermDictionary::from_text("alpha beta alpha --- gamma. alpha");
        assert_eq!(dict.terms["alpha"], 3);
        assert_eq!(dict.terms["beta"], 1);
        assert_eq!(dict.terms["gamma"], 1);
        assert_eq!(dict.num_terms, dict.terms.values().sum::<u64>());
        assert!(dict.terms.values().all(|&c| c >= 1));
    }

    #[test]
    fn empty_after_normalization() {
        let dict = TermDictionary::from_text("--- ... https://x.org");
        assert!(dict.is_empty());
    }
}

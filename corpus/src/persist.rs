use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::TermDictionary;
use crate::vocab::{CorpusInverseVocabulary, CorpusVocabulary};

/// Fixed layout of a corpus working directory.
pub struct CorpusPaths {
    pub root: PathBuf,
}

impl CorpusPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    /// Source documents, named `<material_id>.<extension...>`.
    pub fn download_dir(&self) -> PathBuf {
        self.root.join("downloaded")
    }

    /// Per-document term dictionary artifacts.
    pub fn bow_dir(&self) -> PathBuf {
        self.root.join("bag_of_words")
    }

    pub fn bow_path(&self, material_id: u64) -> PathBuf {
        self.bow_dir().join(format!("{material_id}.json"))
    }

    pub fn corpus_vocabulary(&self) -> PathBuf {
        self.root.join("corpus_vocab.json")
    }

    pub fn corpus_inverse_vocabulary(&self) -> PathBuf {
        self.root.join("corpus_inv_vocab.json")
    }

    pub fn metadata(&self) -> PathBuf {
        self.root.join("metadata.json")
    }

    pub fn report_csv(&self) -> PathBuf {
        self.root.join("tf_idf_results.csv")
    }
}

/// Write through a temp file and rename so an interrupted write never
/// leaves an artifact the idempotence check would treat as complete.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn save_term_dictionary(path: &Path, dict: &TermDictionary) -> Result<()> {
    write_atomic(path, &serde_json::to_string(dict)?)
}

pub fn load_term_dictionary(path: &Path) -> Result<TermDictionary> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

pub fn save_inverse_vocabulary(path: &Path, vocab: &CorpusInverseVocabulary) -> Result<()> {
    write_atomic(path, &serde_json::to_string(vocab)?)
}

pub fn load_inverse_vocabulary(path: &Path) -> Result<CorpusInverseVocabulary> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

pub fn save_vocabulary(path: &Path, vocab: &CorpusVocabulary) -> Result<()> {
    write_atomic(path, &serde_json::to_string(vocab)?)
}

pub fn load_vocabulary(path: &Path) -> Result<CorpusVocabulary> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

use anyhow::{Context, Result};
use corpus::persist::{
    load_term_dictionary, save_inverse_vocabulary, save_vocabulary, CorpusPaths,
};
use corpus::vocab::aggregate;
use corpus::{CorpusInverseVocabulary, CorpusVocabulary};
use tokio::task::JoinSet;

/// Reduce every per-document artifact into the corpus-level records
/// and persist both.
///
/// Artifact loads fan out across blocking tasks; the fold itself
/// happens once, here, on the owning task, so the accumulator maps are
/// never mutated concurrently. Recomputed from scratch on every run.
pub async fn build_corpus_vocabulary(
    paths: &CorpusPaths,
) -> Result<(CorpusInverseVocabulary, CorpusVocabulary)> {
    let mut tasks = JoinSet::new();
    let mut dir = tokio::fs::read_dir(paths.bow_dir())
        .await
        .context("bag-of-words directory missing; run the bows stage first")?;
    while let Some(entry) = dir.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        tasks.spawn_blocking(move || {
            load_term_dictionary(&path).with_context(|| format!("loading {}", path.display()))
        });
    }

    let mut dicts = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        dicts.push(joined??);
    }

    let (inverse, vocab) = aggregate(&dicts);
    tracing::info!(
        num_docs = inverse.num_docs,
        num_terms = vocab.num_terms,
        "corpus vocabulary aggregated"
    );

    save_inverse_vocabulary(&paths.corpus_inverse_vocabulary(), &inverse)?;
    save_vocabulary(&paths.corpus_vocabulary(), &vocab)?;

    Ok((inverse, vocab))
}

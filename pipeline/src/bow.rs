use anyhow::{bail, Result};
use corpus::extract::DocFormat;
use corpus::persist::{save_term_dictionary, CorpusPaths};
use corpus::DocumentRef;
use std::sync::Arc;
use tokio::task::JoinSet;
use walkdir::WalkDir;

use crate::pool::ParsePool;

/// Per-document processing outcome; one of these per discovered input,
/// whatever happened to it.
#[derive(Debug, Clone)]
pub struct DocOutcome {
    pub material_id: u64,
    pub parsing_ok: bool,
    pub parsing_error: String,
}

impl DocOutcome {
    fn ok(material_id: u64) -> Self {
        Self { material_id, parsing_ok: true, parsing_error: String::new() }
    }

    fn failed(material_id: u64, reason: impl Into<String>) -> Self {
        Self { material_id, parsing_ok: false, parsing_error: reason.into() }
    }
}

/// Scan the download directory for `<material_id>.<extension...>`
/// files. Files without a numeric stem are skipped with a warning.
pub fn discover_documents(paths: &CorpusPaths) -> Result<Vec<DocumentRef>> {
    let mut refs = Vec::new();
    for entry in WalkDir::new(paths.download_dir())
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        match DocumentRef::from_filename(paths, &name) {
            Ok(doc) => refs.push(doc),
            Err(err) => tracing::warn!(file = %name, %err, "skipping unrecognized file"),
        }
    }
    refs.sort_by_key(|d| d.material_id);
    Ok(refs)
}

/// Produce and persist one document's term dictionary.
///
/// An existing artifact short-circuits to success without touching the
/// source bytes, which is what makes re-runs cheap. The artifact write
/// goes through a temp file and rename, so a document interrupted
/// mid-write is reprocessed next run.
pub async fn process_document(doc: &DocumentRef, pool: &ParsePool) -> DocOutcome {
    match try_process(doc, pool).await {
        Ok(outcome) => outcome,
        Err(err) => DocOutcome::failed(doc.material_id, format!("{err:#}")),
    }
}

async fn try_process(doc: &DocumentRef, pool: &ParsePool) -> Result<DocOutcome> {
    if tokio::fs::try_exists(&doc.bow_path).await? {
        return Ok(DocOutcome::ok(doc.material_id));
    }

    let data = tokio::fs::read(&doc.doc_path).await?;
    let format = DocFormat::from_extension(&doc.extension);
    let dict = match pool.parse(format, data).await? {
        Ok(dict) => dict,
        Err(err) => return Ok(DocOutcome::failed(doc.material_id, err.to_string())),
    };

    if dict.is_empty() {
        return Ok(DocOutcome::failed(doc.material_id, "Produced empty vocabulary"));
    }

    save_term_dictionary(&doc.bow_path, &dict)?;
    Ok(DocOutcome::ok(doc.material_id))
}

/// Run every discovered document through extraction and persistence.
///
/// All documents are scheduled at once; the parse pool bounds CPU
/// parallelism. Ctrl-C closes the pool to new submissions, drains the
/// in-flight tasks, and then fails the batch.
pub async fn build_bags_of_words(
    paths: &CorpusPaths,
    pool: Arc<ParsePool>,
) -> Result<Vec<DocOutcome>> {
    tokio::fs::create_dir_all(paths.bow_dir()).await?;
    let docs = discover_documents(paths)?;
    tracing::info!(num_docs = docs.len(), "building bag-of-words vocabularies");

    let mut tasks = JoinSet::new();
    for doc in docs {
        let pool = Arc::clone(&pool);
        tasks.spawn(async move { process_document(&doc, &pool).await });
    }

    let mut outcomes = Vec::new();
    let mut cancelled = false;
    loop {
        tokio::select! {
            joined = tasks.join_next() => match joined {
                Some(Ok(outcome)) => {
                    if !outcome.parsing_ok {
                        tracing::warn!(
                            material_id = outcome.material_id,
                            reason = %outcome.parsing_error,
                            "document produced no vocabulary"
                        );
                    }
                    outcomes.push(outcome);
                }
                Some(Err(err)) => return Err(err.into()),
                None => break,
            },
            _ = tokio::signal::ctrl_c(), if !cancelled => {
                tracing::warn!("cancellation requested, draining in-flight parses");
                pool.close();
                cancelled = true;
            }
        }
    }
    if cancelled {
        bail!("bag-of-words batch cancelled");
    }

    outcomes.sort_by_key(|o| o.material_id);
    tracing::info!(
        parsed_ok = outcomes.iter().filter(|o| o.parsing_ok).count(),
        total = outcomes.len(),
        "bag-of-words stage complete"
    );
    Ok(outcomes)
}

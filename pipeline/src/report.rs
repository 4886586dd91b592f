use anyhow::{Context, Result};
use corpus::keywords::generate_keywords;
use corpus::persist::{load_term_dictionary, CorpusPaths};
use corpus::CorpusInverseVocabulary;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::bow::DocOutcome;

/// Catalog record for one material, supplied by the external metadata
/// collaborator. Only the fields the report needs.
#[derive(Debug, Clone, Deserialize)]
pub struct MaterialMetadata {
    pub materialid: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub keywords: String,
}

/// Load catalog metadata if present; a missing file just means blank
/// title/keyword columns.
pub async fn load_material_metadata(paths: &CorpusPaths) -> Result<HashMap<u64, MaterialMetadata>> {
    let path = paths.metadata();
    if !tokio::fs::try_exists(&path).await? {
        tracing::warn!(path = %path.display(), "no metadata file, report will lack titles");
        return Ok(HashMap::new());
    }
    let data = tokio::fs::read_to_string(&path).await?;
    let materials: Vec<MaterialMetadata> =
        serde_json::from_str(&data).context("decoding metadata.json")?;
    Ok(materials.into_iter().map(|m| (m.materialid, m)).collect())
}

#[derive(Serialize)]
struct ReportRow<'a> {
    #[serde(rename = "Material_ID")]
    material_id: u64,
    #[serde(rename = "Parsing_OK")]
    parsing_ok: bool,
    #[serde(rename = "Parsing_Error_Message")]
    parsing_error: &'a str,
    #[serde(rename = "Metadata_Title")]
    metadata_title: &'a str,
    #[serde(rename = "Metadata_Keywords")]
    metadata_keywords: &'a str,
    #[serde(rename = "Generated_Keywords")]
    generated_keywords: String,
}

/// Keywords for one material, or an empty list when its term artifact
/// never got written.
async fn keywords_for_material(
    path: std::path::PathBuf,
    inverse: Arc<CorpusInverseVocabulary>,
    stop_words: Arc<HashSet<String>>,
    threshold: f64,
    max_keywords: usize,
) -> Result<Vec<String>> {
    if !tokio::fs::try_exists(&path).await? {
        return Ok(Vec::new());
    }
    let dict = load_term_dictionary(&path)?;
    Ok(generate_keywords(&inverse, &stop_words, &dict, threshold, max_keywords)?)
}

/// Write the final tabular report: one row per discovered document,
/// keyed and ordered by material id, with parse outcome, catalog
/// title/keywords, and the generated keyword list.
pub async fn generate_keywords_report(
    paths: &CorpusPaths,
    outcomes: &[DocOutcome],
    inverse: &CorpusInverseVocabulary,
    stop_words: &HashSet<String>,
    threshold: f64,
    max_keywords: usize,
) -> Result<()> {
    let metadata = load_material_metadata(paths).await?;
    let inverse = Arc::new(inverse.clone());
    let stop_words = Arc::new(stop_words.clone());

    let mut tasks = JoinSet::new();
    for outcome in outcomes {
        let id = outcome.material_id;
        let path = paths.bow_path(id);
        let inverse = Arc::clone(&inverse);
        let stop_words = Arc::clone(&stop_words);
        tasks.spawn(async move {
            let kws = keywords_for_material(path, inverse, stop_words, threshold, max_keywords)
                .await?;
            anyhow::Ok((id, kws))
        });
    }

    // Completion order is arbitrary; rows are re-keyed by material id.
    let mut keywords_by_id: HashMap<u64, Vec<String>> = HashMap::new();
    while let Some(joined) = tasks.join_next().await {
        let (id, kws) = joined??;
        keywords_by_id.insert(id, kws);
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    for outcome in outcomes {
        let meta = metadata.get(&outcome.material_id);
        let generated = keywords_by_id
            .remove(&outcome.material_id)
            .unwrap_or_default()
            .join(", ");
        writer.serialize(ReportRow {
            material_id: outcome.material_id,
            parsing_ok: outcome.parsing_ok,
            parsing_error: &outcome.parsing_error,
            metadata_title: meta.map(|m| m.title.as_str()).unwrap_or(""),
            metadata_keywords: meta.map(|m| m.keywords.as_str()).unwrap_or(""),
            generated_keywords: generated,
        })?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing csv writer: {e}"))?;
    tokio::fs::write(paths.report_csv(), bytes).await?;
    tracing::info!(report = %paths.report_csv().display(), rows = outcomes.len(), "report written");
    Ok(())
}

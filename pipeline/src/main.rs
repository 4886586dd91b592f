use anyhow::Result;
use clap::{Parser, Subcommand};
use corpus::keywords::{
    stopwords, NUM_MAX_KEYWORDS, NUM_STOP_WORDS, TF_IDF_SCORE_THRESHOLD,
};
use corpus::persist::{load_inverse_vocabulary, load_vocabulary, CorpusPaths};
use pipeline::bow::build_bags_of_words;
use pipeline::corpus_stage::build_corpus_vocabulary;
use pipeline::pool::ParsePool;
use pipeline::report::generate_keywords_report;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "pipeline")]
#[command(about = "Build per-document term vectors and TF-IDF keywords for a corpus", long_about = None)]
struct Cli {
    /// Corpus root directory (holds downloaded/, bag_of_words/, and artifacts)
    #[arg(long, default_value = "./materials")]
    root: String,
    /// Parse workers (defaults to available processing units)
    #[arg(long)]
    workers: Option<usize>,
    /// Number of top corpus terms treated as stopwords
    #[arg(long, default_value_t = NUM_STOP_WORDS)]
    stopwords: usize,
    /// Maximum keywords per document
    #[arg(long, default_value_t = NUM_MAX_KEYWORDS)]
    max_keywords: usize,
    /// Minimum TF-IDF score for a keyword
    #[arg(long, default_value_t = TF_IDF_SCORE_THRESHOLD)]
    threshold: f64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build per-document bag-of-words artifacts (idempotent resume)
    Bows,
    /// Aggregate artifacts into the corpus vocabulary records
    Corpus,
    /// Run the whole pipeline through the keyword report
    Run,
}

fn parse_pool(cli: &Cli) -> Result<Arc<ParsePool>> {
    Ok(Arc::new(match cli.workers {
        Some(n) => ParsePool::new(n)?,
        None => ParsePool::with_default_workers()?,
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let paths = CorpusPaths::new(&cli.root);

    match cli.command {
        Commands::Bows => {
            build_bags_of_words(&paths, parse_pool(&cli)?).await?;
        }
        Commands::Corpus => {
            build_corpus_vocabulary(&paths).await?;
        }
        Commands::Run => {
            let outcomes = build_bags_of_words(&paths, parse_pool(&cli)?).await?;
            build_corpus_vocabulary(&paths).await?;
            // Later stages consume the persisted records, not the
            // in-memory maps, so a rerun from this point sees the same
            // inputs.
            let vocab = load_vocabulary(&paths.corpus_vocabulary())?;
            let inverse = load_inverse_vocabulary(&paths.corpus_inverse_vocabulary())?;
            let stop_words = stopwords(&vocab, cli.stopwords);
            generate_keywords_report(
                &paths,
                &outcomes,
                &inverse,
                &stop_words,
                cli.threshold,
                cli.max_keywords,
            )
            .await?;
        }
    }
    Ok(())
}

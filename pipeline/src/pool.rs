use anyhow::{bail, Context, Result};
use corpus::extract::{parse_document, DocFormat, ExtractError};
use corpus::TermDictionary;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::oneshot;

/// Bounded worker pool for CPU-bound document parsing.
///
/// Parsing a heavy document must not stall the I/O tasks, so the async
/// side hands bytes to a fixed set of worker threads and awaits the
/// result over a oneshot channel. The pool size caps actual parse
/// parallelism even though any number of documents may be scheduled.
pub struct ParsePool {
    pool: rayon::ThreadPool,
    closed: AtomicBool,
}

impl ParsePool {
    pub fn new(workers: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("parse-{i}"))
            .build()
            .context("failed to build parse worker pool")?;
        Ok(Self { pool, closed: AtomicBool::new(false) })
    }

    /// Pool sized to the available processing units.
    pub fn with_default_workers() -> Result<Self> {
        Self::new(num_cpus::get())
    }

    /// Stop accepting new parse submissions; in-flight work still
    /// completes and its results are still delivered.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Parse on a worker thread. The outer error means the pool refused
    /// or lost the job; the inner result is the per-document outcome.
    pub async fn parse(
        &self,
        format: DocFormat,
        data: Vec<u8>,
    ) -> Result<Result<TermDictionary, ExtractError>> {
        if self.is_closed() {
            bail!("parse pool is shut down");
        }
        let (tx, rx) = oneshot::channel();
        self.pool.spawn(move || {
            let _ = tx.send(parse_document(format, &data));
        });
        rx.await.context("parse worker dropped its result")
    }
}

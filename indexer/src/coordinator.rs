//! The build leader: enumerates the corpus, feeds the work queue, drains
//! worker reports into the document registry, then runs the global merge
//! and the offset-index pass.

use anyhow::{bail, Context, Result};
use crossbeam_channel as channel;
use searchcore::{offsets, IndexPaths};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use walkdir::WalkDir;

use crate::merger::{self, Finalize};
use crate::worker::{Job, Report, Worker};

/// Documents larger than this are skipped at enumeration time.
const MAX_DOC_BYTES: u64 = 10_000_000;
const JOB_QUEUE_CAPACITY: usize = 1024;

pub struct BuildConfig {
    /// Directory of crawler-produced `.json` documents.
    pub source: PathBuf,
    /// Directory receiving every build artifact.
    pub index_dir: PathBuf,
    pub workers: usize,
    /// Discard a previous build instead of resuming it.
    pub restart: bool,
}

pub struct BuildSummary {
    pub docs_registered: u64,
    pub workers: usize,
}

pub fn build(cfg: &BuildConfig) -> Result<BuildSummary> {
    build_with_cancel(cfg, Arc::new(AtomicBool::new(false)))
}

/// Run a full build. The cancellation flag is cooperative: workers observe
/// it before dequeuing their next document, finish or abandon the current
/// one, and still run their exit flush/merge/signal sequence. The merge
/// over whatever was indexed runs either way.
pub fn build_with_cancel(cfg: &BuildConfig, cancel: Arc<AtomicBool>) -> Result<BuildSummary> {
    let paths = IndexPaths::new(&cfg.index_dir);
    let workers = cfg.workers.clamp(1, 100);

    let mut registered: HashSet<PathBuf> = HashSet::new();
    if cfg.restart || !paths.registry().exists() {
        if paths.root.exists() {
            fs::remove_dir_all(&paths.root)
                .with_context(|| format!("clearing {}", paths.root.display()))?;
        }
    } else {
        registered = read_registered(&paths)?;
        tracing::info!(docs = registered.len(), "resuming previous build");
    }
    fs::create_dir_all(paths.partials())?;

    let (job_tx, job_rx) = channel::bounded::<Job>(JOB_QUEUE_CAPACITY);
    let (report_tx, report_rx) = channel::unbounded::<Report>();

    let mut handles = Vec::with_capacity(workers);
    for id in 0..workers {
        let worker = Worker::new(id, paths.partials())?;
        let (jobs, reports, cancel) = (job_rx.clone(), report_tx.clone(), cancel.clone());
        handles.push(
            thread::Builder::new()
                .name(format!("indexer-worker-{id}"))
                .spawn(move || worker.run(jobs, reports, cancel))?,
        );
    }
    drop(job_rx);
    drop(report_tx);

    // Enumerate the corpus; doc ids continue past whatever a resumed run
    // already registered.
    let mut next_doc_id = registered.len() as u32;
    for entry in WalkDir::new(&cfg.source).into_iter().filter_map(|e| e.ok()) {
        if cancel.load(Ordering::Relaxed) {
            break;
        }
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        if entry.metadata().map(|m| m.len() > MAX_DOC_BYTES).unwrap_or(true) {
            continue;
        }
        if registered.contains(path) {
            continue;
        }
        let job = Job::Doc { path: path.to_path_buf(), doc_id: next_doc_id };
        if job_tx.send(job).is_err() {
            break;
        }
        next_doc_id += 1;
    }
    for _ in 0..workers {
        if job_tx.send(Job::Shutdown).is_err() {
            break;
        }
    }
    drop(job_tx);

    // Drain reports until every worker's sentinel arrives. Joining first
    // could deadlock against a worker still publishing results, so the
    // join strictly follows the drain.
    let mut registry = BufWriter::new(
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(paths.registry())
            .with_context(|| format!("opening registry {}", paths.registry().display()))?,
    );
    let mut registry_offsets = BufWriter::new(
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(paths.registry_offsets())?,
    );
    let mut position = fs::metadata(paths.registry())?.len();

    let mut docs_registered = registered.len() as u64;
    let mut finished = 0usize;
    while finished < workers {
        match report_rx.recv() {
            Ok(Report::Indexed { doc_id, path, url, title }) => {
                let record = format!("{}\n{}\n{}\n", path.display(), url, title);
                registry.write_all(record.as_bytes())?;
                offsets::write_entry(&mut registry_offsets, doc_id, position)?;
                position += record.len() as u64;
                docs_registered += 1;
            }
            Ok(Report::Finished { worker_id }) => {
                tracing::debug!(worker_id, "sentinel received");
                finished += 1;
            }
            // Every sender is gone; at least one worker died short of its
            // sentinel. Fall through to the join for the real error.
            Err(_) => break,
        }
    }
    registry.flush()?;
    registry_offsets.flush()?;

    for handle in handles {
        match handle.join() {
            Ok(result) => result?,
            Err(_) => bail!("worker thread panicked"),
        }
    }
    if finished < workers {
        bail!("{} of {workers} workers exited without signaling completion", workers - finished);
    }

    let inputs = worker_indices(&paths)?;
    tracing::info!(inputs = inputs.len(), docs = docs_registered, "starting global merge");
    merger::merge_files(&inputs, &paths.index(), Some(&Finalize { total_docs: docs_registered }))?;
    merger::build_offset_index(&paths.index(), &paths.index_offsets())?;
    tracing::info!(docs = docs_registered, "build complete");

    Ok(BuildSummary { docs_registered, workers })
}

/// Every path already present in the registry: its first line of each
/// three-line record.
fn read_registered(paths: &IndexPaths) -> Result<HashSet<PathBuf>> {
    let file = File::open(paths.registry())?;
    let mut set = HashSet::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if i % 3 == 0 {
            set.insert(PathBuf::from(line));
        }
    }
    Ok(set)
}

/// The per-worker merged files feeding the global merge.
fn worker_indices(paths: &IndexPaths) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for entry in fs::read_dir(paths.partials())? {
        let path = entry?.path();
        if path.extension().and_then(|s| s.to_str()) == Some("idx") {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

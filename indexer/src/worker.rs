use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};
use searchcore::document::{self, RawDoc, WebPage};
use searchcore::postings::{self, DocId};
use searchcore::tokenizer::{self, TAG_BOOSTS};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::merger;

/// Flush the accumulator to disk once it holds this many postings. Bounds
/// worker memory independent of corpus size.
const FLUSH_THRESHOLD: usize = 100_000;

/// A unit of work, or the end-of-corpus sentinel.
pub enum Job {
    Doc { path: PathBuf, doc_id: DocId },
    Shutdown,
}

/// What a worker sends back to the coordinator.
pub enum Report {
    Indexed { doc_id: DocId, path: PathBuf, url: String, title: String },
    Finished { worker_id: usize },
}

/// One indexing worker. All mutable state lives here: the posting
/// accumulator, the flush counter, and the private duplicate-fingerprint
/// table. Nothing is shared between workers except the two channels and
/// the cancellation flag.
pub struct Worker {
    id: usize,
    partial_dir: PathBuf,
    postings: HashMap<String, Vec<(DocId, u64)>>,
    posting_count: usize,
    flush_index: usize,
    seen: HashMap<u32, PathBuf>,
}

impl Worker {
    pub fn new(id: usize, partial_dir: PathBuf) -> Result<Self> {
        // A resumed run may already hold partials under this worker id;
        // keep numbering past them.
        let flush_index = own_partials(&partial_dir, id)?.len();
        Ok(Worker {
            id,
            partial_dir,
            postings: HashMap::new(),
            posting_count: 0,
            flush_index,
            seen: HashMap::new(),
        })
    }

    fn partial_path(&self, flush: usize) -> PathBuf {
        self.partial_dir.join(format!("w{}-i{}.dat", self.id, flush))
    }

    fn merged_path(&self) -> PathBuf {
        self.partial_dir.join(format!("w{}.idx", self.id))
    }

    /// Main loop. Exits on the shutdown sentinel, a closed queue, or the
    /// cancellation flag, then always runs the flush/merge/signal exit
    /// sequence.
    pub fn run(
        mut self,
        jobs: Receiver<Job>,
        reports: Sender<Report>,
        cancel: Arc<AtomicBool>,
    ) -> Result<()> {
        while !cancel.load(Ordering::Relaxed) {
            match jobs.recv() {
                Ok(Job::Doc { path, doc_id }) => {
                    match self.process(&path, doc_id) {
                        Ok(Some((url, title))) => {
                            if reports
                                .send(Report::Indexed { doc_id, path, url, title })
                                .is_err()
                            {
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(err) => tracing::warn!(
                            worker = self.id,
                            path = %path.display(),
                            %err,
                            "skipping document"
                        ),
                    }
                    if self.posting_count > FLUSH_THRESHOLD {
                        self.flush()?;
                    }
                }
                Ok(Job::Shutdown) | Err(_) => break,
            }
        }
        self.flush()?;
        self.merge_partials()?;
        let _ = reports.send(Report::Finished { worker_id: self.id });
        tracing::debug!(worker = self.id, "worker finished");
        Ok(())
    }

    /// Gate, dedup, tokenize, accumulate. Errors here concern only this
    /// document; the caller logs them and moves on.
    fn process(&mut self, path: &Path, doc_id: DocId) -> Result<Option<(String, String)>> {
        let raw = RawDoc::from_path(path)?;
        if !document::is_valid_html(&raw.content) {
            return Ok(None);
        }
        let page = WebPage::parse(&raw);

        let fingerprint = page.fingerprint();
        if let Some(first) = self.seen.get(&fingerprint) {
            tracing::debug!(
                worker = self.id,
                path = %path.display(),
                first = %first.display(),
                "duplicate content skipped"
            );
            return Ok(None);
        }
        self.seen.insert(fingerprint, path.to_path_buf());

        let mut freqs = tokenizer::token_frequencies(page.texts());
        for (tag, weight) in TAG_BOOSTS {
            let tag_texts = page.tag_texts(tag);
            if !tag_texts.is_empty() {
                tokenizer::apply_boost(&mut freqs, &tag_texts, weight);
            }
        }
        // The stemmed set is fallback vocabulary only; on collision the
        // primary token wins so a document never posts twice for a token.
        for (token, tf) in tokenizer::stemmed_frequencies(page.texts()) {
            freqs.entry(token).or_insert(tf);
        }
        for (token, tf) in freqs {
            self.postings.entry(token).or_default().push((doc_id, tf));
            self.posting_count += 1;
        }
        Ok(Some((page.url, page.title)))
    }

    /// Write the whole accumulator as one lexicographically sorted partial
    /// index, then reset it.
    fn flush(&mut self) -> Result<()> {
        if self.postings.is_empty() {
            return Ok(());
        }
        let path = self.partial_path(self.flush_index);
        let mut out = BufWriter::new(
            File::create(&path)
                .with_context(|| format!("creating partial index {}", path.display()))?,
        );
        let mut entries: Vec<_> = self.postings.drain().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        for (token, postings) in &entries {
            out.write_all(postings::encode_raw_line(token, postings).as_bytes())?;
        }
        out.flush()?;
        self.posting_count = 0;
        self.flush_index += 1;
        Ok(())
    }

    /// Level-1 merge: collapse every partial this worker id owns into a
    /// single sorted file for the global merge.
    fn merge_partials(&self) -> Result<()> {
        let inputs = own_partials(&self.partial_dir, self.id)?;
        merger::merge_files(&inputs, &self.merged_path(), None)
    }
}

fn own_partials(partial_dir: &Path, id: usize) -> Result<Vec<PathBuf>> {
    let prefix = format!("w{id}-i");
    let mut paths = Vec::new();
    for entry in fs::read_dir(partial_dir)
        .with_context(|| format!("reading partial dir {}", partial_dir.display()))?
    {
        let path = entry?.path();
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(&prefix))
        {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchcore::postings::decode_line;
    use std::fs;
    use tempfile::tempdir;

    fn write_doc(dir: &Path, name: &str, body: &str) -> PathBuf {
        let content = format!("<html><head></head><body><p>{body}</p></body></html>");
        let doc = serde_json::json!({
            "url": format!("http://example.com/{name}"),
            "content": content,
            "encoding": "utf-8",
        });
        let path = dir.join(format!("{name}.json"));
        fs::write(&path, doc.to_string()).unwrap();
        path
    }

    #[test]
    fn flush_writes_sorted_raw_partials() {
        let dir = tempdir().unwrap();
        let mut worker = Worker::new(0, dir.path().to_path_buf()).unwrap();
        let doc = write_doc(dir.path(), "doc0", "zebra yak apple");
        assert!(worker.process(&doc, 0).unwrap().is_some());
        worker.flush().unwrap();

        let content = fs::read_to_string(dir.path().join("w0-i0.dat")).unwrap();
        let tokens: Vec<&str> = content.lines().map(|l| decode_line(l).unwrap().0).collect();
        for pair in tokens.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert!(tokens.contains(&"zebra"));
        assert!(tokens.contains(&"yak apple"));
    }

    #[test]
    fn same_worker_rejects_whitespace_variant_duplicates() {
        let dir = tempdir().unwrap();
        let mut worker = Worker::new(3, dir.path().to_path_buf()).unwrap();
        let first = write_doc(dir.path(), "doc0", "alpha   beta");
        let second = write_doc(dir.path(), "doc1", "alpha\n\tbeta");
        assert!(worker.process(&first, 0).unwrap().is_some());
        assert!(worker.process(&second, 1).unwrap().is_none());
        // Only doc 0 contributes postings.
        worker.flush().unwrap();
        let content = fs::read_to_string(dir.path().join("w3-i0.dat")).unwrap();
        assert!(content.contains("alpha:0,1\n"));
        assert!(!content.contains("1,"));
    }

    #[test]
    fn invalid_html_is_silently_skipped() {
        let dir = tempdir().unwrap();
        let mut worker = Worker::new(0, dir.path().to_path_buf()).unwrap();
        let path = dir.path().join("doc0.json");
        fs::write(
            &path,
            serde_json::json!({
                "url": "http://example.com/plain",
                "content": "just text, no markup",
                "encoding": "utf-8",
            })
            .to_string(),
        )
        .unwrap();
        assert!(worker.process(&path, 0).unwrap().is_none());
        assert_eq!(worker.posting_count, 0);
    }
}

use anyhow::{anyhow, Context, Result};
use searchcore::postings::{self, DocId};
use searchcore::tokenizer;
use searchcore::{offsets, IndexPaths};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

pub const DEFAULT_RESULTS: usize = 5;

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub path: String,
    pub url: String,
    pub title: String,
    pub score: f64,
}

/// Read-only query engine over one completed build. Both offset maps live
/// fully in memory; postings and registry records are fetched by seek.
/// Nothing mutates after construction, and each call opens its own read
/// handles, so concurrent searches need no locking.
pub struct SearchEngine {
    paths: IndexPaths,
    token_offsets: HashMap<String, u64>,
    doc_offsets: HashMap<DocId, u64>,
}

impl SearchEngine {
    /// Load the offset maps and verify the data files they point into are
    /// readable. Missing or unreadable artifacts are fatal: the engine
    /// cannot serve without them.
    pub fn open<P: AsRef<Path>>(index_dir: P) -> Result<Self> {
        let paths = IndexPaths::new(index_dir);
        let token_offsets = offsets::load_token_offsets(&paths.index_offsets())?;
        let doc_offsets = offsets::load_doc_offsets(&paths.registry_offsets())?;
        for data_file in [paths.index(), paths.registry()] {
            File::open(&data_file)
                .with_context(|| format!("opening {}", data_file.display()))?;
        }
        tracing::info!(
            tokens = token_offsets.len(),
            docs = doc_offsets.len(),
            "search engine ready"
        );
        Ok(SearchEngine { paths, token_offsets, doc_offsets })
    }

    pub fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        self.search_top(query, DEFAULT_RESULTS)
    }

    pub fn search_top(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let words = tokenizer::words(query);
        if words.is_empty() {
            return Ok(Vec::new());
        }

        let n = words.len().saturating_sub(1).clamp(1, 3);
        let mut tokens = tokenizer::ngrams(&words, n);
        let stemmed_words: Vec<String> = words.iter().map(|w| tokenizer::stem(w)).collect();
        for gram in tokenizer::ngrams(&stemmed_words, n) {
            if !tokens.contains(&gram) {
                tokens.push(gram);
            }
        }

        let mut scores = self.gather(&tokens)?;
        if scores.is_empty() {
            // The n-grams matched nothing; retry once with stemmed
            // single-word unigrams.
            let mut fallback = Vec::new();
            for word in stemmed_words {
                if !fallback.contains(&word) {
                    fallback.push(word);
                }
            }
            scores = self.gather(&fallback)?;
        }

        let mut ranked: Vec<(DocId, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(k);

        let mut registry = BufReader::new(
            File::open(self.paths.registry())
                .with_context(|| format!("opening registry {}", self.paths.registry().display()))?,
        );
        ranked
            .into_iter()
            .map(|(doc_id, score)| self.hydrate(&mut registry, doc_id, score))
            .collect()
    }

    /// Union aggregation: a document's score is the sum of its weights
    /// across every matched token. Tokens absent from the offset map
    /// contribute nothing.
    fn gather(&self, tokens: &[String]) -> Result<HashMap<DocId, f64>> {
        let mut scores = HashMap::new();
        let mut index = BufReader::new(
            File::open(self.paths.index())
                .with_context(|| format!("opening index {}", self.paths.index().display()))?,
        );
        let mut line = String::new();
        for token in tokens {
            let Some(&offset) = self.token_offsets.get(token) else {
                continue;
            };
            index.seek(SeekFrom::Start(offset))?;
            line.clear();
            index.read_line(&mut line)?;
            let (_, decoded) = postings::decode_line(&line)?;
            for posting in decoded {
                *scores.entry(posting.doc_id).or_insert(0.0) += posting.weight;
            }
        }
        Ok(scores)
    }

    /// Read a document's three-line registry record by seek.
    fn hydrate(
        &self,
        registry: &mut BufReader<File>,
        doc_id: DocId,
        score: f64,
    ) -> Result<SearchHit> {
        let offset = self
            .doc_offsets
            .get(&doc_id)
            .copied()
            .ok_or_else(|| anyhow!("doc {doc_id} missing from registry offsets"))?;
        registry.seek(SeekFrom::Start(offset))?;
        let path = read_record_line(registry)?;
        let url = read_record_line(registry)?;
        let title = read_record_line(registry)?;
        Ok(SearchHit { path, url, title, score })
    }
}

fn read_record_line(reader: &mut BufReader<File>) -> Result<String> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

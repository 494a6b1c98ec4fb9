//! Streaming k-way merge of sorted index files. Both merge levels use the
//! same algorithm; only the final (global) merge computes TF-IDF weights,
//! since document frequency is not known before all postings for a token
//! are assembled.

use anyhow::{Context, Result};
use searchcore::{offsets, postings};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Multi-word tokens with fewer postings than this are dropped from the
/// final index as a size-control measure.
const MIN_NGRAM_POSTINGS: usize = 10;

/// Parameters for the final merge.
pub struct Finalize {
    pub total_docs: u64,
}

/// One buffered line per input file, independent of file size.
struct Cursor {
    reader: BufReader<File>,
    current: Option<(String, String)>,
}

impl Cursor {
    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("opening partial index {}", path.display()))?;
        let mut cursor = Cursor { reader: BufReader::new(file), current: None };
        cursor.advance()?;
        Ok(cursor)
    }

    fn advance(&mut self) -> Result<()> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 || line.trim_end().is_empty() {
            self.current = None;
        } else {
            let (token, list) = postings::split_line(&line)?;
            self.current = Some((token.to_string(), list.to_string()));
        }
        Ok(())
    }
}

/// Merge lexicographically sorted index files into one sorted output.
/// With `finalize` set, each token's document frequency is taken from its
/// assembled posting count and every weight becomes `raw_tf * ln(N / df)`.
pub fn merge_files(inputs: &[PathBuf], output: &Path, finalize: Option<&Finalize>) -> Result<()> {
    let mut cursors = inputs
        .iter()
        .map(|p| Cursor::open(p))
        .collect::<Result<Vec<_>>>()?;
    let mut out = BufWriter::new(
        File::create(output).with_context(|| format!("creating index {}", output.display()))?,
    );

    loop {
        let min_token = match cursors
            .iter()
            .filter_map(|c| c.current.as_ref().map(|(token, _)| token))
            .min()
        {
            Some(token) => token.clone(),
            None => break,
        };

        let mut list = String::new();
        for cursor in &mut cursors {
            let hit = match &cursor.current {
                Some((token, postings_str)) if *token == min_token => {
                    if !list.is_empty() {
                        list.push(';');
                    }
                    list.push_str(postings_str);
                    true
                }
                _ => false,
            };
            if hit {
                cursor.advance()?;
            }
        }

        match finalize {
            None => writeln!(out, "{min_token}:{list}")?,
            Some(params) => {
                let merged = postings::decode_postings(&list)?;
                let df = merged.len();
                if min_token.contains(' ') && df < MIN_NGRAM_POSTINGS {
                    continue;
                }
                let idf = (params.total_docs as f64 / df as f64).ln();
                write!(out, "{min_token}:")?;
                for (i, p) in merged.iter().enumerate() {
                    if i > 0 {
                        out.write_all(b";")?;
                    }
                    write!(out, "{},{:.3}", p.doc_id, p.weight * idf)?;
                }
                out.write_all(b"\n")?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

/// One linear pass over a finished index recording `(token, line offset)`
/// entries, advancing by the exact bytes of each line.
pub fn build_offset_index(index: &Path, offsets_path: &Path) -> Result<()> {
    let mut reader = BufReader::new(
        File::open(index).with_context(|| format!("opening index {}", index.display()))?,
    );
    let mut out = BufWriter::new(
        File::create(offsets_path)
            .with_context(|| format!("creating offset index {}", offsets_path.display()))?,
    );
    let mut position: u64 = 0;
    let mut line = String::new();
    loop {
        line.clear();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            break;
        }
        let (token, _) = postings::split_line(&line)?;
        offsets::write_entry(&mut out, token, position)?;
        position += read as u64;
    }
    out.flush()?;
    Ok(())
}

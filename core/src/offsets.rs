//! Sparse `key,byte_offset` side indices. Small enough to load whole into
//! memory; written incrementally alongside the files they index.

use crate::postings::{DecodeError, DocId};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

pub fn write_entry<W: Write, K: Display>(out: &mut W, key: K, offset: u64) -> io::Result<()> {
    writeln!(out, "{key},{offset}")
}

fn parse_entry(line: &str) -> Result<(&str, u64), DecodeError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (key, offset) = line
        .rsplit_once(',')
        .ok_or_else(|| DecodeError::MalformedOffset(line.to_string()))?;
    let offset = offset
        .parse()
        .map_err(|_| DecodeError::InvalidOffset(offset.to_string()))?;
    Ok((key, offset))
}

/// Offset map for the global index: token -> byte offset of its line.
pub fn load_token_offsets(path: &Path) -> Result<HashMap<String, u64>> {
    let file = File::open(path)
        .with_context(|| format!("opening offset index {}", path.display()))?;
    let mut map = HashMap::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let (key, offset) = parse_entry(&line)?;
        map.insert(key.to_string(), offset);
    }
    Ok(map)
}

/// Offset map for the document registry: doc id -> byte offset of its record.
pub fn load_doc_offsets(path: &Path) -> Result<HashMap<DocId, u64>> {
    let file = File::open(path)
        .with_context(|| format!("opening offset index {}", path.display()))?;
    let mut map = HashMap::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let (key, offset) = parse_entry(&line)?;
        let doc_id = key
            .parse::<DocId>()
            .map_err(|_| DecodeError::InvalidDocId(key.to_string()))?;
        map.insert(doc_id, offset);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_entries() {
        let mut buf = Vec::new();
        write_entry(&mut buf, "research", 0).unwrap();
        write_entry(&mut buf, "computer science", 2376).unwrap();
        assert_eq!(buf, b"research,0\ncomputer science,2376\n");
        assert_eq!(parse_entry("computer science,2376").unwrap(), ("computer science", 2376));
    }

    #[test]
    fn rejects_malformed_entries() {
        assert!(matches!(parse_entry("no offset"), Err(DecodeError::MalformedOffset(_))));
        assert!(matches!(parse_entry("token,xyz"), Err(DecodeError::InvalidOffset(_))));
    }
}

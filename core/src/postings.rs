use thiserror::Error;

pub type DocId = u32;

/// One `(doc_id, weight)` pair. The weight is a raw term frequency (plus
/// structural boosts) in partial indices and a finalized TF-IDF weight in
/// the global index; the grammar is the same for both.
#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    pub doc_id: DocId,
    pub weight: f64,
}

/// Index line grammar:
///
/// ```text
/// line        := token ':' postingList
/// postingList := posting (';' posting)*
/// posting     := doc_id ',' weight
/// ```
///
/// A malformed line is a decode error, never a generic parse failure.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("index line is missing the `:` separator")]
    MissingSeparator,
    #[error("malformed posting `{0}`: expected `doc_id,weight`")]
    MalformedPosting(String),
    #[error("invalid doc id `{0}`")]
    InvalidDocId(String),
    #[error("invalid weight `{0}`")]
    InvalidWeight(String),
    #[error("malformed offset entry `{0}`: expected `key,offset`")]
    MalformedOffset(String),
    #[error("invalid byte offset `{0}`")]
    InvalidOffset(String),
}

/// Split an index line into its token and raw posting-list string.
pub fn split_line(line: &str) -> Result<(&str, &str), DecodeError> {
    line.trim_end_matches(['\r', '\n'])
        .split_once(':')
        .ok_or(DecodeError::MissingSeparator)
}

pub fn decode_postings(list: &str) -> Result<Vec<Posting>, DecodeError> {
    list.split(';')
        .map(|p| {
            let (id, weight) = p
                .split_once(',')
                .ok_or_else(|| DecodeError::MalformedPosting(p.to_string()))?;
            Ok(Posting {
                doc_id: id.parse().map_err(|_| DecodeError::InvalidDocId(id.to_string()))?,
                weight: weight.parse().map_err(|_| DecodeError::InvalidWeight(weight.to_string()))?,
            })
        })
        .collect()
}

pub fn decode_line(line: &str) -> Result<(&str, Vec<Posting>), DecodeError> {
    let (token, list) = split_line(line)?;
    Ok((token, decode_postings(list)?))
}

/// Render a partial-index line with integer raw frequencies.
pub fn encode_raw_line(token: &str, postings: &[(DocId, u64)]) -> String {
    let list = postings
        .iter()
        .map(|(id, tf)| format!("{id},{tf}"))
        .collect::<Vec<_>>()
        .join(";");
    format!("{token}:{list}\n")
}

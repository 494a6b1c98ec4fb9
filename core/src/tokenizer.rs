use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashMap;

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"[a-zA-Z0-9]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// Tags whose text boosts matching tokens, highest priority first.
/// Title and heading hits are meant to dominate raw body frequency.
pub const TAG_BOOSTS: [(&str, u64); 5] = [
    ("title", 100_000),
    ("h1", 10_000),
    ("h2", 1_000),
    ("h3", 100),
    ("strong", 10),
];

fn is_numeric(word: &str) -> bool {
    word.bytes().all(|b| b.is_ascii_digit())
}

/// Split text into normalized words: maximal alphanumeric runs, lowercased.
/// Purely numeric runs longer than 4 digits are noise (ids, timestamps) and
/// are dropped.
pub fn words(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| !is_numeric(w) || w.len() <= 4)
        .collect()
}

pub fn stem(word: &str) -> String {
    STEMMER.stem(word).to_string()
}

/// Space-joined n-grams over consecutive words. For n >= 2 an n-gram is
/// skipped when every component word is purely numeric.
pub fn ngrams(words: &[String], n: usize) -> Vec<String> {
    match n {
        0 => Vec::new(),
        1 => words.to_vec(),
        _ => words
            .windows(n)
            .filter(|w| w.iter().any(|t| !is_numeric(t)))
            .map(|w| w.join(" "))
            .collect(),
    }
}

fn accumulate(freqs: &mut HashMap<String, u64>, texts: &[String], stemmed: bool) {
    for text in texts {
        let mut ws = words(text);
        if stemmed {
            ws = ws.iter().map(|w| stem(w)).collect();
        }
        for w in &ws {
            *freqs.entry(w.clone()).or_insert(0) += 1;
        }
        for n in 2..=3 {
            for gram in ngrams(&ws, n) {
                *freqs.entry(gram).or_insert(0) += 1;
            }
        }
    }
}

/// Token frequencies for a document's visible text: unigrams plus bigrams
/// and trigrams, counted within each text string.
pub fn token_frequencies(texts: &[String]) -> HashMap<String, u64> {
    let mut freqs = HashMap::new();
    accumulate(&mut freqs, texts, false);
    freqs
}

/// Same pipeline with each word stemmed first. Kept separate from the
/// primary set; only consulted as a query-time fallback.
pub fn stemmed_frequencies(texts: &[String]) -> HashMap<String, u64> {
    let mut freqs = HashMap::new();
    accumulate(&mut freqs, texts, true);
    freqs
}

/// Add `weight` to the frequency of every token appearing in a boosted
/// tag's text, creating entries for tokens absent from the body.
pub fn apply_boost(freqs: &mut HashMap<String, u64>, tag_texts: &[String], weight: u64) {
    for token in token_frequencies(tag_texts).into_keys() {
        *freqs.entry(token).or_insert(0) += weight;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_alphanumeric_runs() {
        assert_eq!(words("Hello, World-wide web3!"), ["hello", "world", "wide", "web3"]);
    }

    #[test]
    fn drops_long_numeric_runs() {
        assert_eq!(words("room 404 built 20240115"), ["room", "404", "built"]);
        // Alphanumeric runs keep their digits regardless of length.
        assert_eq!(words("rev20240115a"), ["rev20240115a"]);
    }

    #[test]
    fn ngram_skipped_only_when_all_numeric() {
        let ws: Vec<String> = ["1", "2", "go"].iter().map(|s| s.to_string()).collect();
        assert_eq!(ngrams(&ws, 2), ["2 go"]);
        assert_eq!(ngrams(&ws, 3), ["1 2 go"]);
    }
}

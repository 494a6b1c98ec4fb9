use searchcore::tokenizer::{
    apply_boost, ngrams, stem, stemmed_frequencies, token_frequencies, words, TAG_BOOSTS,
};

#[test]
fn it_counts_unigrams_and_ngrams() {
    let texts = vec!["alpha beta alpha".to_string()];
    let freqs = token_frequencies(&texts);
    assert_eq!(freqs["alpha"], 2);
    assert_eq!(freqs["beta"], 1);
    assert_eq!(freqs["alpha beta"], 1);
    assert_eq!(freqs["beta alpha"], 1);
    assert_eq!(freqs["alpha beta alpha"], 1);
}

#[test]
fn ngrams_do_not_cross_text_boundaries() {
    let texts = vec!["alpha".to_string(), "beta".to_string()];
    let freqs = token_frequencies(&texts);
    assert!(freqs.contains_key("alpha"));
    assert!(freqs.contains_key("beta"));
    assert!(!freqs.contains_key("alpha beta"));
}

#[test]
fn it_stems_the_fallback_set() {
    let texts = vec!["running runners".to_string()];
    let stemmed = stemmed_frequencies(&texts);
    assert_eq!(stemmed["run"], 1);
    assert_eq!(stemmed["runner"], 1);
    assert_eq!(stemmed["run runner"], 1);
    assert_eq!(stem("searching"), "search");
}

#[test]
fn boosts_add_tag_weights_to_token_frequencies() {
    let texts = vec!["graduate research program".to_string()];
    let mut freqs = token_frequencies(&texts);
    let (title_tag, title_weight) = TAG_BOOSTS[0];
    assert_eq!(title_tag, "title");
    apply_boost(&mut freqs, &["Research Labs".to_string()], title_weight);
    assert_eq!(freqs["research"], 1 + title_weight);
    // Tokens only present in the tag still get an entry.
    assert_eq!(freqs["labs"], title_weight);
    assert_eq!(freqs["research labs"], title_weight);
}

#[test]
fn query_helpers_join_ngrams_with_spaces() {
    let ws = words("master of software engineering");
    assert_eq!(ws, ["master", "of", "software", "engineering"]);
    assert_eq!(
        ngrams(&ws, 3),
        ["master of software", "of software engineering"]
    );
    assert_eq!(ngrams(&ws, 1), ws);
}

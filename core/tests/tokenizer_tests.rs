use minisearch_core::tokenizer::tokenize;

#[test]
fn it_ignores_case_and_punctuation() {
    assert_eq!(tokenize("The Cat sat."), tokenize("the cat sat"));
    assert_eq!(tokenize("The Cat sat."), vec!["cat", "sat"]);
}

#[test]
fn it_is_deterministic() {
    let text = "Rust's ownership model: borrow-checking, lifetimes & 2021 edition!";
    assert_eq!(tokenize(text), tokenize(text));
    assert_eq!(tokenize(text), vec!["rusts", "ownership", "model", "borrowchecking", "lifetimes", "2021", "edition"]);
}

#[test]
fn it_filters_stopwords() {
    let words = tokenize("The quick brown fox and the lazy dog");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert_eq!(words, vec!["quick", "brown", "fox", "lazy", "dog"]);
}

#[test]
fn only_stopwords_yield_nothing() {
    assert!(tokenize("the is at").is_empty());
    assert!(tokenize("").is_empty());
    assert!(tokenize("  \t\n ").is_empty());
}

#[test]
fn it_splits_on_any_whitespace() {
    assert_eq!(tokenize("alpha\tbeta\ngamma"), vec!["alpha", "beta", "gamma"]);
}

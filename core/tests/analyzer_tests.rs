use cinefind_core::Analyzer;

#[test]
fn it_normalizes_and_stems() {
    let analyzer = Analyzer::default();
    let tokens = analyzer.normalize(Some("Running Runners RUN! The café's menu."));
    assert!(tokens.contains(&"run".to_string()));
    // NFKC plus lowercasing folds café to cafe
    assert!(tokens.iter().any(|t| t.starts_with("caf")));
}

#[test]
fn it_filters_stopwords() {
    let analyzer = Analyzer::default();
    let tokens = analyzer.normalize(Some("The quick brown fox and the lazy dog"));
    assert!(!tokens.contains(&"the".to_string()));
    assert!(!tokens.contains(&"and".to_string()));
}

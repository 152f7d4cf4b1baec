use std::fs;

use namematch::{
    Catalog, ConfigLoadError, IndexConfig, IndexError, MatchEngine, MatchError, MatcherConfig,
    NameMatchConfig, NeighborIndex, PipelineError, SparseVector, TextOperator, TextPipeline,
    TfidfError,
};

#[test]
fn non_list_catalog_is_a_source_format_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    for (file, payload) in [
        ("object.json", r#"{"names": ["Jon Smith"]}"#),
        ("mixed.json", r#"["Jon Smith", 42]"#),
        ("nested.json", r#"[["Jon Smith"]]"#),
        ("broken.json", r#"["Jon Smith""#),
    ] {
        let source = dir.path().join(file);
        fs::write(&source, payload).expect("write catalog");
        let result = MatchEngine::fit(MatcherConfig::default().with_source_path(&source));
        assert!(
            matches!(result, Err(MatchError::SourceFormat { .. })),
            "{file} should be rejected"
        );
    }
}

#[test]
fn untokenizable_catalog_is_an_empty_vocabulary_error() {
    let result = MatchEngine::from_catalog(
        ["J", "D", "?!"].into_iter().collect::<Catalog>(),
        MatcherConfig::default(),
    );
    assert!(matches!(
        result,
        Err(MatchError::Vectorizer(TfidfError::EmptyVocabulary { .. }))
    ));
}

#[test]
fn invalid_k_is_reported_by_the_index() {
    let rows = vec![
        SparseVector::from_dense(&[1.0, 0.0]).expect("dense row"),
        SparseVector::from_dense(&[0.0, 1.0]).expect("dense row"),
    ];
    let index = NeighborIndex::build(rows, 2, IndexConfig::default()).expect("build");
    let query = SparseVector::from_dense(&[1.0, 1.0]).expect("dense query");

    assert!(matches!(
        index.query(&query, 0),
        Err(IndexError::InvalidK { k: 0, len: 2 })
    ));
    assert!(matches!(
        index.query(&query, 3),
        Err(IndexError::InvalidK { k: 3, len: 2 })
    ));
}

#[test]
fn oversized_neighbor_count_is_clamped_by_the_engine() {
    let engine = MatchEngine::from_catalog(
        ["Jon Smith"].into_iter().collect(),
        MatcherConfig::default().with_neighbor_count(10),
    )
    .expect("fit");
    let records = engine.match_query("Jon Smyth").expect("match");
    assert_eq!(records.len(), 1);
}

#[test]
fn corrupt_bundle_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let bundle = dir.path().join("matcher.mdl");
    fs::write(&bundle, vec![0u8; 2048]).expect("write junk");

    // An all-zero archive has no entries at all, so the manifest is missing.
    match MatchEngine::restore(&bundle) {
        Err(MatchError::CorruptBundle { reason, .. }) => assert!(reason.contains("manifest")),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn operators_after_a_terminal_are_rejected() {
    let result = TextPipeline::from_operators([
        TextOperator::lowercase(),
        TextOperator::cumulative_ngrams(2, 3),
        TextOperator::lowercase(),
    ]);
    assert!(matches!(result, Err(PipelineError::AfterTerminal { .. })));
}

#[test]
fn invalid_operator_parameters_are_rejected() {
    assert!(matches!(
        TextPipeline::new().then(TextOperator::ngrams(0)),
        Err(PipelineError::InvalidOperator { .. })
    ));
    assert!(matches!(
        TextPipeline::new().then(TextOperator::split("")),
        Err(PipelineError::InvalidOperator { .. })
    ));
}

#[test]
fn unknown_operator_in_config_fails_to_parse() {
    let json = r#"[{"op": "lowercase"}, {"op": "soundex"}]"#;
    assert!(serde_json::from_str::<TextPipeline>(json).is_err());
}

#[test]
fn bad_config_documents_are_rejected() {
    assert!(matches!(
        NameMatchConfig::from_yaml("version: \"9\"\n"),
        Err(ConfigLoadError::UnsupportedVersion(_))
    ));
    assert!(matches!(
        NameMatchConfig::from_yaml("version: \"1.0\"\nmatcher:\n  min_document_frequency: 0\n"),
        Err(ConfigLoadError::Validation(_))
    ));
    assert!(matches!(
        NameMatchConfig::from_file("does/not/exist.yaml"),
        Err(ConfigLoadError::FileRead(_))
    ));
}

//! Loading the Sakurae grammar from its builtin and on-disk artifacts.

use sakurae_grammar::{
    load_checked, validate_entry_point, validate_grammar_load, ArtifactError, BuiltinGrammar,
    GrammarEntryPoint, GrammarFile, LoaderConfig, ValidationError, ValidationWarning, GRAMMAR_JSON,
};
use std::fs;
use std::path::Path;

fn write_artifact(dir: &Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("grammar.json");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_builtin_grammar_loads() {
    assert!(validate_grammar_load().is_ok());
}

#[test]
fn test_sakurae_tables() {
    let language = load_checked(&BuiltinGrammar).unwrap();
    let grammar = language.grammar().unwrap();

    assert_eq!(grammar.start_rule().map(|(name, _)| name), Some("source_file"));
    assert_eq!(language.id_for_node_kind("source_file", true), Some(1));
    assert!(language.id_for_node_kind("func_define_stmt", true).is_some());
    assert!(language.id_for_node_kind("->", false).is_some());
    assert!(!language.node_kind_for_id(2).unwrap().visible); // _field
    assert_eq!(language.field_count(), 0);

    // strings inside token() are not node kinds of their own
    assert!(language.id_for_node_kind("//", false).is_none());
}

#[test]
fn test_sakurae_keywords() {
    let language = load_checked(&BuiltinGrammar).unwrap();
    let keywords = language.keywords();
    for keyword in ["let", "func", "if", "else", "while", "for", "return", "i32", "true"] {
        assert!(keywords.iter().any(|k| k == keyword), "missing keyword {keyword}");
    }
    assert!(!keywords.iter().any(|k| k == "+="));
    assert!(!keywords.iter().any(|k| k == "->"));
}

#[test]
fn test_sakurae_unused_rule_is_a_warning() {
    let language = load_checked(&BuiltinGrammar).unwrap();
    assert_eq!(
        language.warnings(),
        [ValidationWarning::UnreachableRule("array_expr".into())]
    );
}

#[test]
fn test_artifact_file_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_artifact(dir.path(), GRAMMAR_JSON);
    let entry = GrammarFile::at("sakurae", path);
    assert!(validate_entry_point(&entry).is_ok());
}

#[test]
fn test_missing_artifact_fails_with_name() {
    let dir = tempfile::tempdir().unwrap();
    let entry = GrammarFile::at("sakurae", dir.path().join("grammar.json"));

    let err = validate_entry_point(&entry).unwrap_err();
    assert_eq!(err.to_string(), "Error loading sakurae grammar");
    assert!(matches!(err.cause(), Some(ArtifactError::NotFound(_))));
}

#[test]
fn test_corrupted_artifact_fails() {
    let dir = tempfile::tempdir().unwrap();
    let truncated = &GRAMMAR_JSON[..GRAMMAR_JSON.len() / 2];
    let entry = GrammarFile::at("sakurae", write_artifact(dir.path(), truncated));

    let err = validate_entry_point(&entry).unwrap_err();
    assert!(err.to_string().contains("sakurae"));
    assert!(matches!(err.cause(), Some(ArtifactError::Malformed(_))));
}

#[test]
fn test_dangling_reference_fails() {
    let dir = tempfile::tempdir().unwrap();
    let broken = GRAMMAR_JSON.replace(r#""name": "break_stmt""#, r#""name": "brake_stmt""#);
    assert_ne!(broken, GRAMMAR_JSON);
    let entry = GrammarFile::at("sakurae", write_artifact(dir.path(), &broken));

    let err = load_checked(&entry).unwrap_err();
    assert!(matches!(
        err.cause(),
        Some(ArtifactError::Invalid(ValidationError::UndefinedSymbol { symbol, .. })) if symbol == "brake_stmt"
    ));
}

#[test]
fn test_artifact_for_other_grammar_fails() {
    let dir = tempfile::tempdir().unwrap();
    let other = GRAMMAR_JSON.replacen(r#""name": "sakurae""#, r#""name": "sakparser""#, 1);
    let entry = GrammarFile::at("sakurae", write_artifact(dir.path(), &other));

    let err = load_checked(&entry).unwrap_err();
    assert!(matches!(err.cause(), Some(ArtifactError::NameMismatch { .. })));
}

#[test]
fn test_search_path_lookup() {
    let empty = tempfile::tempdir().unwrap();
    let installed = tempfile::tempdir().unwrap();
    fs::write(installed.path().join("sakurae.json"), GRAMMAR_JSON).unwrap();

    let config = LoaderConfig::default()
        .with_search_path(empty.path())
        .with_search_path(installed.path());
    let language = load_checked(&GrammarFile::search("sakurae", config)).unwrap();
    assert_eq!(language.name(), "sakurae");
}

#[test]
fn test_repeated_loads_agree() {
    let first = BuiltinGrammar.load().into_language().unwrap();
    let second = BuiltinGrammar.load().into_language().unwrap();

    assert_eq!(first.name(), second.name());
    assert_eq!(first.node_kind_count(), second.node_kind_count());
    assert_eq!(first.keywords(), second.keywords());
    assert_eq!(first.grammar(), second.grammar());

    let dir = tempfile::tempdir().unwrap();
    let missing = GrammarFile::at("sakurae", dir.path().join("absent.json"));
    assert!(validate_entry_point(&missing).is_err());
    assert!(validate_entry_point(&missing).is_err());
}

#[test]
fn test_checks_run_in_parallel() {
    let results: Vec<bool> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| validate_grammar_load().is_ok()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(results.into_iter().all(|ok| ok));
}

#[test]
fn test_language_crosses_threads() {
    let language = load_checked(&BuiltinGrammar).unwrap();
    let count = std::thread::spawn(move || language.node_kind_count())
        .join()
        .unwrap();
    assert!(count > 1);
}

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use ner_batch_core::batch::run_batch;
use ner_batch_core::config::{Config, ExecutionStrategy};
use ner_batch_core::{Match, NerError, RecognizerDescriptor};

const DOC: &str = "Alice works at Acme Corp.\n\nMr. Brown visited London.";

fn corpus() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("news/2020")).unwrap();
    fs::write(dir.path().join("news/a.plain"), DOC).unwrap();
    fs::write(dir.path().join("news/2020/b.plain"), "Zoë met Bob.\n\n\n\nThe End").unwrap();
    fs::write(dir.path().join("news/readme.txt"), "Alice").unwrap();
    dir
}

fn read_result(path: &Path) -> Vec<Vec<Match>> {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn span(start: usize, end: usize, label: &str, text: &str) -> Match {
    Match {
        span: [start, end],
        label: label.to_string(),
        text: text.to_string(),
    }
}

#[test]
fn test_sequential_rules_batch() {
    let dir = corpus();
    let rules = RecognizerDescriptor::preset("rules").unwrap();

    let report = run_batch(&rules, ExecutionStrategy::Sequential, &[dir.path()]).unwrap();
    assert_eq!(report.files, 2);
    assert_eq!(report.paragraphs, 2 + 3);
    assert_eq!(report.bytes, DOC.len() + "Zoë met Bob.\n\n\n\nThe End".len());

    let result = read_result(&dir.path().join("news/a.rules.json"));
    assert_eq!(
        result,
        vec![
            vec![span(0, 5, "PERSON", "Alice"), span(15, 24, "ORG", "Acme Corp")],
            vec![span(4, 9, "PERSON", "Brown")],
        ]
    );

    // Parágrafo vazio no meio continua presente
    let nested = read_result(&dir.path().join("news/2020/b.rules.json"));
    assert_eq!(nested.len(), 3);
    assert!(nested[1].is_empty());

    assert!(!dir.path().join("news/readme.rules.json").exists());
}

#[test]
fn test_output_layout_is_zero_indent_json() {
    let dir = corpus();
    let rules = RecognizerDescriptor::preset("rules").unwrap();
    run_batch(&rules, ExecutionStrategy::Sequential, &[dir.path()]).unwrap();

    let raw = fs::read_to_string(dir.path().join("news/a.rules.json")).unwrap();
    assert!(raw.starts_with("[\n[\n{\n\"span\": [\n0,\n5\n],\n\"label\": \"PERSON\","));
    assert!(!raw.contains("  "));
}

#[test]
fn test_pooled_matches_sequential() {
    let dir = corpus();
    let hybrid = RecognizerDescriptor::preset("hybrid").unwrap();

    run_batch(&hybrid, ExecutionStrategy::Sequential, &[dir.path()]).unwrap();
    let sequential = fs::read_to_string(dir.path().join("news/a.hybrid.json")).unwrap();

    let report = run_batch(&hybrid, ExecutionStrategy::Pooled { workers: 2 }, &[dir.path()]).unwrap();
    let pooled = fs::read_to_string(dir.path().join("news/a.hybrid.json")).unwrap();

    assert_eq!(report.files, 2);
    assert_eq!(sequential, pooled);
}

#[test]
fn test_batched_crf_invariants() {
    let dir = corpus();
    let crf = RecognizerDescriptor::preset("crf").unwrap();
    run_batch(&crf, ExecutionStrategy::Pooled { workers: 1 }, &[dir.path()]).unwrap();

    for (file, paragraphs) in [("news/a.crf.json", 2), ("news/2020/b.crf.json", 3)] {
        let result = read_result(&dir.path().join(file));
        assert_eq!(result.len(), paragraphs);
        for m in result.iter().flatten() {
            assert!(m.label == "ORG" || m.label == "PER", "{m:?}");
            assert_eq!(m.span[1] - m.span[0], m.text.chars().count());
        }
    }
}

#[test]
fn test_idempotent_runs() {
    let dir = corpus();
    let rules = RecognizerDescriptor::preset("rules").unwrap();
    let output = dir.path().join("news/2020/b.rules.json");

    run_batch(&rules, ExecutionStrategy::Sequential, &[dir.path()]).unwrap();
    let first = fs::read(&output).unwrap();
    run_batch(&rules, ExecutionStrategy::Sequential, &[dir.path()]).unwrap();
    assert_eq!(first, fs::read(&output).unwrap());
}

#[test]
fn test_configured_recognizer_name_drives_output() {
    let dir = corpus();
    let config = Config::from_toml_str(
        r#"
recognizer = "people"

[recognizers.people]
engine = "rules"
scheme = "conll"
allow = ["PER"]
"#,
    )
    .unwrap();
    let people = config.descriptor(config.active_recognizer()).unwrap();

    run_batch(&people, config.strategy(), &[dir.path()]).unwrap();
    let result = read_result(&dir.path().join("news/a.people.json"));
    assert_eq!(
        result,
        vec![vec![span(0, 5, "PER", "Alice")], vec![span(4, 9, "PER", "Brown")]]
    );
}

#[test]
fn test_unreadable_document_aborts_batch() {
    let dir = corpus();
    fs::write(dir.path().join("news/broken.plain"), [0xff, 0xfe, 0x00]).unwrap();
    let rules = RecognizerDescriptor::preset("rules").unwrap();

    let err = run_batch(&rules, ExecutionStrategy::Sequential, &[dir.path()]).unwrap_err();
    assert!(matches!(err, NerError::Io { path, .. } if path.ends_with("broken.plain")));
}

#[test]
fn test_unreadable_document_aborts_pooled_batch() {
    let dir = corpus();
    for i in 0..20 {
        fs::write(dir.path().join(format!("news/extra{i:02}.plain")), DOC).unwrap();
    }
    fs::write(dir.path().join("news/broken.plain"), [0xff, 0xfe, 0x00]).unwrap();
    let crf = RecognizerDescriptor::preset("crf").unwrap();

    let err = run_batch(&crf, ExecutionStrategy::Pooled { workers: 2 }, &[dir.path()]).unwrap_err();
    assert!(matches!(err, NerError::Io { path, .. } if path.ends_with("broken.plain")));
}

//! # Reposicionamento de Spans e Agregação por Parágrafo
//!
//! Recebe o documento já dividido em parágrafos e, para cada parágrafo, as
//! detecções relativas a cada sentença. Produz a lista de [`Match`]es por
//! parágrafo com offsets relativos ao **parágrafo**, mantendo apenas os rótulos
//! da allow-list.
//!
//! ```text
//! início no parágrafo = início da sentença + início da detecção
//! fim no parágrafo    = início no parágrafo + chars(texto da detecção)
//! ```
//!
//! O resultado tem sempre um elemento por parágrafo, mesmo que vazio.

use serde::{Deserialize, Serialize};

use crate::error::{NerError, Result};
use crate::recognizer::{AllowList, AnalysisOptions, Detection, Invocation, Recognizer};
use crate::sentence::Sentence;

/// Uma entidade na saída, com offsets em caracteres relativos ao parágrafo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub span: [usize; 2],
    pub label: String,
    pub text: String,
}

/// Resultado de um documento: uma lista de matches por parágrafo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    pub paragraphs: Vec<Vec<Match>>,
    /// Sentenças efetivamente enviadas ao reconhecedor
    pub sentences: usize,
}

impl Analysis {
    pub fn match_count(&self) -> usize {
        self.paragraphs.iter().map(Vec::len).sum()
    }
}

/// Divide o texto em parágrafos por `"\n\n"` exato.
///
/// Texto vazio gera um único parágrafo vazio; `"a\n\n\nb"` gera `["a", "\nb"]`.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    text.split("\n\n").collect()
}

/// Analisa o documento inteiro segundo o modo de invocação das opções.
///
/// Qualquer erro do reconhecedor aborta o documento sem resultado parcial.
pub fn analyze_document(
    recognizer: &dyn Recognizer,
    options: &AnalysisOptions,
    paragraphs: &[&str],
) -> Result<Analysis> {
    let split: Vec<Vec<Sentence>> = paragraphs
        .iter()
        .map(|p| options.splitter.split(p))
        .collect();
    let sentences = split.iter().map(Vec::len).sum();

    let paragraphs = match options.invocation {
        Invocation::PerSentence => split
            .iter()
            .map(|sentences| recognize_each(recognizer, sentences, &options.allow))
            .collect::<Result<Vec<_>>>()?,
        Invocation::Batched => {
            let texts: Vec<&str> = split.iter().flatten().map(|s| s.text).collect();
            let batch = recognizer.recognize_batch(&texts)?;
            if batch.len() != texts.len() {
                return Err(NerError::BatchMismatch {
                    expected: texts.len(),
                    got: batch.len(),
                });
            }

            // Redistribui as respostas pelos parágrafos, na ordem de envio
            let mut batch = batch.into_iter();
            split
                .iter()
                .map(|sentences| {
                    let mut matches = Vec::new();
                    for (sentence, detections) in sentences.iter().zip(batch.by_ref()) {
                        collect_matches(sentence, detections, &options.allow, &mut matches);
                    }
                    matches
                })
                .collect()
        }
    };

    Ok(Analysis {
        paragraphs,
        sentences,
    })
}

/// Uma chamada ao reconhecedor por sentença do parágrafo.
fn recognize_each(recognizer: &dyn Recognizer, sentences: &[Sentence], allow: &AllowList) -> Result<Vec<Match>> {
    let mut matches = Vec::new();
    for sentence in sentences {
        let detections = recognizer.recognize(sentence.text)?;
        collect_matches(sentence, detections, allow, &mut matches);
    }
    Ok(matches)
}

fn collect_matches(
    sentence: &Sentence,
    detections: Vec<Detection>,
    allow: &AllowList,
    out: &mut Vec<Match>,
) {
    for detection in detections {
        if !allow.contains(&detection.label) {
            continue;
        }
        let start = sentence.start + detection.start;
        let end = start + detection.text.chars().count();
        out.push(Match {
            span: [start, end],
            label: detection.label,
            text: detection.text,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::sentence::SplitterKind;

    /// Reconhecedor roteirizado: detecções fixas por sentença.
    #[derive(Default)]
    struct Scripted {
        by_sentence: HashMap<String, Vec<Detection>>,
        fail_on: Option<String>,
        calls: AtomicUsize,
        batch_calls: AtomicUsize,
        drop_last: bool,
    }

    impl Scripted {
        fn with(mut self, sentence: &str, detections: Vec<Detection>) -> Self {
            self.by_sentence.insert(sentence.to_string(), detections);
            self
        }
    }

    impl Recognizer for Scripted {
        fn recognize(&self, sentence: &str) -> Result<Vec<Detection>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on.as_deref() == Some(sentence) {
                return Err(NerError::Recognition {
                    sentence: sentence.to_string(),
                    message: "model crashed".to_string(),
                });
            }
            Ok(self.by_sentence.get(sentence).cloned().unwrap_or_default())
        }

        fn recognize_batch(&self, sentences: &[&str]) -> Result<Vec<Vec<Detection>>> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            let mut out: Vec<Vec<Detection>> =
                sentences.iter().map(|s| self.recognize(s)).collect::<Result<_>>()?;
            if self.drop_last {
                out.pop();
            }
            Ok(out)
        }
    }

    fn options(invocation: Invocation, allow: &[&str]) -> AnalysisOptions {
        AnalysisOptions {
            splitter: SplitterKind::Segtok,
            invocation,
            allow: allow.iter().copied().collect(),
        }
    }

    /// Documento de um único parágrafo; devolve os matches dele.
    fn single_paragraph(recognizer: &Scripted, opts: &AnalysisOptions, paragraph: &str) -> Vec<Match> {
        let analysis = analyze_document(recognizer, opts, &[paragraph]).unwrap();
        assert_eq!(analysis.paragraphs.len(), 1);
        analysis.paragraphs.into_iter().next().unwrap()
    }

    fn alice_and_bob() -> Scripted {
        Scripted::default()
            .with(
                "Alice works at Acme Corp.",
                vec![
                    Detection::new("PER", 0, 5, "Alice"),
                    Detection::new("ORG", 15, 24, "Acme Corp"),
                ],
            )
            .with("Carol left.", vec![Detection::new("PER", 0, 5, "Carol")])
            .with(
                "Bob lives in Paris.",
                vec![
                    Detection::new("PER", 0, 3, "Bob"),
                    Detection::new("LOC", 13, 18, "Paris"),
                ],
            )
    }

    #[test]
    fn test_single_sentence_matches() {
        let recognizer = alice_and_bob();
        let opts = options(Invocation::PerSentence, &["ORG", "PER"]);

        let matches = single_paragraph(&recognizer, &opts, "Alice works at Acme Corp.");
        assert_eq!(
            matches,
            vec![
                Match { span: [0, 5], label: "PER".into(), text: "Alice".into() },
                Match { span: [15, 24], label: "ORG".into(), text: "Acme Corp".into() },
            ]
        );
    }

    #[test]
    fn test_second_sentence_is_reoffset() {
        let recognizer = alice_and_bob();
        let opts = options(Invocation::PerSentence, &["LOC", "PER"]);

        let matches = single_paragraph(&recognizer, &opts, "Carol left. Bob lives in Paris.");
        let spans: Vec<[usize; 2]> = matches.iter().map(|m| m.span).collect();
        assert_eq!(spans, vec![[0, 5], [12, 15], [25, 30]]);
    }

    #[test]
    fn test_empty_paragraph_keeps_its_slot() {
        let recognizer = alice_and_bob();
        let opts = options(Invocation::PerSentence, &["ORG", "PER"]);
        let text = "Alice works at Acme Corp.\n\nNothing to see here.";

        let analysis = analyze_document(&recognizer, &opts, &split_paragraphs(text)).unwrap();
        assert_eq!(analysis.paragraphs.len(), 2);
        assert_eq!(analysis.paragraphs[0].len(), 2);
        assert!(analysis.paragraphs[1].is_empty());
        assert_eq!(analysis.sentences, 2);
    }

    #[test]
    fn test_whitespace_paragraph() {
        let recognizer = alice_and_bob();
        let opts = options(Invocation::PerSentence, &["PER"]);

        let analysis = analyze_document(&recognizer, &opts, &["   \n  "]).unwrap();
        assert_eq!(analysis.paragraphs, vec![Vec::<Match>::new()]);
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_allow_list_is_exact() {
        let recognizer = Scripted::default().with(
            "Alice met Bob.",
            vec![
                Detection::new("PERSON", 0, 5, "Alice"),
                Detection::new("PER", 10, 13, "Bob"),
            ],
        );
        let opts = options(Invocation::PerSentence, &["PERS"]);
        assert!(single_paragraph(&recognizer, &opts, "Alice met Bob.").is_empty());

        let opts = options(Invocation::PerSentence, &["PER"]);
        let matches = single_paragraph(&recognizer, &opts, "Alice met Bob.");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "Bob");
    }

    #[test]
    fn test_batched_equals_per_sentence() {
        let text = "Carol left. Bob lives in Paris.\n\n\n\nBob lives in Paris.";
        let paragraphs = split_paragraphs(text);

        let single = alice_and_bob();
        let per_sentence =
            analyze_document(&single, &options(Invocation::PerSentence, &["PER", "LOC"]), &paragraphs).unwrap();

        let batched_recognizer = alice_and_bob();
        let batched =
            analyze_document(&batched_recognizer, &options(Invocation::Batched, &["PER", "LOC"]), &paragraphs)
                .unwrap();

        assert_eq!(per_sentence, batched);
        assert_eq!(batched.paragraphs.len(), 3);
        assert!(batched.paragraphs[1].is_empty());
        assert_eq!(batched_recognizer.batch_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_span_length_matches_text() {
        let recognizer = Scripted::default().with(
            "Zoë visited Ålesund.",
            vec![Detection::new("LOC", 12, 99, "Ålesund")],
        );
        let opts = options(Invocation::PerSentence, &["LOC"]);

        let matches = single_paragraph(&recognizer, &opts, "  Zoë visited Ålesund.");
        assert_eq!(matches[0].span, [14, 21]);
        for m in &matches {
            assert_eq!(m.span[1] - m.span[0], m.text.chars().count());
        }
    }

    #[test]
    fn test_recognizer_error_aborts_document() {
        let recognizer = Scripted {
            fail_on: Some("Bob lives in Paris.".to_string()),
            ..alice_and_bob()
        };
        let opts = options(Invocation::PerSentence, &["PER"]);
        let paragraphs = ["Alice works at Acme Corp.", "Bob lives in Paris."];

        let err = analyze_document(&recognizer, &opts, &paragraphs).unwrap_err();
        assert!(matches!(err, NerError::Recognition { .. }));
    }

    #[test]
    fn test_short_batch_is_rejected() {
        let recognizer = Scripted {
            drop_last: true,
            ..alice_and_bob()
        };
        let opts = options(Invocation::Batched, &["PER"]);

        let err = analyze_document(&recognizer, &opts, &["Alice works at Acme Corp."]).unwrap_err();
        assert!(matches!(err, NerError::BatchMismatch { expected: 1, got: 0 }));
    }

    #[test]
    fn test_idempotent() {
        let recognizer = alice_and_bob();
        let opts = options(Invocation::PerSentence, &["ORG", "PER", "LOC"]);
        let paragraphs = split_paragraphs("Alice works at Acme Corp.\n\nBob lives in Paris.");

        let first = analyze_document(&recognizer, &opts, &paragraphs).unwrap();
        let second = analyze_document(&recognizer, &opts, &paragraphs).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_split_paragraphs() {
        assert_eq!(split_paragraphs(""), vec![""]);
        assert_eq!(split_paragraphs("a\n\n\nb"), vec!["a", "\nb"]);
        assert_eq!(split_paragraphs("a\n\nb\n\n"), vec!["a", "b", ""]);
    }
}

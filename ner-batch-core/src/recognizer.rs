//! # Reconhecedores
//!
//! Um reconhecedor recebe uma sentença e devolve [`Detection`]s com offsets
//! **em caracteres** relativos à sentença, no vocabulário de rótulos dele.
//!
//! O [`RecognizerDescriptor`] descreve tudo o que um lote precisa saber sobre o
//! reconhecedor ativo: nome (usado no arquivo de saída), motor, esquema de
//! rótulos e as [`AnalysisOptions`] do agregador. Cada worker do pool constrói a
//! própria instância a partir do descritor com [`RecognizerDescriptor::build`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NerError, Result};
use crate::pipeline::{EngineKind, NerPipeline};
use crate::sentence::SplitterKind;
use crate::tagger::LabelScheme;

/// Uma entidade reconhecida dentro de uma sentença.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    /// Rótulo no vocabulário do reconhecedor (ex: "PERSON", "PER").
    pub label: String,
    /// Offset em caracteres do início, relativo à sentença.
    pub start: usize,
    /// Offset em caracteres do fim (exclusivo), relativo à sentença.
    pub end: usize,
    /// Texto coberto.
    pub text: String,
}

impl Detection {
    pub fn new(label: impl Into<String>, start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            start,
            end,
            text: text.into(),
        }
    }
}

/// Contrato de um reconhecedor de entidades.
///
/// `recognize_batch` recebe todas as sentenças de um documento de uma vez e deve
/// devolver uma lista por sentença, na mesma ordem.
pub trait Recognizer: Send {
    fn recognize(&self, sentence: &str) -> Result<Vec<Detection>>;

    fn recognize_batch(&self, sentences: &[&str]) -> Result<Vec<Vec<Detection>>> {
        sentences.iter().map(|s| self.recognize(s)).collect()
    }
}

/// Reconhecedor apoiado no [`NerPipeline`] embutido.
#[derive(Debug, Clone)]
pub struct EngineRecognizer {
    pipeline: NerPipeline,
    engine: EngineKind,
    scheme: LabelScheme,
}

impl EngineRecognizer {
    pub fn new(engine: EngineKind, scheme: LabelScheme) -> Self {
        Self {
            pipeline: NerPipeline::new(),
            engine,
            scheme,
        }
    }
}

impl Recognizer for EngineRecognizer {
    fn recognize(&self, sentence: &str) -> Result<Vec<Detection>> {
        let (_, spans) = self.pipeline.analyze(sentence, self.engine);

        // Spans saem em ordem crescente de byte: converte com um único passe
        let mut byte = 0;
        let mut chars = 0;
        let mut detections = Vec::with_capacity(spans.len());
        for span in spans {
            chars += sentence[byte..span.start].chars().count();
            byte = span.start;
            let start = chars;
            let end = start + span.text.chars().count();
            detections.push(Detection::new(self.scheme.label(span.category), start, end, span.text));
        }
        Ok(detections)
    }

    /// As sentenças são independentes entre si e o pipeline é somente leitura.
    ///
    /// Só paraleliza dentro de um pool já instalado; fora dele (modo sequencial)
    /// roda na thread atual em vez de ocupar o pool global do rayon.
    fn recognize_batch(&self, sentences: &[&str]) -> Result<Vec<Vec<Detection>>> {
        if in_worker_pool() {
            sentences.par_iter().map(|s| self.recognize(s)).collect()
        } else {
            sentences.iter().map(|s| self.recognize(s)).collect()
        }
    }
}

fn in_worker_pool() -> bool {
    rayon::current_thread_index().is_some()
}

/// Como o agregador entrega as sentenças ao reconhecedor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Invocation {
    /// Uma chamada de `recognize` por sentença.
    #[default]
    PerSentence,
    /// Uma única chamada de `recognize_batch` com todas as sentenças do documento.
    Batched,
}

impl Invocation {
    pub fn name(&self) -> &'static str {
        match self {
            Invocation::PerSentence => "per-sentence",
            Invocation::Batched => "batched",
        }
    }
}

impl FromStr for Invocation {
    type Err = NerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "per-sentence" => Ok(Invocation::PerSentence),
            "batched" => Ok(Invocation::Batched),
            other => Err(NerError::InvalidConfig(format!("unknown invocation: {other}"))),
        }
    }
}

/// Rótulos mantidos na saída. A comparação é exata: "PER" não aceita "PERSON".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowList(BTreeSet<String>);

impl AllowList {
    pub fn contains(&self, label: &str) -> bool {
        self.0.contains(label)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for AllowList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for AllowList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.iter().collect();
        write!(f, "{}", labels.join(","))
    }
}

/// Parâmetros do agregador que acompanham cada reconhecedor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub splitter: SplitterKind,
    pub invocation: Invocation,
    pub allow: AllowList,
}

/// Descrição completa de um reconhecedor nomeado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizerDescriptor {
    /// Nome usado na seleção e no nome do arquivo de saída.
    pub name: String,
    pub engine: EngineKind,
    pub scheme: LabelScheme,
    pub options: AnalysisOptions,
}

impl RecognizerDescriptor {
    /// Constrói uma instância nova do reconhecedor.
    pub fn build(&self) -> Box<dyn Recognizer> {
        debug!(
            recognizer = %self.name,
            engine = self.engine.name(),
            scheme = self.scheme.name(),
            "building recognizer"
        );
        Box::new(EngineRecognizer::new(self.engine, self.scheme))
    }

    /// Reconhecedores embutidos. O primeiro listado não é o padrão; veja [`DEFAULT_RECOGNIZER`].
    pub fn presets() -> Vec<RecognizerDescriptor> {
        vec![
            preset(
                "rules",
                EngineKind::Rules,
                LabelScheme::OntoNotes,
                SplitterKind::Segtok,
                Invocation::PerSentence,
                &["ORG", "PERSON"],
            ),
            preset(
                "hybrid",
                EngineKind::Hybrid,
                LabelScheme::OntoNotes,
                SplitterKind::Paragraph,
                Invocation::PerSentence,
                &["GPE", "ORG"],
            ),
            preset(
                "crf",
                EngineKind::Crf,
                LabelScheme::Conll,
                SplitterKind::Segtok,
                Invocation::Batched,
                &["ORG", "PER"],
            ),
        ]
    }

    pub fn preset(name: &str) -> Option<RecognizerDescriptor> {
        Self::presets().into_iter().find(|d| d.name == name)
    }
}

/// Reconhecedor usado quando nada é configurado.
pub const DEFAULT_RECOGNIZER: &str = "hybrid";

fn preset(
    name: &str,
    engine: EngineKind,
    scheme: LabelScheme,
    splitter: SplitterKind,
    invocation: Invocation,
    allow: &[&str],
) -> RecognizerDescriptor {
    RecognizerDescriptor {
        name: name.to_string(),
        engine,
        scheme,
        options: AnalysisOptions {
            splitter,
            invocation,
            allow: allow.iter().copied().collect(),
        },
    }
}

//! Erros do processamento em lote.
//!
//! Nenhum erro é recuperado: uma falha ao ler, reconhecer ou gravar um documento
//! aborta o documento e, por consequência, o lote inteiro.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NerError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid config file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown recognizer: {0}")]
    UnknownRecognizer(String),

    #[error("Recognizer failed on sentence {sentence:?}: {message}")]
    Recognition { sentence: String, message: String },

    #[error("Batched recognizer returned {got} results for {expected} sentences")]
    BatchMismatch { expected: usize, got: usize },

    #[error("Invalid span [{start}, {end}] in paragraph {paragraph}")]
    InvalidSpan {
        paragraph: usize,
        start: usize,
        end: usize,
    },

    #[error("Result file {index} has {got} paragraphs, document has {expected}")]
    ParagraphMismatch {
        index: usize,
        expected: usize,
        got: usize,
    },

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl NerError {
    /// Associa um erro de I/O ao caminho que o causou.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NerError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, NerError>;

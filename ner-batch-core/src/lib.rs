//! # ner-batch-core — Reconhecimento de Entidades Nomeadas em Lote
//!
//! Executa NER sobre árvores de arquivos `.plain` e grava, ao lado de cada
//! entrada, um JSON com as entidades de cada parágrafo.
//!
//! ## Arquitetura
//!
//! O dado flui em camadas:
//!
//! 1.  **Documento** ([`aggregate`]): o texto é dividido em parágrafos por `"\n\n"`.
//! 2.  **Sentenças** ([`sentence`]): cada parágrafo é dividido pelo divisor do
//!     reconhecedor (segtok, UAX #29 ou o parágrafo inteiro).
//! 3.  **Reconhecedor** ([`recognizer`]): devolve detecções relativas à sentença,
//!     em caracteres, no vocabulário de rótulos dele ([`tagger::LabelScheme`]).
//!     Os reconhecedores embutidos usam o [`pipeline`]:
//!     *   **Tokenização** ([`tokenizer`]) com offsets em bytes.
//!     *   **Regras/Gazetteers** ([`rule_based`]).
//!     *   **CRF + Viterbi** ([`features`], [`crf`], [`viterbi`]).
//! 4.  **Agregação** ([`aggregate`]): offsets voltam para o parágrafo e só os
//!     rótulos da allow-list sobrevivem.
//! 5.  **Lote** ([`batch`]): descoberta, execução sequencial ou em pool e escrita.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use ner_batch_core::aggregate::{analyze_document, split_paragraphs};
//! use ner_batch_core::recognizer::RecognizerDescriptor;
//!
//! let descriptor = RecognizerDescriptor::preset("rules").unwrap();
//! let recognizer = descriptor.build();
//!
//! let text = "Alice works at Acme Corp.\n\nNothing here.";
//! let analysis = analyze_document(recognizer.as_ref(), &descriptor.options, &split_paragraphs(text)).unwrap();
//!
//! assert_eq!(analysis.paragraphs.len(), 2);
//! assert_eq!(analysis.paragraphs[0][0].span, [0, 5]);
//! assert_eq!(analysis.paragraphs[0][0].label, "PERSON");
//! assert!(analysis.paragraphs[1].is_empty());
//! ```

pub mod aggregate;
pub mod batch;
pub mod config;
pub mod crf;
pub mod error;
pub mod features;
pub mod highlight;
pub mod model;
pub mod pipeline;
pub mod recognizer;
pub mod rule_based;
pub mod sentence;
pub mod tagger;
pub mod tokenizer;
pub mod viterbi;

pub use aggregate::{Analysis, Match};
pub use batch::{run_batch, BatchReport, FileReport, Job};
pub use config::{Config, ExecutionStrategy};
pub use error::{NerError, Result};
pub use pipeline::{EngineKind, NerPipeline};
pub use recognizer::{AnalysisOptions, Detection, Invocation, Recognizer, RecognizerDescriptor};
pub use sentence::{Sentence, SplitterKind};
pub use tagger::{EntityCategory, EntitySpan, LabelScheme, Tag, TaggedToken};
pub use tokenizer::Token;

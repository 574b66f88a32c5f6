//! Configuração opcional em TOML.
//!
//! ```toml
//! recognizer = "crf"
//!
//! [execution]
//! strategy = "pooled"
//! workers = 8
//!
//! [recognizers.people]
//! engine = "rules"
//! scheme = "conll"
//! allow = ["PER"]
//! ```
//!
//! Uma entrada em `[recognizers]` com o nome de um reconhecedor embutido
//! sobrescreve apenas os campos informados; um nome novo parte dos valores
//! padrão e precisa declarar a própria allow-list.

use std::collections::BTreeMap;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NerError, Result};
use crate::pipeline::EngineKind;
use crate::recognizer::{
    AllowList, AnalysisOptions, Invocation, RecognizerDescriptor, DEFAULT_RECOGNIZER,
};
use crate::sentence::SplitterKind;
use crate::tagger::LabelScheme;

/// Nome do arquivo procurado no diretório atual quando `--config` não é passado.
pub const CONFIG_FILE_NAME: &str = "ner-batch.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Reconhecedor ativo; `hybrid` quando ausente.
    #[serde(default)]
    pub recognizer: Option<String>,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub recognizers: BTreeMap<String, RecognizerConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub strategy: StrategyKind,
    /// Só vale para `pooled`; padrão = CPUs disponíveis.
    #[serde(default)]
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Sequential,
    #[default]
    Pooled,
}

/// Campos opcionais de um reconhecedor declarado no arquivo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecognizerConfig {
    pub engine: Option<EngineKind>,
    pub scheme: Option<LabelScheme>,
    pub splitter: Option<SplitterKind>,
    pub invocation: Option<Invocation>,
    pub allow: Option<Vec<String>>,
}

/// Como os documentos do lote são distribuídos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Um único worker, na ordem de descoberta.
    Sequential,
    /// Pool de threads de tamanho fixo; cada worker tem o próprio reconhecedor.
    Pooled { workers: usize },
}

fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

impl Config {
    /// Lê e valida um arquivo de configuração.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| NerError::io(path, e))?;
        let config = Self::parse(&content, path)?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Usa `explicit` se informado; senão `ner-batch.toml` no diretório atual, se existir.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let local = Path::new(CONFIG_FILE_NAME);
                if local.is_file() {
                    Self::load(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Self::parse(content, Path::new("<inline>"))
    }

    fn parse(content: &str, path: &Path) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(|source| NerError::ConfigParse {
            path: PathBuf::from(path),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.execution.workers == Some(0) {
            return Err(NerError::InvalidConfig("workers must be at least 1".to_string()));
        }
        if let Some(name) = &self.recognizer {
            validate_name(name)?;
        }
        for name in self.recognizers.keys() {
            validate_name(name)?;
        }
        // Resolve todos para pegar allow-lists vazias já na carga
        self.descriptors().map(|_| ())
    }

    /// Nome do reconhecedor ativo.
    pub fn active_recognizer(&self) -> &str {
        self.recognizer.as_deref().unwrap_or(DEFAULT_RECOGNIZER)
    }

    pub fn strategy(&self) -> ExecutionStrategy {
        match self.execution.strategy {
            StrategyKind::Sequential => ExecutionStrategy::Sequential,
            StrategyKind::Pooled => ExecutionStrategy::Pooled {
                workers: self.execution.workers.unwrap_or_else(available_workers),
            },
        }
    }

    /// Resolve um reconhecedor pelo nome: embutido, declarado, ou os dois sobrepostos.
    pub fn descriptor(&self, name: &str) -> Result<RecognizerDescriptor> {
        let base = RecognizerDescriptor::preset(name);
        let custom = self.recognizers.get(name);

        let descriptor = match (base, custom) {
            (Some(base), None) => base,
            (base, Some(custom)) => {
                let base = base.unwrap_or_else(|| RecognizerDescriptor {
                    name: name.to_string(),
                    engine: EngineKind::default(),
                    scheme: LabelScheme::default(),
                    options: AnalysisOptions {
                        splitter: SplitterKind::default(),
                        invocation: Invocation::default(),
                        allow: AllowList::default(),
                    },
                });
                custom.overlay(base)
            }
            (None, None) => return Err(NerError::UnknownRecognizer(name.to_string())),
        };
        check_allow(descriptor)
    }

    /// Como [`Config::descriptor`], com os campos de `overrides` (flags da linha
    /// de comando) aplicados por cima.
    pub fn descriptor_with(&self, name: &str, overrides: &RecognizerConfig) -> Result<RecognizerDescriptor> {
        let descriptor = overrides.overlay(self.descriptor(name)?);
        check_allow(descriptor)
    }

    /// Todos os reconhecedores disponíveis: embutidos primeiro, depois os declarados.
    pub fn descriptors(&self) -> Result<Vec<RecognizerDescriptor>> {
        let mut names: Vec<String> = RecognizerDescriptor::presets()
            .into_iter()
            .map(|d| d.name)
            .collect();
        for name in self.recognizers.keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names.iter().map(|name| self.descriptor(name)).collect()
    }
}

impl RecognizerConfig {
    /// Sobrescreve no descritor apenas os campos presentes.
    pub fn overlay(&self, mut base: RecognizerDescriptor) -> RecognizerDescriptor {
        if let Some(engine) = self.engine {
            base.engine = engine;
        }
        if let Some(scheme) = self.scheme {
            base.scheme = scheme;
        }
        if let Some(splitter) = self.splitter {
            base.options.splitter = splitter;
        }
        if let Some(invocation) = self.invocation {
            base.options.invocation = invocation;
        }
        if let Some(allow) = &self.allow {
            base.options.allow = allow.iter().cloned().collect();
        }
        base
    }
}

fn check_allow(descriptor: RecognizerDescriptor) -> Result<RecognizerDescriptor> {
    if descriptor.options.allow.is_empty() {
        return Err(NerError::InvalidConfig(format!(
            "recognizer {} has an empty allow-list",
            descriptor.name
        )));
    }
    Ok(descriptor)
}

/// O nome vira parte do arquivo de saída: nada de separadores de caminho ou pontos.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains('.') {
        return Err(NerError::InvalidConfig(format!(
            "invalid recognizer name {name:?}"
        )));
    }
    Ok(())
}

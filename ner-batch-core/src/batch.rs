//! # Execução em Lote
//!
//! Descobre os arquivos `.plain` sob cada diretório, analisa cada um com o
//! reconhecedor ativo e grava `<stem>.<reconhecedor>.json` ao lado da entrada.
//!
//! Documentos são independentes. No modo sequencial são processados na ordem de
//! descoberta; no modo em pool cada worker constrói o próprio reconhecedor e não
//! há garantia de ordem entre documentos. O primeiro erro aborta o lote.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::aggregate::{analyze_document, split_paragraphs, Match};
use crate::config::ExecutionStrategy;
use crate::error::{NerError, Result};
use crate::recognizer::{AnalysisOptions, Recognizer, RecognizerDescriptor};

/// Extensão dos arquivos de entrada.
pub const INPUT_EXTENSION: &str = ".plain";

/// Um documento a analisar e o arquivo de resultado correspondente.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Totais de um documento analisado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub paragraphs: usize,
    pub sentences: usize,
    pub matches: usize,
    pub bytes: usize,
}

/// Totais do lote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub files: usize,
    pub paragraphs: usize,
    pub sentences: usize,
    pub matches: usize,
    pub bytes: usize,
    pub elapsed: Duration,
}

impl BatchReport {
    fn add(&mut self, file: &FileReport) {
        self.files += 1;
        self.paragraphs += file.paragraphs;
        self.sentences += file.sentences;
        self.matches += file.matches;
        self.bytes += file.bytes;
    }
}

/// `<dir>/<stem>.plain` → `<dir>/<stem>.<recognizer>.json`
pub fn output_path(input: &Path, recognizer: &str) -> PathBuf {
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name.strip_suffix(INPUT_EXTENSION).unwrap_or(&file_name);
    input.with_file_name(format!("{stem}.{recognizer}.json"))
}

/// Todos os `.plain` sob as raízes, em ordem de nome dentro de cada raiz.
///
/// Entradas ilegíveis são registradas e ignoradas.
pub fn discover_inputs<P: AsRef<Path>>(roots: &[P]) -> Vec<PathBuf> {
    let mut inputs = Vec::new();
    for root in roots {
        let root = root.as_ref();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(root = %root.display(), error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            let is_input = entry.file_type().is_file()
                && entry.file_name().to_string_lossy().ends_with(INPUT_EXTENSION);
            if is_input {
                inputs.push(entry.into_path());
            }
        }
    }
    debug!(count = inputs.len(), "inputs discovered");
    inputs
}

/// Descobre as entradas e associa cada uma ao seu arquivo de saída.
pub fn discover<P: AsRef<Path>>(roots: &[P], recognizer: &str) -> Vec<Job> {
    discover_inputs(roots)
        .into_iter()
        .map(|input| Job {
            output: output_path(&input, recognizer),
            input,
        })
        .collect()
}

/// Lê, analisa e grava o resultado de um documento.
pub fn analyze_file(recognizer: &dyn Recognizer, options: &AnalysisOptions, job: &Job) -> Result<FileReport> {
    let text = fs::read_to_string(&job.input).map_err(|e| NerError::io(&job.input, e))?;
    let paragraphs = split_paragraphs(&text);
    let analysis = analyze_document(recognizer, options, &paragraphs)?;
    write_result(&job.output, &analysis.paragraphs)?;

    let report = FileReport {
        input: job.input.clone(),
        output: job.output.clone(),
        paragraphs: paragraphs.len(),
        sentences: analysis.sentences,
        matches: analysis.match_count(),
        bytes: text.len(),
    };
    info!(
        path = %job.input.display(),
        paragraphs = report.paragraphs,
        matches = report.matches,
        "document analyzed"
    );
    Ok(report)
}

/// Serializa o resultado com uma quebra de linha entre elementos e sem indentação.
pub fn to_json(paragraphs: &[Vec<Match>]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    paragraphs.serialize(&mut serializer)?;
    Ok(buf)
}

/// Grava em `<output>.tmp` e renomeia: quem lê nunca vê um arquivo pela metade.
pub fn write_result(output: &Path, paragraphs: &[Vec<Match>]) -> Result<()> {
    let json = to_json(paragraphs)?;

    let mut tmp = OsString::from(output.as_os_str());
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, json).map_err(|e| NerError::io(&tmp, e))?;
    fs::rename(&tmp, output).map_err(|e| {
        if let Err(cleanup) = fs::remove_file(&tmp) {
            warn!(path = %tmp.display(), error = %cleanup, "could not remove temporary file");
        }
        NerError::io(output, e)
    })
}

/// Executa o lote inteiro com o reconhecedor e a estratégia dados.
pub fn run_batch<P: AsRef<Path>>(
    descriptor: &RecognizerDescriptor,
    strategy: ExecutionStrategy,
    roots: &[P],
) -> Result<BatchReport> {
    let started = Instant::now();
    let jobs = discover(roots, &descriptor.name);
    info!(
        recognizer = %descriptor.name,
        files = jobs.len(),
        strategy = ?strategy,
        "starting batch"
    );

    let files = match strategy {
        ExecutionStrategy::Sequential => {
            let recognizer = descriptor.build();
            jobs.iter()
                .map(|job| analyze_file(recognizer.as_ref(), &descriptor.options, job))
                .collect::<Result<Vec<_>>>()?
        }
        ExecutionStrategy::Pooled { workers } => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("ner-worker-{i}"))
                .build()?;
            pool.install(|| {
                jobs.par_iter()
                    .map_init(
                        || descriptor.build(),
                        |recognizer, job| analyze_file(recognizer.as_ref(), &descriptor.options, job),
                    )
                    .collect::<Result<Vec<_>>>()
            })?
        }
    };

    let mut report = BatchReport::default();
    for file in &files {
        report.add(file);
    }
    report.elapsed = started.elapsed();
    info!(
        files = report.files,
        matches = report.matches,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "batch finished"
    );
    Ok(report)
}

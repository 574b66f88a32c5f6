//! # Divisão de Parágrafos em Sentenças
//!
//! Cada reconhecedor escolhe um divisor de sentenças. A saída é sempre a mesma:
//! uma lista ordenada de [`Sentence`], cada uma com o texto (já sem espaços nas
//! bordas) e o offset **em caracteres** do seu primeiro caractere dentro do
//! parágrafo. Sentenças vazias nunca são emitidas.
//!
//! ## Estratégias
//!
//! - **Segtok**: regras no estilo do `segtok`. Um `.`, `!` ou `?` (seguido de aspas
//!   ou parênteses de fechamento) termina a sentença quando vem seguido de espaço e
//!   de maiúscula, dígito ou aspas de abertura. O ponto de abreviações (`Dr.`) e de
//!   iniciais (`J.`) não termina a sentença. Quebras de linha sempre terminam.
//! - **Unicode**: fronteiras de sentença do UAX #29 (`unicode-segmentation`).
//! - **Paragraph**: o parágrafo inteiro é uma única sentença; útil para motores que
//!   recebem o parágrafo de uma vez.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::NerError;
use crate::tokenizer::{is_abbreviation, is_initialism};

/// Uma sentença dentro de um parágrafo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence<'a> {
    /// Texto da sentença, sem espaços nas bordas.
    pub text: &'a str,
    /// Offset em caracteres do início da sentença no parágrafo.
    pub start: usize,
}

/// Divisor de sentenças usado por um reconhecedor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitterKind {
    #[default]
    Segtok,
    Unicode,
    Paragraph,
}

impl SplitterKind {
    pub fn name(&self) -> &'static str {
        match self {
            SplitterKind::Segtok => "segtok",
            SplitterKind::Unicode => "unicode",
            SplitterKind::Paragraph => "paragraph",
        }
    }

    /// Divide o parágrafo em sentenças não vazias, em ordem.
    pub fn split<'a>(&self, paragraph: &'a str) -> Vec<Sentence<'a>> {
        let pieces = match self {
            SplitterKind::Segtok => segtok_pieces(paragraph),
            SplitterKind::Unicode => paragraph
                .split_sentence_bound_indices()
                .map(|(start, piece)| (start, start + piece.len()))
                .collect(),
            SplitterKind::Paragraph => vec![(0, paragraph.len())],
        };

        let mut chars = CharCursor::new(paragraph);
        pieces
            .into_iter()
            .filter_map(|(start, end)| {
                let piece = &paragraph[start..end];
                let text = piece.trim();
                if text.is_empty() {
                    return None;
                }
                let byte_start = start + (piece.len() - piece.trim_start().len());
                Some(Sentence {
                    text,
                    start: chars.advance_to(byte_start),
                })
            })
            .collect()
    }
}

impl FromStr for SplitterKind {
    type Err = NerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "segtok" => Ok(SplitterKind::Segtok),
            "unicode" => Ok(SplitterKind::Unicode),
            "paragraph" => Ok(SplitterKind::Paragraph),
            other => Err(NerError::InvalidConfig(format!("unknown splitter: {other}"))),
        }
    }
}

/// Converte offsets de byte crescentes em offsets de caractere sem reler o prefixo.
struct CharCursor<'a> {
    text: &'a str,
    byte: usize,
    chars: usize,
}

impl<'a> CharCursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, byte: 0, chars: 0 }
    }

    fn advance_to(&mut self, byte: usize) -> usize {
        self.chars += self.text[self.byte..byte].chars().count();
        self.byte = byte;
        self.chars
    }
}

/// Candidatos a fim de sentença: terminadores, fechamentos opcionais e espaço.
fn boundary_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"[.!?]+["'”’)\]]*[ \t\u{a0}]+"#).expect("valid sentence boundary regex")
    })
}

/// Faixas de bytes (não aparadas) das sentenças segundo as regras segtok.
fn segtok_pieces(paragraph: &str) -> Vec<(usize, usize)> {
    let mut pieces = Vec::new();
    let mut line_start = 0;

    for line in paragraph.split_inclusive('\n') {
        let mut start = 0;
        for m in boundary_regex().find_iter(line) {
            if is_boundary(line, m.start(), m.end()) {
                pieces.push((line_start + start, line_start + m.end()));
                start = m.end();
            }
        }
        pieces.push((line_start + start, line_start + line.len()));
        line_start += line.len();
    }
    pieces
}

/// Decide se o terminador em `line[term..next]` realmente fecha a sentença.
fn is_boundary(line: &str, term: usize, next: usize) -> bool {
    let following = match line[next..].chars().next() {
        Some(c) => c,
        None => return false,
    };
    let opens = following.is_uppercase()
        || following.is_numeric()
        || matches!(following, '"' | '\'' | '“' | '‘' | '(' | '[');
    if !opens {
        return false;
    }

    let terminators = line[term..next].trim_end_matches(|c: char| !matches!(c, '.' | '!' | '?'));
    if terminators != "." {
        return true;
    }

    // Ponto simples: verifica a palavra anterior
    let word = line[..term]
        .rsplit(|c: char| c.is_whitespace())
        .next()
        .unwrap_or("")
        .trim_start_matches(|c: char| !c.is_alphanumeric());
    !(is_abbreviation(word) || is_initialism(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(kind: SplitterKind, paragraph: &str) -> Vec<(String, usize)> {
        kind.split(paragraph)
            .into_iter()
            .map(|s| (s.text.to_string(), s.start))
            .collect()
    }

    #[test]
    fn test_segtok_basic() {
        let got = texts(SplitterKind::Segtok, "Alice works at Acme. Bob lives in Paris.");
        assert_eq!(
            got,
            vec![
                ("Alice works at Acme.".to_string(), 0),
                ("Bob lives in Paris.".to_string(), 21),
            ]
        );
    }

    #[test]
    fn test_segtok_abbreviations_do_not_split() {
        let got = texts(SplitterKind::Segtok, "Dr. Smith met J. Doe in the U.S. Army. Then he left.");
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].0, "Dr. Smith met J. Doe in the U.S. Army.");
        assert_eq!(got[1].0, "Then he left.");
    }

    #[test]
    fn test_segtok_lowercase_continuation() {
        let got = texts(SplitterKind::Segtok, "It costs approx. five dollars. Really? Yes!");
        let sentences: Vec<&str> = got.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(sentences, vec!["It costs approx. five dollars.", "Really?", "Yes!"]);
    }

    #[test]
    fn test_segtok_line_breaks() {
        let got = texts(SplitterKind::Segtok, "Title line\nBody text here");
        assert_eq!(
            got,
            vec![("Title line".to_string(), 0), ("Body text here".to_string(), 11)]
        );
    }

    #[test]
    fn test_start_offsets_are_chars() {
        let got = texts(SplitterKind::Segtok, "Zoë left. Ana stayed.");
        assert_eq!(got[1], ("Ana stayed.".to_string(), 10));
    }

    #[test]
    fn test_leading_whitespace_offset() {
        let got = texts(SplitterKind::Paragraph, "  \nHello there  ");
        assert_eq!(got, vec![("Hello there".to_string(), 3)]);
    }

    #[test]
    fn test_unicode_splitter() {
        let got = texts(SplitterKind::Unicode, "One sentence here. Another one.");
        assert_eq!(
            got,
            vec![
                ("One sentence here.".to_string(), 0),
                ("Another one.".to_string(), 19),
            ]
        );
    }

    #[test]
    fn test_whitespace_paragraph_yields_nothing() {
        for kind in [SplitterKind::Segtok, SplitterKind::Unicode, SplitterKind::Paragraph] {
            assert!(kind.split("  \n \t ").is_empty(), "{:?}", kind);
            assert!(kind.split("").is_empty(), "{:?}", kind);
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("unicode".parse::<SplitterKind>().unwrap(), SplitterKind::Unicode);
        assert!("nltk".parse::<SplitterKind>().is_err());
    }
}

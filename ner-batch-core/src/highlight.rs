//! # Visualização HTML dos Resultados
//!
//! Sobrepõe os resultados de um ou mais reconhecedores ao texto original. Cada
//! parágrafo vira um `<p>`; trechos cobertos por matches viram
//! `<span class="i1 i2">` com uma classe por arquivo de entrada ativo naquele
//! ponto, e o início de cada match recebe um rótulo
//! `<div class="label" input="k" title="texto">LABEL</div>`.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::aggregate::{split_paragraphs, Match};
use crate::error::{NerError, Result};

/// Traduz offsets de caractere em offsets de byte, avançando só para frente.
///
/// Consultas crescentes custam o trecho percorrido desde a anterior; uma consulta
/// para trás recomeça do início do texto.
#[derive(Debug, Clone)]
pub struct IndexTranslator<'a> {
    text: &'a str,
    byte: usize,
    chars: usize,
}

impl<'a> IndexTranslator<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, byte: 0, chars: 0 }
    }

    /// Byte correspondente ao caractere `char_idx`; `None` além do fim do texto.
    pub fn byte_index(&mut self, char_idx: usize) -> Option<usize> {
        if char_idx < self.chars {
            self.byte = 0;
            self.chars = 0;
        }
        let text = self.text;
        let mut iter = text[self.byte..].chars();
        while self.chars < char_idx {
            let ch = iter.next()?;
            self.byte += ch.len_utf8();
            self.chars += 1;
        }
        Some(self.byte)
    }
}

/// Uma borda de match dentro do parágrafo.
struct Edge<'m> {
    char_idx: usize,
    /// Fins vêm antes de inícios na mesma posição
    is_start: bool,
    input: usize,
    m: &'m Match,
}

/// Gera a página HTML completa.
///
/// `results[k]` é o resultado do k-ésimo arquivo e precisa ter um elemento por
/// parágrafo de `plain`.
pub fn render_html(plain: &str, results: &[Vec<Vec<Match>>]) -> Result<String> {
    let paragraphs = split_paragraphs(plain);
    for (index, result) in results.iter().enumerate() {
        if result.len() != paragraphs.len() {
            return Err(NerError::ParagraphMismatch {
                index: index + 1,
                expected: paragraphs.len(),
                got: result.len(),
            });
        }
    }

    let mut out = String::with_capacity(2 * plain.len());
    out.push_str(HEAD);
    out.push_str(&extra_styles(results.len()));
    out.push_str(BODY);
    for (para_idx, paragraph) in paragraphs.iter().enumerate() {
        let matches: Vec<&[Match]> = results.iter().map(|r| r[para_idx].as_slice()).collect();
        render_paragraph(para_idx, paragraph, &matches, &mut out)?;
    }
    out.push_str(TAIL);
    Ok(out)
}

fn render_paragraph(para_idx: usize, paragraph: &str, matches: &[&[Match]], out: &mut String) -> Result<()> {
    let mut edges = Vec::new();
    for (input, list) in matches.iter().enumerate() {
        for m in list.iter() {
            let [start, end] = m.span;
            if end <= start {
                return Err(NerError::InvalidSpan { paragraph: para_idx, start, end });
            }
            edges.push(Edge { char_idx: start, is_start: true, input, m });
            edges.push(Edge { char_idx: end, is_start: false, input, m });
        }
    }
    edges.sort_by_key(|e| (e.char_idx, e.is_start, e.input));

    out.push_str("<p>");
    let mut translator = IndexTranslator::new(paragraph);
    let mut active = vec![0usize; matches.len()];
    let mut last = 0;
    let mut i = 0;

    while i < edges.len() {
        let char_idx = edges[i].char_idx;
        let pos = translator.byte_index(char_idx).ok_or(NerError::InvalidSpan {
            paragraph: para_idx,
            start: edges[i].m.span[0],
            end: edges[i].m.span[1],
        })?;

        out.push_str(&escape_html(&paragraph[last..pos]));
        if active.iter().any(|&n| n > 0) {
            out.push_str("</span>");
        }

        while i < edges.len() && edges[i].char_idx == char_idx {
            let edge = &edges[i];
            if edge.is_start {
                let _ = write!(
                    out,
                    "<div class=\"label\" input=\"{}\" title=\"{}\">{}</div>",
                    edge.input + 1,
                    escape_html(&edge.m.text),
                    escape_html(&edge.m.label)
                );
                active[edge.input] += 1;
            } else {
                active[edge.input] = active[edge.input].saturating_sub(1);
            }
            i += 1;
        }

        let classes: Vec<String> = active
            .iter()
            .enumerate()
            .filter(|(_, &n)| n > 0)
            .map(|(k, _)| format!("i{}", k + 1))
            .collect();
        if !classes.is_empty() {
            let _ = write!(out, "<span class=\"{}\">", classes.join(" "));
        }
        last = pos;
    }

    out.push_str(&escape_html(&paragraph[last..]));
    out.push_str("</p>\n");
    Ok(())
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Lê o `.plain` e os resultados e grava `<arquivo>.html` ao lado da entrada.
pub fn highlight_file<P: AsRef<Path>>(plain_path: &Path, result_paths: &[P]) -> Result<PathBuf> {
    let plain = fs::read_to_string(plain_path).map_err(|e| NerError::io(plain_path, e))?;
    let mut results = Vec::with_capacity(result_paths.len());
    for path in result_paths {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| NerError::io(path, e))?;
        results.push(serde_json::from_str::<Vec<Vec<Match>>>(&data)?);
    }

    let html = render_html(&plain, &results)?;
    let html_path = plain_path.with_extension("html");
    fs::write(&html_path, html).map_err(|e| NerError::io(&html_path, e))?;
    info!(path = %html_path.display(), inputs = results.len(), "highlight written");
    Ok(html_path)
}

/// Cores para entradas além das três com estilo fixo.
fn extra_styles(inputs: usize) -> String {
    const PALETTE: [&str; 4] = ["200,120,0", "120,0,200", "0,120,200", "200,0,120"];
    let mut css = String::new();
    for k in 4..=inputs {
        let _ = writeln!(
            css,
            "span.i{k} {{\n    background-color: rgba({},0.2);\n}}",
            PALETTE[(k - 4) % PALETTE.len()]
        );
    }
    css
}

const HEAD: &str = r#"<html>
  <head>
    <meta charset="UTF-8">
    <style type="text/css">
span.i1 {
    background-color: rgba(200,0,0,0.2);
}
span.i2 {
    background-color: rgba(0,0,200,0.2);
}
span.i3 {
    background-color: rgba(0,200,0,0.2);
}
span.i1.i2 {
    background-color: rgba(150,0,150,0.2);
}
span.i1.i3 {
    background-color: rgba(150,150,0,0.2);
}
span.i2.i3 {
    background-color: rgba(0,150,150,0.2);
}
span.i1.i2.i3 {
    background-color: rgba(0,0,0,0.2);
}
div.label::before {
    content: attr(input) ":";
}
div.label::after {
    content: " ";
}
div.label {
    position: relative;
    display: inline;
    font-size: 67%;
}
"#;

const BODY: &str = r#"    </style>
  </head>
  <body>
"#;

const TAIL: &str = r#"
  </body>
</html>
"#;

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn m(start: usize, end: usize, label: &str, text: &str) -> Match {
        Match {
            span: [start, end],
            label: label.to_string(),
            text: text.to_string(),
        }
    }

    fn body(html: &str) -> &str {
        let start = html.find("<body>\n").unwrap() + "<body>\n".len();
        let end = html.rfind("\n  </body>").unwrap();
        &html[start..end]
    }

    #[test]
    fn test_index_translator() {
        let mut t = IndexTranslator::new("Zoë met Ann");
        assert_eq!(t.byte_index(0), Some(0));
        assert_eq!(t.byte_index(3), Some(4));
        assert_eq!(t.byte_index(8), Some(9));
        assert_eq!(t.byte_index(11), Some(12));
        assert_eq!(t.byte_index(12), None);
        // Consulta para trás recomeça do início
        assert_eq!(t.byte_index(2), Some(2));
    }

    #[test]
    fn test_single_input() {
        let html = render_html(
            "Alice works at Acme Corp.",
            &[vec![vec![m(0, 5, "PER", "Alice"), m(15, 24, "ORG", "Acme Corp")]]],
        )
        .unwrap();
        assert_eq!(
            body(&html),
            "<p><div class=\"label\" input=\"1\" title=\"Alice\">PER</div><span class=\"i1\">Alice</span> works at \
             <div class=\"label\" input=\"1\" title=\"Acme Corp\">ORG</div><span class=\"i1\">Acme Corp</span>.</p>\n"
        );
    }

    #[test]
    fn test_overlapping_inputs() {
        let results = vec![
            vec![vec![m(0, 9, "ORG", "Acme Corp")]],
            vec![vec![m(5, 9, "ORG", "Corp")]],
        ];
        let html = render_html("Acme Corp", &results).unwrap();
        assert_eq!(
            body(&html),
            "<p><div class=\"label\" input=\"1\" title=\"Acme Corp\">ORG</div><span class=\"i1\">Acme </span>\
             <div class=\"label\" input=\"2\" title=\"Corp\">ORG</div><span class=\"i1 i2\">Corp</span></p>\n"
        );
    }

    #[test]
    fn test_adjacent_matches_same_input() {
        let html = render_html("AB", &[vec![vec![m(0, 1, "X", "A"), m(1, 2, "Y", "B")]]]).unwrap();
        assert_eq!(
            body(&html),
            "<p><div class=\"label\" input=\"1\" title=\"A\">X</div><span class=\"i1\">A</span>\
             <div class=\"label\" input=\"1\" title=\"B\">Y</div><span class=\"i1\">B</span></p>\n"
        );
    }

    #[test]
    fn test_paragraph_without_matches_is_kept_and_escaped() {
        let html = render_html("a < b\n\nZoë & Ann", &[vec![vec![], vec![m(6, 9, "PER", "Ann")]]]).unwrap();
        assert_eq!(
            body(&html),
            "<p>a &lt; b</p>\n<p>Zoë &amp; <div class=\"label\" input=\"1\" title=\"Ann\">PER</div>\
             <span class=\"i1\">Ann</span></p>\n"
        );
    }

    #[test]
    fn test_invalid_spans() {
        let empty = render_html("Alice", &[vec![vec![m(3, 3, "PER", "")]]]);
        assert!(matches!(empty, Err(NerError::InvalidSpan { start: 3, end: 3, .. })));

        let out_of_range = render_html("Alice", &[vec![vec![m(0, 50, "PER", "Alice")]]]);
        assert!(matches!(out_of_range, Err(NerError::InvalidSpan { .. })));
    }

    #[test]
    fn test_paragraph_count_mismatch() {
        let err = render_html("one\n\ntwo", &[vec![vec![]]]).unwrap_err();
        assert!(matches!(err, NerError::ParagraphMismatch { index: 1, expected: 2, got: 1 }));
    }

    #[test]
    fn test_extra_styles_for_many_inputs() {
        assert!(extra_styles(3).is_empty());
        assert!(extra_styles(5).contains("span.i5"));
    }

    #[test]
    fn test_highlight_file() {
        let dir = TempDir::new().unwrap();
        let plain = dir.path().join("doc.plain");
        let result = dir.path().join("doc.rules.json");
        fs::write(&plain, "Alice here").unwrap();
        fs::write(&result, r#"[[{"span": [0, 5], "label": "PERSON", "text": "Alice"}]]"#).unwrap();

        let html_path = highlight_file(&plain, &[&result]).unwrap();
        assert_eq!(html_path, dir.path().join("doc.html"));
        let html = fs::read_to_string(html_path).unwrap();
        assert!(html.contains("<span class=\"i1\">Alice</span> here</p>"));
    }
}

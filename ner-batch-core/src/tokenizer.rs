//! # Tokenizador para Inglês
//!
//! Divide uma sentença em tokens (palavras, pontuações), preservando a posição
//! original de cada token. Os offsets são **em bytes** relativos ao texto recebido;
//! a conversão para offsets de caractere acontece só na fronteira do reconhecedor
//! (ver [`crate::recognizer`]).
//!
//! ## Regras
//!
//! - Letras, dígitos e hífens internos formam palavras (`state-of-the-art`).
//! - O ponto fica colado ao token em abreviações (`Dr.`, `Inc.`), iniciais (`J.`),
//!   siglas pontuadas (`U.S.`) e números decimais (`3.5`), **exceto** quando é o
//!   último caractere não-branco do texto: aí é o ponto final da sentença.
//! - O possessivo `'s` vira um token próprio (`Acme's` → `Acme`, `'s`).
//!
//! ```rust
//! use ner_batch_core::tokenizer::tokenize;
//!
//! let tokens = tokenize("Dr. Smith joined Acme Corp.");
//! let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
//! assert_eq!(texts, vec!["Dr.", "Smith", "joined", "Acme", "Corp", "."]);
//! ```

use serde::{Deserialize, Serialize};

/// Um token extraído do texto original.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    /// O texto do token (ex: "Acme", ",", "joined").
    pub text: String,
    /// Índice de byte inicial no texto original (inclusive).
    pub start: usize,
    /// Índice de byte final no texto original (exclusivo).
    pub end: usize,
    /// Índice sequencial do token na lista (0, 1, 2...).
    pub index: usize,
}

/// Abreviações comuns em inglês cujo ponto não encerra a sentença.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "mt", "ft", "rev", "hon",
    "gen", "gov", "sen", "rep", "pres", "lt", "col", "capt", "cmdr", "sgt", "adm",
    "inc", "corp", "ltd", "co", "bros", "dept", "univ", "assn", "est",
    "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec",
    "no", "vol", "fig", "approx", "vs", "etc", "al", "eg", "ie", "cf",
];

/// Verifica se a palavra (sem o ponto final) é uma abreviação conhecida.
///
/// Também compartilhada pelo divisor de sentenças ([`crate::sentence`]).
pub fn is_abbreviation(word: &str) -> bool {
    let lower = word.to_lowercase();
    ABBREVIATIONS.contains(&lower.as_str())
}

/// Inicial isolada (`J`) ou sigla pontuada parcial (`U.S`).
pub fn is_initialism(word: &str) -> bool {
    let mut letters = 0;
    let mut expect_letter = true;
    for ch in word.chars() {
        if expect_letter {
            if !ch.is_alphabetic() {
                return false;
            }
            letters += 1;
            expect_letter = false;
        } else if ch == '.' {
            expect_letter = true;
        } else {
            return false;
        }
    }
    letters >= 1 && !expect_letter && word.chars().next().map_or(false, char::is_uppercase)
}

/// Tokeniza uma sentença.
pub fn tokenize(text: &str) -> Vec<Token> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let last_visible = chars
        .iter()
        .rposition(|(_, c)| !c.is_whitespace())
        .unwrap_or(0);

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_start = 0;

    for (i, &(byte_pos, ch)) in chars.iter().enumerate() {
        if ch.is_alphanumeric() || (ch == '-' && !current.is_empty()) {
            if current.is_empty() {
                current_start = byte_pos;
            }
            current.push(ch);
        } else if ch == '.' && !current.is_empty() && i != last_visible {
            let next = chars.get(i + 1).map(|&(_, c)| c);
            let decimal = current.chars().all(char::is_numeric) && next.map_or(false, char::is_numeric);
            if decimal || is_abbreviation(&current) || is_initialism(&current) {
                current.push('.');
            } else {
                flush(&mut tokens, &mut current, current_start, byte_pos);
                push(&mut tokens, ".", byte_pos, byte_pos + 1);
            }
        } else if (ch == '\'' || ch == '\u{2019}') && !current.is_empty() {
            // Possessivo: "Acme's" → "Acme", "'s"
            let next = chars.get(i + 1).map(|&(_, c)| c);
            let after = chars.get(i + 2).map(|&(_, c)| c);
            let possessive = matches!(next, Some('s') | Some('S'))
                && after.map_or(true, |c| !c.is_alphanumeric());
            flush(&mut tokens, &mut current, current_start, byte_pos);
            if possessive {
                current_start = byte_pos;
                current.push(ch);
            } else {
                push(&mut tokens, &ch.to_string(), byte_pos, byte_pos + ch.len_utf8());
            }
        } else if ch.is_whitespace() {
            flush(&mut tokens, &mut current, current_start, byte_pos);
        } else {
            flush(&mut tokens, &mut current, current_start, byte_pos);
            push(&mut tokens, &ch.to_string(), byte_pos, byte_pos + ch.len_utf8());
        }
    }
    flush(&mut tokens, &mut current, current_start, text.len());

    for (i, token) in tokens.iter_mut().enumerate() {
        token.index = i;
    }
    tokens
}

/// Fecha o token acumulado e adiciona à lista (se não vazio)
fn flush(tokens: &mut Vec<Token>, text: &mut String, start: usize, end: usize) {
    if !text.is_empty() {
        tokens.push(Token {
            text: std::mem::take(text),
            start,
            end,
            index: 0,
        });
    }
}

fn push(tokens: &mut Vec<Token>, text: &str, start: usize, end: usize) {
    tokens.push(Token {
        text: text.to_string(),
        start,
        end,
        index: 0,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(text: &str) -> Vec<String> {
        tokenize(text).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_tokenize_basic() {
        assert_eq!(texts("Alice works at Acme."), vec!["Alice", "works", "at", "Acme", "."]);
    }

    #[test]
    fn test_abbreviation_keeps_period_mid_sentence() {
        assert_eq!(texts("Mr. Brown left."), vec!["Mr.", "Brown", "left", "."]);
    }

    #[test]
    fn test_final_abbreviation_releases_period() {
        assert_eq!(texts("She joined Acme Corp."), vec!["She", "joined", "Acme", "Corp", "."]);
    }

    #[test]
    fn test_initialisms_and_decimals() {
        assert_eq!(texts("The U.S. grew 3.5 percent"), vec!["The", "U.S.", "grew", "3.5", "percent"]);
    }

    #[test]
    fn test_possessive_split() {
        assert_eq!(texts("Acme's board"), vec!["Acme", "'s", "board"]);
    }

    #[test]
    fn test_offsets_are_bytes() {
        let tokens = tokenize("Zoë met Bob");
        assert_eq!(tokens[0].start, 0);
        assert_eq!(tokens[0].end, 4);
        assert_eq!(tokens[1].start, 5);
        assert_eq!(&"Zoë met Bob"[tokens[2].start..tokens[2].end], "Bob");
        assert_eq!(tokens[2].index, 2);
    }

    #[test]
    fn test_hyphenated_word() {
        assert_eq!(texts("state-of-the-art models"), vec!["state-of-the-art", "models"]);
    }

    #[test]
    fn test_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
    }
}

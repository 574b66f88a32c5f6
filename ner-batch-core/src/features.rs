//! # Engenharia de Features para o CRF
//!
//! Para cada token, extrai um vetor esparso de features binárias:
//!
//! - **Forma**: palavra em minúsculas, capitalização, siglas, dígitos, pontuação.
//! - **Afixos**: prefixos e sufixos de 2 a 4 caracteres.
//! - **Léxico**: palavra funcional (stopword), pertence a algum gazetteer.
//! - **Contexto**: janela de 2 tokens para cada lado, início/fim de sentença.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::tokenizer::Token;

/// Vetor esparso de features de um token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Features ativas. Ex: `{"is_capitalized": 1.0, "word=berlin": 1.0}`.
    pub features: HashMap<String, f64>,
    /// Índice do token na sentença.
    pub token_index: usize,
}

impl FeatureVector {
    pub fn new(token_index: usize) -> Self {
        Self {
            features: HashMap::new(),
            token_index,
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.features.insert(key.into(), value);
    }

    fn flag(&mut self, key: &str, on: bool) {
        if on {
            self.insert(key, 1.0);
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.features.contains_key(key)
    }
}

/// Palavras de uma entidade conhecida, por categoria, em minúsculas.
#[derive(Debug, Clone, Default)]
pub struct Gazetteers {
    pub persons: HashSet<String>,
    pub organizations: HashSet<String>,
    pub gpes: HashSet<String>,
    pub locations: HashSet<String>,
    pub misc: HashSet<String>,
}

/// Palavras funcionais que quase nunca iniciam uma entidade, mesmo capitalizadas.
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "he", "she", "it", "they",
    "we", "i", "you", "his", "her", "its", "their", "our", "my", "your", "in", "on",
    "at", "to", "from", "of", "for", "with", "by", "and", "or", "but", "if", "when",
    "while", "after", "before", "as", "is", "was", "are", "were", "be", "been",
    "has", "have", "had", "will", "would", "can", "could", "there", "here", "then",
    "so", "not", "no", "yes", "also", "however", "meanwhile", "today", "yesterday",
];

pub fn is_stopword(lower: &str) -> bool {
    STOPWORDS.contains(&lower)
}

/// Gera os vetores de features de toda a sentença, alinhados com os tokens.
pub fn extract_features(tokens: &[Token], gazetteers: &Gazetteers) -> Vec<FeatureVector> {
    (0..tokens.len())
        .map(|i| extract_for_token(tokens, i, gazetteers))
        .collect()
}

/// Extrai as features de um token no seu contexto.
pub fn extract_for_token(tokens: &[Token], i: usize, gazetteers: &Gazetteers) -> FeatureVector {
    let mut fv = FeatureVector::new(i);
    let word = tokens[i].text.as_str();
    let lower = word.to_lowercase();

    fv.insert("bias", 1.0);
    fv.insert(format!("word={lower}"), 1.0);
    shape_features(&mut fv, word);
    affix_features(&mut fv, &lower);

    fv.flag("is_stopword", is_stopword(&lower));
    fv.flag("in_person_gazetteer", gazetteers.persons.contains(&lower));
    fv.flag("in_org_gazetteer", gazetteers.organizations.contains(&lower));
    fv.flag("in_gpe_gazetteer", gazetteers.gpes.contains(&lower));
    fv.flag("in_location_gazetteer", gazetteers.locations.contains(&lower));
    fv.flag("in_misc_gazetteer", gazetteers.misc.contains(&lower));

    context_features(&mut fv, tokens, i);
    fv
}

fn shape_features(fv: &mut FeatureVector, word: &str) {
    let first_upper = word.chars().next().map_or(false, char::is_uppercase);
    let letters = word.chars().filter(|c| c.is_alphabetic()).count();
    let all_upper = letters > 0 && word.chars().all(|c| c.is_uppercase() || !c.is_alphabetic());

    fv.flag("is_capitalized", first_upper);
    fv.flag("is_all_caps", all_upper && letters > 1);
    fv.flag("is_mixed_case", word.chars().skip(1).any(char::is_uppercase) && !all_upper);
    fv.flag("is_digit", word.chars().all(char::is_numeric));
    fv.flag("has_digit", word.chars().any(char::is_numeric));
    fv.flag("has_hyphen", word.contains('-'));
    fv.flag("has_period", word.contains('.'));
    fv.flag("is_punctuation", !word.chars().any(char::is_alphanumeric));
}

fn affix_features(fv: &mut FeatureVector, lower: &str) {
    let chars: Vec<char> = lower.chars().collect();
    for n in 2..=4 {
        if chars.len() > n {
            let prefix: String = chars[..n].iter().collect();
            let suffix: String = chars[chars.len() - n..].iter().collect();
            fv.insert(format!("prefix{n}={prefix}"), 1.0);
            fv.insert(format!("suffix{n}={suffix}"), 1.0);
        }
    }
}

fn context_features(fv: &mut FeatureVector, tokens: &[Token], i: usize) {
    let capitalized = |t: &Token| t.text.chars().next().map_or(false, char::is_uppercase);

    if i == 0 {
        fv.insert("BOS", 1.0);
    } else {
        let prev = &tokens[i - 1];
        fv.insert(format!("prev_word={}", prev.text.to_lowercase()), 1.0);
        fv.flag("prev_is_capitalized", capitalized(prev));
    }
    if i > 1 {
        fv.insert(format!("prev2_word={}", tokens[i - 2].text.to_lowercase()), 1.0);
    }

    match tokens.get(i + 1) {
        Some(next) => {
            fv.insert(format!("next_word={}", next.text.to_lowercase()), 1.0);
            fv.flag("next_is_capitalized", capitalized(next));
        }
        None => fv.insert("EOS", 1.0),
    }
    if let Some(next2) = tokens.get(i + 2) {
        fv.insert(format!("next2_word={}", next2.text.to_lowercase()), 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    #[test]
    fn test_capitalization_feature() {
        let tokens = tokenize("Berlin is big");
        let features = extract_features(&tokens, &Gazetteers::default());

        assert!(features[0].has("is_capitalized"));
        assert!(!features[1].has("is_capitalized"));
        assert!(features[1].has("is_stopword"));
    }

    #[test]
    fn test_acronym_and_affixes() {
        let tokens = tokenize("NASA launched");
        let features = extract_features(&tokens, &Gazetteers::default());

        assert!(features[0].has("is_all_caps"));
        assert!(features[0].has("prefix2=na"));
        assert!(features[1].has("suffix3=hed"));
    }

    #[test]
    fn test_context_features() {
        let tokens = tokenize("said President Lincoln yesterday");
        let features = extract_features(&tokens, &Gazetteers::default());

        let lincoln = &features[2];
        assert!(lincoln.has("prev_word=president"));
        assert!(lincoln.has("prev_is_capitalized"));
        assert!(lincoln.has("next_word=yesterday"));
        assert!(lincoln.has("prev2_word=said"));
        assert!(features[0].has("BOS"));
        assert!(features[3].has("EOS"));
    }

    #[test]
    fn test_gazetteer_feature() {
        let tokens = tokenize("Berlin is big");
        let mut gaz = Gazetteers::default();
        gaz.gpes.insert("berlin".to_string());

        let features = extract_features(&tokens, &gaz);
        assert!(features[0].has("in_gpe_gazetteer"));
        assert!(!features[0].has("in_location_gazetteer"));
    }

    #[test]
    fn test_punctuation() {
        let tokens = tokenize("Hi .");
        let features = extract_features(&tokens, &Gazetteers::default());
        assert!(features[1].has("is_punctuation"));
        assert!(!features[0].has("is_punctuation"));
    }
}

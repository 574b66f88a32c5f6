//! # Motor de Regras — Gazetteers e Padrões
//!
//! Complementa o CRF com conhecimento explícito: listas de entidades conhecidas
//! (gazetteers, com n-gramas como "New York" ou "United Nations") e padrões de
//! contexto como títulos ("Mr. X") e sufixos corporativos ("X Inc.").
//!
//! As regras rodam em ordem de prioridade e nunca sobrescrevem um token já
//! marcado por uma regra anterior.

use serde::Serialize;

use crate::tagger::{EntityCategory, Tag};
use crate::tokenizer::Token;

/// Uma correspondência de regra: qual token foi marcado e com qual tag
#[derive(Debug, Clone, Serialize)]
pub struct RuleMatch {
    pub token_index: usize,
    pub tag: Tag,
    pub rule_name: &'static str,
    pub confidence: f64,
}

/// Frase de gazetteer já quebrada em palavras minúsculas.
type Phrase = Vec<String>;

/// Motor de regras com gazetteers e padrões de contexto
#[derive(Debug, Clone)]
pub struct RuleEngine {
    persons: Vec<Phrase>,
    organizations: Vec<Phrase>,
    gpes: Vec<Phrase>,
    locations: Vec<Phrase>,
    misc: Vec<Phrase>,
    /// Títulos que precedem nomes de pessoas (sem ponto final)
    person_titles: Vec<&'static str>,
    /// Sufixos que encerram nomes de organizações (sem ponto final)
    org_suffixes: Vec<&'static str>,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self {
            persons: vec![],
            organizations: vec![],
            gpes: vec![],
            locations: vec![],
            misc: vec![],
            person_titles: vec![
                "mr", "mrs", "ms", "miss", "dr", "prof", "sir", "dame", "lord", "lady",
                "president", "senator", "governor", "mayor", "minister", "chancellor",
                "judge", "justice", "general", "colonel", "captain", "sen", "gov", "rep",
                "gen", "col", "capt", "rev", "ceo", "chairman", "chairwoman",
            ],
            org_suffixes: vec![
                "inc", "corp", "corporation", "ltd", "llc", "plc", "gmbh", "ag", "co",
                "company", "group", "holdings", "bank", "university", "institute",
                "foundation", "association", "agency", "airlines", "partners",
            ],
        }
    }

    fn phrases_mut(&mut self, category: EntityCategory) -> &mut Vec<Phrase> {
        match category {
            EntityCategory::Per => &mut self.persons,
            EntityCategory::Org => &mut self.organizations,
            EntityCategory::Gpe => &mut self.gpes,
            EntityCategory::Loc => &mut self.locations,
            EntityCategory::Misc => &mut self.misc,
        }
    }

    /// Adiciona uma entrada (uma ou mais palavras) ao gazetteer da categoria.
    pub fn add(&mut self, category: EntityCategory, name: &str) {
        let parts: Phrase = name.split_whitespace().map(str::to_lowercase).collect();
        if parts.is_empty() {
            return;
        }
        let phrases = self.phrases_mut(category);
        phrases.push(parts);
        // Maior n-grama primeiro: "New York City" antes de "New York"
        phrases.sort_by(|a, b| b.len().cmp(&a.len()));
    }

    /// Aplica todas as regras à sequência de tokens.
    ///
    /// Retorna, alinhado com os tokens, a regra que marcou cada um (se houver).
    pub fn apply(&self, tokens: &[Token]) -> Vec<Option<RuleMatch>> {
        let lower: Vec<String> = tokens.iter().map(|t| t.text.to_lowercase()).collect();
        let mut result: Vec<Option<RuleMatch>> = vec![None; tokens.len()];

        // 1. Gazetteers, da categoria mais específica para a mais genérica
        let gazetteers = [
            (&self.organizations, EntityCategory::Org, "org_gazetteer", 0.93),
            (&self.gpes, EntityCategory::Gpe, "gpe_gazetteer", 0.92),
            (&self.locations, EntityCategory::Loc, "location_gazetteer", 0.90),
            (&self.persons, EntityCategory::Per, "person_gazetteer", 0.90),
            (&self.misc, EntityCategory::Misc, "misc_gazetteer", 0.88),
        ];
        for (phrases, category, rule_name, confidence) in gazetteers {
            match_phrases(&lower, phrases, category, rule_name, confidence, &mut result);
        }

        // 2. Título: "Mr. Brown" → Brown é PER
        for i in 0..tokens.len().saturating_sub(1) {
            let title = lower[i].trim_end_matches('.');
            if self.person_titles.contains(&title)
                && result[i + 1].is_none()
                && is_capitalized(&tokens[i + 1])
            {
                mark(&mut result, i + 1, 1, EntityCategory::Per, "title_pattern", 0.80);
            }
        }

        // 3. Sobrenome: pessoa seguida de palavras capitalizadas livres → mesma entidade
        for i in 1..tokens.len() {
            let extends = result[i].is_none()
                && is_capitalized(&tokens[i])
                && result[i - 1]
                    .as_ref()
                    .map_or(false, |m| m.tag.category() == Some(EntityCategory::Per));
            if extends {
                let source = result[i - 1].as_ref().map_or("surname_pattern", |m| m.rule_name);
                result[i] = Some(RuleMatch {
                    token_index: i,
                    tag: Tag::Inside(EntityCategory::Per),
                    rule_name: source,
                    confidence: 0.75,
                });
            }
        }

        // 4. Sufixo corporativo: "Acme Widget Corp" → ORG com até 3 palavras antes
        for i in 1..tokens.len() {
            let suffix = lower[i].trim_end_matches('.');
            if !self.org_suffixes.contains(&suffix) || !is_capitalized(&tokens[i]) {
                continue;
            }
            let mut first = i;
            while first > 0
                && i - first < 3
                && result[first - 1].is_none()
                && is_capitalized(&tokens[first - 1])
            {
                first -= 1;
            }
            if first < i && result[first..=i].iter().all(Option::is_none) {
                mark(&mut result, first, i - first + 1, EntityCategory::Org, "org_suffix_pattern", 0.85);
            }
        }

        result
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn is_capitalized(token: &Token) -> bool {
    token.text.chars().next().map_or(false, char::is_uppercase)
}

/// Marca `len` tokens a partir de `start` como uma entidade (B-X, I-X, ...).
fn mark(
    result: &mut [Option<RuleMatch>],
    start: usize,
    len: usize,
    category: EntityCategory,
    rule_name: &'static str,
    confidence: f64,
) {
    for (offset, slot) in result[start..start + len].iter_mut().enumerate() {
        *slot = Some(RuleMatch {
            token_index: start + offset,
            tag: if offset == 0 { Tag::Begin(category) } else { Tag::Inside(category) },
            rule_name,
            confidence,
        });
    }
}

/// Procura as frases do gazetteer na sequência, sem sobrepor marcações existentes.
fn match_phrases(
    lower: &[String],
    phrases: &[Phrase],
    category: EntityCategory,
    rule_name: &'static str,
    confidence: f64,
    result: &mut [Option<RuleMatch>],
) {
    let mut i = 0;
    while i < lower.len() {
        let found = phrases.iter().find(|phrase| {
            let end = i + phrase.len();
            end <= lower.len()
                && phrase.iter().zip(&lower[i..end]).all(|(p, w)| p == w.trim_end_matches('.'))
                && result[i..end].iter().all(Option::is_none)
        });
        match found {
            Some(phrase) => {
                mark(result, i, phrase.len(), category, rule_name, confidence);
                i += phrase.len();
            }
            None => i += 1,
        }
    }
}

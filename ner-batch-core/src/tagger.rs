//! # Esquema de Tags BIO, Categorias e Vocabulários de Rótulos
//!
//! Os motores internos trabalham com um conjunto fixo de categorias e com o
//! esquema **BIO** (Beginning-Inside-Outside). O rótulo que aparece na saída
//! depende do [`LabelScheme`] do reconhecedor: cada reconhecedor tem o seu
//! vocabulário e eles não são normalizados entre si.
//!
//! | Categoria | Significado                      | `conll` | `ontonotes` |
//! |-----------|----------------------------------|---------|-------------|
//! | PER       | Pessoa                           | PER     | PERSON      |
//! | ORG       | Organização                      | ORG     | ORG         |
//! | GPE       | Entidade geopolítica (país, ...) | LOC     | GPE         |
//! | LOC       | Local não político (rio, serra)  | LOC     | LOC         |
//! | MISC      | Nacionalidades, eventos, ...     | MISC    | NORP        |

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NerError;
use crate::tokenizer::Token;

/// Categorias de entidade reconhecidas pelos motores internos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityCategory {
    /// **Pessoa**: "Angela Merkel", "Alice".
    Per,
    /// **Organização**: "Acme Corp", "United Nations".
    Org,
    /// **Geopolítica**: países, estados e cidades. "Germany", "Texas".
    Gpe,
    /// **Localização** sem governo próprio: "Amazon River", "Alps".
    Loc,
    /// **Miscelânea**: nacionalidades e grupos ("German"), eventos.
    Misc,
}

impl EntityCategory {
    pub const ALL: [EntityCategory; 5] = [
        EntityCategory::Per,
        EntityCategory::Org,
        EntityCategory::Gpe,
        EntityCategory::Loc,
        EntityCategory::Misc,
    ];

    /// Nome interno da categoria
    pub fn name(&self) -> &'static str {
        match self {
            EntityCategory::Per => "PER",
            EntityCategory::Org => "ORG",
            EntityCategory::Gpe => "GPE",
            EntityCategory::Loc => "LOC",
            EntityCategory::Misc => "MISC",
        }
    }

    fn ordinal(&self) -> usize {
        match self {
            EntityCategory::Per => 0,
            EntityCategory::Org => 1,
            EntityCategory::Gpe => 2,
            EntityCategory::Loc => 3,
            EntityCategory::Misc => 4,
        }
    }
}

/// Vocabulário de rótulos de saída de um reconhecedor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelScheme {
    /// Estilo CoNLL-2003: PER, ORG, LOC, MISC.
    Conll,
    /// Estilo OntoNotes: PERSON, ORG, GPE, LOC, NORP.
    #[default]
    #[serde(rename = "ontonotes")]
    OntoNotes,
}

impl LabelScheme {
    pub fn name(&self) -> &'static str {
        match self {
            LabelScheme::Conll => "conll",
            LabelScheme::OntoNotes => "ontonotes",
        }
    }

    /// Rótulo de saída para a categoria.
    pub fn label(&self, category: EntityCategory) -> &'static str {
        match (self, category) {
            (LabelScheme::Conll, EntityCategory::Per) => "PER",
            (LabelScheme::Conll, EntityCategory::Org) => "ORG",
            (LabelScheme::Conll, EntityCategory::Gpe | EntityCategory::Loc) => "LOC",
            (LabelScheme::Conll, EntityCategory::Misc) => "MISC",
            (LabelScheme::OntoNotes, EntityCategory::Per) => "PERSON",
            (LabelScheme::OntoNotes, EntityCategory::Org) => "ORG",
            (LabelScheme::OntoNotes, EntityCategory::Gpe) => "GPE",
            (LabelScheme::OntoNotes, EntityCategory::Loc) => "LOC",
            (LabelScheme::OntoNotes, EntityCategory::Misc) => "NORP",
        }
    }
}

impl FromStr for LabelScheme {
    type Err = NerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conll" => Ok(LabelScheme::Conll),
            "ontonotes" => Ok(LabelScheme::OntoNotes),
            other => Err(NerError::InvalidConfig(format!("unknown label scheme: {other}"))),
        }
    }
}

/// Tag BIO aplicada a um token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tag {
    /// Primeiro token de uma entidade. Ex: **New** (B-GPE) York.
    Begin(EntityCategory),
    /// Continuação da entidade. Ex: New **York** (I-GPE).
    Inside(EntityCategory),
    /// Fora de entidade.
    Outside,
}

impl Tag {
    /// Número total de tags possíveis (O + B/I por categoria)
    pub const COUNT: usize = 1 + 2 * EntityCategory::ALL.len();

    /// Representação textual da tag (ex: "B-PER", "I-GPE", "O")
    pub fn label(&self) -> String {
        match self {
            Tag::Begin(cat) => format!("B-{}", cat.name()),
            Tag::Inside(cat) => format!("I-{}", cat.name()),
            Tag::Outside => "O".to_string(),
        }
    }

    /// Índice numérico da tag para as matrizes do CRF/Viterbi.
    pub fn index(&self) -> usize {
        match self {
            Tag::Outside => 0,
            Tag::Begin(cat) => 1 + 2 * cat.ordinal(),
            Tag::Inside(cat) => 2 + 2 * cat.ordinal(),
        }
    }

    /// Todas as tags, na ordem de [`Tag::index`].
    pub fn all() -> [Tag; Tag::COUNT] {
        let mut tags = [Tag::Outside; Tag::COUNT];
        for cat in EntityCategory::ALL {
            tags[Tag::Begin(cat).index()] = Tag::Begin(cat);
            tags[Tag::Inside(cat).index()] = Tag::Inside(cat);
        }
        tags
    }

    pub fn category(&self) -> Option<EntityCategory> {
        match self {
            Tag::Begin(c) | Tag::Inside(c) => Some(*c),
            Tag::Outside => None,
        }
    }

    /// `I-X` só pode seguir `B-X` ou `I-X`; o resto é sempre válido.
    pub fn is_valid_transition(prev: &Tag, next: &Tag) -> bool {
        match next {
            Tag::Inside(cat) => match prev {
                Tag::Begin(prev_cat) | Tag::Inside(prev_cat) => prev_cat == cat,
                Tag::Outside => false,
            },
            _ => true,
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Um token com sua tag BIO e a confiança da atribuição
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggedToken {
    pub token: Token,
    pub tag: Tag,
    /// Confiança desta atribuição (0.0 a 1.0)
    pub confidence: f64,
    /// Origem da tag: nome da regra ou "crf"
    pub source: String,
}

/// Uma entidade identificada na sentença (um ou mais tokens)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySpan {
    /// Texto exato coberto pela entidade
    pub text: String,
    pub category: EntityCategory,
    /// Índice do primeiro token
    pub start_token: usize,
    /// Índice do último token (inclusivo)
    pub end_token: usize,
    /// Posição de byte inicial na sentença
    pub start: usize,
    /// Posição de byte final na sentença (exclusiva)
    pub end: usize,
    /// Confiança média dos tokens
    pub confidence: f64,
    /// Origem do primeiro token
    pub source: String,
}

/// Converte uma sequência de tokens BIO em entidades.
///
/// Uma entidade começa em `B-X` e continua enquanto houver `I-X` da mesma
/// categoria. `I-X` órfão (sem `B-X` antes) é ignorado.
///
/// # Exemplo
/// `[B-PER, I-PER, O, B-GPE]` -> `[EntitySpan(PER), EntitySpan(GPE)]`
pub fn tokens_to_spans(tagged: &[TaggedToken], original_text: &str) -> Vec<EntitySpan> {
    let mut spans = Vec::new();
    let mut i = 0;

    while i < tagged.len() {
        let cat = match tagged[i].tag {
            Tag::Begin(cat) => cat,
            _ => {
                i += 1;
                continue;
            }
        };

        let mut j = i + 1;
        while j < tagged.len() && tagged[j].tag == Tag::Inside(cat) {
            j += 1;
        }

        let first = &tagged[i];
        let last = &tagged[j - 1];
        let confidence = tagged[i..j].iter().map(|t| t.confidence).sum::<f64>() / (j - i) as f64;
        spans.push(EntitySpan {
            text: original_text[first.token.start..last.token.end].to_string(),
            category: cat,
            start_token: first.token.index,
            end_token: last.token.index,
            start: first.token.start,
            end: last.token.end,
            confidence,
            source: first.source.clone(),
        });

        i = j;
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    #[test]
    fn test_tag_labels() {
        assert_eq!(Tag::Outside.label(), "O");
        assert_eq!(Tag::Begin(EntityCategory::Per).label(), "B-PER");
        assert_eq!(Tag::Inside(EntityCategory::Gpe).label(), "I-GPE");
    }

    #[test]
    fn test_valid_transitions() {
        assert!(Tag::is_valid_transition(
            &Tag::Begin(EntityCategory::Per),
            &Tag::Inside(EntityCategory::Per)
        ));
        assert!(!Tag::is_valid_transition(&Tag::Outside, &Tag::Inside(EntityCategory::Per)));
        assert!(!Tag::is_valid_transition(
            &Tag::Begin(EntityCategory::Org),
            &Tag::Inside(EntityCategory::Per)
        ));
    }

    #[test]
    fn test_all_tags_indexed_in_order() {
        for (i, tag) in Tag::all().iter().enumerate() {
            assert_eq!(tag.index(), i);
        }
        assert_eq!(Tag::COUNT, 11);
    }

    #[test]
    fn test_label_schemes_differ() {
        assert_eq!(LabelScheme::Conll.label(EntityCategory::Per), "PER");
        assert_eq!(LabelScheme::OntoNotes.label(EntityCategory::Per), "PERSON");
        assert_eq!(LabelScheme::Conll.label(EntityCategory::Gpe), "LOC");
        assert_eq!(LabelScheme::OntoNotes.label(EntityCategory::Misc), "NORP");
        assert_eq!("conll".parse::<LabelScheme>().unwrap(), LabelScheme::Conll);
        assert!("iob2".parse::<LabelScheme>().is_err());
    }

    #[test]
    fn test_tokens_to_spans_groups_bio() {
        let text = "Angela Merkel visited New York";
        let tags = [
            Tag::Begin(EntityCategory::Per),
            Tag::Inside(EntityCategory::Per),
            Tag::Outside,
            Tag::Begin(EntityCategory::Gpe),
            Tag::Inside(EntityCategory::Gpe),
        ];
        let tagged: Vec<TaggedToken> = tokenize(text)
            .into_iter()
            .zip(tags)
            .map(|(token, tag)| TaggedToken { token, tag, confidence: 1.0, source: "test".into() })
            .collect();

        let spans = tokens_to_spans(&tagged, text);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "Angela Merkel");
        assert_eq!(spans[0].category, EntityCategory::Per);
        assert_eq!(spans[1].text, "New York");
        assert_eq!((spans[1].start, spans[1].end), (22, 30));
        assert_eq!((spans[1].start_token, spans[1].end_token), (3, 4));
    }

    #[test]
    fn test_orphan_inside_is_ignored() {
        let text = "York rocks";
        let tagged: Vec<TaggedToken> = tokenize(text)
            .into_iter()
            .map(|token| TaggedToken {
                token,
                tag: Tag::Inside(EntityCategory::Gpe),
                confidence: 1.0,
                source: "test".into(),
            })
            .collect();
        assert!(tokens_to_spans(&tagged, text).is_empty());
    }
}

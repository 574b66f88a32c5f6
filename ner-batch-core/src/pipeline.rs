//! # Pipeline NER — Orquestrador dos Motores
//!
//! O pipeline coordena tokenizador, extração de features, motor de regras e
//! CRF/Viterbi sobre **uma sentença** e devolve os tokens marcados e as
//! entidades encontradas. Offsets aqui são sempre em bytes da sentença; a
//! conversão para caracteres acontece na fronteira do reconhecedor.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::NerError;
use crate::features::extract_features;
use crate::model::NerModel;
use crate::tagger::{tokens_to_spans, EntitySpan, Tag, TaggedToken};
use crate::tokenizer::{tokenize, Token};
use crate::viterbi::viterbi_decode;

/// Motor de marcação usado pelo pipeline.
///
/// Cada motor oferece um balanço diferente entre precisão e previsibilidade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// **Apenas Regras**: gazetteers e padrões de contexto.
    /// Determinístico; não generaliza para entidades não vistas.
    Rules,
    /// **Apenas CRF**: modelo estatístico com decodificação Viterbi.
    Crf,
    /// **Híbrido**: regras primeiro; onde nenhuma regra cobre, vale o CRF.
    #[default]
    Hybrid,
}

impl EngineKind {
    pub fn name(&self) -> &'static str {
        match self {
            EngineKind::Rules => "rules",
            EngineKind::Crf => "crf",
            EngineKind::Hybrid => "hybrid",
        }
    }
}

impl FromStr for EngineKind {
    type Err = NerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rules" => Ok(EngineKind::Rules),
            "crf" => Ok(EngineKind::Crf),
            "hybrid" => Ok(EngineKind::Hybrid),
            other => Err(NerError::InvalidConfig(format!("unknown engine: {other}"))),
        }
    }
}

/// O pipeline NER principal.
///
/// 1. Tokenização da sentença.
/// 2. Motor de regras (exceto em [`EngineKind::Crf`]).
/// 3. Extração de features e Viterbi (exceto em [`EngineKind::Rules`]).
/// 4. Fusão: no modo híbrido a regra prevalece token a token.
/// 5. Agrupamento BIO em entidades.
#[derive(Debug, Clone, Default)]
pub struct NerPipeline {
    pub model: NerModel,
}

impl NerPipeline {
    /// Cria o pipeline carregando o modelo embutido.
    pub fn new() -> Self {
        Self {
            model: NerModel::build(),
        }
    }

    /// Analisa uma sentença com o motor escolhido.
    pub fn analyze(&self, text: &str, engine: EngineKind) -> (Vec<TaggedToken>, Vec<EntitySpan>) {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return (vec![], vec![]);
        }

        let tagged_tokens = match engine {
            EngineKind::Rules => self.tag_with_rules(&tokens),
            EngineKind::Crf => self.tag_with_crf(&tokens),
            EngineKind::Hybrid => {
                let crf = self.tag_with_crf(&tokens);
                self.tag_with_rules(&tokens)
                    .into_iter()
                    .zip(crf)
                    .map(|(rule, crf)| if rule.tag == Tag::Outside { crf } else { rule })
                    .collect()
            }
        };

        let entities = tokens_to_spans(&tagged_tokens, text);
        trace!(
            engine = engine.name(),
            tokens = tokens.len(),
            entities = entities.len(),
            "sentence analyzed"
        );
        (tagged_tokens, entities)
    }

    fn tag_with_rules(&self, tokens: &[Token]) -> Vec<TaggedToken> {
        self.model
            .rule_engine
            .apply(tokens)
            .into_iter()
            .zip(tokens)
            .map(|(rule, token)| match rule {
                Some(rm) => TaggedToken {
                    token: token.clone(),
                    tag: rm.tag,
                    confidence: rm.confidence,
                    source: rm.rule_name.to_string(),
                },
                None => TaggedToken {
                    token: token.clone(),
                    tag: Tag::Outside,
                    confidence: 1.0,
                    source: "no_rule".to_string(),
                },
            })
            .collect()
    }

    fn tag_with_crf(&self, tokens: &[Token]) -> Vec<TaggedToken> {
        let feature_vectors = extract_features(tokens, self.model.gazetteers());
        let result = viterbi_decode(&self.model.crf, &feature_vectors);

        tokens
            .iter()
            .zip(result.best_sequence)
            .zip(result.confidences)
            .map(|((token, tag), confidence)| TaggedToken {
                token: token.clone(),
                tag,
                confidence,
                source: "crf".to_string(),
            })
            .collect()
    }
}

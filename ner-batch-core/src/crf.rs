//! # CRF — Conditional Random Field Linear-Chain
//!
//! Score de uma sequência de tags `y` para os tokens `x`:
//!
//! ```text
//! score(y, x) = Σ_i [emission(y_i, x, i) + transition(y_{i-1}, y_i)]
//! ```
//!
//! A emissão é o produto escalar das features ativas do token com a linha de
//! pesos de cada tag. Os pesos são fixos (ver [`crate::model`]); nada é treinado
//! em tempo de execução.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;
use crate::tagger::Tag;

/// Modelo CRF com pesos definidos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrfModel {
    /// feature → peso por tag (indexado por [`Tag::index`])
    emission_weights: HashMap<String, Vec<f64>>,
    /// `[prev][next]`
    transition_weights: Vec<Vec<f64>>,
}

impl CrfModel {
    /// Cria um modelo CRF com pesos zerados
    pub fn new() -> Self {
        Self {
            emission_weights: HashMap::new(),
            transition_weights: vec![vec![0.0; Tag::COUNT]; Tag::COUNT],
        }
    }

    pub fn set_emission(&mut self, feature: &str, tag: &Tag, weight: f64) {
        self.emission_weights
            .entry(feature.to_string())
            .or_insert_with(|| vec![0.0; Tag::COUNT])[tag.index()] = weight;
    }

    pub fn set_transition(&mut self, from: &Tag, to: &Tag, weight: f64) {
        self.transition_weights[from.index()][to.index()] = weight;
    }

    /// Scores de emissão de todas as tags para um token, na ordem de [`Tag::all`].
    pub fn emission_scores(&self, features: &FeatureVector) -> Vec<f64> {
        let mut scores = vec![0.0; Tag::COUNT];
        for (name, value) in &features.features {
            if let Some(row) = self.emission_weights.get(name) {
                for (score, weight) in scores.iter_mut().zip(row) {
                    *score += value * weight;
                }
            }
        }
        scores
    }

    pub fn emission_score(&self, features: &FeatureVector, tag: &Tag) -> f64 {
        self.emission_scores(features)[tag.index()]
    }

    pub fn transition_score(&self, prev: &Tag, next: &Tag) -> f64 {
        self.transition_weights[prev.index()][next.index()]
    }
}

impl Default for CrfModel {
    fn default() -> Self {
        Self::new()
    }
}

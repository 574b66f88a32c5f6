//! # Algoritmo de Viterbi — Decodificação de Sequências CRF
//!
//! Programação dinâmica que encontra a sequência de tags de maior score em
//! `O(N × T²)`:
//!
//! ```text
//! Inicialização: v[0][t] = emission(t, x_0)
//! Recursão:      v[i][t] = max_{t'} [v[i-1][t'] + transition(t', t) + penalty(t', t)] + emission(t, x_i)
//! Backtracking:  reconstrói o caminho ótimo de trás pra frente
//! ```
//!
//! Transições inválidas no esquema BIO (`O → I-X`, `B-X → I-Y`) recebem uma
//! penalidade fixa além do peso aprendido. O primeiro token é tratado como se
//! viesse de `O`, então uma sentença também não começa com `I-X`.

use crate::crf::CrfModel;
use crate::features::FeatureVector;
use crate::tagger::Tag;

/// Penalidade somada às transições que quebram o esquema BIO.
const INVALID_TRANSITION_PENALTY: f64 = -10.0;

/// Resultado da decodificação
#[derive(Debug, Clone)]
pub struct ViterbiResult {
    /// Sequência de tags mais provável (uma por token)
    pub best_sequence: Vec<Tag>,
    /// Score (não normalizado) da melhor sequência
    pub best_score: f64,
    /// Confiança de cada tag escolhida: softmax dos scores acumulados no passo
    pub confidences: Vec<f64>,
}

pub fn viterbi_decode(model: &CrfModel, feature_vectors: &[FeatureVector]) -> ViterbiResult {
    if feature_vectors.is_empty() {
        return ViterbiResult {
            best_sequence: vec![],
            best_score: 0.0,
            confidences: vec![],
        };
    }

    let tags = Tag::all();
    let n_tokens = feature_vectors.len();

    // lattice[i][t] = melhor score acumulado terminando no token i com a tag t
    let mut lattice: Vec<Vec<f64>> = Vec::with_capacity(n_tokens);
    let mut backptr: Vec<Vec<usize>> = Vec::with_capacity(n_tokens);

    let mut first = model.emission_scores(&feature_vectors[0]);
    for (score, tag) in first.iter_mut().zip(tags.iter()) {
        if !Tag::is_valid_transition(&Tag::Outside, tag) {
            *score += INVALID_TRANSITION_PENALTY;
        }
    }
    lattice.push(first);
    backptr.push((0..Tag::COUNT).collect());

    for fv in &feature_vectors[1..] {
        let emission = model.emission_scores(fv);
        let prev_column = lattice.last().map(Vec::as_slice).unwrap_or_default();
        let mut column = vec![f64::NEG_INFINITY; Tag::COUNT];
        let mut pointers = vec![0usize; Tag::COUNT];

        for (t, next) in tags.iter().enumerate() {
            for (p, prev) in tags.iter().enumerate() {
                let mut score = prev_column[p] + model.transition_score(prev, next);
                if !Tag::is_valid_transition(prev, next) {
                    score += INVALID_TRANSITION_PENALTY;
                }
                if score > column[t] {
                    column[t] = score;
                    pointers[t] = p;
                }
            }
            column[t] += emission[t];
        }

        lattice.push(column);
        backptr.push(pointers);
    }

    // === Backtracking ===
    let (mut best, best_score) = best_in_slice(&lattice[n_tokens - 1]);
    let mut path = vec![0usize; n_tokens];
    path[n_tokens - 1] = best;
    for i in (1..n_tokens).rev() {
        best = backptr[i][best];
        path[i - 1] = best;
    }

    let confidences = path
        .iter()
        .zip(&lattice)
        .map(|(&t, column)| scores_to_probs(column)[t])
        .collect();

    ViterbiResult {
        best_sequence: path.into_iter().map(|t| tags[t]).collect(),
        best_score,
        confidences,
    }
}

/// Retorna (índice, valor) do máximo em um slice
fn best_in_slice(scores: &[f64]) -> (usize, f64) {
    scores
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, &v)| (i, v))
        .unwrap_or((0, f64::NEG_INFINITY))
}

/// Converte scores em probabilidades softmax
pub fn scores_to_probs(scores: &[f64]) -> Vec<f64> {
    if scores.is_empty() {
        return vec![];
    }
    let max_score = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|&s| (s - max_score).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return vec![1.0 / scores.len() as f64; scores.len()];
    }
    exps.iter().map(|e| e / sum).collect()
}

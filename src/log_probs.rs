//! # Token Log-Probabilities
//!
//! Given a prompt and the model's log-probabilities over the vocabulary at each
//! position, shows the top-k predictions per position and how the token that
//! actually came next was ranked.

use ndarray::{ArrayView, ArrayView1, ArrayView2, Axis, Dimension, Ix2};
use serde::Serialize;
use std::cmp::Ordering;

use crate::common::VisError;
use crate::json::float_literals;
use crate::render::{render_component, Component, RenderedHtml};

pub const DEFAULT_TOP_K: usize = 10;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenLogProbs {
    pub prompt: Vec<String>,
    #[serde(serialize_with = "float_literals")]
    pub top_k_log_probs: Vec<Vec<f32>>,
    pub top_k_tokens: Vec<Vec<String>>,
    /// Count of vocabulary entries scored strictly above the next token, per position.
    pub correct_token_rank: Vec<usize>,
    /// Masked vocabulary entries show up here as `-Infinity`.
    #[serde(serialize_with = "float_literals")]
    pub correct_token_log_prob: Vec<f32>,
}

impl TokenLogProbs {
    /// Computes the props from `log_probs` shaped `[seq, vocab]` or `[1, seq, vocab]`.
    pub fn compute<D, F>(
        token_indices: &[usize],
        log_probs: ArrayView<'_, f32, D>,
        to_string: F,
        top_k: usize,
    ) -> Result<Self, VisError>
    where
        D: Dimension,
        F: Fn(usize) -> String,
    {
        let log_probs = squeeze_batch(log_probs)?;
        let (seq_len, vocab_size) = log_probs.dim();

        if seq_len != token_indices.len() {
            return Err(VisError::ShapeMismatch(format!(
                "log_probs has {} positions but {} token indices were given",
                seq_len,
                token_indices.len()
            )));
        }
        if let Some(&bad) = token_indices.iter().find(|&&t| t >= vocab_size) {
            return Err(VisError::OutOfBounds(format!(
                "token index {} is outside the vocabulary of size {}",
                bad, vocab_size
            )));
        }
        if top_k == 0 || top_k > vocab_size {
            return Err(VisError::InvalidArgument(format!(
                "top_k must be between 1 and the vocabulary size {}, got {}",
                vocab_size, top_k
            )));
        }

        let prompt = token_indices.iter().map(|&t| to_string(t)).collect();

        let mut top_k_log_probs = Vec::with_capacity(seq_len);
        let mut top_k_tokens = Vec::with_capacity(seq_len);
        for row in log_probs.outer_iter() {
            let indices = top_k_indices(row, top_k);
            top_k_log_probs.push(indices.iter().map(|&i| row[i]).collect());
            top_k_tokens.push(indices.iter().map(|&i| to_string(i)).collect());
        }

        let mut correct_token_rank = Vec::with_capacity(seq_len.saturating_sub(1));
        let mut correct_token_log_prob = Vec::with_capacity(seq_len.saturating_sub(1));
        for (position, next) in token_indices.windows(2).enumerate() {
            let row = log_probs.index_axis(Axis(0), position);
            let correct = row[next[1]];
            correct_token_rank.push(row.iter().filter(|&&v| v > correct).count());
            correct_token_log_prob.push(correct);
        }

        Ok(TokenLogProbs {
            prompt,
            top_k_log_probs,
            top_k_tokens,
            correct_token_rank,
            correct_token_log_prob,
        })
    }
}

impl Component for TokenLogProbs {
    const NAME: &'static str = "TokenLogProbs";

    fn validate(&self) -> Result<(), VisError> {
        let seq_len = self.prompt.len();
        let expected_next = seq_len.saturating_sub(1);
        if self.top_k_log_probs.len() != seq_len
            || self.top_k_tokens.len() != seq_len
            || self.correct_token_rank.len() != expected_next
            || self.correct_token_log_prob.len() != expected_next
        {
            return Err(VisError::ShapeMismatch(format!(
                "inconsistent lengths for a prompt of {} tokens",
                seq_len
            )));
        }
        Ok(())
    }
}

/// Visualizes the model's log-probabilities over a prompt.
///
/// `to_string` decodes a vocabulary index into its display string.
pub fn token_log_probs<D, F>(
    token_indices: &[usize],
    log_probs: ArrayView<'_, f32, D>,
    to_string: F,
    top_k: usize,
) -> Result<RenderedHtml, VisError>
where
    D: Dimension,
    F: Fn(usize) -> String,
{
    let props = TokenLogProbs::compute(token_indices, log_probs, to_string, top_k)?;
    render_component(&props)
}

fn squeeze_batch<D: Dimension>(
    log_probs: ArrayView<'_, f32, D>,
) -> Result<ArrayView2<'_, f32>, VisError> {
    let log_probs = log_probs.into_dyn();
    let log_probs = match log_probs.ndim() {
        2 => log_probs,
        3 if log_probs.shape()[0] == 1 => log_probs.index_axis_move(Axis(0), 0),
        3 => {
            return Err(VisError::ShapeMismatch(format!(
                "only a batch of 1 is supported, got {}",
                log_probs.shape()[0]
            )))
        }
        n => {
            return Err(VisError::ShapeMismatch(format!(
                "log_probs must be [seq, vocab] or [1, seq, vocab], got {} dimensions",
                n
            )))
        }
    };
    log_probs
        .into_dimensionality::<Ix2>()
        .map_err(|e| VisError::ShapeMismatch(e.to_string()))
}

/// Indices of the `k` largest entries, largest first. Ties keep the lower index
/// first; NaN sorts above every number.
fn top_k_indices(row: ArrayView1<'_, f32>, k: usize) -> Vec<usize> {
    let descending =
        |a: &usize, b: &usize| -> Ordering { row[*b].total_cmp(&row[*a]).then(a.cmp(b)) };
    let mut order: Vec<usize> = (0..row.len()).collect();
    if k < order.len() {
        order.select_nth_unstable_by(k - 1, descending);
        order.truncate(k);
    }
    order.sort_by(descending);
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{arr1, arr2, Array3};

    fn vocab(i: usize) -> String {
        ["<bos>", " the", " cat", " sat"][i].to_string()
    }

    fn sample_log_probs() -> ndarray::Array2<f32> {
        arr2(&[
            [-3.0, -0.5, -1.0, -2.0],
            [-0.1, -2.5, -0.3, -2.5],
            [-1.0, -1.0, -4.0, -0.2],
        ])
    }

    #[test]
    fn test_compute_top_k_and_ranks() -> Result<(), VisError> {
        let log_probs = sample_log_probs();
        let props = TokenLogProbs::compute(&[0, 1, 2], log_probs.view(), vocab, 2)?;

        assert_eq!(props.prompt, vec!["<bos>", " the", " cat"]);
        assert_eq!(props.top_k_tokens, vec![
            vec![" the", " cat"],
            vec!["<bos>", " cat"],
            vec![" sat", "<bos>"],
        ]);
        assert_abs_diff_eq!(props.top_k_log_probs[0][0], -0.5);
        assert_abs_diff_eq!(props.top_k_log_probs[1][1], -0.3);
        assert_abs_diff_eq!(props.top_k_log_probs[2][1], -1.0);

        // Position 0 predicts token 1 (" the"), the best guess.
        // Position 1 predicts " cat", beaten only by "<bos>".
        assert_eq!(props.correct_token_rank, vec![0, 1]);
        assert_abs_diff_eq!(props.correct_token_log_prob[0], -0.5);
        assert_abs_diff_eq!(props.correct_token_log_prob[1], -0.3);
        props.validate()
    }

    #[test]
    fn test_ties_keep_lower_index_first() {
        let row = arr1(&[-1.0f32, -0.5, -0.5, -0.5]);
        assert_eq!(top_k_indices(row.view(), 2), vec![1, 2]);
        assert_eq!(top_k_indices(row.view(), 4), vec![1, 2, 3, 0]);
    }

    #[test]
    fn test_nan_sorts_first() {
        let row = arr1(&[0.0f32, f32::NAN, 1.0]);
        assert_eq!(top_k_indices(row.view(), 1), vec![1]);
    }

    #[test]
    fn test_batch_dimension_is_squeezed() -> Result<(), Box<dyn std::error::Error>> {
        let batched = sample_log_probs().insert_axis(Axis(0));
        let from_batched = TokenLogProbs::compute(&[0, 1, 2], batched.view(), vocab, 3)?;
        let plain = TokenLogProbs::compute(&[0, 1, 2], sample_log_probs().view(), vocab, 3)?;
        assert_eq!(from_batched, plain);
        Ok(())
    }

    #[test]
    fn test_rejects_larger_batches() {
        let batched = Array3::<f32>::zeros((2, 3, 4));
        assert!(matches!(
            TokenLogProbs::compute(&[0, 1, 2], batched.view(), vocab, 1),
            Err(VisError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_rejects_bad_arguments() {
        let log_probs = sample_log_probs();
        assert!(matches!(
            TokenLogProbs::compute(&[0, 1], log_probs.view(), vocab, 2),
            Err(VisError::ShapeMismatch(_))
        ));
        assert!(matches!(
            TokenLogProbs::compute(&[0, 1, 9], log_probs.view(), vocab, 2),
            Err(VisError::OutOfBounds(_))
        ));
        assert!(matches!(
            TokenLogProbs::compute(&[0, 1, 2], log_probs.view(), vocab, 0),
            Err(VisError::InvalidArgument(_))
        ));
        assert!(matches!(
            TokenLogProbs::compute(&[0, 1, 2], log_probs.view(), vocab, 5),
            Err(VisError::InvalidArgument(_))
        ));
        let flat = arr1(&[0.0f32]);
        assert!(matches!(
            TokenLogProbs::compute(&[0], flat.view(), vocab, 1),
            Err(VisError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_single_token_prompt() -> Result<(), VisError> {
        let log_probs = arr2(&[[-0.5f32, -1.0]]);
        let props = TokenLogProbs::compute(&[1], log_probs.view(), |i| format!("t{}", i), 1)?;
        assert!(props.correct_token_rank.is_empty());
        assert!(props.correct_token_log_prob.is_empty());
        assert_eq!(props.top_k_tokens, vec![vec!["t0".to_string()]]);
        props.validate()
    }

    #[test]
    fn test_render_payload_keys() -> Result<(), VisError> {
        let log_probs = arr2(&[[-0.5f32, -1.0], [-2.0, -0.25]]);
        let html = token_log_probs(&[0, 1], log_probs.view(), |i| format!("t{}", i), 1)?;
        assert!(html.cdn_src().contains(
            r#"{"prompt": ["t0", "t1"], "topKLogProbs": [[-0.5], [-0.25]], "topKTokens": [["t0"], ["t1"]], "correctTokenRank": [1], "correctTokenLogProb": [-1.0]}"#
        ));
        Ok(())
    }

    #[test]
    fn test_masked_log_probs_render_as_literals() -> Result<(), VisError> {
        let log_probs = arr2(&[[0.0f32, f32::NEG_INFINITY], [f32::NAN, f32::INFINITY]]);
        let html = token_log_probs(&[0, 1], log_probs.view(), |i| format!("t{}", i), 2)?;
        assert!(html.cdn_src().contains(
            r#""topKLogProbs": [[0.0, -Infinity], [NaN, Infinity]], "topKTokens": [["t0", "t1"], ["t0", "t1"]], "correctTokenRank": [1], "correctTokenLogProb": [-Infinity]}"#
        ));
        Ok(())
    }
}

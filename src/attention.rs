//! # Attention Visualizations
//!
//! Wrappers for the bundle's attention components. Attention tensors follow the
//! usual transformer layout: `[num_heads, dest_tokens, src_tokens]` for a
//! stack of heads and `[dest_tokens, src_tokens]` for a single pattern.

use ndarray::{ArrayView2, ArrayView3};
use serde::Serialize;

use crate::common::{check_len, check_ndim, check_range, to_token_vec, NestedArray, VisError};
use crate::render::{render_component, Component, RenderedHtml};

/// Optional display settings shared by the single-pattern and multi-head views.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttentionHeadsOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attention_head_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positive_color: Option<String>,
    /// Hide the upper triangle (future tokens in a causal model).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_upper_tri: Option<bool>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AttentionHeads<'a, A> {
    pub attention: NestedArray<'a, A>,
    pub tokens: Vec<String>,
    #[serde(flatten)]
    pub options: AttentionHeadsOptions,
}

impl<A: Serialize> Component for AttentionHeads<'_, A> {
    const NAME: &'static str = "AttentionHeads";

    fn validate(&self) -> Result<(), VisError> {
        let shape = self.attention.shape();
        check_ndim("attention", shape, 3)?;
        check_len("attention destination dimension", shape[1], self.tokens.len())?;
        check_len("attention source dimension", shape[2], self.tokens.len())?;
        if let Some(names) = &self.options.attention_head_names {
            check_len("attention_head_names", names.len(), shape[0])?;
        }
        check_range(self.options.min_value, self.options.max_value)
    }
}

/// Attention patterns for every head, with one head shown at a time.
pub fn attention_heads<A: Serialize, S: AsRef<str>>(
    attention: ArrayView3<'_, A>,
    tokens: &[S],
    options: AttentionHeadsOptions,
) -> Result<RenderedHtml, VisError> {
    render_component(&AttentionHeads {
        attention: NestedArray::new(attention),
        tokens: to_token_vec(tokens),
        options,
    })
}

#[derive(Serialize, Debug, Clone)]
pub struct AttentionPatterns<'a, A> {
    pub tokens: Vec<String>,
    pub attention: NestedArray<'a, A>,
}

impl<A: Serialize> Component for AttentionPatterns<'_, A> {
    const NAME: &'static str = "AttentionPatterns";

    fn validate(&self) -> Result<(), VisError> {
        let shape = self.attention.shape();
        check_ndim("attention", shape, 3)?;
        check_len("attention destination dimension", shape[1], self.tokens.len())?;
        check_len("attention source dimension", shape[2], self.tokens.len())
    }
}

pub fn attention_patterns<A: Serialize, S: AsRef<str>>(
    tokens: &[S],
    attention: ArrayView3<'_, A>,
) -> Result<RenderedHtml, VisError> {
    render_component(&AttentionPatterns {
        tokens: to_token_vec(tokens),
        attention: NestedArray::new(attention),
    })
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttentionPatternOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positive_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_axis_labels: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_upper_tri: Option<bool>,
}

#[derive(Serialize, Debug, Clone)]
pub struct AttentionPattern<'a, A> {
    pub tokens: Vec<String>,
    pub attention: NestedArray<'a, A>,
    #[serde(flatten)]
    pub options: AttentionPatternOptions,
}

impl<A: Serialize> Component for AttentionPattern<'_, A> {
    const NAME: &'static str = "AttentionPattern";

    fn validate(&self) -> Result<(), VisError> {
        let shape = self.attention.shape();
        check_ndim("attention", shape, 2)?;
        check_len("attention destination dimension", shape[0], self.tokens.len())?;
        check_len("attention source dimension", shape[1], self.tokens.len())?;
        check_range(self.options.min_value, self.options.max_value)
    }
}

/// A single `[dest, src]` attention pattern.
pub fn attention_pattern<A: Serialize, S: AsRef<str>>(
    tokens: &[S],
    attention: ArrayView2<'_, A>,
    options: AttentionPatternOptions,
) -> Result<RenderedHtml, VisError> {
    render_component(&AttentionPattern {
        tokens: to_token_vec(tokens),
        attention: NestedArray::new(attention),
        options,
    })
}

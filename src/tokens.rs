//! # Colored Tokens
//!
//! Token-level heatmaps. `ColoredTokens` shades each token by a single value;
//! `ColoredTokensMulti` takes `K` value vectors (`[tokens, K]`) and lets the
//! viewer switch between them, hovering a token shows all `K` values.

use ndarray::{ArrayView1, ArrayView2};
use serde::Serialize;

use crate::common::{check_len, check_ndim, check_range, to_token_vec, NestedArray, VisError};
use crate::render::{render_component, Component, RenderedHtml};

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColoredTokensOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positive_color: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct ColoredTokens<'a, A> {
    pub tokens: Vec<String>,
    pub values: NestedArray<'a, A>,
    #[serde(flatten)]
    pub options: ColoredTokensOptions,
}

impl<A: Serialize> Component for ColoredTokens<'_, A> {
    const NAME: &'static str = "ColoredTokens";

    fn validate(&self) -> Result<(), VisError> {
        check_ndim("values", self.values.shape(), 1)?;
        check_len("values", self.values.shape()[0], self.tokens.len())?;
        check_range(self.options.min_value, self.options.max_value)
    }
}

pub fn colored_tokens<A: Serialize, S: AsRef<str>>(
    tokens: &[S],
    values: ArrayView1<'_, A>,
    options: ColoredTokensOptions,
) -> Result<RenderedHtml, VisError> {
    render_component(&ColoredTokens {
        tokens: to_token_vec(tokens),
        values: NestedArray::new(values),
        options,
    })
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColoredTokensMultiOptions {
    /// Names for the `K` value vectors; the bundle falls back to `0..K`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positive_bounds: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_bounds: Option<Vec<f64>>,
}

#[derive(Serialize, Debug, Clone)]
pub struct ColoredTokensMulti<'a, A> {
    pub tokens: Vec<String>,
    pub values: NestedArray<'a, A>,
    #[serde(flatten)]
    pub options: ColoredTokensMultiOptions,
}

impl<A: Serialize> Component for ColoredTokensMulti<'_, A> {
    const NAME: &'static str = "ColoredTokensMulti";

    fn validate(&self) -> Result<(), VisError> {
        let shape = self.values.shape();
        check_ndim("values", shape, 2)?;
        check_len("values token dimension", shape[0], self.tokens.len())?;
        let num_values = shape[1];
        if let Some(labels) = &self.options.labels {
            check_len("labels", labels.len(), num_values)?;
        }
        if let Some(bounds) = &self.options.positive_bounds {
            check_len("positive_bounds", bounds.len(), num_values)?;
        }
        if let Some(bounds) = &self.options.negative_bounds {
            check_len("negative_bounds", bounds.len(), num_values)?;
        }
        let bounds = (&self.options.positive_bounds, &self.options.negative_bounds);
        if let (Some(positive), Some(negative)) = bounds {
            for (k, (pos, neg)) in positive.iter().zip(negative.iter()).enumerate() {
                check_range(Some(*neg), Some(*pos)).map_err(|_| {
                    VisError::InvalidArgument(format!(
                        "negative bound {} exceeds positive bound {} for value {}",
                        neg, pos, k
                    ))
                })?;
            }
        }
        Ok(())
    }
}

pub fn colored_tokens_multi<A: Serialize, S: AsRef<str>>(
    tokens: &[S],
    values: ArrayView2<'_, A>,
    options: ColoredTokensMultiOptions,
) -> Result<RenderedHtml, VisError> {
    render_component(&ColoredTokensMulti {
        tokens: to_token_vec(tokens),
        values: NestedArray::new(values),
        options,
    })
}

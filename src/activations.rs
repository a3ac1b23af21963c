//! # Neuron Activations
//!
//! Per-token activations for a set of neurons, shaped `[tokens, layers, neurons]`.
//! Several prompts can be shown together; each sample then carries its own token
//! list and activation tensor.

use ndarray::ArrayView3;
use serde::Serialize;

use crate::common::{check_len, check_ndim, to_token_vec, NestedArray, VisError};
use crate::render::{render_component, Component, RenderedHtml};

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivationOptions {
    pub first_dimension_name: String,
    pub second_dimension_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_dimension_labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_dimension_labels: Option<Vec<String>>,
}

impl Default for ActivationOptions {
    fn default() -> Self {
        ActivationOptions {
            first_dimension_name: "Layer".to_string(),
            second_dimension_name: "Neuron".to_string(),
            first_dimension_labels: None,
            second_dimension_labels: None,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum TokenSamples {
    Single(Vec<String>),
    Multi(Vec<Vec<String>>),
}

#[derive(Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum ActivationSamples<'a, A> {
    Single(NestedArray<'a, A>),
    Multi(Vec<NestedArray<'a, A>>),
}

#[derive(Serialize, Debug, Clone)]
pub struct TextNeuronActivations<'a, A> {
    pub tokens: TokenSamples,
    pub activations: ActivationSamples<'a, A>,
    #[serde(flatten)]
    pub options: ActivationOptions,
}

impl<A: Serialize> TextNeuronActivations<'_, A> {
    /// `(tokens, activation shape)` for every sample.
    fn samples(&self) -> Result<Vec<(&[String], &[usize])>, VisError> {
        match (&self.tokens, &self.activations) {
            (TokenSamples::Single(tokens), ActivationSamples::Single(activations)) => {
                Ok(vec![(tokens.as_slice(), activations.shape())])
            }
            (TokenSamples::Multi(tokens), ActivationSamples::Multi(activations)) => {
                check_len("activation samples", activations.len(), tokens.len())?;
                Ok(tokens
                    .iter()
                    .zip(activations.iter())
                    .map(|(t, a)| (t.as_slice(), a.shape()))
                    .collect())
            }
            _ => Err(VisError::InvalidArgument(
                "tokens and activations must both be single or both be multi-sample".to_string(),
            )),
        }
    }
}

impl<A: Serialize> Component for TextNeuronActivations<'_, A> {
    const NAME: &'static str = "TextNeuronActivations";

    fn validate(&self) -> Result<(), VisError> {
        let samples = self.samples()?;
        for (index, (_, shape)) in samples.iter().enumerate() {
            check_ndim(&format!("activations[{}]", index), shape, 3)?;
        }
        let (_, first_shape) = samples
            .first()
            .ok_or_else(|| {
                VisError::InvalidArgument("at least one sample is required".to_string())
            })?;
        let (layers, neurons) = (first_shape[1], first_shape[2]);

        for (index, (tokens, shape)) in samples.iter().enumerate() {
            check_len(&format!("activations[{}] token dimension", index), shape[0], tokens.len())?;
            if shape[1] != layers || shape[2] != neurons {
                return Err(VisError::ShapeMismatch(format!(
                    "activations[{}] has shape {:?}, expected [_, {}, {}]",
                    index, shape, layers, neurons
                )));
            }
        }

        if let Some(labels) = &self.options.first_dimension_labels {
            check_len("first_dimension_labels", labels.len(), layers)?;
        }
        if let Some(labels) = &self.options.second_dimension_labels {
            check_len("second_dimension_labels", labels.len(), neurons)?;
        }
        Ok(())
    }
}

/// Activations for a single prompt.
pub fn text_neuron_activations<A: Serialize, S: AsRef<str>>(
    tokens: &[S],
    activations: ArrayView3<'_, A>,
    options: ActivationOptions,
) -> Result<RenderedHtml, VisError> {
    render_component(&TextNeuronActivations {
        tokens: TokenSamples::Single(to_token_vec(tokens)),
        activations: ActivationSamples::Single(NestedArray::new(activations)),
        options,
    })
}

/// Activations for several prompts, selectable in the rendered view.
pub fn text_neuron_activations_multi<'a, A: Serialize, S: AsRef<str>>(
    tokens: &[Vec<S>],
    activations: &[ArrayView3<'a, A>],
    options: ActivationOptions,
) -> Result<RenderedHtml, VisError> {
    render_component(&TextNeuronActivations {
        tokens: TokenSamples::Multi(tokens.iter().map(|t| to_token_vec(t.as_slice())).collect()),
        activations: ActivationSamples::Multi(
            activations.iter().map(|a| NestedArray::new(a.view())).collect(),
        ),
        options,
    })
}

//! Rust bindings for the CircuitsVis rendering bundle.
//!
//! Each visualization function takes arrays computed elsewhere (attention
//! patterns, activations, log-probabilities), serializes them and returns a
//! [`RenderedHtml`] fragment that mounts the matching component from the
//! version-pinned JavaScript bundle.

pub mod config;
pub mod common;
pub mod json;
pub mod render;
pub mod attention;
pub mod activations;
pub mod tokens;
pub mod log_probs;
pub mod examples;
pub mod ui;

pub use common::VisError;
pub use config::RenderConfig;
pub use render::{render, Component, RenderedHtml, Renderer};

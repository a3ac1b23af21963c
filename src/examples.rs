//! Smoke-test component shipped with the rendering bundle.

use serde::Serialize;

use crate::common::VisError;
use crate::render::{render_component, Component, RenderedHtml};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Hello {
    pub name: String,
}

impl Component for Hello {
    const NAME: &'static str = "Hello";
}

/// Renders a greeting, useful for checking the bundle loads in a notebook.
pub fn hello(name: &str) -> Result<RenderedHtml, VisError> {
    render_component(&Hello { name: name.to_string() })
}

//! # HTML Rendering
//!
//! Turns a component name and a serializable props value into an HTML fragment
//! that mounts the component from the pinned rendering bundle. The fragment is a
//! placeholder `<div>` followed by a `<script type="module">` that calls the
//! bundle's `render(elementId, Component, props)` entry point.
//!
//! Two variants are produced for every call:
//! - a CDN fragment importing `esm.js` from the configured CDN (always present),
//! - a local fragment inlining a locally built bundle (only when
//!   [`RenderConfig::local_bundle_path`] is set).

use serde::Serialize;
use std::fs;
use std::path::Path;
use uuid::Uuid;

use crate::common::VisError;
use crate::config::RenderConfig;
use crate::json::to_python_json;

/// Number of characters of the hyphenated UUID used in generated element ids.
const ID_UUID_CHARS: usize = 13;

/// A props type that can be mounted as a named component of the bundle.
pub trait Component: Serialize {
    /// Export name of the React component inside the bundle.
    const NAME: &'static str;

    /// Checks the props before they are serialized.
    fn validate(&self) -> Result<(), VisError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedHtml {
    local_src: Option<String>,
    cdn_src: String,
}

impl RenderedHtml {
    pub fn cdn_src(&self) -> &str {
        &self.cdn_src
    }

    pub fn local_src(&self) -> Option<&str> {
        self.local_src.as_deref()
    }

    /// HTML to hand to a notebook display hook; prefers the inlined bundle.
    pub fn notebook_html(&self) -> &str {
        self.local_src.as_deref().unwrap_or(&self.cdn_src)
    }

    /// Wraps the fragment into a standalone HTML page.
    pub fn to_document(&self, title: &str) -> String {
        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
            html_escape::encode_text(title),
            self.notebook_html()
        )
    }

    pub fn save<P: AsRef<Path>>(&self, path: P, title: &str) -> Result<(), VisError> {
        fs::write(path, self.to_document(title))?;
        Ok(())
    }
}

impl std::fmt::Display for RenderedHtml {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.cdn_src)
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    config: RenderConfig,
    local_bundle: Option<String>,
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer {
            config: RenderConfig::default(),
            local_bundle: None,
        }
    }
}

impl Renderer {
    /// Builds a renderer, reading the local bundle file if one is configured.
    pub fn new(config: RenderConfig) -> Result<Self, VisError> {
        config.validate()?;
        let local_bundle = match &config.local_bundle_path {
            Some(path) => {
                let source = fs::read_to_string(path).map_err(|e| {
                    let message = format!("Failed to read local bundle {}: {}", path.display(), e);
                    VisError::Config(message)
                })?;
                log::info!(
                    "Loaded local rendering bundle from {} ({} bytes)",
                    path.display(),
                    source.len()
                );
                Some(source)
            }
            None => None,
        };
        Ok(Renderer { config, local_bundle })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Fresh element id: prefix plus the first 13 characters of a v4 UUID.
    pub fn generate_id(&self) -> String {
        let uuid = Uuid::new_v4().to_string();
        format!("{}{}", self.config.element_id_prefix, &uuid[..ID_UUID_CHARS])
    }

    pub fn render<P: ?Sized + Serialize>(
        &self,
        component: &str,
        props: &P,
    ) -> Result<RenderedHtml, VisError> {
        let id = self.generate_id();
        self.render_with_id(component, props, &id)
    }

    pub fn render_with_id<P: ?Sized + Serialize>(
        &self,
        component: &str,
        props: &P,
        element_id: &str,
    ) -> Result<RenderedHtml, VisError> {
        validate_component_name(component)?;
        if element_id.is_empty() {
            return Err(VisError::InvalidArgument("element id must not be empty".to_string()));
        }

        let payload = to_python_json(props)?;
        log::debug!(
            "Rendering {} into #{} ({} byte payload)",
            component,
            element_id,
            payload.len()
        );

        let div = self.container_div(element_id);
        // The id lands inside a JS string literal as well.
        let id_literal = to_python_json(element_id)?;

        let cdn_src = format!(
            "{div}\n    <script crossorigin type=\"module\">\n    import {{ render, {name} }} from \"{url}\";\n    render(\n      {id},\n      {name},\n      {props}\n    )\n    </script>",
            div = div,
            name = component,
            url = self.config.cdn_module_url(),
            id = id_literal,
            props = payload,
        );

        let local_src = self.local_bundle.as_ref().map(|bundle| {
            format!(
                "{div}\n    <script crossorigin type=\"module\">\n    {bundle}\n    CircuitsVis.render(\n      {id},\n      CircuitsVis.{name},\n      {props}\n    )\n    </script>",
                div = div,
                bundle = bundle,
                name = component,
                id = id_literal,
                props = payload,
            )
        });

        Ok(RenderedHtml { local_src, cdn_src })
    }

    pub fn render_component<C: Component>(&self, component: &C) -> Result<RenderedHtml, VisError> {
        component.validate()?;
        self.render(C::NAME, component)
    }

    pub fn render_component_with_id<C: Component>(
        &self,
        component: &C,
        element_id: &str,
    ) -> Result<RenderedHtml, VisError> {
        component.validate()?;
        self.render_with_id(C::NAME, component, element_id)
    }

    fn container_div(&self, element_id: &str) -> String {
        format!(
            "<div id=\"{}\" style=\"{}\"/>",
            html_escape::encode_double_quoted_attribute(element_id),
            html_escape::encode_double_quoted_attribute(&self.config.container_style)
        )
    }
}

/// Renders `props` as the bundle component `component` with the default config.
pub fn render<P: ?Sized + Serialize>(component: &str, props: &P) -> Result<RenderedHtml, VisError> {
    Renderer::default().render(component, props)
}

/// Validates and renders a typed component with the default config.
pub fn render_component<C: Component>(component: &C) -> Result<RenderedHtml, VisError> {
    Renderer::default().render_component(component)
}

/// Component names are spliced into an `import { .. }` list, so they must be
/// plain JavaScript identifiers.
pub fn validate_component_name(name: &str) -> Result<(), VisError> {
    let mut chars = name.chars();
    let valid_start =
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
        Ok(())
    } else {
        Err(VisError::InvalidComponentName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_generated_id_format() {
        let renderer = Renderer::default();
        let id = renderer.generate_id();
        assert!(id.starts_with("circuits-vis-"));
        let suffix = &id["circuits-vis-".len()..];
        assert_eq!(suffix.len(), 13);
        assert_eq!(suffix.as_bytes()[8], b'-');
        assert_ne!(id, renderer.generate_id());
    }

    #[test]
    fn test_render_uses_same_id_for_div_and_call() -> Result<(), VisError> {
        let html = render("Hello", &json!({"name": "Bob"}))?;
        let src = html.cdn_src();
        let id_start = src.find("id=\"").map(|i| i + 4).ok_or(VisError::Config("no id".into()))?;
        let id_end = src[id_start..]
            .find('"')
            .map(|i| i + id_start)
            .ok_or(VisError::Config("no id end".into()))?;
        let id = &src[id_start..id_end];
        assert!(src.contains(&format!("      \"{}\",\n", id)));
        assert!(html.local_src().is_none());
        assert_eq!(html.notebook_html(), src);
        assert_eq!(html.to_string(), src);
        Ok(())
    }

    #[test]
    fn test_rejects_invalid_component_names() {
        for name in ["", "1Abc", "Foo Bar", "Foo}; alert(1); {", "A-B"] {
            assert!(
                matches!(render(name, &json!({})), Err(VisError::InvalidComponentName(_))),
                "{:?} should be rejected",
                name
            );
        }
        for name in ["AttentionPatterns", "_private", "$x1"] {
            assert!(validate_component_name(name).is_ok());
        }
    }

    #[test]
    fn test_rejects_empty_element_id() {
        let renderer = Renderer::default();
        assert!(matches!(
            renderer.render_with_id("Hello", &json!({}), ""),
            Err(VisError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_element_id_is_escaped() -> Result<(), VisError> {
        let html = Renderer::default().render_with_id("Hello", &json!({}), "a\"b<c")?;
        assert!(html.cdn_src().starts_with("<div id=\"a&quot;b&lt;c\""));
        assert!(html.cdn_src().contains("      \"a\\\"b<c\",\n"));
        Ok(())
    }

    #[test]
    fn test_custom_config() -> Result<(), VisError> {
        let config = RenderConfig {
            bundle_version: "9.9.9".to_string(),
            container_style: "margin: 0;".to_string(),
            ..RenderConfig::default()
        };
        let html = Renderer::new(config)?.render_with_id("Hello", &json!({"name": "x"}), "vis")?;
        assert!(html.cdn_src().starts_with("<div id=\"vis\" style=\"margin: 0;\"/>"));
        let import = "import { render, Hello } from \"https://unpkg.com/circuitsvis@9.9.9/dist/cdn/esm.js\";";
        assert!(html.cdn_src().contains(import));
        Ok(())
    }

    #[test]
    fn test_local_bundle_is_inlined() -> Result<(), Box<dyn std::error::Error>> {
        let mut bundle = NamedTempFile::new()?;
        write!(bundle, "var CircuitsVis = {{}};")?;

        let config = RenderConfig {
            local_bundle_path: Some(bundle.path().to_path_buf()),
            ..RenderConfig::default()
        };
        let html = Renderer::new(config)?.render_with_id("Hello", &json!({"name": "x"}), "vis")?;

        let expected_local = "<div id=\"vis\" style=\"margin: 15px 0;\"/>\n    <script crossorigin type=\"module\">\n    var CircuitsVis = {};\n    CircuitsVis.render(\n      \"vis\",\n      CircuitsVis.Hello,\n      {\"name\": \"x\"}\n    )\n    </script>";
        assert_eq!(html.local_src(), Some(expected_local));
        assert_eq!(html.notebook_html(), expected_local);
        assert!(html.to_string().contains("dist/cdn/esm.js"));
        Ok(())
    }

    #[test]
    fn test_missing_local_bundle() {
        let config = RenderConfig {
            local_bundle_path: Some("no/such/iife.js".into()),
            ..RenderConfig::default()
        };
        assert!(matches!(Renderer::new(config), Err(VisError::Config(_))));
    }

    #[test]
    fn test_document_and_save() -> Result<(), Box<dyn std::error::Error>> {
        let html = Renderer::default().render_with_id("Hello", &json!({"name": "x"}), "vis")?;
        let doc = html.to_document("Heads <L0>");
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<title>Heads &lt;L0&gt;</title>"));
        assert!(doc.contains(html.cdn_src()));

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("vis.html");
        html.save(&path, "Heads <L0>")?;
        assert_eq!(std::fs::read_to_string(&path)?, doc);
        Ok(())
    }

    #[derive(Serialize)]
    struct Broken {
        value: u8,
    }

    impl Component for Broken {
        const NAME: &'static str = "Broken";
        fn validate(&self) -> Result<(), VisError> {
            Err(VisError::InvalidArgument(format!("value {}", self.value)))
        }
    }

    #[test]
    fn test_render_component_validates_first() {
        assert!(matches!(
            render_component(&Broken { value: 1 }),
            Err(VisError::InvalidArgument(_))
        ));
    }
}

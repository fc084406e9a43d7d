#![allow(dead_code)]

use futures::channel::oneshot;
use merrow::{
    DiagramEngine, Document, EngineError, NodeId, RenderConfig, RenderRequest, SharedDocument,
    Theme,
};
use std::cell::RefCell;
use std::collections::HashMap;

/// What the engine saw for one render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderCall {
    pub id: String,
    pub source: String,
    pub theme: Theme,
    pub font_family: String,
    /// Whether the staging element was attached and hidden when the call started.
    pub staging_ready: bool,
}

/// Deterministic engine driven by markers in the diagram source:
///
/// - `FAIL`: render fails; parse fails too unless the source also contains `PARSE_OK`
/// - `BADSVG`: render returns malformed markup
/// - anything else renders a tiny SVG echoing id, theme and font
///
/// Sources can be gated so their render call only completes once the test releases them.
#[derive(Default)]
pub struct ScriptedEngine {
    doc: Option<SharedDocument>,
    gates: RefCell<HashMap<String, oneshot::Receiver<()>>>,
    pub renders: RefCell<Vec<RenderCall>>,
    pub parses: RefCell<Vec<String>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lets the engine inspect the staging element during render calls.
    pub fn watching(doc: &SharedDocument) -> Self {
        Self {
            doc: Some(doc.clone()),
            ..Self::default()
        }
    }

    /// The next render of `source` waits until the returned sender fires (or is dropped).
    pub fn gate(&self, source: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().insert(source.to_string(), rx);
        tx
    }
}

impl DiagramEngine for ScriptedEngine {
    async fn render(&self, request: RenderRequest<'_>) -> Result<String, EngineError> {
        let staging_ready = self.doc.as_ref().is_some_and(|doc| {
            let d = doc.borrow();
            d.is_connected(request.staging)
                && d.style_property(request.staging, "visibility") == Some("hidden")
        });
        self.renders.borrow_mut().push(RenderCall {
            id: request.id.to_string(),
            source: request.source.to_string(),
            theme: request.config.theme,
            font_family: request.config.font_family.clone(),
            staging_ready,
        });

        let gate = self.gates.borrow_mut().remove(request.source);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        if request.source.contains("FAIL") {
            return Err(EngineError::Render {
                message: "render exploded".to_string(),
            });
        }
        if request.source.contains("BADSVG") {
            return Ok("<svg><g></svg>".to_string());
        }
        Ok(format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" id="{}" data-theme="{}" data-font="{}"><text>ok</text></svg>"#,
            request.id, request.config.theme, request.config.font_family
        ))
    }

    async fn parse(&self, source: &str, _config: &RenderConfig) -> Result<(), EngineError> {
        self.parses.borrow_mut().push(source.to_string());
        if source.contains("FAIL") && !source.contains("PARSE_OK") {
            return Err(EngineError::Parse {
                message: "Parse error on line 1: unexpected end of input".to_string(),
            });
        }
        Ok(())
    }
}

/// Builds a page with one `jp-Mermaid` placeholder per source.
pub fn page(sources: &[&str]) -> (SharedDocument, Vec<NodeId>) {
    let mut doc = Document::new();
    let body = doc.body().expect("body");
    let mut placeholders = Vec::new();
    for source in sources {
        let placeholder = doc.create_element("div");
        doc.add_class(placeholder, "jp-Mermaid");
        let pre = doc.create_element("pre");
        doc.add_class(pre, "mermaid");
        doc.set_text_content(pre, source);
        doc.append_child(placeholder, pre);
        doc.append_child(body, placeholder);
        placeholders.push(placeholder);
    }
    (doc.into_shared(), placeholders)
}

pub fn svgs(doc: &SharedDocument, placeholder: NodeId) -> Vec<NodeId> {
    let d = doc.borrow();
    d.children(placeholder)
        .iter()
        .copied()
        .filter(|&c| d.tag_name(c) == Some("svg"))
        .collect()
}

pub fn panels(doc: &SharedDocument, placeholder: NodeId) -> Vec<NodeId> {
    let d = doc.borrow();
    d.children(placeholder)
        .iter()
        .copied()
        .filter(|&c| d.has_class(c, "jp-mod-warning"))
        .collect()
}

pub fn is_settled(doc: &SharedDocument, placeholder: NodeId) -> bool {
    doc.borrow().has_class(placeholder, "jp-RenderedMermaid")
}

pub fn set_theme(doc: &SharedDocument, value: &str) {
    let mut d = doc.borrow_mut();
    let root = d.root();
    d.set_attribute(root, "data-theme", value);
}

//! One render attempt for one placeholder.

use crate::SharedDocument;
use crate::config::{RenderConfig, RendererOptions};
use crate::dom::{Document, NodeId};
use crate::engine::{DiagramEngine, EngineError, RenderRequest};
use crate::ids::next_render_id;
use crate::panel::build_diagnostic_panel;
use std::rc::Rc;

/// Terminal state of a placeholder after one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// An `<svg>` was appended to the placeholder.
    Rendered,
    /// A diagnostic panel was appended instead.
    Diagnostic {
        /// Why the render call failed.
        render_error: String,
        /// Readable error from the follow-up parse call. `None` when that call produced no error,
        /// in which case the panel's message block is empty.
        message: Option<String>,
    },
    /// The placeholder was removed from the document while the engine was working; nothing
    /// was written.
    Detached,
}

impl Outcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered)
    }

    pub fn is_diagnostic(&self) -> bool {
        matches!(self, Self::Diagnostic { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptReport {
    pub placeholder: NodeId,
    pub render_id: String,
    pub outcome: Outcome,
}

/// Invisible element the engine gets as layout context. Detached again on drop, which also
/// covers attempts that are cancelled mid-render.
struct Staging {
    doc: SharedDocument,
    node: NodeId,
}

impl Staging {
    fn attach(doc: &SharedDocument) -> Self {
        let mut d = doc.borrow_mut();
        let node = d.create_element("div");
        d.set_style_property(node, "visibility", "hidden");
        let host = d.body().unwrap_or_else(|| d.root());
        d.append_child(host, node);
        Self {
            doc: Rc::clone(doc),
            node,
        }
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        match self.doc.try_borrow_mut() {
            Ok(mut d) => d.remove(self.node),
            Err(_) => tracing::warn!("document busy; staging element left attached"),
        }
    }
}

/// Removes previous output: every `<svg>` and every diagnostic panel under `placeholder`.
fn clear_output(doc: &mut Document, placeholder: NodeId, warning_class: &str) {
    let stale: Vec<NodeId> = doc
        .descendants(placeholder)
        .into_iter()
        .filter(|&n| doc.tag_name(n) == Some("svg") || doc.has_class(n, warning_class))
        .collect();
    for node in stale {
        // Nested matches are already gone with their ancestor.
        if doc.contains(node) {
            doc.remove(node);
        }
    }
}

pub(crate) async fn render_placeholder<E: DiagramEngine>(
    doc: SharedDocument,
    engine: Rc<E>,
    options: Rc<RendererOptions>,
    config: Rc<RenderConfig>,
    placeholder: NodeId,
) -> AttemptReport {
    let source = {
        let mut d = doc.borrow_mut();
        d.remove_class(placeholder, &options.rendered_class);
        clear_output(&mut d, placeholder, &options.warning_class);
        d.first_with_class(placeholder, &options.source_class)
            .map(|node| d.text_content(node))
    };
    let render_id = next_render_id(&options.id_prefix);

    let outcome = match source {
        Some(source) => attempt(&doc, &*engine, &options, &config, placeholder, &render_id, &source)
            .await,
        None => {
            let message = format!(
                "placeholder has no `.{}` source element",
                options.source_class
            );
            show_diagnostic(&doc, &options, placeholder, "", Some(&message));
            Outcome::Diagnostic {
                render_error: message.clone(),
                message: Some(message),
            }
        }
    };

    if outcome != Outcome::Detached {
        doc.borrow_mut()
            .add_class(placeholder, &options.rendered_class);
    }
    tracing::debug!(id = %render_id, outcome = ?outcome, "diagram attempt settled");
    AttemptReport {
        placeholder,
        render_id,
        outcome,
    }
}

async fn attempt<E: DiagramEngine>(
    doc: &SharedDocument,
    engine: &E,
    options: &RendererOptions,
    config: &RenderConfig,
    placeholder: NodeId,
    render_id: &str,
    source: &str,
) -> Outcome {
    let staging = Staging::attach(doc);
    let request = RenderRequest {
        id: render_id,
        source,
        staging: staging.node,
        config,
    };
    let rendered = engine.render(request).await;
    if is_gone(doc, placeholder, render_id) {
        return Outcome::Detached;
    }
    let rendered = rendered.and_then(|svg| move_into_placeholder(doc, &staging, placeholder, &svg));
    drop(staging);

    let render_error = match rendered {
        Ok(()) => return Outcome::Rendered,
        Err(err) => err,
    };
    tracing::warn!(id = %render_id, error = %render_error, "diagram render failed");

    let message = engine.parse(source, config).await.err().map(|e| e.to_string());
    if is_gone(doc, placeholder, render_id) {
        return Outcome::Detached;
    }
    show_diagnostic(doc, options, placeholder, source, message.as_deref());
    Outcome::Diagnostic {
        render_error: render_error.to_string(),
        message,
    }
}

/// Node ids outlive their nodes, so a placeholder removed during an engine call must be
/// checked for before anything is written.
fn is_gone(doc: &SharedDocument, placeholder: NodeId, render_id: &str) -> bool {
    let gone = !doc.borrow().contains(placeholder);
    if gone {
        tracing::debug!(id = %render_id, "placeholder removed mid-render; output dropped");
    }
    gone
}

/// Parses the SVG markup inside the staging element, then moves the graphic into `placeholder`.
fn move_into_placeholder(
    doc: &SharedDocument,
    staging: &Staging,
    placeholder: NodeId,
    svg: &str,
) -> Result<(), EngineError> {
    let mut d = doc.borrow_mut();
    let graphic = d
        .graft_xml(staging.node, svg)
        .map_err(|e| EngineError::InvalidSvg {
            message: e.to_string(),
        })?;
    d.append_child(placeholder, graphic);
    Ok(())
}

fn show_diagnostic(
    doc: &SharedDocument,
    options: &RendererOptions,
    placeholder: NodeId,
    source: &str,
    message: Option<&str>,
) {
    let mut d = doc.borrow_mut();
    let panel = build_diagnostic_panel(
        &mut d,
        &options.warning_class,
        source,
        message.unwrap_or_default(),
    );
    d.append_child(placeholder, panel);
}

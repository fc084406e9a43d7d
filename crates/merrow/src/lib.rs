#![forbid(unsafe_code)]

//! `merrow` keeps the Mermaid diagrams of a documentation page rendered for the page's current
//! theme.
//!
//! A page is an in-memory [`Document`]. Every element carrying the placeholder class
//! (`jp-Mermaid`) holds its raw diagram source in a child with the source class (`mermaid`).
//! [`DiagramRenderer`] renders each placeholder through a [`DiagramEngine`], appending either the
//! resulting `<svg>` or a collapsible diagnostic panel, and re-renders everything whenever the
//! root's `data-theme` attribute changes.
//!
//! # Features
//!
//! - `merman` (default): `MermanEngine`, a headless engine backed by the `merman` crate

pub mod attempt;
pub mod config;
pub mod dom;
pub mod engine;
pub mod ids;
pub mod panel;
pub mod pass;
pub mod renderer;
pub mod theme;

use std::cell::RefCell;
use std::rc::Rc;

pub use attempt::{AttemptReport, Outcome};
pub use config::{LogLevel, RenderConfig, RendererOptions};
pub use dom::{Document, NodeId};
pub use engine::{DiagramEngine, EngineError, RenderRequest};
pub use pass::{PassReport, RenderPass};
pub use renderer::{DiagramRenderer, ThemeWatcher};
pub use theme::Theme;

#[cfg(feature = "merman")]
pub use engine::MermanEngine;

/// A page shared between the renderer, its in-flight attempts and the host.
///
/// Everything runs on one thread; borrows are never held across a suspension point.
pub type SharedDocument = Rc<RefCell<Document>>;

impl Document {
    pub fn into_shared(self) -> SharedDocument {
        Rc::new(RefCell::new(self))
    }
}

//! Rendering-engine seam.
//!
//! The renderer never talks to a diagram library directly; it goes through [`DiagramEngine`].
//! With the `merman` feature (on by default), [`MermanEngine`] renders headlessly via `merman`.

use crate::config::RenderConfig;
use crate::dom::NodeId;
use std::future::Future;

#[cfg(feature = "merman")]
mod headless;

#[cfg(feature = "merman")]
pub use headless::MermanEngine;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("{message}")]
    Parse { message: String },
    #[error("{message}")]
    Render { message: String },
    #[error("Maximum text size in diagram exceeded ({len} > {max} characters)")]
    TextTooLarge { len: usize, max: usize },
    #[error("No diagram type detected")]
    NoDiagram,
    #[error("engine returned invalid SVG: {message}")]
    InvalidSvg { message: String },
}

/// One call into the engine's render entry point.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    /// Unique per attempt; engines use it as the SVG root id and for internal element ids.
    pub id: &'a str,
    pub source: &'a str,
    /// Invisible element attached to the page for the duration of the attempt.
    pub staging: NodeId,
    pub config: &'a RenderConfig,
}

/// A diagram library as seen by the renderer.
///
/// Both calls may suspend. They are driven on a single-threaded executor, so implementations do
/// not need to be `Send`.
pub trait DiagramEngine {
    /// Renders `request.source` and returns SVG markup.
    fn render(
        &self,
        request: RenderRequest<'_>,
    ) -> impl Future<Output = Result<String, EngineError>>;

    /// Validates `source` without rendering. Used only to obtain a readable error after a failed
    /// render.
    fn parse(
        &self,
        source: &str,
        config: &RenderConfig,
    ) -> impl Future<Output = Result<(), EngineError>>;
}

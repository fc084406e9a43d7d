use super::{DiagramEngine, EngineError, RenderRequest};
use crate::config::RenderConfig;
use merman::MermaidConfig;
use merman::render::{HeadlessError, HeadlessRenderer};
use std::cell::RefCell;
use std::rc::Rc;

/// [`DiagramEngine`] backed by `merman`'s headless renderer.
///
/// Layout and SVG generation are CPU-bound and complete without suspending. The engine keeps one
/// renderer per distinct [`RenderConfig`] (the most recent one), so a pass pays for site-config
/// merging once rather than per placeholder.
pub struct MermanEngine {
    base: HeadlessRenderer,
    cache: RefCell<Option<(RenderConfig, Rc<HeadlessRenderer>)>>,
}

impl Default for MermanEngine {
    fn default() -> Self {
        Self::with_renderer(HeadlessRenderer::new())
    }
}

impl std::fmt::Debug for MermanEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MermanEngine").finish_non_exhaustive()
    }
}

impl MermanEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `base` (engine, parse, layout and SVG options) for every render; per-call
    /// configuration is merged on top as site config.
    pub fn with_renderer(base: HeadlessRenderer) -> Self {
        Self {
            base,
            cache: RefCell::new(None),
        }
    }

    fn renderer_for(&self, config: &RenderConfig) -> Rc<HeadlessRenderer> {
        let mut cache = self.cache.borrow_mut();
        if let Some((cached, renderer)) = cache.as_ref() {
            if cached == config {
                return Rc::clone(renderer);
            }
        }
        let site_config = MermaidConfig::from_value(config.to_site_config());
        let renderer = Rc::new(self.base.clone().with_site_config(site_config));
        *cache = Some((config.clone(), Rc::clone(&renderer)));
        renderer
    }
}

fn check_text_size(source: &str, config: &RenderConfig) -> Result<(), EngineError> {
    let len = source.chars().count();
    if len > config.max_text_size {
        return Err(EngineError::TextTooLarge {
            len,
            max: config.max_text_size,
        });
    }
    Ok(())
}

fn headless_error(err: HeadlessError) -> EngineError {
    match err {
        HeadlessError::Parse(err) => EngineError::Parse {
            message: err.to_string(),
        },
        HeadlessError::Render(err) => EngineError::Render {
            message: err.to_string(),
        },
    }
}

impl DiagramEngine for MermanEngine {
    async fn render(&self, request: RenderRequest<'_>) -> Result<String, EngineError> {
        check_text_size(request.source, request.config)?;
        let renderer = self.renderer_for(request.config);
        renderer
            .render_svg_sync_with_diagram_id(request.source, request.id)
            .map_err(headless_error)?
            .ok_or(EngineError::NoDiagram)
    }

    async fn parse(&self, source: &str, config: &RenderConfig) -> Result<(), EngineError> {
        check_text_size(source, config)?;
        let renderer = self.renderer_for(config);
        renderer
            .parse_diagram_sync(source)
            .map_err(headless_error)?
            .map(|_| ())
            .ok_or(EngineError::NoDiagram)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::theme::Theme;
    use futures::executor::block_on;

    fn request<'a>(id: &'a str, source: &'a str, config: &'a RenderConfig) -> RenderRequest<'a> {
        let doc = Document::new();
        RenderRequest {
            id,
            source,
            staging: doc.root(),
            config,
        }
    }

    #[test]
    fn renders_svg_with_requested_id() {
        let engine = MermanEngine::new();
        let config = RenderConfig::default();
        let svg = block_on(engine.render(request("jp-mermaid-7", "graph TD; A-->B", &config)))
            .unwrap();
        assert!(svg.trim_start().starts_with("<svg"));
        assert!(svg.contains("jp-mermaid-7"));
    }

    #[test]
    fn truncated_flowchart_reports_parse_error() {
        let engine = MermanEngine::new();
        let config = RenderConfig::default();
        let err = block_on(engine.parse("graph TD; A--", &config)).unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn oversized_source_is_rejected_before_layout() {
        let engine = MermanEngine::new();
        let config = RenderConfig {
            max_text_size: 8,
            ..RenderConfig::default()
        };
        let err = block_on(engine.render(request("m", "graph TD; A-->B", &config))).unwrap_err();
        assert_eq!(err, EngineError::TextTooLarge { len: 15, max: 8 });
    }

    #[test]
    fn renderer_cache_follows_config() {
        let engine = MermanEngine::new();
        let light = RenderConfig::default();
        let dark = RenderConfig {
            theme: Theme::Dark,
            ..RenderConfig::default()
        };
        let a = engine.renderer_for(&light);
        let b = engine.renderer_for(&light);
        assert!(Rc::ptr_eq(&a, &b));
        let c = engine.renderer_for(&dark);
        assert!(!Rc::ptr_eq(&a, &c));
    }
}

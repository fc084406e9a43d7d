#![cfg(feature = "merman")]

use futures::executor::{LocalPool, block_on};
use futures::task::LocalSpawnExt;
use merrow::{DiagramRenderer, Document, MermanEngine, Outcome, Theme};

const PAGE: &str = r#"<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
  <head><title>diagrams</title></head>
  <body>
    <div class="jp-Mermaid"><pre class="mermaid">graph TD; A--&gt;B</pre></div>
    <div class="jp-Mermaid"><pre class="mermaid">graph TD; A--</pre></div>
  </body>
</html>"#;

#[test]
fn valid_and_truncated_flowcharts() {
    let doc = Document::parse_xml(PAGE).unwrap().into_shared();
    let renderer = DiagramRenderer::new(doc.clone(), MermanEngine::new());

    let mut pool = LocalPool::new();
    let watcher = renderer.init().unwrap();
    pool.spawner().spawn_local(watcher.run()).unwrap();
    pool.run_until_stalled();

    let d = doc.borrow();
    let placeholders = d.elements_with_class(d.root(), "jp-Mermaid");
    assert_eq!(placeholders.len(), 2);

    let first = placeholders[0];
    assert!(d.has_class(first, "jp-RenderedMermaid"));
    assert_eq!(d.elements_by_tag(first, "svg").len(), 1);
    assert!(d.elements_with_class(first, "jp-mod-warning").is_empty());

    let second = placeholders[1];
    assert!(d.has_class(second, "jp-RenderedMermaid"));
    assert!(d.elements_by_tag(second, "svg").is_empty());
    let panel = d.elements_with_class(second, "jp-mod-warning");
    assert_eq!(panel.len(), 1);
    assert_eq!(d.tag_name(panel[0]), Some("details"));
    assert_eq!(d.elements_by_tag(panel[0], "summary").len(), 1);
    let pres = d.elements_by_tag(panel[0], "pre");
    assert_eq!(pres.len(), 2);
    assert_eq!(d.text_content(pres[0]), "graph TD; A--");
    assert!(!d.text_content(pres[1]).trim().is_empty());
}

#[test]
fn dark_theme_changes_rendered_svg() {
    let doc = Document::parse_xml(PAGE).unwrap().into_shared();
    let renderer = DiagramRenderer::new(doc.clone(), MermanEngine::new());

    let light = block_on(renderer.render_pass()).unwrap();
    assert_eq!(light.config.theme, Theme::Default);
    let light_svg = {
        let d = doc.borrow();
        let svg = d.elements_by_tag(d.root(), "svg")[0];
        d.inner_html(svg)
    };

    {
        let mut d = doc.borrow_mut();
        let root = d.root();
        d.set_attribute(root, "data-theme", "dark");
    }
    let dark = block_on(renderer.render_pass()).unwrap();
    assert_eq!(dark.config.theme, Theme::Dark);
    assert!(dark.attempts[0].outcome.is_rendered());
    assert!(matches!(dark.attempts[1].outcome, Outcome::Diagnostic { .. }));

    // Ids differ per attempt; anything else that differs comes from the theme.
    let light_svg = light_svg.replace(
        &light.attempts[0].render_id,
        &dark.attempts[0].render_id,
    );
    let d = doc.borrow();
    let svgs = d.elements_by_tag(d.root(), "svg");
    assert_eq!(svgs.len(), 1);
    assert_ne!(d.inner_html(svgs[0]), light_svg);
}

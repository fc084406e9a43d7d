use crate::dom::{Document, NodeId};

/// Builds a detached diagnostic panel:
///
/// ```html
/// <details class="{warning_class}">
///   <summary><pre><code>{source}</code></pre></summary>
///   <pre><code>{message}</code></pre>
/// </details>
/// ```
///
/// Source and message are inserted as text, so they show up verbatim.
pub fn build_diagnostic_panel(
    doc: &mut Document,
    warning_class: &str,
    source: &str,
    message: &str,
) -> NodeId {
    let details = doc.create_element("details");
    doc.add_class(details, warning_class);

    let summary = doc.create_element("summary");
    let source_pre = code_block(doc, source);
    doc.append_child(summary, source_pre);
    doc.append_child(details, summary);

    let message_pre = code_block(doc, message);
    doc.append_child(details, message_pre);
    details
}

fn code_block(doc: &mut Document, text: &str) -> NodeId {
    let pre = doc.create_element("pre");
    let code = doc.create_element("code");
    doc.set_text_content(code, text);
    doc.append_child(pre, code);
    pre
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_layout() {
        let mut doc = Document::new();
        let panel = build_diagnostic_panel(&mut doc, "jp-mod-warning", "graph TD; A--<x>", "boom");
        assert_eq!(
            doc.outer_html(panel),
            "<details class=\"jp-mod-warning\"><summary><pre><code>graph TD; A--&lt;x&gt;</code></pre></summary><pre><code>boom</code></pre></details>"
        );
        let pres = doc.elements_by_tag(panel, "pre");
        assert_eq!(doc.text_content(pres[0]), "graph TD; A--<x>");
    }

    #[test]
    fn empty_message_still_has_second_block() {
        let mut doc = Document::new();
        let panel = build_diagnostic_panel(&mut doc, "w", "x", "");
        let pres = doc.elements_by_tag(panel, "pre");
        assert_eq!(pres.len(), 2);
        assert_eq!(doc.text_content(pres[1]), "");
    }
}

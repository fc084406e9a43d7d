use super::{Document, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

impl Document {
    /// Serializes the whole page, prefixed with `<!DOCTYPE html>`.
    pub fn to_html(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>\n");
        self.write_node(self.root, false, &mut out);
        out.push('\n');
        out
    }

    /// Serializes `id` including its own tag.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, self.in_foreign_content(id), &mut out);
        out
    }

    /// Serializes the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        let foreign = self.in_foreign_content(id) || self.tag_name(id) == Some("svg");
        for &child in self.children(id) {
            self.write_node(child, foreign, &mut out);
        }
        out
    }

    fn in_foreign_content(&self, id: NodeId) -> bool {
        let mut cur = self.parent(id);
        while let Some(node) = cur {
            if self.tag_name(node) == Some("svg") {
                return true;
            }
            cur = self.parent(node);
        }
        false
    }

    fn write_node(&self, id: NodeId, foreign: bool, out: &mut String) {
        if let Some(text) = self.text(id) {
            // HTML parses <script>/<style> as raw text; inside SVG, entities are decoded.
            let raw = !foreign
                && self
                    .parent(id)
                    .and_then(|p| self.tag_name(p))
                    .is_some_and(|t| t == "script" || t == "style");
            if raw {
                out.push_str(text);
            } else {
                escape_text(text, out);
            }
            return;
        }
        let Some(tag) = self.tag_name(id) else {
            return;
        };

        out.push('<');
        out.push_str(tag);
        for (name, value) in self.attributes(id) {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            escape_attr(value, out);
            out.push('"');
        }

        let children = self.children(id);
        if children.is_empty() && (VOID_ELEMENTS.contains(&tag) && !foreign) {
            out.push_str("/>");
            return;
        }
        out.push('>');
        let foreign = foreign || tag == "svg";
        for &child in children {
            self.write_node(child, foreign, out);
        }
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
}

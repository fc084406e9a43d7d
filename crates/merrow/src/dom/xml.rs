use super::{Document, DomError, NodeId, Result};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

fn parse(text: &str) -> Result<roxmltree::Document<'_>> {
    // Pages usually start with `<!DOCTYPE html>`, which roxmltree rejects unless DTDs are allowed.
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    Ok(roxmltree::Document::parse_with_options(text, options)?)
}

impl Document {
    /// Builds a document from well-formed XML/XHTML.
    ///
    /// Comments and processing instructions are dropped. Namespaces are kept as `xmlns`
    /// attributes wherever an element's namespace differs from its parent's.
    pub fn parse_xml(text: &str) -> Result<Self> {
        let xml = parse(text)?;
        let src_root = xml.root_element();
        let mut doc = Self::with_root(src_root.tag_name().name());
        let root = doc.root;
        doc.import_attributes(root, src_root, None, true);
        for child in src_root.children() {
            doc.import(root, child, src_root.tag_name().namespace());
        }
        Ok(doc)
    }

    /// Parses an XML fragment (typically SVG markup) and appends its root element to `parent`.
    ///
    /// Returns the id of the appended element. On error the document is left unchanged.
    pub fn graft_xml(&mut self, parent: NodeId, text: &str) -> Result<NodeId> {
        let xml = parse(text)?;
        self.import(parent, xml.root_element(), None)
            .ok_or(DomError::NoRootElement)
    }

    fn import(
        &mut self,
        parent: NodeId,
        src: roxmltree::Node<'_, '_>,
        parent_ns: Option<&str>,
    ) -> Option<NodeId> {
        if src.is_text() {
            let text = src.text().unwrap_or_default();
            let node = self.create_text(text);
            self.append_child(parent, node);
            return Some(node);
        }
        if !src.is_element() {
            return None;
        }

        let node = self.create_element(src.tag_name().name());
        self.import_attributes(node, src, parent_ns, parent_ns.is_none());
        self.append_child(parent, node);

        let ns = src.tag_name().namespace();
        for child in src.children() {
            self.import(node, child, ns);
        }
        Some(node)
    }

    /// Copies attributes of `src` onto `node`. `declare_prefixes` re-emits every in-scope
    /// prefixed namespace, which is needed at the top of an imported subtree.
    fn import_attributes(
        &mut self,
        node: NodeId,
        src: roxmltree::Node<'_, '_>,
        parent_ns: Option<&str>,
        declare_prefixes: bool,
    ) {
        let ns = src.tag_name().namespace();
        if let Some(uri) = ns {
            if ns != parent_ns {
                self.set_attribute(node, "xmlns", uri);
            }
        }
        if declare_prefixes {
            for decl in src.namespaces() {
                let Some(prefix) = decl.name() else {
                    continue;
                };
                if decl.uri() == XML_NAMESPACE {
                    continue;
                }
                self.set_attribute(node, &format!("xmlns:{prefix}"), decl.uri());
            }
        }
        for attr in src.attributes() {
            let name = match attr.namespace().and_then(|uri| src.lookup_prefix(uri)) {
                Some(prefix) => format!("{prefix}:{}", attr.name()),
                None => attr.name().to_string(),
            };
            self.set_attribute(node, &name, attr.value());
        }
    }
}

use super::{Document, NodeId};

/// Splits an inline `style` attribute into `(property, value)` declarations.
///
/// Values are trimmed; `!important` is kept as part of the value. Declarations without a `:` are
/// skipped, mirroring how browsers drop invalid declarations.
fn declarations(style: &str) -> impl Iterator<Item = (&str, &str)> {
    style.split(';').filter_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some((name, value.trim()))
    })
}

impl Document {
    /// Reads one declaration from the inline `style` attribute of `id`.
    ///
    /// The last declaration wins, as in CSS.
    pub fn style_property(&self, id: NodeId, property: &str) -> Option<&str> {
        let style = self.attribute(id, "style")?;
        declarations(style)
            .filter(|(name, _)| *name == property)
            .map(|(_, value)| value)
            .last()
    }

    /// Sets (or replaces) one declaration in the inline `style` attribute of `id`.
    pub fn set_style_property(&mut self, id: NodeId, property: &str, value: &str) {
        let mut out: Vec<String> = self
            .attribute(id, "style")
            .map(|style| {
                declarations(style)
                    .filter(|(name, _)| *name != property)
                    .map(|(name, value)| format!("{name}: {value}"))
                    .collect()
            })
            .unwrap_or_default();
        out.push(format!("{property}: {value}"));
        let joined = out.join("; ");
        self.set_attribute(id, "style", &joined);
    }

    /// Resolves a custom property (`--name`) for `id` the way computed style would for inline
    /// declarations: the nearest element on the ancestor chain that declares it wins.
    ///
    /// Returns an empty string when no ancestor declares the property, matching
    /// `getComputedStyle(el).getPropertyValue("--missing")`.
    pub fn computed_custom_property(&self, id: NodeId, property: &str) -> String {
        let mut cur = Some(id);
        while let Some(node) = cur {
            if let Some(value) = self.style_property(node, property) {
                return value.to_string();
            }
            cur = self.parent(node);
        }
        String::new()
    }
}

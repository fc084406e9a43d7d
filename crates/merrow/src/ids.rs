use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_RENDER_ID: AtomicU64 = AtomicU64::new(0);

/// Allocates the next render identifier, e.g. `jp-mermaid-12`.
///
/// The counter is process-wide and only ever increases, so identifiers are unique across every
/// renderer and every pass for the lifetime of the process.
pub fn next_render_id(prefix: &str) -> String {
    let n = NEXT_RENDER_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}{n}")
}

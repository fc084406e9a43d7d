//! A re-render pass: every placeholder on the page, rendered concurrently as one task group.

use crate::SharedDocument;
use crate::attempt::{AttemptReport, render_placeholder};
use crate::config::{RenderConfig, RendererOptions};
use crate::engine::DiagramEngine;
use crate::theme::Theme;
use futures::FutureExt;
use futures::future::{AbortHandle, Abortable, Aborted, LocalBoxFuture, join_all};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// Configuration every attempt of the pass rendered with.
    pub config: RenderConfig,
    /// One entry per placeholder, in document order.
    pub attempts: Vec<AttemptReport>,
}

impl PassReport {
    pub fn rendered(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.outcome.is_rendered())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.outcome.is_diagnostic())
            .count()
    }
}

/// An in-flight pass.
///
/// Theme, font and the placeholder list are captured when the pass is created; attempts start
/// (in document order) on first poll and settle independently. Resolves to
/// `Err(Aborted)` if the pass was cancelled, in which case unfinished attempts are dropped
/// together with their staging elements.
#[must_use = "a pass does nothing unless polled"]
pub struct RenderPass {
    handle: AbortHandle,
    inner: Abortable<LocalBoxFuture<'static, PassReport>>,
}

impl std::fmt::Debug for RenderPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPass")
            .field("aborted", &self.handle.is_aborted())
            .finish_non_exhaustive()
    }
}

impl RenderPass {
    pub(crate) fn start<E: DiagramEngine + 'static>(
        doc: &SharedDocument,
        engine: &Rc<E>,
        options: &Rc<RendererOptions>,
    ) -> Self {
        let (config, placeholders) = {
            let d = doc.borrow();
            let root = d.root();
            let theme = Theme::from_attribute(d.attribute(root, &options.theme_attribute));
            let font_family = d
                .body()
                .map(|body| d.computed_custom_property(body, &options.font_family_property))
                .unwrap_or_default();
            let placeholders = d.elements_with_class(root, &options.placeholder_class);
            (options.render_config(theme, font_family), placeholders)
        };
        tracing::debug!(
            theme = %config.theme,
            font_family = %config.font_family,
            placeholders = placeholders.len(),
            "starting render pass"
        );

        let config = Rc::new(config);
        let attempts: Vec<_> = placeholders
            .into_iter()
            .map(|placeholder| {
                render_placeholder(
                    Rc::clone(doc),
                    Rc::clone(engine),
                    Rc::clone(options),
                    Rc::clone(&config),
                    placeholder,
                )
            })
            .collect();
        let group = async move {
            let attempts = join_all(attempts).await;
            PassReport {
                config: (*config).clone(),
                attempts,
            }
        }
        .boxed_local();

        let (handle, registration) = AbortHandle::new_pair();
        Self {
            handle,
            inner: Abortable::new(group, registration),
        }
    }

    /// Handle that cancels this pass from elsewhere.
    pub fn abort_handle(&self) -> AbortHandle {
        self.handle.clone()
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.handle.is_aborted()
    }
}

impl Future for RenderPass {
    type Output = Result<PassReport, Aborted>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().inner.poll_unpin(cx)
    }
}

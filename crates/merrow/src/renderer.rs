//! The theme-reactive diagram renderer.

use crate::SharedDocument;
use crate::config::RendererOptions;
use crate::dom::{MutationReceiver, MutationRecord, ObserverId};
use crate::engine::DiagramEngine;
use crate::pass::RenderPass;
use futures::future::{self, AbortHandle, Either};
use futures::{FutureExt, StreamExt};
use std::cell::RefCell;
use std::pin::pin;
use std::rc::Rc;

#[derive(Debug, Default)]
struct WatchState {
    initialized: bool,
    observer: Option<ObserverId>,
    current: Option<AbortHandle>,
}

/// Keeps every diagram placeholder of a page rendered for the page's current theme and font.
///
/// ```no_run
/// # #[cfg(feature = "merman")]
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use futures::executor::LocalPool;
/// use futures::task::LocalSpawnExt;
/// use merrow::{DiagramRenderer, Document, MermanEngine};
///
/// let doc = Document::parse_xml(&std::fs::read_to_string("page.xhtml")?)?.into_shared();
/// let renderer = DiagramRenderer::new(doc.clone(), MermanEngine::new());
///
/// let mut pool = LocalPool::new();
/// if let Some(watcher) = renderer.init() {
///     pool.spawner().spawn_local(watcher.run())?;
/// }
/// pool.run_until_stalled();
///
/// // Flipping the theme re-renders every placeholder.
/// let root = doc.borrow().root();
/// doc.borrow_mut().set_attribute(root, "data-theme", "dark");
/// pool.run_until_stalled();
/// # Ok(())
/// # }
/// # #[cfg(not(feature = "merman"))]
/// # fn main() {}
/// ```
pub struct DiagramRenderer<E> {
    doc: SharedDocument,
    engine: Rc<E>,
    options: Rc<RendererOptions>,
    state: Rc<RefCell<WatchState>>,
}

impl<E> Clone for DiagramRenderer<E> {
    fn clone(&self) -> Self {
        Self {
            doc: Rc::clone(&self.doc),
            engine: Rc::clone(&self.engine),
            options: Rc::clone(&self.options),
            state: Rc::clone(&self.state),
        }
    }
}

impl<E: DiagramEngine + 'static> DiagramRenderer<E> {
    pub fn new(doc: SharedDocument, engine: E) -> Self {
        Self::with_options(doc, engine, RendererOptions::default())
    }

    pub fn with_options(doc: SharedDocument, engine: E, options: RendererOptions) -> Self {
        Self {
            doc,
            engine: Rc::new(engine),
            options: Rc::new(options),
            state: Rc::new(RefCell::new(WatchState::default())),
        }
    }

    pub fn document(&self) -> &SharedDocument {
        &self.doc
    }

    pub fn options(&self) -> &RendererOptions {
        &self.options
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Starts a pass over every placeholder currently on the page.
    ///
    /// A pass that is still in flight from an earlier call (or from the watcher) is cancelled
    /// first; only the newest pass applies output.
    pub fn render_pass(&self) -> RenderPass {
        let pass = RenderPass::start(&self.doc, &self.engine, &self.options);
        let previous = self
            .state
            .borrow_mut()
            .current
            .replace(pass.abort_handle());
        if let Some(previous) = previous {
            previous.abort();
        }
        pass
    }

    /// Installs the theme observer and starts the initial pass.
    ///
    /// Returns the watcher that drives the initial pass and every pass triggered by a theme
    /// change; spawn it on a local executor. Calling `init` again is a no-op and returns `None`.
    pub fn init(&self) -> Option<ThemeWatcher<E>> {
        {
            let mut state = self.state.borrow_mut();
            if state.initialized {
                return None;
            }
            state.initialized = true;
        }

        let (observer, mutations) = {
            let mut doc = self.doc.borrow_mut();
            let root = doc.root();
            doc.observe_attributes(root, &[self.options.theme_attribute.as_str()])
        };
        self.state.borrow_mut().observer = Some(observer);
        tracing::debug!(attribute = %self.options.theme_attribute, "theme observer installed");

        let initial = self.render_pass();
        Some(ThemeWatcher {
            renderer: self.clone(),
            mutations,
            initial: Some(initial),
        })
    }

    /// Disconnects the theme observer and cancels the in-flight pass, if any. The watcher
    /// returned by [`DiagramRenderer::init`] finishes once it observes the disconnect.
    ///
    /// Placeholders whose attempt was cancelled keep the state the attempt left them in: prior
    /// output already cleared and no status class. Their staging elements are detached. Run
    /// [`DiagramRenderer::render_pass`] afterwards to bring them back.
    pub fn shutdown(&self) {
        let (observer, current) = {
            let mut state = self.state.borrow_mut();
            (state.observer.take(), state.current.take())
        };
        if let Some(current) = current {
            current.abort();
        }
        if let Some(observer) = observer {
            match self.doc.try_borrow_mut() {
                Ok(mut doc) => doc.disconnect(observer),
                Err(_) => tracing::warn!("document busy; theme observer left connected"),
            }
        }
    }
}

/// Drives the initial pass and re-renders on every theme change until the observer is
/// disconnected.
#[must_use = "the watcher does nothing unless run"]
pub struct ThemeWatcher<E> {
    renderer: DiagramRenderer<E>,
    mutations: MutationReceiver,
    initial: Option<RenderPass>,
}

/// Waits for the next record, then takes everything else already queued with it.
async fn next_batch(mutations: &mut MutationReceiver) -> Option<Vec<MutationRecord>> {
    let first = mutations.next().await?;
    let mut batch = vec![first];
    while let Some(Some(record)) = mutations.next().now_or_never() {
        batch.push(record);
    }
    Some(batch)
}

fn log_settled(result: Result<crate::PassReport, future::Aborted>) {
    match result {
        Ok(report) => tracing::debug!(
            rendered = report.rendered(),
            failed = report.failed(),
            "render pass settled"
        ),
        Err(future::Aborted) => tracing::debug!("render pass cancelled"),
    }
}

impl<E: DiagramEngine + 'static> ThemeWatcher<E> {
    pub async fn run(self) {
        let ThemeWatcher {
            renderer,
            mut mutations,
            initial,
        } = self;
        let mut in_flight = initial;

        loop {
            let batch = match in_flight.take() {
                Some(pass) => {
                    let next = pin!(next_batch(&mut mutations));
                    match future::select(pass, next).await {
                        Either::Left((result, next)) => {
                            log_settled(result);
                            next.await
                        }
                        Either::Right((batch, pass)) => {
                            in_flight = Some(pass);
                            batch
                        }
                    }
                }
                None => next_batch(&mut mutations).await,
            };

            let Some(batch) = batch else {
                if let Some(pass) = in_flight.take() {
                    pass.cancel();
                }
                tracing::debug!("theme observer disconnected; watcher stopped");
                return;
            };
            if !batch.iter().any(MutationRecord::changed_value) {
                tracing::trace!(records = batch.len(), "theme attribute rewritten unchanged");
                continue;
            }
            tracing::debug!(records = batch.len(), "theme changed; re-rendering");
            // Replacing the handle drops the superseded pass and its unfinished attempts.
            in_flight = Some(renderer.render_pass());
        }
    }
}

//! Live binding of view definitions to render targets
//!
//! [`RenderBinder::bind`] subscribes to every store a view reads (the query's
//! sources and each join target), runs an initial pass, and then schedules a
//! new pass for every mutation event. Each pass:
//!
//! 1. takes a ticket and moves the view to `Loading`
//! 2. fetches base records and resolves joins through a fresh [`ViewCache`]
//! 3. renders rows (or the empty placeholder)
//! 4. replaces the target's children in one call, if its ticket is still the
//!    newest and the view is still bound
//!
//! A pass whose ticket has been overtaken is discarded. A pass whose query
//! fails leaves the last good render in place and shows the error indicator.

use crate::cache::ViewCache;
use crate::config::ViewConfig;
use crate::error::{ViewError, ViewResult};
use crate::query::RecordQuery;
use crate::resolver::JoinResolver;
use crate::row::ViewRow;
use crate::state::{validate_transition, ViewState};
use crate::target::{RenderTarget, RenderUnit};
use crate::StoreRef;
use clinic_store::{MutationEvent, StoreError, StoreResult};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Renders one View Row to display text
pub type RowRenderer = Arc<dyn Fn(&ViewRow) -> String + Send + Sync>;

/// Query, joins and row rendering of one view
#[derive(Clone)]
pub struct ViewDefinition {
    query: Arc<dyn RecordQuery>,
    resolver: JoinResolver,
    render: RowRenderer,
}

impl ViewDefinition {
    /// Create definition
    pub fn new<Q, F>(query: Q, resolver: JoinResolver, render: F) -> Self
    where
        Q: RecordQuery + 'static,
        F: Fn(&ViewRow) -> String + Send + Sync + 'static,
    {
        Self {
            query: Arc::new(query),
            resolver,
            render: Arc::new(render),
        }
    }

    /// Join resolver
    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &JoinResolver {
        &self.resolver
    }

    /// Every store whose mutations affect this view, deduplicated by name
    #[must_use]
    pub fn sources(&self) -> Vec<StoreRef> {
        let mut seen = HashSet::new();
        self.query
            .sources()
            .into_iter()
            .chain(self.resolver.target_stores())
            .filter(|store| seen.insert(store.name().to_string()))
            .collect()
    }

    /// Fetch and resolve rows with a fresh cache
    ///
    /// Pure data: nothing is rendered and no target is touched.
    pub async fn rows(&self) -> StoreResult<Vec<ViewRow>> {
        self.rows_with(&ViewCache::new()).await
    }

    /// Fetch and resolve rows through `cache`
    pub async fn rows_with(&self, cache: &ViewCache) -> StoreResult<Vec<ViewRow>> {
        let records = self.query.fetch().await?;
        Ok(self.resolver.resolve_all(records, cache).await)
    }

    /// Render one row
    #[must_use]
    pub fn render_row(&self, row: &ViewRow) -> String {
        (self.render)(row)
    }

    /// Render rows, or a single placeholder when there are none
    #[must_use]
    pub fn render_units(&self, rows: &[ViewRow], placeholder: &str) -> Vec<RenderUnit> {
        if rows.is_empty() {
            return vec![RenderUnit::Placeholder(placeholder.to_string())];
        }
        rows.iter()
            .map(|row| RenderUnit::Row(self.render_row(row)))
            .collect()
    }
}

impl fmt::Debug for ViewDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewDefinition")
            .field("query", &self.query)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

/// Result of one render pass
#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    /// Target now shows this pass
    Applied {
        /// Rendered rows (0 when the placeholder was shown)
        rows: usize,
        /// References that could not be loaded
        failed_references: usize,
    },
    /// A newer pass was issued, or the view was unbound, before this one
    /// finished
    Superseded,
    /// Base query failed; the last good render was kept
    Failed(StoreError),
}

#[derive(Debug)]
struct PassGuard {
    state: ViewState,
    bound: bool,
    last_good: Option<Vec<RenderUnit>>,
}

#[derive(Debug)]
struct ViewInner {
    target: Arc<dyn RenderTarget>,
    definition: ViewDefinition,
    config: ViewConfig,
    guard: Mutex<PassGuard>,
    issued: AtomicU64,
    generation: watch::Sender<u64>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ViewInner {
    fn transition(guard: &mut PassGuard, to: ViewState) {
        match validate_transition(guard.state, to) {
            Ok(()) => guard.state = to,
            Err(err) => debug!(error = %err, "Ignoring view transition"),
        }
    }

    /// Issue a new ticket, or `None` if unbound
    fn begin(&self) -> Option<u64> {
        let mut guard = self.guard.lock();
        if !guard.bound {
            return None;
        }
        let ticket = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Self::transition(&mut guard, ViewState::Loading);
        Some(ticket)
    }

    async fn run_pass(&self) -> PassOutcome {
        let Some(ticket) = self.begin() else {
            return PassOutcome::Superseded;
        };

        let cache = ViewCache::new();
        let result = self.definition.rows_with(&cache).await;
        let stats = cache.stats();

        let mut guard = self.guard.lock();
        if !guard.bound || self.issued.load(Ordering::SeqCst) != ticket {
            debug!(target_id = %self.target.id(), ticket, "Discarding stale pass");
            return PassOutcome::Superseded;
        }

        let outcome = match result {
            Ok(rows) => {
                let failed_references: usize = rows.iter().map(|r| r.failures().len()).sum();
                let units = self
                    .definition
                    .render_units(&rows, &self.config.empty_placeholder);

                self.target.replace_children(&units);
                if failed_references > 0 {
                    let message = format!("{failed_references} references could not be loaded");
                    self.target.set_error_indicator(Some(&message));
                } else {
                    self.target.set_error_indicator(None);
                }
                guard.last_good = Some(units);

                debug!(
                    target_id = %self.target.id(),
                    ticket,
                    rows = rows.len(),
                    lookups = stats.lookups,
                    store_reads = stats.store_reads,
                    "Pass applied"
                );
                PassOutcome::Applied {
                    rows: rows.len(),
                    failed_references,
                }
            }
            Err(err) => {
                warn!(target_id = %self.target.id(), error = %err, "Pass failed, keeping last render");
                self.target.set_error_indicator(Some(&err.to_string()));
                PassOutcome::Failed(err)
            }
        };

        Self::transition(&mut guard, ViewState::Rendered);
        drop(guard);
        self.generation.send_modify(|g| *g += 1);
        outcome
    }

    fn teardown(&self) {
        {
            let mut guard = self.guard.lock();
            if !guard.bound {
                return;
            }
            guard.bound = false;
            Self::transition(&mut guard, ViewState::Unbound);
        }
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        self.generation.send_modify(|g| *g += 1);
        info!(target_id = %self.target.id(), "View unbound");
    }
}

/// Handle to a live binding
#[derive(Debug, Clone)]
pub struct BoundView {
    inner: Arc<ViewInner>,
}

impl BoundView {
    /// Target identity
    #[inline]
    #[must_use]
    pub fn target_id(&self) -> &str {
        self.inner.target.id()
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> ViewState {
        self.inner.guard.lock().state
    }

    /// Check if still bound
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.inner.guard.lock().bound
    }

    /// Units of the newest successful pass
    #[must_use]
    pub fn last_rendered(&self) -> Option<Vec<RenderUnit>> {
        self.inner.guard.lock().last_good.clone()
    }

    /// Completed passes (and teardowns) so far
    #[must_use]
    pub fn generation(&self) -> u64 {
        *self.inner.generation.borrow()
    }

    /// Wait until at least `generation` passes have completed
    pub async fn wait_for_generation(&self, generation: u64) {
        let mut rx = self.inner.generation.subscribe();
        // The sender lives in `inner`, so the channel cannot close here
        let _ = rx.wait_for(|g| *g >= generation).await;
    }

    /// Run a pass now
    pub async fn refresh(&self) -> ViewResult<PassOutcome> {
        if !self.is_bound() {
            return Err(ViewError::Unbound(self.target_id().to_string()));
        }
        Ok(self.inner.run_pass().await)
    }

    /// Tear down: stop listening and discard any in-flight pass
    pub fn unbind(&self) {
        self.inner.teardown();
    }
}

/// Binds view definitions to render targets and keeps them current
#[derive(Debug, Default)]
pub struct RenderBinder {
    config: ViewConfig,
    views: DashMap<String, Arc<ViewInner>>,
}

impl RenderBinder {
    /// Create binder with configuration
    #[must_use]
    pub fn new(config: ViewConfig) -> Self {
        Self {
            config,
            views: DashMap::new(),
        }
    }

    /// View configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Number of live bindings
    #[must_use]
    pub fn bound_count(&self) -> usize {
        self.views.len()
    }

    /// Check if a target currently has a binding
    #[must_use]
    pub fn is_bound(&self, target_id: &str) -> bool {
        self.views
            .get(target_id)
            .is_some_and(|view| view.guard.lock().bound)
    }

    /// Bind `definition` to `target` and render it
    ///
    /// Replaces any existing binding for the same target id. Subscriptions are
    /// in place before the first pass runs, so no mutation is missed.
    pub async fn bind(&self, target: Arc<dyn RenderTarget>, definition: ViewDefinition) -> BoundView {
        let target_id = target.id().to_string();
        if let Some((_, previous)) = self.views.remove(&target_id) {
            previous.teardown();
        }

        let sources = definition.sources();
        let (generation, _) = watch::channel(0);
        let inner = Arc::new(ViewInner {
            target,
            definition,
            config: self.config.clone(),
            guard: Mutex::new(PassGuard {
                state: ViewState::Unbound,
                bound: true,
                last_good: None,
            }),
            issued: AtomicU64::new(0),
            generation,
            tasks: Mutex::new(Vec::new()),
        });

        // Capacity 1: a pending wake-up already covers any later events
        let (tx, rx) = mpsc::channel(1);
        let mut tasks = Vec::with_capacity(sources.len() + 1);
        for store in &sources {
            let events = store.subscribe();
            tasks.push(tokio::spawn(forward_mutations(
                store.name().to_string(),
                events,
                tx.clone(),
            )));
        }
        drop(tx);
        tasks.push(tokio::spawn(drive_passes(Arc::downgrade(&inner), rx)));
        *inner.tasks.lock() = tasks;

        self.views.insert(target_id.clone(), inner.clone());
        info!(
            target_id = %target_id,
            sources = sources.len(),
            "View bound"
        );

        let outcome = inner.run_pass().await;
        debug!(target_id = %target_id, ?outcome, "Initial pass");
        BoundView { inner }
    }

    /// Tear down the binding for a target, if any
    pub fn unbind(&self, target_id: &str) -> bool {
        match self.views.remove(target_id) {
            Some((_, view)) => {
                view.teardown();
                true
            }
            None => false,
        }
    }

    /// Tear down every binding
    pub fn unbind_all(&self) {
        let ids: Vec<String> = self.views.iter().map(|v| v.key().clone()).collect();
        for id in ids {
            self.unbind(&id);
        }
    }
}

/// Turn one store's mutation events into wake-ups
async fn forward_mutations(
    store: String,
    mut events: broadcast::Receiver<MutationEvent>,
    tx: mpsc::Sender<()>,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                debug!(store = %event.store, kind = ?event.kind, "Mutation observed");
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(store = %store, skipped, "Mutation events lagged, refreshing");
            }
            Err(RecvError::Closed) => break,
        }
        if let Err(mpsc::error::TrySendError::Closed(())) = tx.try_send(()) {
            break;
        }
    }
}

/// Start a pass per wake-up while the view is alive
async fn drive_passes(view: Weak<ViewInner>, mut rx: mpsc::Receiver<()>) {
    while rx.recv().await.is_some() {
        let Some(inner) = view.upgrade() else {
            break;
        };
        tokio::spawn(async move {
            inner.run_pass().await;
        });
    }
}

//! Selection controller: keeps the result set, the selected record and the
//! history URL in step.
//!
//! Every state change goes through [`SelectionController::commit`], which
//! projects the next state onto a URL fragment and pushes it to the router
//! before the state is applied. URL-to-state only happens through the route
//! handlers registered by [`SelectionController::initialize_routes`].
//!
//! Overlapping requests are ordered with two counters. The search generation
//! is bumped by every search; a search completion whose generation is no
//! longer current is discarded. The selection generation is bumped by every
//! transition that changes the selection; a fetched record is only selected
//! if no other selection change happened while it was in flight.
//!
//! A failed search restores the query whose results are on screen and, when
//! nothing else touched the selection meanwhile, the view it cleared.

use std::{
    collections::BTreeMap,
    sync::{Arc, Weak},
};

use futures::FutureExt;
use parking_lot::Mutex;
use shared::domain::{Record, RecordId, ResultSet};
use tracing::{debug, info, warn};

use crate::{
    error::ControllerError,
    routing::{build_fragment, RouteName, RouteParams, Router},
    Collection, Notification, NotificationPort, RecordSource,
};

pub const SAVED_MESSAGE: &str = "Saved successfully.";
pub const DELETED_MESSAGE: &str = "Deleted successfully.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Edit,
    Add,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveView {
    Edit(Option<Record>),
    Add,
}

impl Default for ActiveView {
    fn default() -> Self {
        Self::Edit(None)
    }
}

impl ActiveView {
    pub fn kind(&self) -> ViewKind {
        match self {
            Self::Edit(_) => ViewKind::Edit,
            Self::Add => ViewKind::Add,
        }
    }

    pub fn selected(&self) -> Option<&Record> {
        match self {
            Self::Edit(record) => record.as_ref(),
            Self::Add => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerState {
    pub items: ResultSet,
    pub search_query: String,
    pub view: ActiveView,
}

impl ControllerState {
    pub fn selected_record(&self) -> Option<&Record> {
        self.view.selected()
    }

    pub fn selected_id(&self) -> Option<RecordId> {
        self.selected_record().map(|record| record.id)
    }
}

/// `edit/<id>/` when a record is selected, otherwise `""` or `?q=<query>`.
pub fn project_url(state: &ControllerState) -> String {
    if let Some(record) = state.selected_record() {
        return format!("edit/{}/", record.id);
    }
    let mut params = BTreeMap::new();
    if !state.search_query.is_empty() {
        params.insert("q".to_string(), state.search_query.clone());
    }
    build_fragment("", &params)
}

enum Carry {
    Nothing,
    ClearSelection,
    Select {
        record: Record,
        selection_generation: u64,
    },
}

#[derive(Default)]
struct SelectionInner {
    state: ControllerState,
    /// Query whose results are in `state.items`.
    committed_query: String,
    /// View held before the pending optimistic search cleared it, valid only
    /// while the selection generation still matches.
    rollback_view: Option<(ActiveView, u64)>,
    search_generation: u64,
    selection_generation: u64,
}

pub struct SelectionController {
    collection: Arc<dyn Collection>,
    records: Arc<dyn RecordSource>,
    router: Arc<dyn Router>,
    notifier: Arc<dyn NotificationPort>,
    inner: Mutex<SelectionInner>,
}

impl SelectionController {
    pub fn new(
        collection: Arc<dyn Collection>,
        records: Arc<dyn RecordSource>,
        router: Arc<dyn Router>,
        notifier: Arc<dyn NotificationPort>,
    ) -> Arc<Self> {
        Arc::new(Self {
            collection,
            records,
            router,
            notifier,
            inner: Mutex::new(SelectionInner::default()),
        })
    }

    pub fn state(&self) -> ControllerState {
        self.inner.lock().state.clone()
    }

    pub fn current_fragment(&self) -> String {
        project_url(&self.inner.lock().state)
    }

    /// Registers the `main` and `edit` handlers. Must run before history starts.
    pub fn initialize_routes(self: &Arc<Self>, router: &dyn Router) {
        let weak = Arc::downgrade(self);
        router.on(
            RouteName::Main,
            Arc::new(move |params: RouteParams| {
                let weak: Weak<Self> = weak.clone();
                async move {
                    let Some(controller) = weak.upgrade() else {
                        return;
                    };
                    let query = params.param("q").unwrap_or_default().to_string();
                    if let Err(err) = controller.search(query, Carry::ClearSelection).await {
                        debug!(error = %err, "route main: transition not applied");
                    }
                }
                .boxed()
            }),
        );

        let weak = Arc::downgrade(self);
        router.on(
            RouteName::Edit,
            Arc::new(move |params: RouteParams| {
                let weak: Weak<Self> = weak.clone();
                async move {
                    let Some(controller) = weak.upgrade() else {
                        return;
                    };
                    let raw_id = params.id.unwrap_or_default();
                    match raw_id.parse::<RecordId>() {
                        Ok(id) => {
                            if let Err(err) = controller.on_select_item(Record::stub(id)).await {
                                debug!(error = %err, "route edit: transition not applied");
                            }
                        }
                        Err(_) => {
                            warn!(raw_id = %raw_id, "route edit: invalid record id");
                            controller
                                .notifier
                                .show(Notification::danger(format!("Invalid record id '{raw_id}'.")));
                        }
                    }
                }
                .boxed()
            }),
        );
    }

    pub async fn on_search(&self, query: impl Into<String>) -> Result<(), ControllerError> {
        self.search(query.into(), Carry::Nothing).await
    }

    pub async fn on_select_item(&self, record: Record) -> Result<(), ControllerError> {
        let id = record.id;
        let selection_generation = {
            let mut inner = self.inner.lock();
            inner.selection_generation += 1;
            let generation = inner.selection_generation;

            if self.collection.contains(id) {
                let selected = if record.is_loaded() {
                    record
                } else {
                    inner.state.items.get(id).cloned().unwrap_or(record)
                };
                let mut next = inner.state.clone();
                next.view = ActiveView::Edit(Some(selected));
                self.commit(&mut inner, next);
                info!(record_id = id.0, "selection: selected record from collection");
                return Ok(());
            }
            generation
        };

        debug!(record_id = id.0, "selection: fetching record outside collection");
        let fetched = self.records.fetch(id).await;

        let query = {
            let inner = self.inner.lock();
            if inner.selection_generation != selection_generation {
                debug!(record_id = id.0, "selection: discarding superseded fetch");
                return Err(ControllerError::StaleResponse);
            }
            inner.state.search_query.clone()
        };

        let record = match fetched {
            Ok(record) => record,
            Err(err) => {
                warn!(record_id = id.0, error = %err, "selection: fetch failed");
                self.notify_failure(&err);
                return Err(err);
            }
        };

        self.search(
            query,
            Carry::Select {
                record,
                selection_generation,
            },
        )
        .await
    }

    pub fn on_add(&self) {
        self.set_view(ActiveView::Add);
        info!("selection: add view");
    }

    pub fn on_cancel(&self) {
        self.set_view(ActiveView::Edit(None));
        info!("selection: cancel");
    }

    /// Shows the success message immediately, then selects the saved record.
    pub async fn on_save(&self, record: Record) -> Result<(), ControllerError> {
        info!(record_id = record.id.0, "selection: saved");
        self.notifier.show(Notification::success(SAVED_MESSAGE));
        self.on_select_item(record).await
    }

    pub fn on_delete(&self) {
        {
            let mut inner = self.inner.lock();
            inner.selection_generation += 1;
            let mut next = inner.state.clone();
            if let ActiveView::Edit(selected) = &mut next.view {
                *selected = None;
            }
            self.commit(&mut inner, next);
        }
        info!("selection: deleted");
        self.notifier.show(Notification::success(DELETED_MESSAGE));
    }

    fn set_view(&self, view: ActiveView) {
        let mut inner = self.inner.lock();
        inner.selection_generation += 1;
        let mut next = inner.state.clone();
        next.view = view;
        self.commit(&mut inner, next);
    }

    async fn search(&self, query: String, carry: Carry) -> Result<(), ControllerError> {
        let generation = {
            let mut inner = self.inner.lock();
            inner.search_generation += 1;
            let generation = inner.search_generation;

            if query != inner.state.search_query || matches!(carry, Carry::ClearSelection) {
                let current = inner.selection_generation;
                let prior_view = match inner.rollback_view.take() {
                    Some((view, valid_for)) if valid_for == current => view,
                    _ => inner.state.view.clone(),
                };
                inner.selection_generation += 1;
                let valid_for = inner.selection_generation;
                inner.rollback_view = Some((prior_view, valid_for));

                let mut next = inner.state.clone();
                next.search_query = query.clone();
                next.view = ActiveView::Edit(None);
                self.commit(&mut inner, next);
            }
            generation
        };

        debug!(query = %query, generation, "selection: search issued");
        let result = self.collection.search(&query).await;

        let failure = {
            let mut inner = self.inner.lock();
            if inner.search_generation != generation {
                debug!(query = %query, generation, "selection: discarding stale search");
                return Err(ControllerError::StaleResponse);
            }

            match result {
                Ok(items) => {
                    let mut next = inner.state.clone();
                    next.items = items;
                    next.search_query = query.clone();
                    if let Carry::Select {
                        record,
                        selection_generation,
                    } = carry
                    {
                        if selection_generation == inner.selection_generation {
                            next.view = ActiveView::Edit(Some(record));
                        } else {
                            debug!(record_id = record.id.0, "selection: selection superseded during search");
                        }
                    }
                    info!(query = %query, items = next.items.len(), "selection: search committed");
                    inner.committed_query = query.clone();
                    inner.rollback_view = None;
                    self.commit(&mut inner, next);
                    return Ok(());
                }
                Err(err) => {
                    let current = inner.selection_generation;
                    let mut next = inner.state.clone();
                    next.search_query = inner.committed_query.clone();
                    if let Some((view, _)) = inner
                        .rollback_view
                        .take()
                        .filter(|(_, valid_for)| *valid_for == current)
                    {
                        next.view = view;
                    }
                    if next != inner.state {
                        self.commit(&mut inner, next);
                    }
                    err
                }
            }
        };

        warn!(query = %query, error = %failure, "selection: search failed");
        self.notify_failure(&failure);
        Err(failure)
    }

    /// Pushes the URL for `next`, then applies it.
    fn commit(&self, inner: &mut SelectionInner, next: ControllerState) {
        self.sync_url(&next);
        inner.state = next;
    }

    fn sync_url(&self, next: &ControllerState) {
        let fragment = project_url(next);
        debug!(fragment = %fragment, view = ?next.view.kind(), "selection: sync url");
        self.router.navigate(&fragment);
    }

    fn notify_failure(&self, err: &ControllerError) {
        if err.is_user_visible() {
            self.notifier.show(Notification::for_error(err));
        }
    }
}

#[cfg(test)]
#[path = "tests/selection_tests.rs"]
mod tests;

use std::sync::Arc;

use parking_lot::Mutex;
use shared::protocol::{Page, PageQuery};
use tracing::{debug, info, warn};

use crate::{error::ControllerError, Notification, NotificationPort, PagingApi};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementalListState<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}

struct ListInner<T> {
    state: IncrementalListState<T>,
    in_flight: bool,
}

/// "Load more" list: pages are appended at `offset = items.len()` until the
/// API reports no further items.
pub struct IncrementalListController<T: Send + 'static> {
    api: Arc<dyn PagingApi<T>>,
    notifier: Arc<dyn NotificationPort>,
    context_key: String,
    inner: Mutex<ListInner<T>>,
}

/// Clears the in-flight flag even when the request future is dropped.
struct InFlight<'a, T> {
    inner: &'a Mutex<ListInner<T>>,
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        self.inner.lock().in_flight = false;
    }
}

impl<T: Clone + Send + Sync + 'static> IncrementalListController<T> {
    pub fn new(
        api: Arc<dyn PagingApi<T>>,
        notifier: Arc<dyn NotificationPort>,
        context_key: impl Into<String>,
        initial: Page<T>,
    ) -> Self {
        Self {
            api,
            notifier,
            context_key: context_key.into(),
            inner: Mutex::new(ListInner {
                state: IncrementalListState {
                    items: initial.items,
                    has_more: initial.has_more_items,
                },
                in_flight: false,
            }),
        }
    }

    pub fn context_key(&self) -> &str {
        &self.context_key
    }

    pub fn state(&self) -> IncrementalListState<T> {
        self.inner.lock().state.clone()
    }

    pub fn has_more(&self) -> bool {
        self.inner.lock().state.has_more
    }

    /// Returns `Ok(false)` without a request when the list is exhausted or
    /// another page request is still in flight.
    pub async fn load_more(&self) -> Result<bool, ControllerError> {
        let offset = {
            let mut inner = self.inner.lock();
            if !inner.state.has_more {
                return Ok(false);
            }
            if inner.in_flight {
                debug!(context = %self.context_key, "list: load_more already in flight");
                return Ok(false);
            }
            inner.in_flight = true;
            inner.state.items.len()
        };
        let guard = InFlight { inner: &self.inner };

        debug!(context = %self.context_key, offset, "list: requesting page");
        let result = self
            .api
            .get_page_after(&self.context_key, PageQuery { offset })
            .await;
        drop(guard);

        match result {
            Ok(page) => {
                let appended = page.items.len();
                let total = {
                    let mut inner = self.inner.lock();
                    inner.state.items.extend(page.items);
                    inner.state.has_more = page.has_more_items;
                    inner.state.items.len()
                };
                info!(
                    context = %self.context_key,
                    appended,
                    total,
                    has_more = page.has_more_items,
                    "list: page appended"
                );
                Ok(true)
            }
            Err(err) => {
                warn!(context = %self.context_key, offset, error = %err, "list: page request failed");
                if err.is_user_visible() {
                    self.notifier.show(Notification::for_error(&err));
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/incremental_tests.rs"]
mod tests;

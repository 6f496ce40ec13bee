use async_trait::async_trait;
use shared::{
    domain::{Record, RecordId, ResultSet},
    protocol::{Page, PageQuery},
};
use tracing::{info, warn};

pub mod error;
pub mod http;
pub mod incremental;
pub mod memory;
pub mod routing;
pub mod selection;

pub use error::{ControllerError, RoutingError};
pub use http::HttpBackend;
pub use incremental::{IncrementalListController, IncrementalListState};
pub use memory::{MemoryPages, MemoryStore};
pub use routing::{
    HistoryOptions, HistoryRouter, RouteHandler, RouteName, RouteParams, Router,
};
pub use selection::{project_url, ActiveView, ControllerState, SelectionController, ViewKind};

/// Searchable record store. `search` replaces the current result set.
#[async_trait]
pub trait Collection: Send + Sync {
    async fn search(&self, query: &str) -> Result<ResultSet, ControllerError>;
    fn contains(&self, id: RecordId) -> bool;
}

/// Resolves a record stub into a fully loaded record.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch(&self, id: RecordId) -> Result<Record, ControllerError>;
}

#[async_trait]
pub trait PagingApi<T: Send + 'static>: Send + Sync {
    async fn get_page_after(
        &self,
        context_key: &str,
        query: PageQuery,
    ) -> Result<Page<T>, ControllerError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub text: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn danger(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: NotificationLevel::Danger,
        }
    }

    pub(crate) fn for_error(err: &ControllerError) -> Self {
        match err {
            ControllerError::NotFound(id) => Self::danger(format!("Record {id} was not found.")),
            ControllerError::Network(message) => {
                Self::danger(format!("Could not reach the server: {message}"))
            }
            ControllerError::StaleResponse => Self {
                text: err.to_string(),
                level: NotificationLevel::Info,
            },
        }
    }
}

/// Fire-and-forget sink for user-visible messages.
pub trait NotificationPort: Send + Sync {
    fn show(&self, notification: Notification);
}

/// Notification sink that only logs.
pub struct TracingNotifier;

impl NotificationPort for TracingNotifier {
    fn show(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Danger | NotificationLevel::Warning => {
                warn!(level = ?notification.level, "notify: {}", notification.text)
            }
            NotificationLevel::Success | NotificationLevel::Info => {
                info!(level = ?notification.level, "notify: {}", notification.text)
            }
        }
    }
}

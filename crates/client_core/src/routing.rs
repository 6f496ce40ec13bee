//! Route table, fragment building/parsing, and an in-memory push-state history.

use std::{collections::BTreeMap, collections::HashMap, sync::Arc};

use async_trait::async_trait;
use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};
use url::form_urlencoded;

use crate::error::RoutingError;

pub type RouteHandler = Arc<dyn Fn(RouteParams) -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteName {
    /// `""` with an optional query string.
    Main,
    /// `edit/<id>/` with an optional query string.
    Edit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    pub id: Option<String>,
    pub query: BTreeMap<String, String>,
}

impl RouteParams {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryOptions {
    pub push_state: bool,
    pub root: String,
}

impl HistoryOptions {
    pub fn push_state(root: &str) -> Self {
        Self {
            push_state: true,
            root: normalize_root(root),
        }
    }
}

#[async_trait]
pub trait Router: Send + Sync {
    fn on(&self, route: RouteName, handler: RouteHandler);

    /// Pushes a history entry without dispatching any route handler.
    fn navigate(&self, fragment: &str);

    fn to_fragment(&self, path: &str, params: &BTreeMap<String, String>) -> String {
        build_fragment(path, params)
    }

    /// Starts history tracking and dispatches the handler matching `location`.
    /// Returns whether a route matched.
    async fn start(&self, options: HistoryOptions, location: &str) -> Result<bool, RoutingError>;
}

/// Always `/`-prefixed and `/`-terminated.
pub fn normalize_root(root: &str) -> String {
    let trimmed = root.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

pub fn build_fragment(path: &str, params: &BTreeMap<String, String>) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, value);
    }
    format!("{path}?{}", serializer.finish())
}

pub fn match_fragment(fragment: &str) -> Option<(RouteName, RouteParams)> {
    let fragment = fragment.trim_start_matches('/');
    let (path, query) = fragment.split_once('?').unwrap_or((fragment, ""));
    let query = form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect::<BTreeMap<_, _>>();
    let segments = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>();

    match segments.as_slice() {
        [] => Some((RouteName::Main, RouteParams { id: None, query })),
        ["edit", id] => Some((
            RouteName::Edit,
            RouteParams {
                id: Some((*id).to_string()),
                query,
            },
        )),
        _ => None,
    }
}

#[derive(Default)]
struct History {
    root: Option<String>,
    entries: Vec<String>,
    index: usize,
}

impl History {
    fn current(&self) -> Option<&String> {
        self.root.as_ref()?;
        self.entries.get(self.index)
    }
}

#[derive(Default)]
pub struct HistoryRouter {
    handlers: RwLock<HashMap<RouteName, RouteHandler>>,
    history: Mutex<History>,
}

impl HistoryRouter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_started(&self) -> bool {
        self.history.lock().root.is_some()
    }

    pub fn current_fragment(&self) -> Option<String> {
        self.history.lock().current().cloned()
    }

    /// Root plus fragment, e.g. `/admin/users/edit/7/`.
    pub fn current_url(&self) -> Option<String> {
        let history = self.history.lock();
        let root = history.root.as_ref()?;
        let fragment = history.current()?;
        Some(format!("{root}{fragment}"))
    }

    pub fn entries(&self) -> Vec<String> {
        self.history.lock().entries.clone()
    }

    pub async fn back(&self) -> Result<bool, RoutingError> {
        let fragment = {
            let mut history = self.history.lock();
            if history.root.is_none() {
                return Err(RoutingError::NotStarted);
            }
            if history.index == 0 {
                return Ok(false);
            }
            history.index -= 1;
            history.entries[history.index].clone()
        };
        debug!(fragment = %fragment, "history: back");
        self.load_url(&fragment).await;
        Ok(true)
    }

    pub async fn forward(&self) -> Result<bool, RoutingError> {
        let fragment = {
            let mut history = self.history.lock();
            if history.root.is_none() {
                return Err(RoutingError::NotStarted);
            }
            if history.index + 1 >= history.entries.len() {
                return Ok(false);
            }
            history.index += 1;
            history.entries[history.index].clone()
        };
        debug!(fragment = %fragment, "history: forward");
        self.load_url(&fragment).await;
        Ok(true)
    }

    async fn load_url(&self, fragment: &str) -> bool {
        let Some((route, params)) = match_fragment(fragment) else {
            debug!(fragment = %fragment, "history: no route matched");
            return false;
        };
        let handler = self.handlers.read().get(&route).cloned();
        let Some(handler) = handler else {
            debug!(?route, "history: route has no handler");
            return false;
        };
        handler(params).await;
        true
    }
}

fn fragment_from_location(
    options: &HistoryOptions,
    root: &str,
    location: &str,
) -> Result<String, RoutingError> {
    if !options.push_state {
        return Ok(location
            .split_once('#')
            .map(|(_, fragment)| fragment.to_string())
            .unwrap_or_default());
    }

    let bare_root = root.trim_end_matches('/');
    let outside = || RoutingError::OutsideRoot {
        location: location.to_string(),
        root: root.to_string(),
    };
    if let Some(rest) = location.strip_prefix(root) {
        return Ok(rest.to_string());
    }
    match location.strip_prefix(bare_root) {
        Some(rest) if rest.is_empty() || rest.starts_with('?') => Ok(rest.to_string()),
        _ => Err(outside()),
    }
}

#[async_trait]
impl Router for HistoryRouter {
    fn on(&self, route: RouteName, handler: RouteHandler) {
        self.handlers.write().insert(route, handler);
    }

    fn navigate(&self, fragment: &str) {
        let mut history = self.history.lock();
        if history.root.is_none() {
            debug!(fragment = %fragment, "history: navigate before start ignored");
            return;
        }
        if history.current().map(String::as_str) == Some(fragment) {
            return;
        }
        let keep = history.index + 1;
        history.entries.truncate(keep);
        history.entries.push(fragment.to_string());
        history.index = history.entries.len() - 1;
        debug!(fragment = %fragment, depth = history.entries.len(), "history: push");
    }

    async fn start(&self, options: HistoryOptions, location: &str) -> Result<bool, RoutingError> {
        let fragment = {
            let mut history = self.history.lock();
            if history.root.is_some() {
                return Err(RoutingError::AlreadyStarted);
            }
            let root = normalize_root(&options.root);
            let fragment = fragment_from_location(&options, &root, location)?;
            info!(root = %root, fragment = %fragment, "history: started");
            history.root = Some(root);
            history.entries = vec![fragment.clone()];
            history.index = 0;
            fragment
        };
        Ok(self.load_url(&fragment).await)
    }
}

#[cfg(test)]
#[path = "tests/routing_tests.rs"]
mod tests;

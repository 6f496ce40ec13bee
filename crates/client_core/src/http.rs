//! Records API over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Contributor, Record, RecordId, ResultSet},
    error::ApiError,
    protocol::{Page, PageQuery, RecordPayload, SearchResponse},
};
use tracing::{debug, warn};
use url::Url;

use crate::{error::ControllerError, Collection, PagingApi, RecordSource};

#[derive(Default)]
struct AppliedResult {
    sequence: u64,
    items: ResultSet,
}

pub struct HttpBackend {
    http: Client,
    api_url: Url,
    issued: AtomicU64,
    current: Mutex<AppliedResult>,
}

impl HttpBackend {
    pub fn new(api_url: &str) -> Result<Self> {
        let mut api_url =
            Url::parse(api_url).with_context(|| format!("invalid api url '{api_url}'"))?;
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            api_url,
            issued: AtomicU64::new(0),
            current: Mutex::new(AppliedResult::default()),
        })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ControllerError> {
        self.api_url.join(path).map_err(ControllerError::network)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        record_id: Option<RecordId>,
    ) -> Result<T, ControllerError> {
        debug!(url = %url, "http: GET");
        let res = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(ControllerError::network)?;

        let status = res.status();
        if status.is_success() {
            return res.json::<T>().await.map_err(ControllerError::network);
        }

        let body = res.text().await.unwrap_or_default();
        let api_error = serde_json::from_str::<ApiError>(&body).ok();
        if let Some(id) = record_id {
            let not_found = status == StatusCode::NOT_FOUND
                || api_error.as_ref().is_some_and(ApiError::is_not_found);
            if not_found {
                return Err(ControllerError::NotFound(id));
            }
        }

        warn!(url = %url, %status, "http: request failed");
        Err(match api_error {
            Some(err) => ControllerError::Network(format!("{status}: {}", err.message)),
            None => ControllerError::Network(status.to_string()),
        })
    }
}

#[async_trait]
impl Collection for HttpBackend {
    async fn search(&self, query: &str) -> Result<ResultSet, ControllerError> {
        let sequence = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let mut url = self.endpoint("users/")?;
        if !query.is_empty() {
            url.query_pairs_mut().append_pair("q", query);
        }

        let response: SearchResponse = self.get_json(url, None).await?;
        let items = ResultSet::from(response);

        let mut current = self.current.lock();
        if sequence > current.sequence {
            current.sequence = sequence;
            current.items = items.clone();
        } else {
            debug!(sequence, applied = current.sequence, "http: older search response not applied");
        }
        Ok(items)
    }

    fn contains(&self, id: RecordId) -> bool {
        self.current.lock().items.contains(id)
    }
}

#[async_trait]
impl RecordSource for HttpBackend {
    async fn fetch(&self, id: RecordId) -> Result<Record, ControllerError> {
        let url = self.endpoint(&format!("users/{id}/"))?;
        let payload: RecordPayload = self.get_json(url, Some(id)).await?;
        Ok(Record::from(payload))
    }
}

#[async_trait]
impl PagingApi<Contributor> for HttpBackend {
    async fn get_page_after(
        &self,
        context_key: &str,
        query: PageQuery,
    ) -> Result<Page<Contributor>, ControllerError> {
        let mut url = self.endpoint("stats/contributors/")?;
        url.query_pairs_mut()
            .append_pair("path", context_key)
            .append_pair("offset", &query.offset.to_string());
        self.get_json(url, None).await
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;

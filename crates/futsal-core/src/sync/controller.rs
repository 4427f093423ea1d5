use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError};
use crate::cache::CacheManager;
use crate::config::RetryPolicy;
use crate::models::{Collection, Records};

use super::{LoadStatus, Refresh, Snapshot};

/// Every attempt to fetch a collection failed.
#[derive(Error, Debug)]
#[error("Failed to load {collection} after {attempts} attempts: {source}")]
pub struct FetchError {
    pub collection: Collection,
    pub attempts: u32,
    #[source]
    pub source: ApiError,
}

/// Fetches the tournament collections, caching successes and tracking
/// per-collection load status.
pub struct DataSyncController {
    api: ApiClient,
    cache: CacheManager,
    retry: RetryPolicy,
    statuses: Mutex<HashMap<Collection, LoadStatus>>,
}

impl DataSyncController {
    pub fn new(api: ApiClient, cache: CacheManager, retry: RetryPolicy) -> Self {
        Self {
            api,
            cache,
            retry,
            statuses: Mutex::new(HashMap::new()),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    fn statuses_mut(&self) -> MutexGuard<'_, HashMap<Collection, LoadStatus>> {
        self.statuses.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_status(&self, collection: Collection, status: LoadStatus) {
        self.statuses_mut().insert(collection, status);
    }

    /// Fetch one collection, serving a fresh cache entry unless `refresh`
    /// is [`Refresh::Force`].
    pub async fn fetch_collection(
        &self,
        collection: Collection,
        refresh: Refresh,
    ) -> Result<Arc<Records>, FetchError> {
        if refresh == Refresh::IfStale {
            if let Some(records) = self.cache.get_fresh(collection) {
                debug!(%collection, "Cache hit");
                self.set_status(collection, LoadStatus::Ready(Arc::clone(&records)));
                return Ok(records);
            }
        }

        self.set_status(collection, LoadStatus::Loading);

        let max_attempts = self.retry.max_attempts();
        let mut attempt = 1;
        loop {
            match self.api.fetch(collection).await {
                Ok(records) => {
                    let records = self.cache.store(records);
                    debug!(%collection, attempt, count = records.len(), "Fetched");
                    self.set_status(collection, LoadStatus::Ready(Arc::clone(&records)));
                    return Ok(records);
                }
                Err(e) if attempt < max_attempts => {
                    let backoff = self.retry.backoff(attempt);
                    warn!(
                        %collection,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        status = ?e.status(),
                        error = %e,
                        "Fetch failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(%collection, attempts = attempt, error = %e, "Giving up on fetch");
                    self.set_status(collection, LoadStatus::Error(e.to_string()));
                    return Err(FetchError {
                        collection,
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }

    /// Like [`fetch_collection`](Self::fetch_collection), but a failure
    /// yields an empty sequence. The failure stays visible in [`status`](Self::status).
    pub async fn load(&self, collection: Collection, refresh: Refresh) -> Arc<Records> {
        self.fetch_collection(collection, refresh)
            .await
            .unwrap_or_else(|_| Arc::new(Records::empty(collection)))
    }

    /// Load every collection concurrently.
    pub async fn load_all(&self, refresh: Refresh) -> Snapshot {
        self.load_many(&Collection::ALL, refresh).await
    }

    /// Load the given collections concurrently.
    pub async fn load_many(&self, collections: &[Collection], refresh: Refresh) -> Snapshot {
        let loads = collections.iter().map(|&collection| async move {
            (collection, self.load(collection, refresh).await)
        });
        Snapshot::new(join_all(loads).await.into_iter().collect())
    }

    /// Drop the cached entry for `collection` and fetch it again.
    pub async fn refresh(&self, collection: Collection) -> Arc<Records> {
        self.cache.invalidate(collection);
        self.load(collection, Refresh::Force).await
    }

    /// Reload every collection whose last load failed.
    ///
    /// Returns the collections that were retried.
    pub async fn retry_failed(&self) -> Vec<Collection> {
        let failed: Vec<Collection> = self.errors().into_iter().map(|(c, _)| c).collect();
        if !failed.is_empty() {
            debug!(count = failed.len(), "Retrying failed loads");
            self.load_many(&failed, Refresh::Force).await;
        }
        failed
    }

    pub fn invalidate(&self, collection: Collection) -> bool {
        self.cache.invalidate(collection)
    }

    // ===== Status =====

    /// Status of `collection`. Collections never requested report `Loading`.
    pub fn status(&self, collection: Collection) -> LoadStatus {
        self.statuses_mut()
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Status of every collection, in load order.
    pub fn statuses(&self) -> Vec<(Collection, LoadStatus)> {
        let statuses = self.statuses_mut();
        Collection::ALL
            .iter()
            .map(|c| (*c, statuses.get(c).cloned().unwrap_or_default()))
            .collect()
    }

    /// No collection is loading.
    pub fn all_settled(&self) -> bool {
        self.statuses().iter().all(|(_, s)| !s.is_loading())
    }

    /// Every collection loaded successfully.
    pub fn all_ready(&self) -> bool {
        self.statuses().iter().all(|(_, s)| s.is_ready())
    }

    /// `(settled, total)` collection counts.
    pub fn progress(&self) -> (usize, usize) {
        let statuses = self.statuses();
        let settled = statuses.iter().filter(|(_, s)| !s.is_loading()).count();
        (settled, statuses.len())
    }

    /// Collections whose last load failed, with the cause.
    pub fn errors(&self) -> Vec<(Collection, String)> {
        self.statuses()
            .into_iter()
            .filter_map(|(c, s)| s.error().map(|cause| (c, cause.to_string())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn controller_for(server: &MockServer) -> DataSyncController {
        let api = ApiClient::new(&format!("{}/api", server.uri()), Duration::from_secs(2)).unwrap();
        let cache = CacheManager::in_memory(Duration::from_secs(300));
        let retry = RetryPolicy {
            max_retries: 3,
            initial_backoff_ms: 1,
        };
        DataSyncController::new(api, cache, retry)
    }

    #[tokio::test]
    async fn test_status_before_any_load_is_loading() {
        let server = MockServer::start().await;
        let controller = controller_for(&server);
        assert!(controller.status(Collection::Teams).is_loading());
        assert!(!controller.all_settled());
        assert_eq!(controller.progress(), (0, 6));
    }

    #[tokio::test]
    async fn test_fetch_error_reports_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/semifinals"))
            .respond_with(ResponseTemplate::new(500))
            .expect(4)
            .mount(&server)
            .await;

        let controller = controller_for(&server);
        let err = controller
            .fetch_collection(Collection::Semifinals, Refresh::IfStale)
            .await
            .unwrap_err();
        assert_eq!(err.collection, Collection::Semifinals);
        assert_eq!(err.attempts, 4);
        assert_eq!(err.source.status(), Some(500));
        assert_eq!(controller.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/points"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        let api = ApiClient::new(&format!("{}/api", server.uri()), Duration::from_secs(2)).unwrap();
        let controller = DataSyncController::new(
            api,
            CacheManager::in_memory(Duration::from_secs(300)),
            RetryPolicy {
                max_retries: 0,
                initial_backoff_ms: 1,
            },
        );
        let err = controller
            .fetch_collection(Collection::Points, Refresh::Force)
            .await
            .unwrap_err();
        assert_eq!(err.attempts, 1);
    }
}

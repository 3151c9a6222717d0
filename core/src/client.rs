//! Tag-invalidated query cache in front of the [`Transport`].
//!
//! One [`ApiClient`] is shared by every view of the process. Each distinct
//! [`QueryKey`] owns a cache entry with a `watch` channel its subscribers
//! observe. At most one request per key is in flight: later callers join
//! the outstanding request through a shared future. An entry nobody
//! subscribes to is dropped once it has been unused for the keep-unused
//! window.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::Weak;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use futures::future::Shared;
use helpdesk_protocol::ApiResponse;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;

use crate::cache::QueryKey;
use crate::cache::QuerySnapshot;
use crate::cache::QueryStatus;
use crate::cache::TagRef;
use crate::config::ClientConfig;
use crate::config::DEFAULT_KEEP_UNUSED_FOR;
use crate::endpoints::Mutation;
use crate::endpoints::Query;
use crate::error::ClientError;
use crate::session::SessionStore;
use crate::transport::ApiRequest;
use crate::transport::HttpTransport;
use crate::transport::Transport;

type FetchResult = Result<Arc<Value>, ClientError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

struct CacheEntry {
    request: ApiRequest,
    provides: Vec<TagRef>,
    state: watch::Sender<QuerySnapshot>,
    subscribers: usize,
    inflight: Option<SharedFetch>,
    fetch_id: u64,
    /// Invalidated while a fetch was in flight.
    stale: bool,
    /// Bumped on every subscribe and every scheduled eviction; a pending
    /// eviction only fires if it still matches.
    generation: u64,
}

impl CacheEntry {
    fn new(request: ApiRequest, provides: Vec<TagRef>) -> Self {
        let (state, _rx) = watch::channel(QuerySnapshot::empty());
        Self {
            request,
            provides,
            state,
            subscribers: 0,
            inflight: None,
            fetch_id: 0,
            stale: false,
            generation: 0,
        }
    }
}

struct Inner {
    transport: Arc<dyn Transport>,
    session: SessionStore,
    entries: Mutex<HashMap<QueryKey, CacheEntry>>,
    next_fetch_id: AtomicU64,
    keep_unused_for: Duration,
}

impl Inner {
    fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send one request and map the HTTP outcome onto [`ClientError`].
    async fn execute(&self, request: ApiRequest) -> FetchResult {
        let method = request.method;
        let path = request.path.clone();
        let response = self.transport.send(request).await?;
        let status = response.status;
        let body = response.body;

        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);

        if response_is_success(status, &body) {
            return Ok(Arc::new(body));
        }

        let message = message.unwrap_or_else(|| format!("request failed with status {status}"));
        match status {
            401 => {
                tracing::warn!(%method, path = %path, "unauthorized response, clearing session");
                self.session.clear();
                Err(ClientError::Unauthorized { message })
            }
            404 => Err(ClientError::NotFound { message }),
            _ => Err(ClientError::Api {
                status,
                message,
                details: body.pointer("/error/details").cloned(),
            }),
        }
    }
}

/// 2xx and not an envelope that reports `success: false`.
fn response_is_success(status: u16, body: &Value) -> bool {
    (200..300).contains(&status) && body.get("success").and_then(Value::as_bool) != Some(false)
}

fn decode<T: DeserializeOwned>(value: &Value) -> Result<ApiResponse<T>, ClientError> {
    ApiResponse::<T>::deserialize(value).map_err(ClientError::from)
}

/// Shared handle to the cache and the session it clears on 401.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, session: SessionStore) -> Self {
        Self::with_keep_unused_for(transport, session, DEFAULT_KEEP_UNUSED_FOR)
    }

    /// Like [`ApiClient::new`], dropping unsubscribed entries after
    /// `keep_unused_for` instead of the default window. Zero drops them as
    /// soon as they become unused.
    pub fn with_keep_unused_for(
        transport: Arc<dyn Transport>,
        session: SessionStore,
        keep_unused_for: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                session,
                entries: Mutex::new(HashMap::new()),
                next_fetch_id: AtomicU64::new(1),
                keep_unused_for,
            }),
        }
    }

    /// Client over the HTTP transport described by `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_keep_unused_for(
            Arc::new(transport),
            SessionStore::new(),
            config.keep_unused_for,
        ))
    }

    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    pub fn has_session_marker(&self) -> bool {
        self.inner.transport.has_session_marker()
    }

    /// Cached-or-fetched result of `query`. Joins an in-flight request for
    /// the same key instead of issuing another.
    pub async fn query<Q: Query>(&self, query: &Q) -> Result<ApiResponse<Q::Data>, ClientError> {
        let key = query.key();
        let fetch = {
            let mut entries = self.inner.entries();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(query.request(), query.provides()));
            if entry.inflight.is_none() {
                let snapshot = entry.state.borrow();
                if snapshot.status == QueryStatus::Fulfilled
                    && let Some(data) = &snapshot.data
                {
                    tracing::debug!(%key, "cache hit");
                    return decode(data);
                }
            }
            Self::start_fetch(&self.inner, &mut entries, &key)
        };
        let value = await_fetch(fetch).await?;
        decode(&value)
    }

    /// Fetch `query` from the network even if a cached result exists. Still
    /// joins a request already in flight.
    pub async fn refetch<Q: Query>(&self, query: &Q) -> Result<ApiResponse<Q::Data>, ClientError> {
        let key = query.key();
        let fetch = {
            let mut entries = self.inner.entries();
            entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(query.request(), query.provides()));
            Self::start_fetch(&self.inner, &mut entries, &key)
        };
        let value = await_fetch(fetch).await?;
        decode(&value)
    }

    /// Keep `query` cached and observed. The first subscriber of an empty or
    /// failed entry triggers a fetch; the result arrives through
    /// [`Subscription::changed`].
    pub fn subscribe<Q: Query>(&self, query: &Q) -> Subscription<Q::Data> {
        let key = query.key();
        let mut entries = self.inner.entries();
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(query.request(), query.provides()));
        entry.subscribers += 1;
        entry.generation += 1;
        let rx = entry.state.subscribe();
        let needs_fetch = entry.inflight.is_none()
            && matches!(
                entry.state.borrow().status,
                QueryStatus::Uninitialized | QueryStatus::Rejected
            );
        if needs_fetch {
            Self::start_fetch(&self.inner, &mut entries, &key);
        }
        drop(entries);

        Subscription {
            client: self.clone(),
            key,
            rx,
            _data: PhantomData,
        }
    }

    /// Run `mutation`; on success invalidate the tags it declares.
    pub async fn mutate<M: Mutation>(
        &self,
        mutation: &M,
    ) -> Result<ApiResponse<M::Data>, ClientError> {
        let request = mutation.request()?;
        tracing::debug!(mutation = M::NAME, "running mutation");
        let value = self.inner.execute(request).await?;
        let response = decode(&value)?;
        self.invalidate(&mutation.invalidates());
        Ok(response)
    }

    /// Invalidate every entry providing a matching tag. Observed entries
    /// refetch; unobserved ones are evicted so the next query goes to the
    /// network.
    pub fn invalidate(&self, tags: &[TagRef]) {
        if tags.is_empty() {
            return;
        }
        let mut entries = self.inner.entries();
        let hit: Vec<QueryKey> = entries
            .iter()
            .filter(|(_, entry)| {
                entry
                    .provides
                    .iter()
                    .any(|provided| tags.iter().any(|tag| tag.invalidates(provided)))
            })
            .map(|(key, _)| key.clone())
            .collect();

        for key in hit {
            let Some(entry) = entries.get_mut(&key) else {
                continue;
            };
            if entry.inflight.is_some() {
                tracing::debug!(%key, "invalidated mid-flight");
                entry.stale = true;
            } else if entry.subscribers > 0 {
                tracing::debug!(%key, "invalidated, refetching");
                Self::start_fetch(&self.inner, &mut entries, &key);
            } else {
                tracing::debug!(%key, "invalidated, evicting");
                entries.remove(&key);
            }
        }
    }

    /// Snapshot of the entry for `key`, if cached.
    pub fn cached(&self, key: &QueryKey) -> Option<QuerySnapshot> {
        self.inner
            .entries()
            .get(key)
            .map(|entry| entry.state.borrow().clone())
    }

    fn release(&self, key: &QueryKey) {
        let mut entries = self.inner.entries();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        entry.subscribers = entry.subscribers.saturating_sub(1);
        if entry.subscribers == 0 {
            Self::schedule_eviction(&self.inner, &mut entries, key);
        }
    }

    /// Drop `key` once it has gone `keep_unused_for` without a subscriber.
    /// A subscribe or a newer schedule in the meantime cancels this one; an
    /// entry still fetching is rescheduled when the fetch finishes.
    fn schedule_eviction(
        inner: &Arc<Inner>,
        entries: &mut HashMap<QueryKey, CacheEntry>,
        key: &QueryKey,
    ) {
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        if entry.subscribers > 0 || entry.inflight.is_some() {
            return;
        }
        entry.generation += 1;
        let generation = entry.generation;

        if inner.keep_unused_for.is_zero() {
            tracing::debug!(%key, "evicting unused entry");
            entries.remove(key);
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let weak: Weak<Inner> = Arc::downgrade(inner);
        let delay = inner.keep_unused_for;
        let key = key.clone();
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut entries = inner.entries();
            let expired = entries.get(&key).is_some_and(|entry| {
                entry.generation == generation
                    && entry.subscribers == 0
                    && entry.inflight.is_none()
            });
            if expired {
                tracing::debug!(%key, "evicting unused entry");
                entries.remove(&key);
            }
        });
    }

    fn refetch_key(&self, key: &QueryKey) -> Option<SharedFetch> {
        let mut entries = self.inner.entries();
        Self::start_fetch(&self.inner, &mut entries, key)
    }

    /// Start a fetch for `key` or hand back the one already in flight. The
    /// request runs on its own task so it completes even if every caller
    /// stops waiting.
    fn start_fetch(
        inner: &Arc<Inner>,
        entries: &mut HashMap<QueryKey, CacheEntry>,
        key: &QueryKey,
    ) -> Option<SharedFetch> {
        let entry = entries.get_mut(key)?;
        if let Some(inflight) = &entry.inflight {
            tracing::debug!(%key, "joining in-flight request");
            return Some(inflight.clone());
        }

        let fetch_id = inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        entry.fetch_id = fetch_id;
        entry.stale = false;
        entry.state.send_modify(QuerySnapshot::begin_fetch);
        tracing::debug!(%key, "fetching");

        let request = entry.request.clone();
        let task_inner = Arc::clone(inner);
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            let result = task_inner.execute(request).await;
            Self::finish_fetch(&task_inner, &task_key, fetch_id, &result);
            result
        });
        let shared = async move {
            handle
                .await
                .unwrap_or_else(|err| Err(ClientError::Network(format!("fetch task failed: {err}"))))
        }
        .boxed()
        .shared();

        entry.inflight = Some(shared.clone());
        Some(shared)
    }

    fn finish_fetch(inner: &Arc<Inner>, key: &QueryKey, fetch_id: u64, result: &FetchResult) {
        let mut entries = inner.entries();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        if entry.fetch_id != fetch_id {
            return;
        }
        entry.inflight = None;
        entry.state.send_modify(|snapshot| snapshot.finish_fetch(result));
        if !entry.stale {
            if entry.subscribers == 0 {
                Self::schedule_eviction(inner, &mut entries, key);
            }
            return;
        }
        if entry.subscribers > 0 {
            tracing::debug!(%key, "refetching after mid-flight invalidation");
            Self::start_fetch(inner, &mut entries, key);
        } else {
            entries.remove(key);
        }
    }
}

async fn await_fetch(fetch: Option<SharedFetch>) -> FetchResult {
    match fetch {
        Some(fetch) => fetch.await,
        None => Err(ClientError::InvalidRequest("query is not cached".to_string())),
    }
}

/// Typed view of a cache entry.
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    pub status: QueryStatus,
    pub data: Option<ApiResponse<T>>,
    pub error: Option<ClientError>,
    pub is_fetching: bool,
}

impl<T> QueryState<T> {
    /// No data yet and a first fetch pending.
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && matches!(self.status, QueryStatus::Uninitialized | QueryStatus::Pending)
    }

    pub fn is_not_found(&self) -> bool {
        self.error.as_ref().is_some_and(ClientError::is_not_found)
    }
}

impl<T: DeserializeOwned> QueryState<T> {
    fn from_snapshot(snapshot: &QuerySnapshot) -> Self {
        let mut error = snapshot.error.clone();
        let data = match snapshot.data.as_deref().map(decode::<T>) {
            Some(Ok(response)) => Some(response),
            Some(Err(err)) => {
                error.get_or_insert(err);
                None
            }
            None => None,
        };
        Self {
            status: snapshot.status,
            data,
            error,
            is_fetching: snapshot.is_fetching,
        }
    }
}

/// A mounted observer of one query. Dropping it unmounts: the entry stays
/// cached for the keep-unused window, or until its next invalidation.
pub struct Subscription<T> {
    client: ApiClient,
    key: QueryKey,
    rx: watch::Receiver<QuerySnapshot>,
    _data: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Subscription<T> {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn state(&self) -> QueryState<T> {
        QueryState::from_snapshot(&self.rx.borrow())
    }

    /// Wait for the next state change. `None` once the entry is gone.
    pub async fn changed(&mut self) -> Option<QueryState<T>> {
        self.rx.changed().await.ok()?;
        Some(QueryState::from_snapshot(&self.rx.borrow_and_update()))
    }

    /// Wait until no fetch is running and return that state.
    pub async fn settled(&mut self) -> Option<QueryState<T>> {
        let snapshot = self.rx.wait_for(|s| !s.is_fetching).await.ok()?;
        Some(QueryState::from_snapshot(&snapshot))
    }

    /// Force a network fetch of this entry.
    pub async fn refetch(&self) -> Result<ApiResponse<T>, ClientError> {
        let value = await_fetch(self.client.refetch_key(&self.key)).await?;
        decode(&value)
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.client.release(&self.key);
    }
}

//! Fan-out, in-flight dedup, timeouts, failure isolation
//!
//! One task per eligible source; outcomes stream back over a channel in
//! completion order, so a slow source never delays a fast one. The in-flight
//! table is the single piece of shared mutable state: registering a fetch
//! and attaching a waiter are atomic under its mutex, which is what keeps a
//! cache stampede down to exactly one driver invocation per cache key.

use crate::registry::{IntegrationSource, Registry};
use crate::settings::UserIntegrationSettings;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;
use pivot_cache::{Cache, CacheKey};
use pivot_core::{Indicator, SourceOutcome, User};
use pivot_crypto::SecretCodec;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

/// One orchestrated query
#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// Normalized indicator to fan out
    pub indicator: Indicator,
    /// User the query runs on behalf of
    pub user: User,
    /// The user's settings snapshot, if any were saved
    pub settings: Option<UserIntegrationSettings>,
    /// Explicit source subset; `None` means all eligible
    pub sources: Option<Vec<String>>,
}

/// Cloneable failure for waiters sharing one in-flight fetch
#[derive(Debug, Clone)]
enum FetchFailure {
    Timeout { millis: u64 },
    Failed(Arc<str>),
}

type FetchOutput = Result<Arc<Value>, FetchFailure>;
type SharedFetch = Shared<BoxFuture<'static, FetchOutput>>;

/// Fans a query out across eligible sources with caching, dedup, bounded
/// concurrency, and per-source timeouts
pub struct Orchestrator {
    registry: Arc<Registry>,
    cache: Arc<dyn Cache>,
    codec: Arc<SecretCodec>,
    inflight: Arc<Mutex<HashMap<CacheKey, SharedFetch>>>,
    limiter: Arc<Semaphore>,
}

impl Orchestrator {
    /// Build an orchestrator over an immutable registry and a cache backend.
    /// `max_concurrency` bounds simultaneous driver invocations process-wide.
    pub fn new(
        registry: Arc<Registry>,
        cache: Arc<dyn Cache>,
        codec: Arc<SecretCodec>,
        max_concurrency: usize,
    ) -> Self {
        Orchestrator {
            registry,
            cache,
            codec,
            inflight: Arc::new(Mutex::new(HashMap::new())),
            limiter: Arc::new(Semaphore::new(max_concurrency.max(1))),
        }
    }

    /// Run one query. The returned stream yields one outcome per eligible
    /// source in completion order and ends when all are in. Dropping the
    /// stream stops delivery but never retracts in-flight fetches or their
    /// cache writes.
    pub fn orchestrate(&self, request: QueryRequest) -> ReceiverStream<SourceOutcome> {
        let mut eligible = self
            .registry
            .sources_for(request.indicator.itype, request.settings.as_ref());
        if let Some(subset) = &request.sources {
            eligible.retain(|s| subset.iter().any(|id| id == &s.descriptor().id));
        }

        debug!(
            indicator = %request.indicator,
            user = %request.user.user_id,
            sources = eligible.len(),
            "starting fan-out"
        );

        let (tx, rx) = mpsc::channel(eligible.len().max(1));
        for source in eligible {
            let sealed = request
                .settings
                .as_ref()
                .and_then(|s| s.sealed_secret(&source.descriptor().id))
                .map(str::to_owned);
            tokio::spawn(run_source(
                source,
                request.indicator.clone(),
                sealed,
                self.cache.clone(),
                self.codec.clone(),
                self.inflight.clone(),
                self.limiter.clone(),
                tx.clone(),
            ));
        }
        ReceiverStream::new(rx)
    }
}

/// Drive one (request, source) pair to its terminal outcome:
/// pending -> cached, or pending -> dispatched -> success | timeout | error.
#[allow(clippy::too_many_arguments)]
async fn run_source(
    source: Arc<dyn IntegrationSource>,
    indicator: Indicator,
    sealed_secret: Option<String>,
    cache: Arc<dyn Cache>,
    codec: Arc<SecretCodec>,
    inflight: Arc<Mutex<HashMap<CacheKey, SharedFetch>>>,
    limiter: Arc<Semaphore>,
    tx: mpsc::Sender<SourceOutcome>,
) {
    let descriptor = source.descriptor();
    let id = descriptor.id.clone();
    let params: Vec<(&str, &str)> = descriptor
        .cache_params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let key = CacheKey::new(&id, &indicator, &params);

    // A backend failure degrades to a miss; the fetch proceeds directly.
    match cache.get(&key).await {
        Ok(Some(payload)) => {
            let _ = tx.send(SourceOutcome::cached(&id, payload)).await;
            return;
        }
        Ok(None) => {}
        Err(err) => {
            warn!(source = %id, %err, "cache read failed, treating as miss");
        }
    }

    let fetch = join_or_register(
        key, source, indicator, sealed_secret, cache, codec, inflight, limiter,
    );

    let outcome = match fetch.await {
        Ok(payload) => SourceOutcome::success(&id, payload),
        Err(FetchFailure::Timeout { millis }) => {
            warn!(source = %id, millis, "source timed out");
            SourceOutcome::timeout(&id)
        }
        Err(FetchFailure::Failed(detail)) => {
            warn!(source = %id, %detail, "source fetch failed");
            SourceOutcome::error(&id, detail.as_ref())
        }
    };
    // Send failure means the consumer went away; the fetch already ran and
    // populated the cache for other callers.
    let _ = tx.send(outcome).await;
}

/// Attach to the in-flight fetch for this key, or register a new one.
/// Lookup and insert happen under one lock so concurrent misses for the
/// same key can never both dispatch.
#[allow(clippy::too_many_arguments)]
fn join_or_register(
    key: CacheKey,
    source: Arc<dyn IntegrationSource>,
    indicator: Indicator,
    sealed_secret: Option<String>,
    cache: Arc<dyn Cache>,
    codec: Arc<SecretCodec>,
    inflight: Arc<Mutex<HashMap<CacheKey, SharedFetch>>>,
    limiter: Arc<Semaphore>,
) -> SharedFetch {
    let mut table = inflight.lock();
    if let Some(existing) = table.get(&key) {
        debug!(%key, "joining in-flight fetch");
        return existing.clone();
    }

    let fetch = dispatch(
        key,
        source,
        indicator,
        sealed_secret,
        cache,
        codec,
        inflight.clone(),
        limiter,
    )
    .boxed()
    .shared();
    table.insert(key, fetch.clone());
    drop(table);

    // Detached driver keeps the fetch running to completion (and the cache
    // populated) even if every waiter disconnects.
    tokio::spawn(fetch.clone().map(|_| ()));
    fetch
}

/// The single underlying driver invocation for one cache key
#[allow(clippy::too_many_arguments)]
async fn dispatch(
    key: CacheKey,
    source: Arc<dyn IntegrationSource>,
    indicator: Indicator,
    sealed_secret: Option<String>,
    cache: Arc<dyn Cache>,
    codec: Arc<SecretCodec>,
    inflight: Arc<Mutex<HashMap<CacheKey, SharedFetch>>>,
    limiter: Arc<Semaphore>,
) -> FetchOutput {
    let descriptor = source.descriptor();
    let id = descriptor.id.clone();
    let timeout = descriptor.timeout;
    let cacheable = descriptor.cacheable;

    let output = async {
        // Bounded concurrency: one large query cannot flood the process or
        // starve other requests' access to shared sources.
        let _permit = limiter.acquire().await.map_err(|_| {
            FetchFailure::Failed(Arc::from("concurrency limiter closed"))
        })?;

        // Credentials are opened here, at the point of use, and dropped
        // (zeroized) as soon as the driver call returns.
        let secret = match &sealed_secret {
            None => None,
            Some(sealed) => match codec.open(sealed) {
                Ok(plain) => Some(plain),
                Err(err) => {
                    return Err(FetchFailure::Failed(Arc::from(format!(
                        "credentials: {err}"
                    ))));
                }
            },
        };

        match tokio::time::timeout(timeout, source.fetch(&indicator, secret)).await {
            Ok(Ok(value)) => {
                let payload = Arc::new(value);
                if cacheable {
                    if let Err(err) = cache.set(key, payload.clone(), None).await {
                        warn!(source = %id, %err, "cache write failed, continuing");
                    }
                }
                Ok(payload)
            }
            Ok(Err(err)) => Err(FetchFailure::Failed(Arc::from(err.to_string()))),
            Err(_) => Err(FetchFailure::Timeout {
                millis: timeout.as_millis() as u64,
            }),
        }
    }
    .await;

    inflight.lock().remove(&key);
    output
}

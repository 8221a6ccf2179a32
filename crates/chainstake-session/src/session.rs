//! Session lifecycle.
//!
//! A session moves from `Open` to `Closed` exactly once. Closing cancels
//! every in-flight call, releases the client pool, discards the aggregation
//! cache and closes the event sink; it is idempotent and also happens when
//! the [`Session`] handle is dropped or the consumer drops its event stream.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use chainstake_core::cache::StakeAggregationCache;
use chainstake_core::chain::ChainEndpointRegistry;
use chainstake_core::error::StakeError;
use chainstake_core::event::StakeEvent;
use chainstake_core::sink::{EventSink, EventStream};
use chainstake_hex::HexAbi;

use crate::config::{StakeConfig, DEFAULT_MAX_STAKES};
use crate::dispatcher::QueryDispatcher;
use crate::factory::{ClientFactory, HttpClientFactory};
use crate::pool::ChainClientPool;

/// Opaque session identifier, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed,
}

/// State shared between a session handle and its in-flight tasks.
pub(crate) struct SessionShared {
    pub(crate) id: SessionId,
    pub(crate) pool: ChainClientPool,
    cache: Mutex<StakeAggregationCache>,
    sink: EventSink,
    open: AtomicBool,
    cancel: CancellationToken,
    tasks: TaskTracker,
    runtime: Handle,
    max_stakes: u64,
}

impl SessionShared {
    pub(crate) fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    pub(crate) fn ensure_open(&self) -> Result<(), StakeError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(StakeError::SessionClosed)
        }
    }

    /// Largest stake count a retrieval may fan out to.
    pub(crate) fn max_stakes(&self) -> u64 {
        self.max_stakes
    }

    pub(crate) fn cache(&self) -> MutexGuard<'_, StakeAggregationCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `fut` as an independent task that is dropped when the session closes.
    pub(crate) fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        self.tasks.spawn_on(
            async move {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {}
                    _ = fut => {}
                }
            },
            &self.runtime,
        );
    }

    /// Push `event` to the consumer. A dropped consumer closes the session.
    pub(crate) fn deliver(&self, event: StakeEvent) {
        if !self.is_open() {
            return;
        }
        let kind = event.kind();
        let chain = event.chain();
        match self.sink.emit(event) {
            Ok(()) => tracing::debug!(session = %self.id, %chain, kind, "event delivered"),
            Err(_) if self.is_open() => {
                tracing::info!(session = %self.id, "event stream dropped by consumer, closing session");
                self.close();
            }
            Err(_) => {}
        }
    }

    pub(crate) fn close(&self) -> bool {
        if !self.open.swap(false, Ordering::AcqRel) {
            return false;
        }
        self.cancel.cancel();
        self.tasks.close();
        self.sink.close();
        self.pool.close();
        self.cache().clear();
        tracing::info!(session = %self.id, in_flight = self.tasks.len(), "session closed");
        true
    }
}

/// Handle to an open session. Dropping it closes the session.
pub struct Session {
    pub(crate) shared: Arc<SessionShared>,
    dispatcher: QueryDispatcher,
}

impl Session {
    pub fn id(&self) -> SessionId {
        self.shared.id
    }

    pub fn state(&self) -> SessionState {
        if self.shared.is_open() {
            SessionState::Open
        } else {
            SessionState::Closed
        }
    }

    /// Query entry points for this session.
    pub fn dispatcher(&self) -> &QueryDispatcher {
        &self.dispatcher
    }

    /// Number of calls still running.
    pub fn in_flight(&self) -> usize {
        self.shared.tasks.len()
    }

    /// Stake buckets still waiting for entries.
    pub fn pending_buckets(&self) -> usize {
        self.shared.cache().pending_len()
    }

    /// Close the session. Returns `true` if this call performed the close.
    pub fn close(&self) -> bool {
        self.shared.close()
    }

    /// Wait until the session is closed and every task has finished.
    pub async fn closed(&self) {
        self.shared.tasks.wait().await
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shared.close();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.shared.id)
            .field("state", &self.state())
            .finish()
    }
}

/// Opens independent sessions against a fixed chain registry.
pub struct SessionManager {
    registry: Arc<ChainEndpointRegistry>,
    factory: Arc<dyn ClientFactory>,
    abi: Arc<HexAbi>,
    max_stakes: u64,
}

impl SessionManager {
    pub fn new(
        registry: ChainEndpointRegistry,
        factory: Arc<dyn ClientFactory>,
    ) -> Result<Self, StakeError> {
        Ok(Self {
            registry: Arc::new(registry),
            factory,
            abi: Arc::new(HexAbi::new()?),
            max_stakes: DEFAULT_MAX_STAKES,
        })
    }

    /// Refuse stake retrievals whose reported count exceeds `max_stakes`.
    pub fn with_max_stakes(mut self, max_stakes: u64) -> Self {
        self.max_stakes = max_stakes;
        self
    }

    /// Manager over HTTP clients for the configured chains.
    pub fn from_config(config: &StakeConfig) -> Result<Self, StakeError> {
        Ok(Self::new(
            config.registry()?,
            Arc::new(HttpClientFactory::new(config.http.clone())),
        )?
        .with_max_stakes(config.max_stakes))
    }

    pub fn registry(&self) -> &ChainEndpointRegistry {
        &self.registry
    }

    /// Open a session: provisions a client per chain, an empty cache and a
    /// fresh event channel.
    ///
    /// Must be called from within a Tokio runtime; the session's tasks run on it.
    pub fn open(&self) -> Result<(Session, EventStream), StakeError> {
        let runtime = Handle::try_current()
            .map_err(|e| StakeError::Config(format!("no Tokio runtime: {e}")))?;
        let id = SessionId::new();
        let pool = ChainClientPool::open(id, &self.registry, self.factory.as_ref(), self.abi.clone())?;
        let (sink, stream) = EventSink::channel();

        let shared = Arc::new(SessionShared {
            id,
            pool,
            cache: Mutex::new(StakeAggregationCache::new()),
            sink,
            open: AtomicBool::new(true),
            cancel: CancellationToken::new(),
            tasks: TaskTracker::new(),
            runtime,
            max_stakes: self.max_stakes,
        });
        tracing::info!(session = %id, chains = self.registry.len(), "session opened");

        let session = Session {
            dispatcher: QueryDispatcher::new(shared.clone()),
            shared,
        };
        Ok((session, stream))
    }

    /// Close `session`; a no-op if it is already closed.
    pub fn close(&self, session: &Session) -> bool {
        session.close()
    }
}

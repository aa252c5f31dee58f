//! Connection pool keyed by server identity.
//!
//! Each server has at most one live connection. Access is serialized by a
//! single-permit semaphore per server, so the first `acquire` builds the
//! connection while later callers queue (FIFO) and then reuse it. Nobody
//! ever constructs a second connection while one is being built.
//!
//! # State machine
//!
//! ```text
//! Uninitialized -> Connecting -> Ready <-> Acquired
//!                      |           |
//!                      v           v
//!                   Failed      Closing -> Closed
//! ```
//!
//! `Failed` and `Closed` (after closing a single server) reconnect on the
//! next acquire. After [`ConnectionPoolManager::close_all`] every acquire
//! fails with [`Error::PoolClosed`].
//!
//! # Examples
//!
//! ```
//! use async_trait::async_trait;
//! use mcp_toolbox_core::{Result, ServerId, ToolName};
//! use mcp_toolbox_runtime::{
//!     ConnectionPoolManager, Connector, JsonObject, PoolOptions, PoolState, ToolClient,
//! };
//! use serde_json::{Value, json};
//! use std::sync::Arc;
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl ToolClient for Echo {
//!     async fn call_tool(&self, _tool: &ToolName, args: Option<JsonObject>) -> Result<Value> {
//!         Ok(json!({"content": [], "args": args}))
//!     }
//!     async fn close(&self) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! struct EchoConnector;
//!
//! #[async_trait]
//! impl Connector for EchoConnector {
//!     async fn connect(&self, _server: &ServerId) -> Result<Arc<dyn ToolClient>> {
//!         Ok(Arc::new(Echo))
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<()> {
//! let pool = ConnectionPoolManager::new(Arc::new(EchoConnector), PoolOptions::default());
//! let server = ServerId::new("echo");
//!
//! let resource = pool.acquire(&server).await?;
//! assert_eq!(pool.state(&server).await, PoolState::Acquired);
//! pool.release(resource);
//! assert_eq!(pool.state(&server).await, PoolState::Ready);
//!
//! pool.close_all().await;
//! assert!(pool.acquire(&server).await.is_err());
//! # Ok(())
//! # }
//! ```

use crate::client::{Connector, JsonObject, ToolClient};
use mcp_toolbox_core::{Error, Result, ServerId, ToolName};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Default time an `acquire` may wait for a busy connection.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Lifecycle state of one server's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolState {
    /// No connection and none being built
    Uninitialized,
    /// Construction in progress
    Connecting,
    /// Connected and idle
    Ready,
    /// Connected and held by a caller
    Acquired,
    /// Last construction failed; the next acquire retries
    Failed,
    /// Shutdown in progress
    Closing,
    /// Shut down
    Closed,
}

impl PoolState {
    /// Lowercase state name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Connecting => "connecting",
            Self::Ready => "ready",
            Self::Acquired => "acquired",
            Self::Failed => "failed",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for PoolState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pool tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    /// Maximum wait for a connection held by another caller
    pub acquire_timeout: Duration,
    /// Idle time after which a ready connection is rebuilt on next use
    pub idle_timeout: Option<Duration>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            idle_timeout: None,
        }
    }
}

/// Pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Successful acquisitions
    pub acquisitions: u64,
    /// Connection constructions attempted
    pub constructions: u64,
    /// Constructions that failed
    pub construction_failures: u64,
    /// Acquisitions that timed out
    pub timeouts: u64,
    /// Connections currently open
    pub live_connections: u64,
}

impl PoolStats {
    /// Fraction of constructions that succeeded, or `None` before the first.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn construction_success_rate(&self) -> Option<f64> {
        if self.constructions == 0 {
            None
        } else {
            let succeeded = self.constructions - self.construction_failures;
            Some(succeeded as f64 / self.constructions as f64)
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    acquisitions: AtomicU64,
    constructions: AtomicU64,
    construction_failures: AtomicU64,
    timeouts: AtomicU64,
    live_connections: AtomicU64,
}

struct SlotInner {
    state: PoolState,
    client: Option<Arc<dyn ToolClient>>,
    last_used: Instant,
}

/// Per-server connection slot.
struct Slot {
    permit: Arc<Semaphore>,
    inner: std::sync::Mutex<SlotInner>,
}

impl Slot {
    fn new() -> Self {
        Self {
            permit: Arc::new(Semaphore::new(1)),
            inner: std::sync::Mutex::new(SlotInner {
                state: PoolState::Uninitialized,
                client: None,
                last_used: Instant::now(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: PoolState) {
        self.lock().state = state;
    }

    fn state(&self) -> PoolState {
        self.lock().state
    }
}

impl std::fmt::Debug for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("Slot")
            .field("state", &inner.state)
            .field("connected", &inner.client.is_some())
            .finish_non_exhaustive()
    }
}

/// A connection checked out of the pool.
///
/// Holds the server's only permit. Dropping it without
/// [`ConnectionPoolManager::release`] still frees the slot.
pub struct PooledResource {
    server: ServerId,
    client: Arc<dyn ToolClient>,
    slot: Arc<Slot>,
    permit: Option<OwnedSemaphorePermit>,
}

impl PooledResource {
    /// Server this connection belongs to.
    #[must_use]
    pub const fn server(&self) -> &ServerId {
        &self.server
    }

    /// The underlying client.
    #[must_use]
    pub fn client(&self) -> &Arc<dyn ToolClient> {
        &self.client
    }

    /// Calls a tool over this connection.
    ///
    /// # Errors
    ///
    /// Propagates the client's error unchanged.
    pub async fn call_tool(&self, tool: &ToolName, arguments: Option<JsonObject>) -> Result<Value> {
        self.client.call_tool(tool, arguments).await
    }

    /// Takes the permit so `Drop` leaves the slot state alone.
    fn detach(&mut self) -> Option<OwnedSemaphorePermit> {
        self.permit.take()
    }
}

impl Drop for PooledResource {
    fn drop(&mut self) {
        if self.permit.is_none() {
            return;
        }
        let mut inner = self.slot.lock();
        if inner.state == PoolState::Acquired {
            inner.state = PoolState::Ready;
            inner.last_used = Instant::now();
        }
    }
}

impl std::fmt::Debug for PooledResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledResource")
            .field("server", &self.server)
            .field("client", &"dyn ToolClient")
            .finish_non_exhaustive()
    }
}

/// Process-wide pool of MCP connections, one per server identity.
///
/// Construct once at start-up and share by `Arc`.
pub struct ConnectionPoolManager {
    connector: Arc<dyn Connector>,
    options: PoolOptions,
    slots: Mutex<HashMap<ServerId, Arc<Slot>>>,
    closed: AtomicBool,
    counters: Counters,
}

impl std::fmt::Debug for ConnectionPoolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPoolManager")
            .field("options", &self.options)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

impl ConnectionPoolManager {
    /// Creates an empty pool. No connection is made until the first acquire.
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>, options: PoolOptions) -> Self {
        Self {
            connector,
            options,
            slots: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
            counters: Counters::default(),
        }
    }

    /// Pool options.
    #[must_use]
    pub const fn options(&self) -> &PoolOptions {
        &self.options
    }

    /// Returns `true` once [`close_all`](Self::close_all) has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Checks out the connection for `server`, building it if needed.
    ///
    /// # Errors
    ///
    /// - [`Error::PoolClosed`] after `close_all`
    /// - [`Error::PoolTimeout`] if another caller held the connection longer
    ///   than `acquire_timeout`
    /// - The connector's error if construction fails; the slot moves to
    ///   `Failed` and the next acquire retries
    pub async fn acquire(&self, server: &ServerId) -> Result<PooledResource> {
        if self.is_closed() {
            return Err(pool_closed(server));
        }

        let slot = self.slot(server).await;
        let started = Instant::now();
        let permit = match tokio::time::timeout(
            self.options.acquire_timeout,
            Arc::clone(&slot.permit).acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => return Err(pool_closed(server)),
            Err(_) => {
                self.counters.timeouts.fetch_add(1, Ordering::Relaxed);
                let waited_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                tracing::warn!(server = %server, waited_ms, "connection acquire timed out");
                return Err(Error::PoolTimeout {
                    server: server.to_string(),
                    waited_ms,
                });
            }
        };

        if self.is_closed() {
            return Err(pool_closed(server));
        }

        let (reusable, stale) = {
            let mut inner = slot.lock();
            match (inner.state, inner.client.clone()) {
                (PoolState::Ready, Some(client)) if self.is_expired(inner.last_used) => {
                    inner.client = None;
                    inner.state = PoolState::Uninitialized;
                    (None, Some(client))
                }
                (PoolState::Ready, Some(client)) => {
                    inner.state = PoolState::Acquired;
                    (Some(client), None)
                }
                _ => (None, None),
            }
        };

        if let Some(stale) = stale {
            tracing::debug!(server = %server, "idle connection expired, reconnecting");
            self.shutdown_client(server, stale.as_ref()).await;
        }

        let client = match reusable {
            Some(client) => client,
            None => self.construct(server, &slot).await?,
        };

        self.counters.acquisitions.fetch_add(1, Ordering::Relaxed);
        Ok(PooledResource {
            server: server.clone(),
            client,
            slot,
            permit: Some(permit),
        })
    }

    /// Returns a healthy connection to the pool.
    pub fn release(&self, resource: PooledResource) {
        tracing::debug!(server = %resource.server, "connection released");
        drop(resource);
    }

    /// Closes a connection after a transport failure.
    ///
    /// The slot returns to `Uninitialized` and the next acquire reconnects.
    pub async fn discard(&self, mut resource: PooledResource) {
        let permit = resource.detach();
        let client = {
            let mut inner = resource.slot.lock();
            inner.state = PoolState::Closing;
            inner.client.take()
        };
        if let Some(client) = client {
            self.shutdown_client(&resource.server, client.as_ref()).await;
        }
        if !self.is_closed() {
            resource.slot.set_state(PoolState::Uninitialized);
        }
        tracing::info!(server = %resource.server, "connection discarded");
        drop(permit);
    }

    /// Closes the connection for one server.
    ///
    /// Waits up to `acquire_timeout` for a current holder to release it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolTimeout`] if the connection stayed checked out.
    pub async fn close(&self, server: &ServerId) -> Result<()> {
        let Some(slot) = self.slots.lock().await.get(server).cloned() else {
            return Ok(());
        };
        let started = Instant::now();
        let permit = match tokio::time::timeout(
            self.options.acquire_timeout,
            Arc::clone(&slot.permit).acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => Some(permit),
            Ok(Err(_)) => None,
            Err(_) => {
                return Err(Error::PoolTimeout {
                    server: server.to_string(),
                    waited_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                });
            }
        };
        self.close_slot(server, &slot).await;
        drop(permit);
        Ok(())
    }

    /// Closes every connection and rejects all further acquires.
    ///
    /// Failures to close individual connections are logged and skipped.
    /// Safe to call more than once; later calls do nothing. Returns the
    /// number of connections closed.
    pub async fn close_all(&self) -> usize {
        if self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!("connection pool already closed");
            return 0;
        }

        let slots: Vec<(ServerId, Arc<Slot>)> = self
            .slots
            .lock()
            .await
            .iter()
            .map(|(id, slot)| (id.clone(), Arc::clone(slot)))
            .collect();

        let mut closed = 0;
        for (server, slot) in slots {
            slot.permit.close();
            if self.close_slot(&server, &slot).await {
                closed += 1;
            }
        }

        tracing::info!(closed, "connection pool closed");
        closed
    }

    /// Current state for `server`; unknown servers are `Uninitialized`.
    pub async fn state(&self, server: &ServerId) -> PoolState {
        self.slots
            .lock()
            .await
            .get(server)
            .map_or(PoolState::Uninitialized, |slot| slot.state())
    }

    /// Snapshot of the pool counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            acquisitions: self.counters.acquisitions.load(Ordering::Relaxed),
            constructions: self.counters.constructions.load(Ordering::Relaxed),
            construction_failures: self.counters.construction_failures.load(Ordering::Relaxed),
            timeouts: self.counters.timeouts.load(Ordering::Relaxed),
            live_connections: self.counters.live_connections.load(Ordering::Relaxed),
        }
    }

    async fn slot(&self, server: &ServerId) -> Arc<Slot> {
        Arc::clone(
            self.slots
                .lock()
                .await
                .entry(server.clone())
                .or_insert_with(|| Arc::new(Slot::new())),
        )
    }

    fn is_expired(&self, last_used: Instant) -> bool {
        self.options
            .idle_timeout
            .is_some_and(|idle| last_used.elapsed() >= idle)
    }

    /// Builds a connection while holding the slot's permit.
    async fn construct(&self, server: &ServerId, slot: &Slot) -> Result<Arc<dyn ToolClient>> {
        slot.set_state(PoolState::Connecting);
        self.counters.constructions.fetch_add(1, Ordering::Relaxed);

        match self.connector.connect(server).await {
            Ok(client) => {
                self.counters.live_connections.fetch_add(1, Ordering::Relaxed);
                let installed = {
                    let mut inner = slot.lock();
                    if self.is_closed() {
                        inner.state = PoolState::Closing;
                        false
                    } else {
                        inner.client = Some(Arc::clone(&client));
                        inner.state = PoolState::Acquired;
                        true
                    }
                };
                if !installed {
                    tracing::debug!(server = %server, "pool closed during connect, dropping connection");
                    self.shutdown_client(server, client.as_ref()).await;
                    slot.set_state(PoolState::Closed);
                    return Err(pool_closed(server));
                }
                tracing::info!(server = %server, "connected");
                Ok(client)
            }
            Err(e) => {
                slot.set_state(PoolState::Failed);
                self.counters
                    .construction_failures
                    .fetch_add(1, Ordering::Relaxed);
                tracing::warn!(server = %server, error = %e, "connection failed");
                Err(e)
            }
        }
    }

    /// Closes whatever client the slot holds. Returns `true` if one was open.
    async fn close_slot(&self, server: &ServerId, slot: &Slot) -> bool {
        let client = {
            let mut inner = slot.lock();
            inner.state = PoolState::Closing;
            inner.client.take()
        };
        let had_client = client.is_some();
        if let Some(client) = client {
            self.shutdown_client(server, client.as_ref()).await;
        }
        slot.set_state(PoolState::Closed);
        had_client
    }

    async fn shutdown_client(&self, server: &ServerId, client: &dyn ToolClient) {
        if let Err(e) = client.close().await {
            tracing::warn!(server = %server, error = %e, "failed to close connection");
        }
        self.counters.live_connections.fetch_sub(1, Ordering::Relaxed);
    }
}

fn pool_closed(server: &ServerId) -> Error {
    Error::PoolClosed {
        server: server.to_string(),
    }
}

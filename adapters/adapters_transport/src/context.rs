//! Network Context Module
//!
//! Provides the owning object for the socket table and the lifecycle
//! event queue. The context replaces ambient global state: callers create
//! it once, share it (typically behind an `Arc`) with their I/O threads,
//! and drain events through it. Initialization happens exactly once in
//! `NetworkContext::new`; teardown when the context is dropped.

use std::sync::{Arc, Mutex};

use infrastructure_events::EventQueue;
use infrastructure_registry::{Handle, HandleTable};
use tracing::warn;

use crate::error::SocketError;
use crate::event::{NetworkEvent, NetworkEventKind};
use crate::socket::{SocketRecord, Transport};

/// Opaque socket identifier
///
/// An index+generation pair validated on every lookup, so a handle held
/// past `destroy` is detected instead of reaching freed or reused state.
pub type SocketHandle = Handle;

/// Network context configuration
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Capacity of the lifecycle event queue
    pub event_capacity: usize,
    /// Maximum number of live sockets (0 = unlimited)
    pub max_sockets: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            event_capacity: 1024,
            max_sockets: 0,
        }
    }
}

/// Network context
///
/// Owns the socket records and the event queue. All socket operations are
/// methods on this type, keyed by [`SocketHandle`]. Handle validation and
/// event posting are safe from any thread; blocking I/O on a given socket
/// is expected to be driven by one owning thread.
pub struct NetworkContext {
    pub(crate) sockets: Arc<HandleTable<Mutex<SocketRecord>>>,
    pub(crate) events: Arc<EventQueue<NetworkEvent>>,
}

impl NetworkContext {
    /// Create a context from the given configuration
    ///
    /// # Examples
    /// ```
    /// use adapters_transport::{NetworkConfig, NetworkContext};
    ///
    /// let context = NetworkContext::new(NetworkConfig::default());
    /// assert_eq!(context.socket_count(), 0);
    /// ```
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            sockets: Arc::new(HandleTable::with_max_size(config.max_sockets)),
            events: Arc::new(EventQueue::with_capacity(config.event_capacity)),
        }
    }

    /// Allocate a socket for the given transport
    ///
    /// The new socket starts in `NotConnected` with no native descriptor.
    pub(crate) fn allocate(&self, transport: Transport) -> Result<SocketHandle, SocketError> {
        self.allocate_record(SocketRecord::new(transport))
    }

    /// Insert a pre-built record into the table
    ///
    /// On table overflow the record (and any descriptor it carries) is
    /// dropped, so nothing leaks.
    pub(crate) fn allocate_record(&self, record: SocketRecord) -> Result<SocketHandle, SocketError> {
        self.sockets.insert(Mutex::new(record)).map_err(|_| {
            warn!("socket table is full");
            SocketError::InvalidHandle
        })
    }

    /// Look up the record behind a handle
    pub(crate) fn record(
        &self,
        handle: SocketHandle,
    ) -> Result<Arc<Mutex<SocketRecord>>, SocketError> {
        self.sockets.lookup(handle).ok_or(SocketError::InvalidHandle)
    }

    /// Check whether a handle refers to a live socket
    ///
    /// Safe to call with any previously returned handle value, including
    /// handles whose socket has been destroyed.
    pub fn is_socket(&self, handle: SocketHandle) -> bool {
        self.sockets.contains(handle)
    }

    /// Number of live sockets
    pub fn socket_count(&self) -> usize {
        self.sockets.size()
    }

    /// The lifecycle event queue
    ///
    /// Consumers drain in FIFO order; events referencing destroyed sockets
    /// carry a stale handle, never freed state.
    pub fn events(&self) -> &EventQueue<NetworkEvent> {
        &self.events
    }

    pub(crate) fn post_event(&self, kind: NetworkEventKind, socket: SocketHandle) {
        if !self.events.post(NetworkEvent::new(kind, socket)) {
            warn!(kind = ?kind, "network event queue full, dropping event");
        }
    }
}

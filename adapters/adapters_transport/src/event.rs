//! Network Event Module
//!
//! Provides the connection lifecycle notifications posted to the context's
//! event queue. An event carries only its kind and the originating socket
//! handle; consumers must treat the handle as a value, since the socket may
//! already have been destroyed by the time the event is drained.

use crate::context::SocketHandle;

/// Network event identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkEventKind {
    /// An outbound connection completed
    Connected,
    /// A connected socket was closed
    Disconnected,
    /// A listening socket accepted a connection
    Accepted,
    /// A connection attempt failed
    Error,
}

/// Connection lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkEvent {
    kind: NetworkEventKind,
    socket: SocketHandle,
}

impl NetworkEvent {
    pub(crate) fn new(kind: NetworkEventKind, socket: SocketHandle) -> Self {
        Self { kind, socket }
    }

    /// Event kind
    pub fn kind(&self) -> NetworkEventKind {
        self.kind
    }

    /// Handle of the originating socket
    ///
    /// The handle may refer to a socket that has since been destroyed;
    /// `NetworkContext::is_socket` reports whether it is still live.
    pub fn socket(&self) -> SocketHandle {
        self.socket
    }
}

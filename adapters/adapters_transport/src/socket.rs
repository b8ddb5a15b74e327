//! Socket Core Module
//!
//! Provides the connection-state machine and the operations shared by all
//! transports: bind, connect, close, destroy, blocking toggle, and the
//! state/address queries. Transport-specific behavior (descriptor type,
//! stream profile) is localized in the closed [`Transport`] variant set.

use std::io;

use entities_addressing::{Address, AddressFamily};
use socket2::{Domain, Protocol, SockAddr, Socket as Socket2, Type};
use tracing::{debug, error, info};

use crate::context::{NetworkContext, SocketHandle};
use crate::error::SocketError;
use crate::event::NetworkEventKind;
use crate::readiness;

/// Socket connection states
///
/// Transitions are monotonic within a connection attempt
/// (`NotConnected` → `Connecting` → `Connected`, or
/// `NotConnected` → `Listening`) and reset only by close/destroy.
/// A destroyed socket is observable through `NetworkContext::is_socket`,
/// not as a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    /// No connection attempt in progress
    NotConnected,
    /// Outbound connection in progress (non-blocking connect)
    Connecting,
    /// Connected to a remote peer
    Connected,
    /// Accepting inbound connections
    Listening,
}

/// Transport variants
///
/// A closed set dispatching the per-transport behavior: how a descriptor
/// is opened for an address family, and the reliability/ordering profile
/// the stream adapter reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Stream transport (TCP)
    Tcp,
    /// Datagram transport (UDP)
    Udp,
}

impl Transport {
    /// Open a native descriptor for the given address family
    pub(crate) fn open(&self, family: AddressFamily) -> io::Result<Socket2> {
        let domain = domain_for(family);
        match self {
            Transport::Tcp => Socket2::new(domain, Type::STREAM, Some(Protocol::TCP)),
            Transport::Udp => Socket2::new(domain, Type::DGRAM, Some(Protocol::UDP)),
        }
    }

    /// Whether the transport delivers every byte that was sent
    pub fn is_reliable(&self) -> bool {
        matches!(self, Transport::Tcp)
    }

    /// Whether the transport preserves sending order
    pub fn is_sequential(&self) -> bool {
        matches!(self, Transport::Tcp)
    }
}

fn domain_for(family: AddressFamily) -> Domain {
    match family {
        AddressFamily::Ipv4 => Domain::IPV4,
        AddressFamily::Ipv6 => Domain::IPV6,
    }
}

/// Backing record for one socket handle
///
/// Exclusively owned by the thread driving the socket's blocking I/O;
/// cross-thread access goes through the handle table and this record's
/// mutex.
pub(crate) struct SocketRecord {
    pub(crate) transport: Transport,
    pub(crate) fd: Option<Socket2>,
    pub(crate) fd_family: Option<AddressFamily>,
    pub(crate) state: SocketState,
    pub(crate) blocking: bool,
    pub(crate) tcp_delay: bool,
    pub(crate) reuse_address: bool,
    pub(crate) local_address: Option<Address>,
    pub(crate) remote_address: Option<Address>,
}

impl SocketRecord {
    pub(crate) fn new(transport: Transport) -> Self {
        Self {
            transport,
            fd: None,
            fd_family: None,
            state: SocketState::NotConnected,
            blocking: true,
            tcp_delay: false,
            reuse_address: false,
            local_address: None,
            remote_address: None,
        }
    }

    /// The open native descriptor, or `InvalidState` if none
    pub(crate) fn descriptor(&self) -> Result<&Socket2, SocketError> {
        self.fd.as_ref().ok_or(SocketError::InvalidState)
    }

    /// Open the descriptor for `family` if not already open
    ///
    /// An unbound descriptor of a different family is closed and reopened;
    /// a bound or connected one keeps its family and the native call
    /// reports any mismatch. Flags recorded before the descriptor existed
    /// are applied at open time.
    pub(crate) fn ensure_open(&mut self, family: AddressFamily) -> Result<(), SocketError> {
        if let Some(open_family) = self.fd_family {
            if open_family == family {
                return Ok(());
            }
            if self.state != SocketState::NotConnected || self.local_address.is_some() {
                return Ok(());
            }
            self.fd = None;
            self.fd_family = None;
        }

        let socket = self.transport.open(family).map_err(|e| {
            error!(family = ?family, error = %e, "unable to open socket descriptor");
            SocketError::from(e)
        })?;
        socket.set_nonblocking(!self.blocking)?;
        if self.reuse_address {
            socket.set_reuse_address(true)?;
        }
        if self.transport == Transport::Tcp {
            socket.set_nodelay(!self.tcp_delay)?;
        }
        debug!(family = ?family, transport = ?self.transport, "opened socket descriptor");
        self.fd = Some(socket);
        self.fd_family = Some(family);
        Ok(())
    }

    /// Drop the descriptor and owned addresses, back to `NotConnected`
    pub(crate) fn reset(&mut self) {
        self.fd = None;
        self.fd_family = None;
        self.local_address = None;
        self.remote_address = None;
        self.state = SocketState::NotConnected;
    }
}

/// Scoped blocking-mode override
///
/// Puts the descriptor into non-blocking mode and restores blocking mode
/// unconditionally when dropped, on every exit path of the enclosing
/// call. The recorded `blocking` flag is untouched; only the descriptor
/// mode is suspended.
pub(crate) struct BlockingGuard<'a> {
    socket: &'a Socket2,
}

impl<'a> BlockingGuard<'a> {
    pub(crate) fn suspend(socket: &'a Socket2) -> io::Result<Self> {
        socket.set_nonblocking(true)?;
        Ok(Self { socket })
    }
}

impl Drop for BlockingGuard<'_> {
    fn drop(&mut self) {
        let _ = self.socket.set_nonblocking(false);
    }
}

/// Whether a native connect error means "in progress" on a non-blocking
/// descriptor
pub(crate) fn connect_in_progress(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::WouldBlock {
        return true;
    }
    #[cfg(unix)]
    {
        err.raw_os_error() == Some(libc::EINPROGRESS)
    }
    #[cfg(not(unix))]
    {
        false
    }
}

impl NetworkContext {
    /// Bind a socket to a local endpoint
    ///
    /// Opens the native descriptor for the address's family on first use.
    /// On success the descriptor-reported local address is stored, so a
    /// port-0 bind records the assigned ephemeral port.
    ///
    /// # Arguments
    /// * `handle` - Socket to bind
    /// * `address` - Local endpoint
    ///
    /// # Returns
    /// * `Ok(())` - Socket is bound
    /// * `Err(SocketError)` - Already bound/connected, or the native bind
    ///   failed; state is unchanged
    pub fn bind(&self, handle: SocketHandle, address: &Address) -> Result<(), SocketError> {
        let record = self.record(handle)?;
        let mut rec = record.lock().unwrap();

        if rec.state != SocketState::NotConnected || rec.local_address.is_some() {
            return Err(SocketError::InvalidState);
        }

        let had_fd = rec.fd.is_some();
        rec.ensure_open(address.family())?;

        let target = SockAddr::from(address.to_socket_addr());
        let bound = {
            let fd = rec.descriptor()?;
            fd.bind(&target).and_then(|_| fd.local_addr())
        };
        match bound {
            Ok(local) => {
                let local = local.as_socket().map(Address::from);
                debug!(handle = ?handle, local = ?local, "bound socket");
                rec.local_address = local;
                Ok(())
            }
            Err(e) => {
                error!(
                    address = %address.to_string_with_port(),
                    error = %e,
                    "unable to bind socket"
                );
                if !had_fd {
                    rec.fd = None;
                    rec.fd_family = None;
                }
                Err(SocketError::from(e))
            }
        }
    }

    /// Initiate an outbound connection
    ///
    /// With `timeout_ms == 0` the native connect runs in the descriptor's
    /// current mode: a blocking socket blocks until connected or failed,
    /// a non-blocking socket parks the state at `Connecting` and returns
    /// `Ok` while the connection completes in the background. With
    /// `timeout_ms > 0` the connect is bounded by a readiness wait and the
    /// descriptor's blocking mode is restored before returning.
    ///
    /// On success the state becomes `Connected`, both addresses are
    /// refreshed from the descriptor and a `Connected` event is posted; on
    /// failure an `Error` event is posted and the state is rolled back.
    pub fn connect(
        &self,
        handle: SocketHandle,
        address: &Address,
        timeout_ms: u32,
    ) -> Result<(), SocketError> {
        let record = self.record(handle)?;
        let mut rec = record.lock().unwrap();

        if rec.state != SocketState::NotConnected {
            return Err(SocketError::InvalidState);
        }

        let had_fd = rec.fd.is_some();
        rec.ensure_open(address.family())?;
        rec.state = SocketState::Connecting;

        let target = SockAddr::from(address.to_socket_addr());
        let blocking = rec.blocking;
        let attempt: Result<bool, SocketError> = (|| {
            let fd = rec.fd.as_ref().ok_or(SocketError::InvalidState)?;
            if timeout_ms == 0 {
                return match fd.connect(&target) {
                    Ok(()) => Ok(true),
                    Err(e) if !blocking && connect_in_progress(&e) => Ok(false),
                    Err(e) => Err(SocketError::from(e)),
                };
            }
            let _guard = if blocking {
                Some(BlockingGuard::suspend(fd)?)
            } else {
                None
            };
            match fd.connect(&target) {
                Ok(()) => Ok(true),
                Err(e) if connect_in_progress(&e) => {
                    if !readiness::wait_writable(fd, timeout_ms)? {
                        return Err(SocketError::Timeout);
                    }
                    match fd.take_error()? {
                        None => Ok(true),
                        Some(e) => Err(SocketError::from(e)),
                    }
                }
                Err(e) => Err(SocketError::from(e)),
            }
        })();

        match attempt {
            Ok(true) => {
                let (local, remote) = match rec.fd.as_ref() {
                    Some(fd) => (
                        fd.local_addr().ok().and_then(|a| a.as_socket()).map(Address::from),
                        fd.peer_addr().ok().and_then(|a| a.as_socket()).map(Address::from),
                    ),
                    None => (None, None),
                };
                rec.local_address = local;
                rec.remote_address = remote.or_else(|| Some(address.clone()));
                rec.state = SocketState::Connected;
                info!(
                    handle = ?handle,
                    remote = %address.to_string_with_port(),
                    "connected socket"
                );
                drop(rec);
                self.post_event(NetworkEventKind::Connected, handle);
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(e) => {
                error!(
                    remote = %address.to_string_with_port(),
                    error = %e,
                    "unable to connect socket"
                );
                rec.state = SocketState::NotConnected;
                if !had_fd {
                    rec.fd = None;
                    rec.fd_family = None;
                }
                drop(rec);
                self.post_event(NetworkEventKind::Error, handle);
                Err(e)
            }
        }
    }

    /// Close a socket
    ///
    /// Drops the descriptor and owned addresses and returns the state to
    /// `NotConnected`. Idempotent; a no-op for destroyed handles. Posts
    /// `Disconnected` if the socket was connected.
    pub fn close(&self, handle: SocketHandle) {
        if let Some(record) = self.sockets.lookup(handle) {
            let was_connected = {
                let mut rec = record.lock().unwrap();
                let was_connected = rec.state == SocketState::Connected;
                if rec.fd.is_some() {
                    debug!(handle = ?handle, "closed socket");
                }
                rec.reset();
                was_connected
            };
            if was_connected {
                self.post_event(NetworkEventKind::Disconnected, handle);
            }
        }
    }

    /// Destroy a socket
    ///
    /// Closes the descriptor and invalidates the handle; afterwards
    /// `is_socket` reports false. Safe to call on an already-destroyed
    /// handle.
    pub fn destroy(&self, handle: SocketHandle) {
        self.close(handle);
        self.sockets.remove(handle);
    }

    /// Toggle the descriptor's blocking mode
    ///
    /// The flag is always recorded; the descriptor mode is updated when
    /// one is open. The connection state is unaffected.
    pub fn set_blocking(&self, handle: SocketHandle, blocking: bool) -> Result<(), SocketError> {
        let record = self.record(handle)?;
        let mut rec = record.lock().unwrap();
        rec.blocking = blocking;
        if let Some(fd) = rec.fd.as_ref() {
            fd.set_nonblocking(!blocking)?;
        }
        Ok(())
    }

    /// The recorded blocking flag
    pub fn is_blocking(&self, handle: SocketHandle) -> Result<bool, SocketError> {
        let record = self.record(handle)?;
        let rec = record.lock().unwrap();
        Ok(rec.blocking)
    }

    /// Current connection state
    pub fn state(&self, handle: SocketHandle) -> Result<SocketState, SocketError> {
        let record = self.record(handle)?;
        let rec = record.lock().unwrap();
        Ok(rec.state)
    }

    /// The bound local address, if any
    pub fn local_address(&self, handle: SocketHandle) -> Result<Option<Address>, SocketError> {
        let record = self.record(handle)?;
        let rec = record.lock().unwrap();
        Ok(rec.local_address.clone())
    }

    /// The connected remote address, if known
    pub fn remote_address(&self, handle: SocketHandle) -> Result<Option<Address>, SocketError> {
        let record = self.record(handle)?;
        let rec = record.lock().unwrap();
        Ok(rec.remote_address.clone())
    }

    /// Toggle address-reuse (SO_REUSEADDR) for rebind behavior
    ///
    /// Applied immediately when the descriptor is open, otherwise recorded
    /// and applied at open time.
    pub fn set_reuse_address(&self, handle: SocketHandle, reuse: bool) -> Result<(), SocketError> {
        let record = self.record(handle)?;
        let mut rec = record.lock().unwrap();
        rec.reuse_address = reuse;
        if let Some(fd) = rec.fd.as_ref() {
            fd.set_reuse_address(reuse)?;
        }
        Ok(())
    }

    /// Take and clear the descriptor's pending error (SO_ERROR)
    pub fn take_socket_error(
        &self,
        handle: SocketHandle,
    ) -> Result<Option<SocketError>, SocketError> {
        let record = self.record(handle)?;
        let rec = record.lock().unwrap();
        let fd = rec.descriptor()?;
        Ok(fd.take_error()?.map(SocketError::from))
    }
}

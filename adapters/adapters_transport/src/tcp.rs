//! TCP Transport Module
//!
//! Provides the stream-transport operations layered on the socket core:
//! listen, timeout-bounded accept, and Nagle-delay control. The timed
//! accept suspends a blocking socket's descriptor mode through a scoped
//! guard that restores it on every exit path, and retries the accept
//! exactly once after a bounded readiness wait.

use std::io;

use entities_addressing::Address;
use tracing::{debug, error, info};

use crate::context::{NetworkContext, SocketHandle};
use crate::error::SocketError;
use crate::event::NetworkEventKind;
use crate::readiness;
use crate::socket::{BlockingGuard, SocketRecord, SocketState, Transport};

#[cfg(unix)]
const LISTEN_BACKLOG: i32 = libc::SOMAXCONN;
#[cfg(not(unix))]
const LISTEN_BACKLOG: i32 = 128;

impl NetworkContext {
    /// Allocate a TCP socket
    ///
    /// The socket starts in `NotConnected` with no native descriptor; the
    /// descriptor is opened on first bind or connect.
    pub fn tcp_allocate(&self) -> Result<SocketHandle, SocketError> {
        self.allocate(Transport::Tcp)
    }

    /// Start listening for inbound connections
    ///
    /// Requires a locally bound, not-connected socket. On success the
    /// state becomes `Listening`; on failure the state is unchanged.
    pub fn tcp_listen(&self, handle: SocketHandle) -> Result<(), SocketError> {
        let record = self.record(handle)?;
        let mut rec = record.lock().unwrap();

        if rec.transport != Transport::Tcp {
            return Err(SocketError::NotSupported);
        }
        // Must be locally bound
        if rec.state != SocketState::NotConnected || rec.fd.is_none() || rec.local_address.is_none()
        {
            return Err(SocketError::InvalidState);
        }

        let listened = rec.descriptor()?.listen(LISTEN_BACKLOG);
        match listened {
            Ok(()) => {
                info!(
                    handle = ?handle,
                    local = %display_address(&rec.local_address),
                    "listening on TCP socket"
                );
                rec.state = SocketState::Listening;
                Ok(())
            }
            Err(e) => {
                error!(
                    local = %display_address(&rec.local_address),
                    error = %e,
                    "unable to listen on TCP socket"
                );
                Err(SocketError::from(e))
            }
        }
    }

    /// Accept an inbound connection, bounded by `timeout_ms`
    ///
    /// Requires state `Listening`. When `timeout_ms > 0` and the socket is
    /// blocking, its descriptor mode is suspended for the duration of the
    /// call and restored before returning, including on failure. A
    /// would-block first attempt is retried exactly once after a bounded
    /// readiness wait; any other failure is terminal for this call.
    ///
    /// # Returns
    /// * `Ok(SocketHandle)` - New connected socket carrying the peer's
    ///   address as its remote address
    /// * `Err(SocketError::Timeout)` - No connection arrived within
    ///   `timeout_ms`
    /// * `Err(SocketError)` - Accept failed; no descriptor is leaked
    pub fn tcp_accept(
        &self,
        handle: SocketHandle,
        timeout_ms: u32,
    ) -> Result<SocketHandle, SocketError> {
        let record = self.record(handle)?;
        let rec = record.lock().unwrap();

        if rec.transport != Transport::Tcp {
            return Err(SocketError::NotSupported);
        }
        if rec.state != SocketState::Listening || rec.fd.is_none() || rec.local_address.is_none() {
            error!(state = ?rec.state, "accept on a non-listening TCP socket");
            return Err(SocketError::InvalidState);
        }

        let attempt = {
            let fd = rec.descriptor()?;
            let _guard = if timeout_ms > 0 && rec.blocking {
                Some(BlockingGuard::suspend(fd).map_err(SocketError::from)?)
            } else {
                None
            };
            match fd.accept() {
                Ok(pair) => Ok(pair),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock && timeout_ms > 0 => {
                    if readiness::wait_readable(fd, timeout_ms)? {
                        fd.accept().map_err(SocketError::from)
                    } else {
                        Err(SocketError::Timeout)
                    }
                }
                Err(e) => Err(SocketError::from(e)),
            }
        };
        let listen_address = rec.local_address.clone();
        drop(rec);

        let (accepted, peer) = match attempt {
            Ok(pair) => pair,
            Err(SocketError::WouldBlock) if timeout_ms > 0 => return Err(SocketError::Timeout),
            Err(e) => {
                debug!(error = %e, "accept returned no connection");
                return Err(e);
            }
        };

        let remote = peer.as_socket().map(Address::from).ok_or(SocketError::InvalidAddress)?;
        accepted.set_nonblocking(false)?;
        let local = accepted
            .local_addr()
            .ok()
            .and_then(|a| a.as_socket())
            .map(Address::from);

        let mut new_record = SocketRecord::new(Transport::Tcp);
        new_record.fd_family = Some(remote.family());
        new_record.state = SocketState::Connected;
        new_record.local_address = local;
        new_record.remote_address = Some(remote.clone());
        new_record.fd = Some(accepted);

        // On table overflow the record drops here, closing the descriptor
        let new_handle = self.allocate_record(new_record)?;

        info!(
            listener = %display_address(&listen_address),
            remote = %remote.to_string_with_port(),
            "accepted TCP connection"
        );
        self.post_event(NetworkEventKind::Accepted, handle);
        Ok(new_handle)
    }

    /// The recorded Nagle-coalescing flag
    pub fn tcp_delay(&self, handle: SocketHandle) -> Result<bool, SocketError> {
        let record = self.record(handle)?;
        let rec = record.lock().unwrap();
        if rec.transport != Transport::Tcp {
            return Err(SocketError::NotSupported);
        }
        Ok(rec.tcp_delay)
    }

    /// Toggle Nagle-style write coalescing
    ///
    /// `delay = false` sets TCP_NODELAY. Applied immediately when the
    /// descriptor is open, otherwise recorded and applied at open time.
    pub fn tcp_set_delay(&self, handle: SocketHandle, delay: bool) -> Result<(), SocketError> {
        let record = self.record(handle)?;
        let mut rec = record.lock().unwrap();
        if rec.transport != Transport::Tcp {
            return Err(SocketError::NotSupported);
        }
        rec.tcp_delay = delay;
        if let Some(fd) = rec.fd.as_ref() {
            fd.set_nodelay(!delay)?;
        }
        Ok(())
    }
}

fn display_address(address: &Option<Address>) -> String {
    match address {
        Some(address) => address.to_string_with_port(),
        None => "<unbound>".to_string(),
    }
}

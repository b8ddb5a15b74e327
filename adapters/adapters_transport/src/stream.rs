//! Stream Adapter Module
//!
//! Provides the byte-oriented `std::io::Read`/`std::io::Write` view over a
//! connected socket. Writes are buffered locally and pushed to the wire by
//! `flush`; for TCP the flush loops until every buffered byte is sent, for
//! UDP each write…flush sequence becomes one discrete datagram. Reads on a
//! reliable stream gather the requested byte count; datagram reads never
//! span datagrams.

use std::io::{self, Read, Write};
use std::mem::MaybeUninit;
use std::sync::{Arc, Mutex};

use infrastructure_events::EventQueue;
use infrastructure_registry::HandleTable;
use socket2::Socket as Socket2;
use tracing::warn;

use crate::context::{NetworkContext, SocketHandle};
use crate::error::SocketError;
use crate::event::{NetworkEvent, NetworkEventKind};
use crate::socket::{SocketRecord, SocketState};

/// Largest datagram a stream read can refill from
const DATAGRAM_BUFFER_SIZE: usize = 65536;

/// Byte stream over a connected socket
///
/// Obtained from [`NetworkContext::stream`]. The stream shares the
/// socket's record; dropping it destroys the underlying socket only when
/// it was constructed as the exclusive owner.
pub struct SocketStream {
    handle: SocketHandle,
    record: Arc<Mutex<SocketRecord>>,
    sockets: Arc<HandleTable<Mutex<SocketRecord>>>,
    events: Arc<EventQueue<NetworkEvent>>,
    reliable: bool,
    sequential: bool,
    owns_socket: bool,
    write_buffer: Vec<u8>,
    read_buffer: Vec<u8>,
    read_pos: usize,
}

impl NetworkContext {
    /// Obtain a stream view of a connected socket
    ///
    /// # Arguments
    /// * `handle` - A socket in state `Connected`
    /// * `owns_socket` - When true, dropping the stream destroys the
    ///   socket; when false the socket outlives the stream
    pub fn stream(
        &self,
        handle: SocketHandle,
        owns_socket: bool,
    ) -> Result<SocketStream, SocketError> {
        let record = self.record(handle)?;
        let (reliable, sequential) = {
            let rec = record.lock().unwrap();
            if rec.state != SocketState::Connected || rec.fd.is_none() {
                return Err(SocketError::InvalidState);
            }
            (rec.transport.is_reliable(), rec.transport.is_sequential())
        };

        Ok(SocketStream {
            handle,
            record,
            sockets: Arc::clone(&self.sockets),
            events: Arc::clone(&self.events),
            reliable,
            sequential,
            owns_socket,
            write_buffer: Vec::new(),
            read_buffer: Vec::new(),
            read_pos: 0,
        })
    }
}

impl SocketStream {
    /// Handle of the underlying socket
    pub fn handle(&self) -> SocketHandle {
        self.handle
    }

    /// Whether the transport delivers every byte that was sent
    pub fn is_reliable(&self) -> bool {
        self.reliable
    }

    /// Whether the transport preserves sending order
    pub fn is_sequential(&self) -> bool {
        self.sequential
    }

    /// Whether dropping the stream destroys the socket
    pub fn owns_socket(&self) -> bool {
        self.owns_socket
    }
}

fn recv_into(fd: &Socket2, buf: &mut [u8]) -> io::Result<usize> {
    // Convert &mut [u8] to &mut [MaybeUninit<u8>]
    let uninit_buf: &mut [MaybeUninit<u8>] = unsafe {
        std::slice::from_raw_parts_mut(buf.as_mut_ptr() as *mut MaybeUninit<u8>, buf.len())
    };
    // Safety: recv initializes the first n bytes of the buffer
    fd.recv(uninit_buf)
}

fn closed_socket() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "socket is closed")
}

impl Read for SocketStream {
    /// Read bytes from the peer
    ///
    /// On a reliable stream this gathers bytes until the caller's buffer
    /// is full or the peer closes; fewer bytes are returned only on close
    /// or, for a non-blocking socket, when nothing more is ready. On a
    /// datagram stream at most the current datagram's remaining bytes are
    /// returned, refilling from the next datagram only once the previous
    /// one is fully consumed.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        if self.reliable {
            let rec = self.record.lock().unwrap();
            let fd = rec.fd.as_ref().ok_or_else(closed_socket)?;
            let mut total = 0;
            while total < buf.len() {
                match recv_into(fd, &mut buf[total..]) {
                    Ok(0) => break,
                    Ok(n) => total += n,
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                        if total > 0 {
                            break;
                        }
                        return Err(e);
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(total)
        } else {
            if self.read_pos >= self.read_buffer.len() {
                let rec = self.record.lock().unwrap();
                let fd = rec.fd.as_ref().ok_or_else(closed_socket)?;
                let mut datagram = vec![0u8; DATAGRAM_BUFFER_SIZE];
                let size = recv_into(fd, &mut datagram)?;
                datagram.truncate(size);
                self.read_buffer = datagram;
                self.read_pos = 0;
            }
            let remaining = self.read_buffer.len() - self.read_pos;
            let size = remaining.min(buf.len());
            buf[..size].copy_from_slice(&self.read_buffer[self.read_pos..self.read_pos + size]);
            self.read_pos += size;
            Ok(size)
        }
    }
}

impl Write for SocketStream {
    /// Buffer bytes for the next flush
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    /// Push buffered bytes to the wire
    ///
    /// TCP loops until the buffer is fully sent; UDP sends the buffer as
    /// one discrete datagram to the connected peer.
    fn flush(&mut self) -> io::Result<()> {
        if self.write_buffer.is_empty() {
            return Ok(());
        }
        let rec = self.record.lock().unwrap();
        let fd = rec.fd.as_ref().ok_or_else(closed_socket)?;

        if self.reliable {
            let mut sent = 0;
            let mut failure = None;
            while sent < self.write_buffer.len() {
                match fd.send(&self.write_buffer[sent..]) {
                    Ok(n) => sent += n,
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
            // Sent bytes leave the buffer even when the tail failed
            self.write_buffer.drain(..sent);
            match failure {
                Some(e) => Err(e),
                None => Ok(()),
            }
        } else {
            let sent = fd.send(&self.write_buffer)?;
            if sent != self.write_buffer.len() {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "datagram truncated",
                ));
            }
            self.write_buffer.clear();
            Ok(())
        }
    }
}

impl Drop for SocketStream {
    /// Destroy the underlying socket when the stream owns it exclusively
    fn drop(&mut self) {
        if !self.owns_socket {
            return;
        }
        let was_connected = {
            let mut rec = self.record.lock().unwrap();
            let was_connected = rec.state == SocketState::Connected;
            rec.reset();
            was_connected
        };
        if was_connected && !self.events.post(NetworkEvent::new(
            NetworkEventKind::Disconnected,
            self.handle,
        )) {
            warn!("network event queue full, dropping event");
        }
        self.sockets.remove(self.handle);
    }
}

//! UDP Transport Module
//!
//! Provides connectionless datagram operations addressed per call, plus
//! the connected-peer mode enabling unaddressed send/receive. Datagrams
//! are all-or-nothing: a partial send is reported as a failure, and the
//! caller's buffer bounds the largest receivable datagram.

use std::mem::MaybeUninit;

use entities_addressing::{Address, AddressFamily};
use tracing::warn;

use crate::context::{NetworkContext, SocketHandle};
use crate::error::SocketError;
use crate::socket::Transport;

impl NetworkContext {
    /// Create a UDP socket
    ///
    /// The descriptor is opened immediately for the default family (IPv4);
    /// a later bind or connect to an IPv6 address reopens it for that
    /// family.
    pub fn udp_create(&self) -> Result<SocketHandle, SocketError> {
        let mut record = crate::socket::SocketRecord::new(Transport::Udp);
        record.ensure_open(AddressFamily::Ipv4)?;
        self.allocate_record(record)
    }

    /// Send one datagram to `target`
    ///
    /// # Arguments
    /// * `handle` - UDP socket
    /// * `payload` - Datagram contents, written in full
    /// * `target` - Destination endpoint
    ///
    /// # Returns
    /// * `Ok(size)` - Bytes sent, always `payload.len()`
    /// * `Err(SocketError::TruncatedDatagram)` - The native send wrote
    ///   fewer bytes than the datagram
    /// * `Err(SocketError)` - Send failed
    pub fn udp_send_to(
        &self,
        handle: SocketHandle,
        payload: &[u8],
        target: &Address,
    ) -> Result<usize, SocketError> {
        let record = self.record(handle)?;
        let mut rec = record.lock().unwrap();
        if rec.transport != Transport::Udp {
            return Err(SocketError::NotSupported);
        }
        rec.ensure_open(target.family())?;

        let fd = rec.descriptor()?;
        let sent = fd.send_to(payload, &target.to_socket_addr().into())?;
        if sent != payload.len() {
            warn!(sent, expected = payload.len(), "partial datagram send");
            return Err(SocketError::TruncatedDatagram);
        }
        Ok(sent)
    }

    /// Receive one datagram from any sender
    ///
    /// Blocks when the socket is blocking. The caller's buffer bounds the
    /// largest receivable datagram; excess bytes are truncated by the
    /// native socket.
    ///
    /// # Returns
    /// * `Ok((size, sender))` - Bytes received and the sender's address,
    ///   independently owned by the caller
    /// * `Err(SocketError)` - Receive failed
    pub fn udp_recv_from(
        &self,
        handle: SocketHandle,
        buf: &mut [u8],
    ) -> Result<(usize, Address), SocketError> {
        let record = self.record(handle)?;
        let rec = record.lock().unwrap();
        if rec.transport != Transport::Udp {
            return Err(SocketError::NotSupported);
        }
        let fd = rec.descriptor()?;

        // Convert &mut [u8] to &mut [MaybeUninit<u8>]
        let uninit_buf: &mut [MaybeUninit<u8>] = unsafe {
            std::slice::from_raw_parts_mut(buf.as_mut_ptr() as *mut MaybeUninit<u8>, buf.len())
        };
        let (size, sender) = fd.recv_from(uninit_buf)?;
        // Safety: recv_from initializes the first `size` bytes of the buffer

        let sender = sender.as_socket().ok_or(SocketError::InvalidAddress)?;
        Ok((size, Address::from(sender)))
    }

    /// Send one datagram to the connected peer
    ///
    /// Requires a prior `connect` fixing the default peer. Partial sends
    /// are reported as [`SocketError::TruncatedDatagram`].
    pub fn udp_send(&self, handle: SocketHandle, payload: &[u8]) -> Result<usize, SocketError> {
        let record = self.record(handle)?;
        let rec = record.lock().unwrap();
        if rec.transport != Transport::Udp {
            return Err(SocketError::NotSupported);
        }
        let fd = rec.descriptor()?;
        let sent = fd.send(payload)?;
        if sent != payload.len() {
            warn!(sent, expected = payload.len(), "partial datagram send");
            return Err(SocketError::TruncatedDatagram);
        }
        Ok(sent)
    }

    /// Receive one datagram from the connected peer
    pub fn udp_recv(&self, handle: SocketHandle, buf: &mut [u8]) -> Result<usize, SocketError> {
        let record = self.record(handle)?;
        let rec = record.lock().unwrap();
        if rec.transport != Transport::Udp {
            return Err(SocketError::NotSupported);
        }
        let fd = rec.descriptor()?;

        let uninit_buf: &mut [MaybeUninit<u8>] = unsafe {
            std::slice::from_raw_parts_mut(buf.as_mut_ptr() as *mut MaybeUninit<u8>, buf.len())
        };
        let size = fd.recv(uninit_buf)?;
        // Safety: recv initializes the first `size` bytes of the buffer

        Ok(size)
    }
}

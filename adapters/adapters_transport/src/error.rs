//! Error Module
//!
//! Provides the error type shared by all socket operations. Native I/O
//! failures are mapped to semantic variants by `ErrorKind`; everything
//! else is carried as the platform error message.

use std::fmt;
use std::io;

/// Socket error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketError {
    /// Handle does not refer to a live socket
    InvalidHandle,
    /// Operation attempted in the wrong connection state
    InvalidState,
    /// Invalid address
    InvalidAddress,
    /// Address already in use
    AddressInUse,
    /// Connection refused
    ConnectionRefused,
    /// Connection reset
    ConnectionReset,
    /// Connection aborted
    ConnectionAborted,
    /// Network unreachable
    NetworkUnreachable,
    /// Host unreachable
    HostUnreachable,
    /// Timeout
    Timeout,
    /// Would block (non-blocking operation)
    WouldBlock,
    /// Operation not supported for this transport
    NotSupported,
    /// A datagram was sent or received only partially
    TruncatedDatagram,
    /// I/O error
    IoError(String),
}

impl From<io::Error> for SocketError {
    fn from(err: io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::AddrInUse => SocketError::AddressInUse,
            ErrorKind::ConnectionRefused => SocketError::ConnectionRefused,
            ErrorKind::ConnectionReset => SocketError::ConnectionReset,
            ErrorKind::ConnectionAborted => SocketError::ConnectionAborted,
            ErrorKind::NetworkUnreachable => SocketError::NetworkUnreachable,
            ErrorKind::HostUnreachable => SocketError::HostUnreachable,
            ErrorKind::TimedOut => SocketError::Timeout,
            ErrorKind::WouldBlock => SocketError::WouldBlock,
            _ => SocketError::IoError(err.to_string()),
        }
    }
}

impl fmt::Display for SocketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketError::InvalidHandle => write!(f, "invalid socket handle"),
            SocketError::InvalidState => write!(f, "operation invalid in current socket state"),
            SocketError::InvalidAddress => write!(f, "invalid address"),
            SocketError::AddressInUse => write!(f, "address already in use"),
            SocketError::ConnectionRefused => write!(f, "connection refused"),
            SocketError::ConnectionReset => write!(f, "connection reset"),
            SocketError::ConnectionAborted => write!(f, "connection aborted"),
            SocketError::NetworkUnreachable => write!(f, "network unreachable"),
            SocketError::HostUnreachable => write!(f, "host unreachable"),
            SocketError::Timeout => write!(f, "operation timed out"),
            SocketError::WouldBlock => write!(f, "operation would block"),
            SocketError::NotSupported => write!(f, "operation not supported"),
            SocketError::TruncatedDatagram => write!(f, "datagram truncated"),
            SocketError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for SocketError {}

//! Adapters Layer: Network Transport
//!
//! Provides a uniform handle-based object model over TCP and UDP transport
//! with an explicit connection-state machine. This crate implements socket
//! operations using Rust's standard library and the `socket2` crate for
//! safe, cross-platform socket operations.
//!
//! ## Overview
//!
//! The `adapters_transport` crate provides:
//! - **Socket core**: bind, connect, close, destroy, blocking toggle and
//!   state/address queries, keyed by generation-checked handles
//! - **TCP transport**: listen, timeout-bounded accept, Nagle-delay control
//! - **UDP transport**: connectionless datagram send/receive addressed
//!   per call, plus connected-peer mode
//! - **Stream adapter**: a `std::io::Read`/`std::io::Write` view over a
//!   connected socket
//! - **Event channel**: connection lifecycle notifications drained
//!   independently of the I/O threads
//!
//! ## Architecture
//!
//! This crate is part of the adapters layer in the CLEAN architecture
//! implementation. It depends on:
//! - `entities_addressing`: For the endpoint address value type
//! - `infrastructure_registry`: For the generational socket handle table
//! - `infrastructure_events`: For the bounded lifecycle event queue
//!
//! ## Usage
//!
//! ```no_run
//! use adapters_transport::{Address, NetworkConfig, NetworkContext};
//!
//! let context = NetworkContext::new(NetworkConfig::default());
//! let server = context.tcp_allocate().unwrap();
//! let address = Address::parse("127.0.0.1:0").unwrap();
//! context.bind(server, &address).unwrap();
//! context.tcp_listen(server).unwrap();
//!
//! // Returns within ~500ms whether or not a connection arrives
//! let _ = context.tcp_accept(server, 500);
//! ```

pub mod context;
pub mod error;
pub mod event;
pub mod interfaces;
pub mod readiness;
pub mod socket;
pub mod stream;
pub mod tcp;
pub mod udp;

pub use context::{NetworkConfig, NetworkContext, SocketHandle};
pub use error::SocketError;
pub use event::{NetworkEvent, NetworkEventKind};
pub use interfaces::{local_addresses, supports_ipv4, supports_ipv6};
pub use socket::{SocketState, Transport};
pub use stream::SocketStream;

pub use entities_addressing::{Address, AddressError, AddressFamily};

//! Entities Layer: Network Addressing
//!
//! This crate provides the endpoint address model shared by every transport
//! in the network library: a family-tagged IPv4/IPv6 address value with a
//! port, numeric parsing and formatting, and family discrimination.
//!
//! ## Overview
//!
//! The `entities_addressing` crate is part of the entities layer. As the
//! innermost layer it has no dependencies on other crates in the system;
//! the transport adapters build their socket-address conversions on top of
//! it.
//!
//! ## Modules
//!
//! - **[`address`](address/index.html)**: The `Address` value type (family,
//!   IP, port), the `AddressFamily` tag, in-place port mutation, equality
//!   over family+IP+port, and canonical numeric string rendering.
//!
//! ## Usage
//!
//! ```rust
//! use entities_addressing::{Address, AddressFamily};
//!
//! let mut addr = Address::parse("127.0.0.1:8080").unwrap();
//! assert_eq!(addr.family(), AddressFamily::Ipv4);
//! assert_eq!(addr.port(), 8080);
//!
//! addr.set_port(9000);
//! assert_eq!(addr.to_string_with_port(), "127.0.0.1:9000");
//! ```

pub mod address;

pub use address::{Address, AddressError, AddressFamily};

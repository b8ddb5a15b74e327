//! Infrastructure Layer: Object Registry
//!
//! Provides the handle table used to hand out opaque identifiers for
//! pooled runtime objects. Handles are index+generation pairs; every
//! lookup validates the generation, so a stale handle to a destroyed
//! object is detected instead of dereferencing freed state.
//!
//! ## Overview
//!
//! The `infrastructure_registry` crate is part of the infrastructure
//! layer. It has no dependencies on other crates in the system. The
//! transport adapters store their socket records in a [`HandleTable`]
//! and expose the issued [`Handle`] values as the public socket
//! identifiers.
//!
//! ## Modules
//!
//! - **[`handle_table`](handle_table/index.html)**: The generational slot
//!   arena with free-slot reuse and thread-safe lookup.

pub mod handle_table;

pub use handle_table::{Handle, HandleTable};

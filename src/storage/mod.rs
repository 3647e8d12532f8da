//! File store backing the HTTP methods.
//!
//! All paths are relative to one root directory. Concurrent operations on
//! the same resolved path can optionally be serialised with [`PathLocks`].

pub mod locks;
pub mod store;

pub use locks::PathLocks;
pub use store::{FileStore, Outcome, StoreError};

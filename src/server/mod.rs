//! Connection dispatch.
//!
//! [`listener`] owns the accept loop and hands each socket to a fresh task;
//! [`router`] turns a parsed request into a file store call.

pub mod listener;
pub mod router;

pub use router::Router;

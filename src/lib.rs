//! webroot - minimal HTTP/1.1 file server
//!
//! Parses requests straight off the socket and maps GET, POST/PUT and DELETE
//! onto files under a single root directory.

pub mod config;
pub mod http;
pub mod server;
pub mod storage;

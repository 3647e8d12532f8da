//! HTTP protocol implementation.
//!
//! A deliberately small HTTP/1.1 subset: one request per connection, bodies
//! framed by `Content-Length` only, no keep-alive and no chunked encoding.
//!
//! # Architecture
//!
//! - **`connection`**: Per-connection state machine, from request line to close
//! - **`parser`**: Reads the request line and headers off a buffered stream
//! - **`body`**: Copies exactly `Content-Length` body bytes into a sink
//! - **`request`**: Parsed request head
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Serializes and writes HTTP responses to the client
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Request line, then headers up to the blank line
//!        └──────┬──────┘
//!               │ Request head parsed
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Route by method, touch the file store
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               ▼
//!            Closed          ← Also reached on EOF, parse or I/O failure
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use webroot::http::body::BodyMode;
//! use webroot::http::connection::Connection;
//! use webroot::server::Router;
//! use webroot::storage::FileStore;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     let router = Arc::new(Router::new(FileStore::new("web_root"), BodyMode::Lenient));
//!
//!     loop {
//!         let (socket, _addr) = listener.accept().await?;
//!         let router = Arc::clone(&router);
//!         tokio::spawn(async move {
//!             let mut conn = Connection::new(socket, router, None);
//!             if let Err(e) = conn.run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod body;
pub mod connection;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;

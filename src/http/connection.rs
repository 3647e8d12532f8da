use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::http::parser::read_request;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;
use crate::server::router::Router;
use crate::storage::StoreError;

/// One accepted client, served for exactly one request.
pub struct Connection<S> {
    stream: BufReader<S>,
    router: Arc<Router>,
    read_timeout: Option<Duration>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, router: Arc<Router>, read_timeout: Option<Duration>) -> Self {
        Self {
            stream: BufReader::new(stream),
            router,
            read_timeout,
            state: ConnectionState::Reading,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Drives the connection to `Closed`, whatever happens on the way.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let result = self.drive().await;
        self.state = ConnectionState::Closed;

        if let Err(e) = self.stream.shutdown().await {
            tracing::trace!(error = %e, "Shutdown after response failed");
        }

        result
    }

    async fn drive(&mut self) -> anyhow::Result<()> {
        loop {
            let state = std::mem::replace(&mut self.state, ConnectionState::Closed);

            self.state = match state {
                ConnectionState::Reading => match self.read_request().await? {
                    Some(req) => ConnectionState::Processing(req),
                    // Peer went away or sent nothing
                    None => ConnectionState::Closed,
                },

                ConnectionState::Processing(req) => {
                    let response = self.handle_request(&req).await?;

                    tracing::info!(
                        method = %req.method,
                        path = %req.path,
                        status = response.status.as_u16(),
                        "Handled request"
                    );

                    ConnectionState::Writing(ResponseWriter::new(&response))
                }

                ConnectionState::Writing(mut writer) => {
                    writer.write_to_stream(&mut self.stream).await?;
                    ConnectionState::Closed
                }

                ConnectionState::Closed => return Ok(()),
            };
        }
    }

    /// Reads the request head, giving up after `read_timeout`.
    pub async fn read_request(&mut self) -> anyhow::Result<Option<Request>> {
        let head = read_request(&mut self.stream);
        let parsed = match self.read_timeout {
            Some(limit) => tokio::time::timeout(limit, head)
                .await
                .with_context(|| format!("request head not received within {limit:?}"))?,
            None => head.await,
        };
        parsed.context("HTTP parse error")
    }

    /// Body reads inside `dispatch` carry their own idle timeout; lock waits
    /// and filesystem work are not bounded here.
    async fn handle_request(&mut self, req: &Request) -> anyhow::Result<Response> {
        let router = Arc::clone(&self.router);

        match router.dispatch(req, &mut self.stream).await {
            Ok(response) => Ok(response),
            Err(e @ StoreError::Io { .. }) => {
                // Best effort: the client may already be gone.
                let mut writer = ResponseWriter::new(&Response::internal_error());
                if let Err(write_err) = writer.write_to_stream(&mut self.stream).await {
                    tracing::debug!(error = %write_err, "Could not deliver 500 response");
                }
                Err(anyhow::Error::new(e).context(format!("{} {} failed", req.method, req.path)))
            }
            Err(e) => {
                Err(anyhow::Error::new(e).context(format!("{} {} failed", req.method, req.path)))
            }
        }
    }
}

use std::time::Duration;

use tokio::io::AsyncRead;

use crate::http::body::BodyMode;
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::storage::{FileStore, StoreError};

/// Maps each method onto a file store operation.
#[derive(Debug)]
pub struct Router {
    store: FileStore,
    body_mode: BodyMode,
    idle_timeout: Option<Duration>,
}

impl Router {
    pub fn new(store: FileStore, body_mode: BodyMode) -> Self {
        Self {
            store,
            body_mode,
            idle_timeout: None,
        }
    }

    /// Longest wait for the next body chunk during an upload.
    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Runs the operation for `req`. `body` is only read for POST and PUT,
    /// and then only up to `req.content_length` bytes.
    pub async fn dispatch<R>(&self, req: &Request, body: &mut R) -> Result<Response, StoreError>
    where
        R: AsyncRead + Unpin,
    {
        let outcome = match &req.method {
            Method::GET => self.store.serve(&req.path).await?,
            Method::POST | Method::PUT => {
                self.store
                    .save(
                        &req.path,
                        body,
                        req.content_length,
                        self.body_mode,
                        self.idle_timeout,
                    )
                    .await?
            }
            Method::DELETE => self.store.delete(&req.path).await?,
            Method::Other(_) => return Ok(Response::method_not_allowed()),
        };

        Ok(outcome.into_response())
    }
}

//! Content-Length bounded body reading.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Size of the intermediate copy buffer.
pub const BUFFER_SIZE: usize = 8192;

/// What to do when the peer stops sending before `Content-Length` bytes arrived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyMode {
    /// Keep whatever arrived and carry on.
    #[default]
    Lenient,
    /// Fail the request.
    Strict,
}

#[derive(Debug, Error)]
pub enum BodyError {
    #[error("body ended after {received} of {expected} bytes")]
    Incomplete { expected: usize, received: usize },

    #[error("no body bytes arrived for {idle:?} after {received} bytes")]
    Stalled { idle: Duration, received: usize },

    #[error("failed to read request body")]
    Read(#[source] std::io::Error),

    #[error("failed to write request body")]
    Sink(#[source] std::io::Error),
}

/// Copies exactly `content_length` bytes from `reader` into `sink`.
///
/// Each read asks for at most `min(BUFFER_SIZE, remaining)` bytes, so nothing
/// past the declared body is consumed. `idle_timeout` bounds every single
/// read, not the transfer as a whole: a slow body that keeps arriving is
/// never cut off. Returns the number of bytes copied, which is less than
/// `content_length` only in [`BodyMode::Lenient`].
pub async fn read_body<R, W>(
    reader: &mut R,
    sink: &mut W,
    content_length: usize,
    mode: BodyMode,
    idle_timeout: Option<Duration>,
) -> Result<usize, BodyError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; BUFFER_SIZE];
    let mut total = 0;

    while total < content_length {
        let want = BUFFER_SIZE.min(content_length - total);
        let read = reader.read(&mut buf[..want]);
        let n = match idle_timeout {
            Some(idle) => tokio::time::timeout(idle, read)
                .await
                .map_err(|_| BodyError::Stalled {
                    idle,
                    received: total,
                })?,
            None => read.await,
        }
        .map_err(BodyError::Read)?;

        if n == 0 {
            break;
        }

        sink.write_all(&buf[..n]).await.map_err(BodyError::Sink)?;
        total += n;
    }

    sink.flush().await.map_err(BodyError::Sink)?;

    if total < content_length {
        match mode {
            BodyMode::Lenient => {
                tracing::debug!(
                    expected = content_length,
                    received = total,
                    "Accepting short request body"
                );
            }
            BodyMode::Strict => {
                return Err(BodyError::Incomplete {
                    expected: content_length,
                    received: total,
                });
            }
        }
    }

    Ok(total)
}

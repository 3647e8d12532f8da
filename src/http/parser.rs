use std::num::ParseIntError;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::http::request::{Method, Request};

/// Longest request line or header line accepted, terminator included.
pub const MAX_LINE_LEN: usize = 8192;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed request line {0:?}")]
    MalformedRequestLine(String),

    #[error("stream ended before the blank line closing the request head")]
    Truncated,

    #[error("invalid Content-Length {value:?}")]
    InvalidContentLength {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("line exceeds {MAX_LINE_LEN} bytes")]
    LineTooLong,

    #[error("failed to read request head")]
    Io(#[from] std::io::Error),
}

/// Reads one request head off `reader`, one line at a time.
///
/// Returns `Ok(None)` when the peer closed the connection or sent an empty
/// first line. On success the reader is positioned at the first body byte.
pub async fn read_request<R>(reader: &mut R) -> Result<Option<Request>, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let line = match read_line(reader).await? {
        Some(line) if !line.is_empty() => line,
        _ => return Ok(None),
    };

    let (method, path, version) = parse_request_line(&line)?;

    let mut content_length = 0;
    loop {
        let line = read_line(reader).await?.ok_or(ParseError::Truncated)?;
        if line.is_empty() {
            break;
        }
        // Last Content-Length wins; every other header is dropped.
        if let Some(len) = parse_content_length(&line)? {
            content_length = len;
        }
    }

    Ok(Some(Request {
        method,
        path,
        version,
        content_length,
    }))
}

/// Splits `METHOD PATH [VERSION]` on whitespace.
pub fn parse_request_line(line: &str) -> Result<(Method, String, Option<String>), ParseError> {
    let mut parts = line.split_whitespace();

    let (Some(method), Some(path)) = (parts.next(), parts.next()) else {
        return Err(ParseError::MalformedRequestLine(line.to_string()));
    };
    let version = parts.next().map(str::to_string);

    Ok((Method::parse(method), path.to_string(), version))
}

/// Returns the declared length if `line` is a `Content-Length` header.
///
/// The header name is matched case-insensitively. A value that is not a
/// non-negative integer is an error rather than being ignored.
pub fn parse_content_length(line: &str) -> Result<Option<usize>, ParseError> {
    let Some((name, value)) = line.split_once(':') else {
        return Ok(None);
    };
    if !name.eq_ignore_ascii_case("content-length") {
        return Ok(None);
    }

    let value = value.trim();
    value
        .parse::<usize>()
        .map(Some)
        .map_err(|source| ParseError::InvalidContentLength {
            value: value.to_string(),
            source,
        })
}

/// Reads a single line, stripping the LF and an optional preceding CR.
///
/// `Ok(None)` means the stream was already at end-of-data.
async fn read_line<R>(reader: &mut R) -> Result<Option<String>, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let n = (&mut *reader)
        .take(MAX_LINE_LEN as u64)
        .read_until(b'\n', &mut buf)
        .await?;

    if n == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else if n == MAX_LINE_LEN {
        return Err(ParseError::LineTooLong);
    }

    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parse_simple_get() {
        let mut req: &[u8] = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";

        let parsed = read_request(&mut req).await.unwrap().unwrap();

        assert_eq!(parsed.method, Method::GET);
        assert_eq!(parsed.path, "/");
        assert_eq!(parsed.content_length, 0);
        assert!(req.is_empty());
    }

    #[tokio::test]
    async fn leaves_body_on_the_stream() {
        let mut req: &[u8] = b"PUT /a.txt HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc";

        let parsed = read_request(&mut req).await.unwrap().unwrap();

        assert_eq!(parsed.content_length, 3);
        assert_eq!(req, b"abc");
    }
}

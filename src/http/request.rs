use std::fmt;

/// HTTP request methods.
///
/// GET, POST, PUT and DELETE are routed to the file store. Anything else is
/// kept verbatim in `Other` and answered with 405 Method Not Allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Serve a file
    GET,
    /// POST - Create or overwrite a file
    POST,
    /// PUT - Create or overwrite a file
    PUT,
    /// DELETE - Remove a file
    DELETE,
    /// Any other token found in the method position
    Other(String),
}

/// Represents a parsed HTTP request head.
///
/// Only what routing needs survives parsing: headers other than
/// `Content-Length` are read and dropped, and the body is left on the
/// stream for the body extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request path exactly as sent (e.g., "/index.html")
    pub path: String,
    /// HTTP version token, when the request line carried one
    pub version: Option<String>,
    /// Declared body length; 0 when no Content-Length header was sent
    pub content_length: usize,
}

impl Method {
    /// Parses an HTTP method token. Matching is case-sensitive, as methods are.
    ///
    /// # Example
    ///
    /// ```
    /// # use webroot::http::request::Method;
    /// assert_eq!(Method::parse("GET"), Method::GET);
    /// assert_eq!(Method::parse("get"), Method::Other("get".to_string()));
    /// ```
    pub fn parse(s: &str) -> Self {
        match s {
            "GET" => Method::GET,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            other => Method::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::Other(s) => s,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

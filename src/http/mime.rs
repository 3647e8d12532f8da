//! MIME type detection based on file extensions.

use std::collections::HashMap;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const BUILTIN: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("json", "application/json"),
    ("txt", "text/plain"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("pdf", "application/pdf"),
    ("ico", "image/x-icon"),
    ("svg", "image/svg+xml"),
    ("xml", "application/xml"),
];

/// Extension → content-type lookup table.
///
/// Built once at startup and only read afterwards; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct MimeTable {
    types: HashMap<String, String>,
}

impl Default for MimeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MimeTable {
    pub fn new() -> Self {
        let types = BUILTIN
            .iter()
            .map(|(ext, ty)| (ext.to_string(), ty.to_string()))
            .collect();
        Self { types }
    }

    /// Adds or replaces entries. Extensions are stored lowercase, without a dot.
    pub fn with_overrides<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (ext, ty) in entries {
            let ext = ext.as_ref().trim_start_matches('.').to_ascii_lowercase();
            self.types.insert(ext, ty.into());
        }
        self
    }

    /// Content type for `file_name`, falling back to [`DEFAULT_CONTENT_TYPE`].
    ///
    /// ```
    /// # use webroot::http::mime::MimeTable;
    /// let table = MimeTable::new();
    /// assert_eq!(table.content_type("index.HTML"), "text/html");
    /// assert_eq!(table.content_type(".bashrc"), "application/octet-stream");
    /// ```
    pub fn content_type(&self, file_name: &str) -> &str {
        extension(file_name)
            .and_then(|ext| self.types.get(&ext.to_ascii_lowercase()))
            .map(String::as_str)
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

/// Text after the last dot, unless the dot leads or ends the name.
fn extension(file_name: &str) -> Option<&str> {
    let dot = file_name.rfind('.')?;
    if dot == 0 || dot == file_name.len() - 1 {
        return None;
    }
    Some(&file_name[dot + 1..])
}

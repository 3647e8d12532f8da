use webroot::http::mime::{DEFAULT_CONTENT_TYPE, MimeTable};

#[test]
fn test_builtin_types() {
    let table = MimeTable::new();

    assert_eq!(table.content_type("index.html"), "text/html");
    assert_eq!(table.content_type("style.css"), "text/css");
    assert_eq!(table.content_type("app.js"), "application/javascript");
    assert_eq!(table.content_type("photo.JPEG"), "image/jpeg");
    assert_eq!(table.content_type("logo.svg"), "image/svg+xml");
}

#[test]
fn test_unknown_and_missing_extensions() {
    let table = MimeTable::new();

    assert_eq!(table.content_type("archive.tar.zst"), DEFAULT_CONTENT_TYPE);
    assert_eq!(table.content_type("Makefile"), DEFAULT_CONTENT_TYPE);
    assert_eq!(table.content_type(".env"), DEFAULT_CONTENT_TYPE);
    assert_eq!(table.content_type("file."), DEFAULT_CONTENT_TYPE);
}

#[test]
fn test_overrides_extend_and_replace() {
    let table = MimeTable::new().with_overrides([(".MD", "text/markdown"), ("html", "text/html; charset=utf-8")]);

    assert_eq!(table.content_type("README.md"), "text/markdown");
    assert_eq!(table.content_type("index.html"), "text/html; charset=utf-8");
    assert_eq!(table.content_type("data.json"), "application/json");
}

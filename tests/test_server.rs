//! End-to-end tests over real TCP connections

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use webroot::http::body::BodyMode;
use webroot::server::{Router, listener};
use webroot::storage::FileStore;

struct Reply {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Reply {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

async fn start(dir: &tempfile::TempDir) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = Arc::new(Router::new(FileStore::new(dir.path()), BodyMode::Lenient));

    tokio::spawn(listener::serve(listener, router, Some(Duration::from_secs(5))));
    addr
}

async fn send_raw(addr: SocketAddr, raw: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();

    let mut out = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut out))
        .await
        .expect("server should close the connection")
        .unwrap();
    out
}

async fn request(addr: SocketAddr, method: &str, path: &str, body: &[u8]) -> Reply {
    let mut raw = format!(
        "{method} {path} HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\n\r\n",
        body.len()
    )
    .into_bytes();
    raw.extend_from_slice(body);

    parse_reply(&send_raw(addr, &raw).await)
}

fn parse_reply(raw: &[u8]) -> Reply {
    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response head terminator");
    let head = std::str::from_utf8(&raw[..split]).unwrap();
    let mut lines = head.split("\r\n");

    let status_line = lines.next().unwrap();
    assert!(status_line.starts_with("HTTP/1.1 "));
    let status = status_line[9..12].parse().unwrap();

    let headers = lines
        .map(|line| {
            let (k, v) = line.split_once(": ").unwrap();
            (k.to_string(), v.to_string())
        })
        .collect();

    Reply {
        status,
        headers,
        body: raw[split + 4..].to_vec(),
    }
}

#[tokio::test]
async fn test_get_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), b"<h1>home</h1>").unwrap();
    let addr = start(&dir).await;

    let reply = request(addr, "GET", "/index.html", b"").await;

    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Content-Type"), Some("text/html"));
    assert_eq!(reply.header("Content-Length"), Some("13"));
    assert_eq!(reply.body, b"<h1>home</h1>");
}

#[tokio::test]
async fn test_get_root_serves_index() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), b"root page").unwrap();
    let addr = start(&dir).await;

    let root = request(addr, "GET", "/", b"").await;
    let index = request(addr, "GET", "/index.html", b"").await;

    assert_eq!(root.status, 200);
    assert_eq!(root.body, index.body);
    assert_eq!(root.headers, index.headers);
}

#[tokio::test]
async fn test_get_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start(&dir).await;

    let reply = request(addr, "GET", "/missing.css", b"").await;

    assert_eq!(reply.status, 404);
    assert_eq!(reply.header("Content-Type"), Some("text/plain"));
    assert_eq!(reply.body, b"404 Not Found");
}

#[tokio::test]
async fn test_put_then_get_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start(&dir).await;
    let body: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();

    let put = request(addr, "PUT", "/a/b/c.txt", &body).await;
    assert_eq!(put.status, 201);
    assert!(dir.path().join("a/b").is_dir());

    let get = request(addr, "GET", "/a/b/c.txt", b"").await;
    assert_eq!(get.status, 200);
    assert_eq!(get.body, body);
}

#[tokio::test]
async fn test_post_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start(&dir).await;

    assert_eq!(request(addr, "POST", "/note.txt", b"first version").await.status, 201);
    assert_eq!(request(addr, "POST", "/note.txt", b"second").await.status, 201);

    assert_eq!(std::fs::read(dir.path().join("note.txt")).unwrap(), b"second");
}

#[tokio::test]
async fn test_delete_twice() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("old.txt"), b"x").unwrap();
    let addr = start(&dir).await;

    let first = request(addr, "DELETE", "/old.txt", b"").await;
    assert_eq!(first.status, 204);
    assert!(first.body.is_empty());
    assert!(!dir.path().join("old.txt").exists());

    assert_eq!(request(addr, "DELETE", "/old.txt", b"").await.status, 404);
    assert_eq!(request(addr, "DELETE", "/old.txt", b"").await.status, 404);
}

#[tokio::test]
async fn test_unsupported_method() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start(&dir).await;

    let reply = request(addr, "PATCH", "/patched.txt", b"").await;

    assert_eq!(reply.status, 405);
    assert!(!dir.path().join("patched.txt").exists());
}

#[tokio::test]
async fn test_short_body_is_accepted_leniently() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start(&dir).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"PUT /partial.txt HTTP/1.1\r\nContent-Length: 100\r\n\r\nonly this")
        .await
        .unwrap();
    stream.shutdown().await.unwrap();

    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();

    assert_eq!(parse_reply(&out).status, 201);
    assert_eq!(
        std::fs::read(dir.path().join("partial.txt")).unwrap(),
        b"only this"
    );
}

#[tokio::test]
async fn test_malformed_request_does_not_affect_others() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ok.txt"), b"fine").unwrap();
    let addr = start(&dir).await;

    let garbage = send_raw(addr, b"JUSTONETOKEN\r\n\r\n").await;
    assert!(garbage.is_empty());

    let bad_length = send_raw(addr, b"PUT /x HTTP/1.1\r\nContent-Length: nope\r\n\r\n").await;
    assert!(bad_length.is_empty());
    assert!(!dir.path().join("x").exists());

    let reply = request(addr, "GET", "/ok.txt", b"").await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, b"fine");
}

#[tokio::test]
async fn test_concurrent_clients() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start(&dir).await;

    let mut tasks = Vec::new();
    for i in 0..16 {
        tasks.push(tokio::spawn(async move {
            let path = format!("/client/{i}.txt");
            let body = format!("payload {i}").into_bytes();

            assert_eq!(request(addr, "PUT", &path, &body).await.status, 201);
            let reply = request(addr, "GET", &path, b"").await;
            assert_eq!(reply.body, body);
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }
}

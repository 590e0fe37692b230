//! End-to-end tests against a live listener on an OS-assigned port.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use logyard_protocol::{source_endpoint, stream_endpoint};
use logyard_server::{LogServer, ServerConfig, ServerError, source_href};
use logyard_sources::{Catalog, RawSource};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

const WAIT: Duration = Duration::from_secs(5);

struct Running {
    server: Arc<LogServer>,
    handle: JoinHandle<Result<(), ServerError>>,
    port: u16,
}

async fn start(roots: &[PathBuf]) -> Running {
    start_with_timeout(roots, Duration::from_secs(5)).await
}

async fn start_with_timeout(roots: &[PathBuf], shutdown_timeout: Duration) -> Running {
    let raws: Vec<_> = roots
        .iter()
        .map(|p| RawSource {
            raw_path: p.display().to_string(),
            abs_path: Some(p.clone()),
        })
        .collect();
    let config = ServerConfig {
        port: 0,
        poll_interval: Duration::from_millis(50),
        shutdown_timeout,
    };
    let server = LogServer::new(config, &Catalog::build(&raws));
    let server2 = Arc::clone(&server);
    let handle = tokio::spawn(async move { server2.run().await });

    let mut port = 0;
    for _ in 0..100 {
        port = server.port().await;
        if port > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(port > 0, "server did not bind");

    Running {
        server,
        handle,
        port,
    }
}

/// Minimal HTTP/1.1 GET; returns the status code and the raw response.
async fn get(port: u16, route: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    let request =
        format!("GET {route} HTTP/1.1\r\nHost: 127.0.0.1\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    tokio::time::timeout(WAIT, stream.read_to_end(&mut response))
        .await
        .unwrap()
        .unwrap();
    let response = String::from_utf8_lossy(&response).into_owned();
    let status = response
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap();
    (status, response)
}

fn append(path: &Path, data: &[u8]) {
    let mut f = std::fs::OpenOptions::new().append(true).open(path).unwrap();
    f.write_all(data).unwrap();
    f.flush().unwrap();
}

async fn next_text<S>(ws: &mut S) -> String
where
    S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
        + Unpin,
{
    loop {
        let msg = tokio::time::timeout(WAIT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .unwrap();
        match msg {
            Message::Text(text) => return text.as_str().to_owned(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

#[tokio::test]
async fn listing_links_every_source() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir(tmp.path().join("nested")).unwrap();
    std::fs::write(tmp.path().join("nested/app.log"), "").unwrap();
    std::fs::write(tmp.path().join("notes.txt"), "").unwrap();

    let running = start(&[tmp.path().to_path_buf()]).await;
    let (status, body) = get(running.port, "/").await;

    assert_eq!(status, 200);
    assert!(body.contains("text/html"));
    let child = tmp.path().join("nested/app.log");
    assert!(body.contains(&source_endpoint(&child)));
    assert!(!body.contains("notes.txt"));

    running.server.shutdown();
    running.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn viewer_page_is_served_per_source() {
    let tmp = tempfile::tempdir().unwrap();
    let file = tmp.path().join("viewer.log");
    std::fs::write(&file, "").unwrap();

    let running = start(&[file.clone()]).await;
    let (status, body) = get(running.port, &source_endpoint(&file)).await;

    assert_eq!(status, 200);
    assert!(body.contains(&file.display().to_string()));

    running.server.shutdown();
    running.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let running = start(&[tmp.path().to_path_buf()]).await;

    assert_eq!(get(running.port, "/src/not/registered.log").await.0, 404);
    assert_eq!(get(running.port, "/src/not/registered.log/$").await.0, 404);
    assert_eq!(get(running.port, "/elsewhere").await.0, 404);

    running.server.shutdown();
    running.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn stream_route_requires_upgrade() {
    let tmp = tempfile::tempdir().unwrap();
    let file = tmp.path().join("plain.log");
    std::fs::write(&file, "").unwrap();

    let running = start(&[file.clone()]).await;
    assert_eq!(get(running.port, &stream_endpoint(&file)).await.0, 400);

    running.server.shutdown();
    running.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn websocket_streams_complete_lines() {
    let tmp = tempfile::tempdir().unwrap();
    let file = tmp.path().join("live.log");
    std::fs::write(&file, "first\nsecond\r\npart").unwrap();

    let running = start(&[file.clone()]).await;
    let url = format!("ws://127.0.0.1:{}{}", running.port, stream_endpoint(&file));
    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();

    assert_eq!(next_text(&mut ws).await, "first");
    assert_eq!(next_text(&mut ws).await, "second\r");

    append(&file, b"ial\n");
    assert_eq!(next_text(&mut ws).await, "partial");

    append(&file, b"appended later\n");
    assert_eq!(next_text(&mut ws).await, "appended later");

    drop(ws);
    running.server.shutdown();
    running.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn shutdown_closes_open_streams() {
    let tmp = tempfile::tempdir().unwrap();
    let file = tmp.path().join("open.log");
    std::fs::write(&file, "only\n").unwrap();

    let running = start(&[file.clone()]).await;
    let url = format!("ws://127.0.0.1:{}{}", running.port, stream_endpoint(&file));
    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
    assert_eq!(next_text(&mut ws).await, "only");

    running.server.shutdown();
    let result = tokio::time::timeout(WAIT, running.handle)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());

    // The session ends with a close frame or a dropped connection.
    let rest = tokio::time::timeout(WAIT, ws.next()).await.unwrap();
    assert!(matches!(rest, None | Some(Ok(Message::Close(_))) | Some(Err(_))));
}

#[tokio::test]
async fn shutdown_route_redirects_and_stops_the_server() {
    let tmp = tempfile::tempdir().unwrap();
    let running = start(&[tmp.path().to_path_buf()]).await;

    let (status, response) = get(running.port, "/$").await;
    assert_eq!(status, 302);
    assert!(response.to_ascii_lowercase().contains("location: /\r\n"));

    let result = tokio::time::timeout(WAIT, running.handle)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn catalog_is_fixed_at_startup() {
    let tmp = tempfile::tempdir().unwrap();
    let running = start(&[tmp.path().to_path_buf()]).await;

    let late = tmp.path().join("late.log");
    std::fs::write(&late, "").unwrap();

    let (_, body) = get(running.port, "/").await;
    assert!(!body.contains(&source_endpoint(&late)));
    assert_eq!(get(running.port, &source_endpoint(&late)).await.0, 404);

    running.server.shutdown();
    running.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn stalled_connection_hits_shutdown_timeout() {
    let tmp = tempfile::tempdir().unwrap();
    let timeout = Duration::from_millis(300);
    let running = start_with_timeout(&[tmp.path().to_path_buf()], timeout).await;

    // Request head never completed, so the drain cannot finish.
    let mut stalled = TcpStream::connect(("127.0.0.1", running.port)).await.unwrap();
    stalled
        .write_all(b"GET / HTTP/1.1\r\nHost: 127.0.0.1\r\n")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    running.server.shutdown();
    let result = tokio::time::timeout(WAIT, running.handle)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(result, Err(ServerError::ShutdownTimeout(t)) if t == timeout));

    drop(stalled);
}

#[tokio::test]
async fn special_file_names_are_reachable_from_their_links() {
    let tmp = tempfile::tempdir().unwrap();
    let file = tmp.path().join("odd #1?.log");
    std::fs::write(&file, "hello\n").unwrap();

    let running = start(&[tmp.path().to_path_buf()]).await;
    let href = source_href(&file);

    let (_, listing) = get(running.port, "/").await;
    assert!(listing.contains(&href));

    let (status, viewer) = get(running.port, &href).await;
    assert_eq!(status, 200);
    assert!(viewer.contains("odd #1?.log"));

    let url = format!("ws://127.0.0.1:{}{href}/$", running.port);
    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
    assert_eq!(next_text(&mut ws).await, "hello");

    drop(ws);
    running.server.shutdown();
    running.handle.await.unwrap().unwrap();
}

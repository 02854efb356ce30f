// HttpConverter against a minimal in-process HTTP/1.1 server.

use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use docrelay_convert::{build_source, ConvertError, HttpConverter};
use docrelay_core::config::{ConverterConfig, ConverterMode};
use docrelay_relay::{ChunkEvent, ChunkSource, ChunkStream};

/// Raw request as received by the test server.
struct Captured {
    head: String,
    body: Vec<u8>,
}

/// Accept one connection, capture the request, then write `parts` with a
/// short pause between them.
async fn serve_once(parts: Vec<Vec<u8>>) -> (String, oneshot::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (captured_tx, captured_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let head_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let content_length = head
            .lines()
            .find_map(|l| {
                let lower = l.to_ascii_lowercase();
                lower
                    .strip_prefix("content-length:")
                    .map(|v| v.trim().parse::<usize>().unwrap())
            })
            .unwrap_or(0);
        while buf.len() < head_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            buf.extend_from_slice(&chunk[..n]);
        }
        let body = buf[head_end..head_end + content_length].to_vec();
        let _ = captured_tx.send(Captured { head, body });

        for part in parts {
            socket.write_all(&part).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let _ = socket.shutdown().await;
    });

    (format!("http://{addr}/convert"), captured_rx)
}

fn chunked_response(chunks: &[&[u8]]) -> Vec<Vec<u8>> {
    let mut parts = vec![b"HTTP/1.1 200 OK\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
Transfer-Encoding: chunked\r\n\
Connection: close\r\n\r\n"
        .to_vec()];
    for chunk in chunks {
        let mut part = format!("{:x}\r\n", chunk.len()).into_bytes();
        part.extend_from_slice(chunk);
        part.extend_from_slice(b"\r\n");
        parts.push(part);
    }
    parts.push(b"0\r\n\r\n".to_vec());
    parts
}

fn config(url: &str) -> ConverterConfig {
    ConverterConfig {
        url: Some(url.to_string()),
        api_key: Some("secret-token".to_string()),
        ..ConverterConfig::default()
    }
}

/// Drain a stream into (data, terminal event).
async fn collect(mut stream: ChunkStream) -> (Vec<u8>, ChunkEvent) {
    let mut data = Vec::new();
    loop {
        match stream.next().await {
            Some(ChunkEvent::Data(bytes)) => data.extend_from_slice(&bytes),
            Some(terminal) => return (data, terminal),
            None => panic!("stream ended without a terminal event"),
        }
    }
}

#[tokio::test]
async fn streams_chunked_body_and_sends_document() {
    let euro = "€".as_bytes();
    // Split the euro sign across two HTTP chunks.
    let (url, captured) = serve_once(chunked_response(&[
        b"Page one. ",
        &[b'x', euro[0]],
        &[euro[1], euro[2], b'!'],
    ]))
    .await;

    let converter = HttpConverter::new(&config(&url)).unwrap();
    let stream = converter.start(Bytes::from_static(b"%PDF-1.7 fake"));
    let (data, terminal) = collect(stream).await;

    assert_eq!(terminal, ChunkEvent::End);
    assert_eq!(String::from_utf8(data).unwrap(), "Page one. x€!");

    let request = captured.await.unwrap();
    assert!(request.head.starts_with("POST /convert "));
    assert!(request
        .head
        .to_ascii_lowercase()
        .contains("authorization: bearer secret-token"));
    assert_eq!(request.body, b"%PDF-1.7 fake");
}

#[tokio::test]
async fn error_status_becomes_single_error_event() {
    let (url, _captured) = serve_once(vec![b"HTTP/1.1 500 Internal Server Error\r\n\
Content-Length: 4\r\n\
Connection: close\r\n\r\n\
oops"
        .to_vec()])
    .await;

    let converter = HttpConverter::new(&config(&url)).unwrap();
    let mut stream = converter.start(Bytes::from_static(b"doc"));

    match stream.next().await {
        Some(ChunkEvent::Error(cause)) => {
            assert!(cause.contains("500"), "unexpected cause: {cause}");
            assert!(cause.contains("oops"));
        }
        other => panic!("expected error, got {other:?}"),
    }
    assert_eq!(stream.next().await, None);
}

#[tokio::test]
async fn unreachable_service_is_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let converter = HttpConverter::new(&config(&format!("http://{addr}/convert"))).unwrap();
    let (data, terminal) = collect(converter.start(Bytes::from_static(b"doc"))).await;

    assert!(data.is_empty());
    assert!(matches!(terminal, ChunkEvent::Error(_)));
}

#[test]
fn http_mode_requires_url() {
    let err = build_source(&ConverterConfig::default()).err().unwrap();
    assert!(matches!(err, ConvertError::NoUrl));
}

#[test]
fn synthetic_mode_needs_no_url() {
    let config = ConverterConfig {
        mode: ConverterMode::Synthetic,
        ..ConverterConfig::default()
    };
    let source = build_source(&config).unwrap();
    assert_eq!(source.name(), "synthetic");
}

//! Shortener gateway tests
//!
//! Runs `MonetizzyGateway` against a throwaway HTTP server on localhost.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use keygate::config::GatewayConfig;
use keygate::errors::KeygateError;
use keygate::services::{LinkShortener, MonetizzyGateway};

/// Read one HTTP request (headers plus `Content-Length` body).
fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        let n = stream.read(&mut chunk).unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}

/// Serve a single canned response; the received request is sent back on the
/// returned channel.
fn serve_once(status_line: &'static str, body: &'static str) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/v1/links", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = tx.send(request);
    });

    (url, rx)
}

fn gateway(api_url: String, timeout_secs: u64) -> MonetizzyGateway {
    let config = GatewayConfig {
        api_url,
        timeout_secs,
        ..GatewayConfig::default()
    };
    MonetizzyGateway::new(&config, "gw-token")
}

#[tokio::test]
async fn test_success_returns_short_link_and_sends_expected_request() {
    let (url, rx) = serve_once("200 OK", r#"{"success":true,"shortLink":"https://ufly.monetizzy.com/abc"}"#);

    let short = gateway(url, 5)
        .shorten("https://example.com/a")
        .await
        .unwrap();
    assert_eq!(short, "https://ufly.monetizzy.com/abc");

    let request = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    let lower = request.to_ascii_lowercase();
    assert!(request.starts_with("POST /v1/links"));
    assert!(lower.contains("authorization: bearer gw-token"));

    let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
    let json: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(json["url"], "https://example.com/a");
    assert_eq!(json["domain"], "ufly.monetizzy.com");
    assert_eq!(json["type"], "direct");
}

#[tokio::test]
async fn test_nested_data_field_is_accepted() {
    let (url, _rx) = serve_once("200 OK", r#"{"data":{"shortUrl":"https://s.example/x"}}"#);

    let short = gateway(url, 5).shorten("https://example.com/a").await.unwrap();
    assert_eq!(short, "https://s.example/x");
}

#[tokio::test]
async fn test_unauthorized_maps_to_gateway_auth() {
    for status in ["401 Unauthorized", "403 Forbidden"] {
        let (url, _rx) = serve_once(status, r#"{"error":"invalid token"}"#);

        let err = gateway(url, 5)
            .shorten("https://example.com/a")
            .await
            .unwrap_err();
        assert!(matches!(err, KeygateError::GatewayAuth(_)), "{}", status);
        assert_eq!(err.http_status(), 401);
    }
}

#[tokio::test]
async fn test_server_error_maps_to_gateway() {
    let (url, _rx) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#);

    let err = gateway(url, 5)
        .shorten("https://example.com/a")
        .await
        .unwrap_err();
    assert!(matches!(err, KeygateError::Gateway(_)));
}

#[tokio::test]
async fn test_missing_short_link_maps_to_gateway() {
    let (url, _rx) = serve_once("200 OK", r#"{"success":true,"data":{}}"#);

    let err = gateway(url, 5)
        .shorten("https://example.com/a")
        .await
        .unwrap_err();
    assert!(matches!(err, KeygateError::Gateway(_)));
}

#[tokio::test]
async fn test_unreachable_host_maps_to_gateway() {
    // bind then drop to get a port with nothing listening
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let err = gateway(format!("http://127.0.0.1:{}/v1/links", port), 5)
        .shorten("https://example.com/a")
        .await
        .unwrap_err();
    assert!(matches!(err, KeygateError::Gateway(_)));
}

#[tokio::test]
async fn test_slow_upstream_maps_to_gateway_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/v1/links", listener.local_addr().unwrap());
    let (done_tx, done_rx) = mpsc::channel::<()>();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let _ = read_request(&mut stream);
        // hold the connection open without answering
        let _ = done_rx.recv_timeout(Duration::from_secs(10));
    });

    let err = gateway(url, 1)
        .shorten("https://example.com/a")
        .await
        .unwrap_err();
    let _ = done_tx.send(());

    assert!(matches!(err, KeygateError::GatewayTimeout(_)));
    assert_eq!(err.http_status(), 408);
}

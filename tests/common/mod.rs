//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use imgproxy::http::{HttpServer, ServerError};
use imgproxy::net::{DualListener, EphemeralIdentity};
use imgproxy::{encode_target, ProxyConfig, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const TEST_VERSION: &str = "9.9.9-test";

/// A mock upstream and the request heads it has received.
pub struct Upstream {
    pub addr: SocketAddr,
    pub requests: mpsc::UnboundedReceiver<String>,
}

impl Upstream {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Next request head, lowercased for header matching.
    pub async fn next_request(&mut self) -> String {
        tokio::time::timeout(Duration::from_secs(5), self.requests.recv())
            .await
            .expect("upstream saw no request")
            .expect("upstream closed")
            .to_lowercase()
    }
}

async fn read_head(socket: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&head).into_owned()
}

/// Start a mock upstream that answers every connection with `response`
/// verbatim and then closes.
pub async fn start_raw_backend(response: Vec<u8>) -> Upstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, requests) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let tx = tx.clone();
            let response = response.clone();
            tokio::spawn(async move {
                let head = read_head(&mut socket).await;
                let _ = tx.send(head);
                let _ = socket.write_all(&response).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    Upstream { addr, requests }
}

/// Start a mock upstream that returns a fixed 200 response.
pub async fn start_mock_backend(body: &'static str) -> Upstream {
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nX-Upstream: mock\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    start_raw_backend(response.into_bytes()).await
}

/// Start a mock upstream that accepts connections and never answers.
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// An address nothing listens on.
pub fn refused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// A running relay on loopback ephemeral ports.
pub struct Relay {
    pub http: SocketAddr,
    pub https: SocketAddr,
    pub shutdown: Shutdown,
    pub task: JoinHandle<Result<(), ServerError>>,
}

impl Relay {
    pub fn http_url(&self, target: &str) -> String {
        format!("http://{}/{}", self.http, encode_target(target))
    }

    pub fn https_url(&self, target: &str) -> String {
        format!("https://{}/{}", self.https, encode_target(target))
    }
}

pub async fn start_relay(mut config: ProxyConfig) -> Relay {
    config.listener.bind_address = IpAddr::V4(Ipv4Addr::LOCALHOST);
    config.listener.http_port = 0;
    config.listener.https_port = 0;

    let identity = EphemeralIdentity::generate().unwrap();
    let tls = identity.rustls_config().await.unwrap();
    let listeners = DualListener::bind(&config.listener).unwrap();
    let http = listeners.http_addr().unwrap();
    let https = listeners.https_addr().unwrap();

    let server = HttpServer::new(config, TEST_VERSION).unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let task = tokio::spawn(async move { server.run(listeners, tls, rx).await });

    Relay {
        http,
        https,
        shutdown,
        task,
    }
}

/// Test client: no system proxy, trusts the ephemeral certificate.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .danger_accept_invalid_certs(true)
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// Formatted log output collected by [`capture_logs`].
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Lines carrying `message`.
    pub fn lines_with(&self, message: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.contains(message))
            .map(str::to_string)
            .collect()
    }
}

/// Route `info` and above on the current thread into a buffer.
///
/// Only valid on the default current-thread test runtime, where the relay's
/// spawned tasks run on the same thread as the test.
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .with_writer(move || writer.clone())
        .finish();
    (buffer, tracing::subscriber::set_default(subscriber))
}

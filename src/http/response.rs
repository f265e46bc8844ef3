//! Response handling and transformation.
//!
//! # Responsibilities
//! - Copy upstream status and end-to-end headers onto the client response
//! - Stamp `X-Imgproxy-Version`
//! - Stream the upstream body for `GET`, nothing for `HEAD`
//! - Enforce the size ceiling while streaming
//! - Log the completed relay with the number of bytes transferred
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Hop-by-hop headers stripped automatically
//! - The completion log is emitted by the body stream itself, because the
//!   copy only finishes after the handler has returned
//! - A body with a declared length is complete once that many bytes have
//!   been yielded; hyper stops polling at that point and never sees the end
//!   of the stream

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use axum::body::{Body, Bytes};
use axum::http::{HeaderValue, Method};
use axum::response::Response;
use futures_util::stream::{BoxStream, Stream, StreamExt};

use crate::http::request::RelayContext;
use crate::routing::Target;
use crate::security::headers::{response_headers, X_IMGPROXY_VERSION};
use crate::security::limits::{declared_length, format_bytes, ResponseLimit};

/// Failure while copying the upstream body to the caller.
#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("response body exceeded {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("error reading upstream body: {0}")]
    Upstream(#[from] reqwest::Error),
}

/// Turn an accepted upstream response into the client-facing response.
pub fn relay_response(
    upstream: reqwest::Response,
    ctx: RelayContext,
    target: Target,
    version: &HeaderValue,
    limit: ResponseLimit,
) -> Response {
    let status = upstream.status();
    let mut headers = response_headers(upstream.headers());
    headers.insert(X_IMGPROXY_VERSION, version.clone());

    let body = if ctx.method == Method::GET {
        let expected = declared_length(upstream.headers());
        Body::from_stream(RelayBody::new(
            upstream.bytes_stream().boxed(),
            ctx,
            target,
            limit,
            expected,
        ))
    } else {
        log_relayed(&ctx, &target, 0);
        Body::empty()
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

fn log_relayed(ctx: &RelayContext, target: &Target, length: u64) {
    tracing::info!(
        request_id = %ctx.request_id,
        remote_addr = %ctx.remote_addr,
        method = %ctx.method,
        url = %target,
        length_b = length,
        length = %format_bytes(length),
        "Proxied request"
    );
}

/// Upstream body stream that counts bytes, enforces the ceiling and logs
/// the outcome of the copy exactly once.
pub struct RelayBody {
    inner: BoxStream<'static, reqwest::Result<Bytes>>,
    ctx: RelayContext,
    target: Target,
    limit: ResponseLimit,
    expected: Option<u64>,
    transferred: u64,
    done: bool,
}

impl RelayBody {
    pub fn new(
        inner: BoxStream<'static, reqwest::Result<Bytes>>,
        ctx: RelayContext,
        target: Target,
        limit: ResponseLimit,
        expected: Option<u64>,
    ) -> Self {
        Self {
            inner,
            ctx,
            target,
            limit,
            expected,
            transferred: 0,
            done: false,
        }
    }
}

impl Stream for RelayBody {
    type Item = Result<Bytes, BodyError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        if this.done {
            return Poll::Ready(None);
        }

        match ready!(this.inner.poll_next_unpin(cx)) {
            Some(Ok(chunk)) => {
                this.transferred += chunk.len() as u64;
                if this.limit.exceeded_by(this.transferred) {
                    this.done = true;
                    tracing::warn!(
                        request_id = %this.ctx.request_id,
                        url = %this.target,
                        limit = %format_bytes(this.limit.max_bytes()),
                        "Invalid request: response too large while streaming"
                    );
                    return Poll::Ready(Some(Err(BodyError::TooLarge {
                        limit: this.limit.max_bytes(),
                    })));
                }
                if this.expected == Some(this.transferred) {
                    this.done = true;
                    log_relayed(&this.ctx, &this.target, this.transferred);
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Some(Err(err)) => {
                this.done = true;
                tracing::error!(
                    request_id = %this.ctx.request_id,
                    url = %this.target,
                    error = %err,
                    "Error writing response bytes"
                );
                Poll::Ready(Some(Err(BodyError::Upstream(err))))
            }
            None => {
                this.done = true;
                log_relayed(&this.ctx, &this.target, this.transferred);
                Poll::Ready(None)
            }
        }
    }
}

impl Drop for RelayBody {
    fn drop(&mut self) {
        if !self.done {
            tracing::warn!(
                request_id = %self.ctx.request_id,
                remote_addr = %self.ctx.remote_addr,
                url = %self.target,
                length_b = self.transferred,
                "Client went away before the response was fully written"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

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
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        (buffer, tracing::subscriber::set_default(subscriber))
    }

    fn body_with(
        items: Vec<reqwest::Result<Bytes>>,
        limit: u64,
        expected: Option<u64>,
    ) -> RelayBody {
        RelayBody::new(
            stream::iter(items).boxed(),
            RelayContext::new("127.0.0.1:1".parse().unwrap(), Method::GET),
            Target::parse(b"http://example.com/").unwrap(),
            ResponseLimit::new(limit),
            expected,
        )
    }

    fn body_over(chunks: Vec<&'static [u8]>, limit: u64) -> RelayBody {
        let items = chunks.into_iter().map(|c| Ok(Bytes::from_static(c))).collect();
        body_with(items, limit, None)
    }

    async fn upstream_error() -> reqwest::Error {
        // Nothing listens on port 1 of the loopback interface.
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        client.get("http://127.0.0.1:1/").send().await.unwrap_err()
    }

    #[tokio::test]
    async fn passes_chunks_through() {
        let mut body = body_over(vec![b"hello ", b"world"], 64);
        let mut out = Vec::new();
        while let Some(chunk) = body.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(out, b"hello world");
        assert_eq!(body.transferred, 11);
    }

    #[tokio::test]
    async fn exactly_at_limit_is_allowed() {
        let mut body = body_over(vec![b"12345", b"678"], 8);
        assert!(body.next().await.unwrap().is_ok());
        assert!(body.next().await.unwrap().is_ok());
        assert!(body.next().await.is_none());
    }

    #[tokio::test]
    async fn aborts_once_limit_is_crossed() {
        let mut body = body_over(vec![b"12345", b"6789", b"never"], 8);
        assert!(body.next().await.unwrap().is_ok());
        assert!(matches!(
            body.next().await,
            Some(Err(BodyError::TooLarge { limit: 8 }))
        ));
        assert!(body.next().await.is_none());
    }

    #[tokio::test]
    async fn declared_length_completes_without_polling_the_end() {
        let (logs, _guard) = capture_logs();

        let mut body = body_with(
            vec![Ok(Bytes::from_static(b"tiny png")), Ok(Bytes::from_static(b" bytes"))],
            64,
            Some(14),
        );
        assert!(body.next().await.unwrap().is_ok());
        assert!(body.next().await.unwrap().is_ok());
        // The server stops here once Content-Length bytes are out.
        drop(body);

        let logs = logs.contents();
        assert_eq!(logs.matches("Proxied request").count(), 1, "{logs}");
        assert!(logs.contains("length_b=14"), "{logs}");
        assert!(!logs.contains("Client went away"), "{logs}");
    }

    #[tokio::test]
    async fn undeclared_length_completes_at_end_of_stream() {
        let (logs, _guard) = capture_logs();

        let mut body = body_over(vec![b"hello ", b"world"], 64);
        while body.next().await.is_some() {}
        drop(body);

        let logs = logs.contents();
        assert_eq!(logs.matches("Proxied request").count(), 1, "{logs}");
        assert!(logs.contains("length_b=11"), "{logs}");
        assert!(!logs.contains("Client went away"), "{logs}");
    }

    #[tokio::test]
    async fn early_drop_is_reported_as_disconnect() {
        let (logs, _guard) = capture_logs();

        let mut body = body_with(
            vec![Ok(Bytes::from_static(b"part")), Ok(Bytes::from_static(b"rest"))],
            64,
            Some(8),
        );
        assert!(body.next().await.unwrap().is_ok());
        drop(body);

        let logs = logs.contents();
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("Client went away"), "{logs}");
        assert!(logs.contains("length_b=4"), "{logs}");
        assert!(!logs.contains("Proxied request"), "{logs}");
    }

    #[tokio::test]
    async fn upstream_body_failure_is_logged_as_error() {
        let err = upstream_error().await;
        let (logs, _guard) = capture_logs();

        let mut body = body_with(vec![Ok(Bytes::from_static(b"part")), Err(err)], 64, None);
        assert!(body.next().await.unwrap().is_ok());
        assert!(matches!(body.next().await, Some(Err(BodyError::Upstream(_)))));
        assert!(body.next().await.is_none());
        drop(body);

        let logs = logs.contents();
        assert!(logs.contains("ERROR"), "{logs}");
        assert!(logs.contains("Error writing response bytes"), "{logs}");
        assert!(!logs.contains("Proxied request"), "{logs}");
        assert!(!logs.contains("Client went away"), "{logs}");
    }
}

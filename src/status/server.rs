// ABOUTME: Read-only HTTP endpoint exposing the status board as JSON.
// ABOUTME: Serves /api/status, /api/report and /health over hyper HTTP/1.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio_util::sync::CancellationToken;

use super::StatusBoard;

/// A bound, not yet running status server.
pub struct StatusServer {
    listener: TcpListener,
}

impl StatusServer {
    pub async fn bind(addr: impl ToSocketAddrs) -> std::io::Result<Self> {
        Ok(Self {
            listener: TcpListener::bind(addr).await?,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` is cancelled.
    pub async fn run(self, board: StatusBoard, shutdown: CancellationToken) {
        let mut failures = 0u32;
        loop {
            let accepted = tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = self.listener.accept() => accepted,
            };

            let (stream, peer) = match accepted {
                Ok(conn) => {
                    failures = 0;
                    conn
                }
                Err(e) => {
                    // Errors like EMFILE persist; don't spin on them.
                    let delay = accept_backoff(failures);
                    failures = failures.saturating_add(1);
                    tracing::warn!(retry_in = ?delay, "status server accept failed: {}", e);
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(delay) => continue,
                    }
                }
            };

            let board = board.clone();
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let board = board.clone();
                    async move { Ok::<_, Infallible>(route(&board, &req)) }
                });

                if let Err(e) = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await
                {
                    tracing::debug!(%peer, "status connection error: {}", e);
                }
            });
        }

        tracing::debug!("status server stopped");
    }
}

/// Delay before retrying `accept` after `failures` consecutive errors:
/// 10ms doubling up to one second.
fn accept_backoff(failures: u32) -> Duration {
    let millis = 10u64.saturating_mul(1 << failures.min(7));
    Duration::from_millis(millis).min(Duration::from_secs(1))
}

/// Map a request to a response. Only GET is served.
pub fn route<B>(board: &StatusBoard, req: &Request<B>) -> Response<Full<Bytes>> {
    if req.method() != Method::GET {
        return json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &ErrorBody {
                error: "method not allowed",
            },
        );
    }

    match req.uri().path() {
        "/api/status" => json_response(StatusCode::OK, &board.snapshot()),
        "/api/report" => match board.report() {
            Some(report) => json_response(StatusCode::OK, report.as_ref()),
            None => json_response(
                StatusCode::NOT_FOUND,
                &ErrorBody {
                    error: "deployment still in progress",
                },
            ),
        },
        "/health" => json_response(StatusCode::OK, &HealthBody { status: "healthy" }),
        _ => json_response(StatusCode::NOT_FOUND, &ErrorBody { error: "not found" }),
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

fn json_response<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let (status, bytes) = match serde_json::to_vec(body) {
        Ok(bytes) => (status, bytes),
        Err(e) => {
            tracing::error!("failed to serialize status body: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, b"{}".to_vec())
        }
    };

    let mut response = Response::new(Full::new(Bytes::from(bytes)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    response
}

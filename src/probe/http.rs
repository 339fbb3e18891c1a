// ABOUTME: HTTP readiness check over a plain hyper HTTP/1 connection.
// ABOUTME: Ready when the response status matches the expected set (any 2xx by default).

use bytes::Bytes;
use http_body_util::Empty;
use hyper::Uri;
use hyper_util::rt::TokioIo;
use snafu::OptionExt;
use tokio::net::TcpStream;

use super::Readiness;
use super::error::{InvalidUrlSnafu, MissingHostSnafu, ProbeError, UnsupportedSchemeSnafu};

const USER_AGENT: &str = concat!("muster/", env!("CARGO_PKG_VERSION"));

/// A parsed HTTP probe target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HttpTarget {
    host: String,
    port: u16,
    authority: String,
    path: String,
}

impl HttpTarget {
    pub(crate) fn parse(url: &str) -> Result<Self, ProbeError> {
        let uri = url.parse::<Uri>().map_err(|e| {
            InvalidUrlSnafu {
                url,
                reason: e.to_string(),
            }
            .build()
        })?;

        match uri.scheme_str() {
            Some("http") => {}
            None => {
                return InvalidUrlSnafu {
                    url,
                    reason: "missing scheme",
                }
                .fail();
            }
            Some(_) => return UnsupportedSchemeSnafu { url }.fail(),
        }

        let authority = uri.authority().context(MissingHostSnafu { url })?;
        let host = authority
            .host()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        if host.is_empty() {
            return MissingHostSnafu { url }.fail();
        }

        Ok(Self {
            host,
            port: authority.port_u16().unwrap_or(80),
            authority: authority.as_str().to_string(),
            path: uri
                .path_and_query()
                .map(|p| p.as_str().to_string())
                .unwrap_or_else(|| "/".to_string()),
        })
    }
}

/// Issue one GET against `url`.
pub async fn check_http(url: &str, expect_status: &[u16]) -> Result<Readiness, ProbeError> {
    let target = HttpTarget::parse(url)?;

    let stream = match TcpStream::connect((target.host.as_str(), target.port)).await {
        Ok(stream) => stream,
        Err(e) => {
            return Ok(Readiness::NotReady(format!(
                "connect to {} failed: {}",
                target.authority, e
            )));
        }
    };

    let io = TokioIo::new(stream);
    let (mut sender, conn) = match hyper::client::conn::http1::handshake(io).await {
        Ok(parts) => parts,
        Err(e) => {
            return Ok(Readiness::NotReady(format!("HTTP handshake failed: {e}")));
        }
    };

    // Spawn connection handler
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!("probe connection error: {}", e);
        }
    });

    let req = hyper::Request::builder()
        .method("GET")
        .uri(target.path.as_str())
        .header("Host", target.authority.as_str())
        .header("User-Agent", USER_AGENT)
        .body(Empty::<Bytes>::new())
        .map_err(|e| {
            InvalidUrlSnafu {
                url,
                reason: e.to_string(),
            }
            .build()
        })?;

    let resp = match sender.send_request(req).await {
        Ok(resp) => resp,
        Err(e) => return Ok(Readiness::NotReady(format!("request failed: {e}"))),
    };

    let status = resp.status();
    let matched = if expect_status.is_empty() {
        status.is_success()
    } else {
        expect_status.contains(&status.as_u16())
    };

    if matched {
        Ok(Readiness::Ready)
    } else {
        Ok(Readiness::NotReady(format!("unexpected HTTP status {status}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeErrorKind;

    #[test]
    fn parses_host_port_and_path() {
        let target = HttpTarget::parse("http://localhost:9200/_cluster/health?wait=1").unwrap();
        assert_eq!(target.host, "localhost");
        assert_eq!(target.port, 9200);
        assert_eq!(target.authority, "localhost:9200");
        assert_eq!(target.path, "/_cluster/health?wait=1");
    }

    #[test]
    fn default_port_and_path() {
        let target = HttpTarget::parse("http://kibana").unwrap();
        assert_eq!(target.port, 80);
        assert_eq!(target.path, "/");
    }

    #[test]
    fn strips_ipv6_brackets() {
        let target = HttpTarget::parse("http://[::1]:8080/").unwrap();
        assert_eq!(target.host, "::1");
    }

    #[test]
    fn https_is_unsupported() {
        let err = HttpTarget::parse("https://localhost:9200").unwrap_err();
        assert_eq!(err.kind(), ProbeErrorKind::Unsupported);
    }

    #[test]
    fn garbage_is_invalid() {
        let err = HttpTarget::parse("not a url").unwrap_err();
        assert_eq!(err.kind(), ProbeErrorKind::InvalidTarget);
        let err = HttpTarget::parse("/relative/path").unwrap_err();
        assert_eq!(err.kind(), ProbeErrorKind::InvalidTarget);
    }
}

// ABOUTME: TCP readiness check.
// ABOUTME: Ready when a connection to host:port is accepted.

use tokio::net::TcpStream;

use super::Readiness;
use super::error::{InvalidAddressSnafu, ProbeError};

/// Split `host:port`, accepting bracketed IPv6 hosts.
pub(crate) fn parse_address(address: &str) -> Result<(String, u16), ProbeError> {
    let address = address.trim();
    let (host, port) = address.rsplit_once(':').ok_or_else(|| {
        InvalidAddressSnafu {
            address,
            reason: "expected host:port",
        }
        .build()
    })?;

    let port = port.parse::<u16>().map_err(|_| {
        InvalidAddressSnafu {
            address,
            reason: format!("invalid port: {port}"),
        }
        .build()
    })?;

    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return InvalidAddressSnafu {
            address,
            reason: "hostname cannot be empty",
        }
        .fail();
    }

    Ok((host.to_string(), port))
}

pub async fn check_tcp(address: &str) -> Result<Readiness, ProbeError> {
    let (host, port) = parse_address(address)?;

    match TcpStream::connect((host.as_str(), port)).await {
        Ok(_) => Ok(Readiness::Ready),
        Err(e) => Ok(Readiness::NotReady(format!("connect to {address} failed: {e}"))),
    }
}

//! TCP connect probe.

use std::fmt::Display;
use std::io;
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use super::IntoPort;
use crate::error::WaitResult;
use crate::poll::{try_wait, WaitOptions, WaitOutcome};

/// Port an SSH daemon listens on once a node has booted.
pub const SSH_PORT: u16 = 22;
/// How long [`wait_ssh`] waits for a node to accept SSH connections.
pub const SSH_WAIT_TIMEOUT: Duration = Duration::from_secs(180);
/// Per-attempt connect timeout used by [`wait_ssh`].
pub const SSH_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Open and immediately close a TCP connection to `host:port`.
///
/// Every resolved address is tried in order; the last connect error is
/// returned if none accept. A `None` or zero `timeout` uses the OS
/// connect timeout, which can block for a long time.
pub fn tcp_connect(host: impl Display, port: u16, timeout: Option<Duration>) -> io::Result<()> {
    let host = host.to_string();
    let mut last_err = None;

    for addr in (host.as_str(), port).to_socket_addrs()? {
        let attempt = match timeout {
            Some(t) if !t.is_zero() => TcpStream::connect_timeout(&addr, t),
            _ => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => {
                let _ = stream.shutdown(Shutdown::Both);
                return Ok(());
            }
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::AddrNotAvailable, format!("{host} did not resolve"))
    }))
}

/// Whether a TCP connection to `host:port` can be established.
///
/// Connection and resolution failures are `Ok(false)`; only a port that
/// cannot be coerced is an error.
pub fn tcp_ping(host: impl Display, port: impl IntoPort, timeout: Option<Duration>) -> WaitResult<bool> {
    let port = port.into_port()?;
    match tcp_connect(&host, port, timeout) {
        Ok(()) => Ok(true),
        Err(e) => {
            debug!(%host, port, error = %e, "tcp probe failed");
            Ok(false)
        }
    }
}

/// Poll until `host:port` accepts TCP connections.
pub fn wait_tcp(
    host: impl Display,
    port: impl IntoPort,
    connect_timeout: Option<Duration>,
    options: &WaitOptions,
) -> WaitResult<WaitOutcome<bool>> {
    let port = port.into_port()?;
    try_wait(|| tcp_ping(&host, port, connect_timeout), options)
}

/// Poll until a freshly booted node accepts SSH connections.
pub fn wait_ssh(host: impl Display) -> WaitResult<WaitOutcome<bool>> {
    let options = WaitOptions::new()
        .timeout(SSH_WAIT_TIMEOUT)
        .message(format!("Node {host} is not accessible by SSH."));
    wait_tcp(host, SSH_PORT, Some(SSH_CONNECT_TIMEOUT), &options)
}

//! Readiness probes.
//!
//! Probes answer "is the target ready right now" with a boolean. Transport
//! failures of any kind (refused, unreachable, timed out, bad response)
//! are `false`; only caller mistakes such as an unparseable port escape
//! as errors. Retrying is left to [`wait`](crate::wait).

pub mod http;
pub mod icmp;
pub mod tcp;

pub use self::http::{http, HttpProbe};
pub use self::icmp::{icmp_ping, IcmpProbe};
pub use self::tcp::{tcp_connect, tcp_ping, wait_ssh, wait_tcp};

use crate::error::{WaitError, WaitResult};

/// Port arguments accepted by the probes: integers of any width or their
/// decimal string form, in 1..=65535.
pub trait IntoPort {
    fn into_port(self) -> WaitResult<u16>;
}

fn nonzero(port: u16) -> WaitResult<u16> {
    if port == 0 {
        return Err(WaitError::InvalidPort("0".to_string()));
    }
    Ok(port)
}

impl IntoPort for u16 {
    fn into_port(self) -> WaitResult<u16> {
        nonzero(self)
    }
}

macro_rules! int_port {
    ($($t:ty),*) => {
        $(impl IntoPort for $t {
            fn into_port(self) -> WaitResult<u16> {
                u16::try_from(self)
                    .map_err(|_| WaitError::InvalidPort(self.to_string()))
                    .and_then(nonzero)
            }
        })*
    };
}

int_port!(u32, u64, usize, i32, i64);

impl IntoPort for &str {
    fn into_port(self) -> WaitResult<u16> {
        self.trim()
            .parse::<u16>()
            .map_err(|_| WaitError::InvalidPort(self.to_string()))
            .and_then(nonzero)
    }
}

impl IntoPort for String {
    fn into_port(self) -> WaitResult<u16> {
        self.as_str().into_port()
    }
}

impl IntoPort for &String {
    fn into_port(self) -> WaitResult<u16> {
        self.as_str().into_port()
    }
}

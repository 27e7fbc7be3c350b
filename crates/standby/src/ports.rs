//! Free local port discovery.
//!
//! The scan is advisory: a port reported free here is not reserved, and
//! another process may bind it before the caller does.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{WaitError, WaitResult};
use crate::probe::tcp_ping;

/// First candidate port of the default scan range.
pub const DEFAULT_FIRST_PORT: u16 = 32000;
/// Last candidate port (inclusive) of the default scan range.
pub const DEFAULT_LAST_PORT: u16 = 32099;

/// Connect timeout for each candidate; loopback refusals are immediate.
const LOCAL_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Inclusive range of candidate ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    pub first: u16,
    pub last: u16,
}

impl Default for PortRange {
    fn default() -> Self {
        Self {
            first: DEFAULT_FIRST_PORT,
            last: DEFAULT_LAST_PORT,
        }
    }
}

impl PortRange {
    pub fn new(first: u16, last: u16) -> Self {
        Self { first, last }
    }

    pub fn iter(&self) -> std::ops::RangeInclusive<u16> {
        self.first..=self.last
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.first > self.last
    }
}

/// First port in `range` for which `is_open` reports false.
pub fn find_free_port<F>(range: PortRange, mut is_open: F) -> WaitResult<u16>
where
    F: FnMut(u16) -> bool,
{
    for port in range.iter() {
        if !is_open(port) {
            debug!(port, "found free port");
            return Ok(port);
        }
    }
    Err(WaitError::NoFreePorts {
        first: range.first,
        last: range.last,
    })
}

/// First port in `range` that refuses TCP connections on localhost.
pub fn get_free_port_in(range: PortRange) -> WaitResult<u16> {
    find_free_port(range, |port| {
        tcp_ping("localhost", port, Some(LOCAL_CONNECT_TIMEOUT)).unwrap_or(false)
    })
}

/// First port in 32000..=32099 that refuses TCP connections on localhost.
pub fn get_free_port() -> WaitResult<u16> {
    get_free_port_in(PortRange::default())
}

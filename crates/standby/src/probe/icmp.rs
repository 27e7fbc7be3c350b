//! ICMP echo probe via the system `ping` utility.

use std::fmt::Display;
use std::process::{Command, Stdio};
use std::time::Duration;

use tracing::debug;

/// Default reply timeout for [`icmp_ping`].
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(1);

/// Runs a single echo request through an external ping program and
/// reports its exit status. Output is discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcmpProbe {
    program: String,
}

impl Default for IcmpProbe {
    fn default() -> Self {
        Self {
            program: "ping".to_string(),
        }
    }
}

impl IcmpProbe {
    /// Use `program` instead of `ping`. It is invoked as
    /// `<program> -c 1 -W <secs> <host>`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether `host` answered one echo request within `timeout`.
    ///
    /// Permission errors, unknown hosts, and a missing ping binary are
    /// all `false`.
    pub fn ping(&self, host: impl Display, timeout: Duration) -> bool {
        let host = host.to_string();
        let status = Command::new(&self.program)
            .args(["-c", "1", "-W"])
            .arg(reply_wait_secs(timeout).to_string())
            .arg(&host)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => true,
            Ok(status) => {
                debug!(%host, code = ?status.code(), "icmp probe failed");
                false
            }
            Err(e) => {
                debug!(%host, program = %self.program, error = %e, "icmp probe could not run");
                false
            }
        }
    }
}

/// `-W` takes whole seconds; round up and never pass zero.
fn reply_wait_secs(timeout: Duration) -> u64 {
    let secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
    secs.max(1)
}

/// Whether `host` answers ICMP echo, using the system `ping`.
pub fn icmp_ping(host: impl Display, timeout: Duration) -> bool {
    IcmpProbe::default().ping(host, timeout)
}

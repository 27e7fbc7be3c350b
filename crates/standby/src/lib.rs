//! standby — bounded waiting for things that are about to be ready.
//!
//! Provisioning code spends much of its time waiting: for a VM to boot,
//! for its network to come up, for sshd or an API to start listening.
//! This crate provides two synchronous engines and the probes most often
//! fed into them.
//!
//! # Architecture
//!
//! ```text
//! wait(predicate)            wait_pass(operation, is_recoverable)
//!   ├── Poller<Clock>          └── Retrier<Clock>
//!   │   ├── deadline fixed at entry      ├── fixed interval sleeps
//!   │   ├── sleeps clipped to deadline   └── last real error on expiry
//!   │   └── WaitError::Timeout(message)
//!   └── predicates built from probes:
//!       ├── tcp_ping / wait_tcp / wait_ssh
//!       ├── icmp_ping (external ping process)
//!       ├── http (one hyper request)
//!       └── get_free_port (tcp_ping over 32000..=32099)
//! ```
//!
//! # Two failure styles
//!
//! Probes absorb transport failures and return `false`. The polling
//! engine turns "never became true" into [`WaitError::Timeout`] with the
//! caller's message. The retry engine instead hands back the last
//! recoverable error it saw, and never catches errors the caller did not
//! mark recoverable.
//!
//! Neither engine can interrupt an attempt in flight: the deadline bounds
//! how many attempts start, not how long one takes. Give blocking probes
//! their own connect timeout.

pub mod clock;
pub mod config;
pub mod error;
pub mod poll;
pub mod ports;
pub mod probe;
pub mod retry;

pub use clock::{Clock, SystemClock};
pub use config::StandbyConfig;
pub use error::{WaitError, WaitResult};
pub use poll::{try_wait, wait, Outcome, Poller, WaitOptions, WaitOutcome};
pub use ports::{find_free_port, get_free_port, get_free_port_in, PortRange};
pub use probe::{http, icmp_ping, tcp_connect, tcp_ping, wait_ssh, wait_tcp, HttpProbe, IcmpProbe, IntoPort};
pub use retry::{any_error, wait_pass, Retrier, RetryOptions};

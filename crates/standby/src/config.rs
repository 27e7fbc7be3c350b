//! standby.toml configuration parser.
//!
//! ```toml
//! [wait]
//! interval = "5s"
//! timeout = "180s"
//! message = "Admin node is not accessible by SSH."
//!
//! [retry]
//! interval = "2s"
//! timeout = "none"
//!
//! [ports]
//! first = 32000
//! last = 32099
//!
//! [icmp]
//! program = "ping"
//! timeout = "1s"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{WaitError, WaitResult};
use crate::ports::PortRange;
use crate::probe::icmp::{IcmpProbe, DEFAULT_PING_TIMEOUT};
use crate::{RetryOptions, WaitOptions};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandbyConfig {
    pub wait: Option<WaitSection>,
    pub retry: Option<RetrySection>,
    pub ports: Option<PortRange>,
    pub icmp: Option<IcmpSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaitSection {
    pub interval: Option<String>,
    pub timeout: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrySection {
    pub interval: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IcmpSection {
    pub program: Option<String>,
    pub timeout: Option<String>,
}

impl StandbyConfig {
    pub fn from_file(path: &Path) -> WaitResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| WaitError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> WaitResult<Self> {
        toml::from_str(content).map_err(|e| WaitError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> WaitResult<String> {
        toml::to_string_pretty(self).map_err(|e| WaitError::Config(e.to_string()))
    }

    /// Polling options, falling back to the engine defaults for unset keys.
    pub fn wait_options(&self) -> WaitResult<WaitOptions> {
        let mut options = WaitOptions::default();
        if let Some(section) = &self.wait {
            if let Some(interval) = &section.interval {
                options.interval = parse_duration(interval)?;
            }
            if let Some(timeout) = &section.timeout {
                options.timeout = parse_timeout(timeout)?;
            }
            if let Some(message) = &section.message {
                options.timeout_message = message.clone();
            }
        }
        Ok(options)
    }

    pub fn retry_options(&self) -> WaitResult<RetryOptions> {
        let mut options = RetryOptions::default();
        if let Some(section) = &self.retry {
            if let Some(interval) = &section.interval {
                options.interval = parse_duration(interval)?;
            }
            if let Some(timeout) = &section.timeout {
                options.timeout = parse_timeout(timeout)?;
            }
        }
        Ok(options)
    }

    pub fn port_range(&self) -> PortRange {
        self.ports.unwrap_or_default()
    }

    pub fn icmp_probe(&self) -> IcmpProbe {
        self.icmp
            .as_ref()
            .and_then(|s| s.program.as_deref())
            .map(IcmpProbe::new)
            .unwrap_or_default()
    }

    pub fn icmp_timeout(&self) -> WaitResult<Duration> {
        match self.icmp.as_ref().and_then(|s| s.timeout.as_deref()) {
            Some(timeout) => parse_duration(timeout),
            None => Ok(DEFAULT_PING_TIMEOUT),
        }
    }

    /// Starter config with every default spelled out.
    pub fn scaffold() -> Self {
        StandbyConfig {
            wait: Some(WaitSection {
                interval: Some("5s".to_string()),
                timeout: Some("60s".to_string()),
                message: Some(crate::poll::DEFAULT_TIMEOUT_MESSAGE.to_string()),
            }),
            retry: Some(RetrySection {
                interval: Some("5s".to_string()),
                timeout: Some("none".to_string()),
            }),
            ports: Some(PortRange::default()),
            icmp: Some(IcmpSection {
                program: Some("ping".to_string()),
                timeout: Some("1s".to_string()),
            }),
        }
    }
}

/// Parse a duration string like "5s", "500ms", "2m", or bare seconds.
pub fn parse_duration(s: &str) -> WaitResult<Duration> {
    let s = s.trim();
    let parsed = if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.trim().parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.trim().parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    };
    parsed.ok_or_else(|| WaitError::Config(format!("invalid duration: {s:?}")))
}

/// Like [`parse_duration`], but "none", "off", and zero mean no timeout.
pub fn parse_timeout(s: &str) -> WaitResult<Option<Duration>> {
    match s.trim().to_ascii_lowercase().as_str() {
        "none" | "off" | "" => Ok(None),
        other => parse_duration(other).map(|d| Some(d).filter(|d| !d.is_zero())),
    }
}

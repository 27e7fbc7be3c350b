pub mod init;
pub mod ports;
pub mod probe;

use std::path::Path;

use anyhow::{bail, Context as _, Result};
use serde::Serialize;
use standby::config::{parse_duration, parse_timeout};
use standby::{StandbyConfig, WaitOptions};
use tracing::debug;

use crate::WaitArgs;

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "standby.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => bail!("Unknown output format: {other}. Use text or json."),
        }
    }
}

/// Settings shared by every subcommand.
pub struct Context {
    pub config: StandbyConfig,
    pub format: OutputFormat,
}

impl Context {
    pub fn load(config_path: Option<&Path>, format: &str) -> Result<Self> {
        let format = OutputFormat::parse(format)?;
        let config = match config_path {
            Some(path) => StandbyConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                debug!("Using ./{DEFAULT_CONFIG_FILE}");
                StandbyConfig::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => StandbyConfig::default(),
        };
        Ok(Self { config, format })
    }

    /// Config-file wait options with command-line overrides applied.
    pub fn wait_options(&self, args: &WaitArgs) -> Result<WaitOptions> {
        let mut options = self.config.wait_options()?;
        if let Some(interval) = &args.interval {
            options.interval = parse_duration(interval)?;
        }
        if let Some(timeout) = &args.timeout {
            options.timeout = parse_timeout(timeout)?;
        }
        if let Some(message) = &args.message {
            options.timeout_message = message.clone();
        }
        Ok(options)
    }

    /// Print a command's result in the selected format.
    pub fn emit(&self, report: &Report) -> Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
            OutputFormat::Text => println!("{}", report.summary()),
        }
        Ok(())
    }
}

/// Machine-readable result of a subcommand.
#[derive(Debug, Serialize)]
pub struct Report {
    pub target: String,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl Report {
    fn summary(&self) -> String {
        match (self.port, self.remaining_ms, self.ready) {
            (Some(port), _, _) => port.to_string(),
            (None, Some(ms), true) => format!("{} is ready ({ms}ms to spare)", self.target),
            (None, None, true) => format!("{} is ready", self.target),
            (None, _, false) => format!("{} is not ready", self.target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ctx(config: StandbyConfig) -> Context {
        Context { config, format: OutputFormat::Text }
    }

    #[test]
    fn format_parsing() {
        assert_eq!(OutputFormat::parse("json").unwrap(), OutputFormat::Json);
        assert!(OutputFormat::parse("yaml").is_err());
    }

    #[test]
    fn overrides_win_over_config() {
        let config = StandbyConfig::from_toml_str("[wait]\ninterval = \"2s\"\ntimeout = \"30s\"\n").unwrap();
        let args = WaitArgs {
            interval: None,
            timeout: Some("none".into()),
            message: Some("db never came up".into()),
        };
        let options = ctx(config).wait_options(&args).unwrap();
        assert_eq!(options.interval, Duration::from_secs(2));
        assert_eq!(options.timeout, None);
        assert_eq!(options.timeout_message, "db never came up");
    }

    #[test]
    fn load_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[ports]\nfirst = 41000\nlast = 41005\n").unwrap();
        let ctx = Context::load(Some(&path), "json").unwrap();
        assert_eq!(ctx.format, OutputFormat::Json);
        assert_eq!(ctx.config.port_range().first, 41000);
    }

    #[test]
    fn report_summaries() {
        let ready = Report { target: "10.0.0.2:22".into(), ready: true, remaining_ms: Some(1500), port: None };
        assert_eq!(ready.summary(), "10.0.0.2:22 is ready (1500ms to spare)");
        let probed = Report { target: "10.0.0.2".into(), ready: false, remaining_ms: None, port: None };
        assert_eq!(probed.summary(), "10.0.0.2 is not ready");
        let port = Report { target: "localhost".into(), ready: true, remaining_ms: None, port: Some(32000) };
        assert_eq!(port.summary(), "32000");
    }
}

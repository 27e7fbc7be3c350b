//! `standby tcp|icmp|http` — poll a probe until it passes.

use anyhow::{bail, Result};
use standby::config::parse_duration;
use standby::{wait, HttpProbe, WaitOutcome};
use tracing::info;

use super::{Context, Report};
use crate::WaitArgs;

/// Wait for `host:port` to accept TCP connections.
pub fn tcp(ctx: &Context, host: &str, port: &str, connect_timeout: &str, args: &WaitArgs) -> Result<()> {
    let options = ctx.wait_options(args)?;
    let connect_timeout = parse_duration(connect_timeout)?;

    info!(%host, %port, "Waiting for TCP port");
    let outcome = standby::wait_tcp(host, port, Some(connect_timeout), &options)?;
    finish(ctx, format!("{host}:{port}"), outcome)
}

/// Wait for `host` to answer ICMP echo.
pub fn icmp(ctx: &Context, host: &str, ping_timeout: Option<&str>, args: &WaitArgs) -> Result<()> {
    let options = ctx.wait_options(args)?;
    let ping_timeout = match ping_timeout {
        Some(t) => parse_duration(t)?,
        None => ctx.config.icmp_timeout()?,
    };
    let probe = ctx.config.icmp_probe();

    info!(%host, program = probe.program(), "Waiting for ICMP echo");
    let outcome = wait(|| probe.ping(host, ping_timeout), &options)?;
    finish(ctx, host.to_string(), outcome)
}

/// Wait for an HTTP endpoint to return the expected status.
pub fn http(ctx: &Context, probe: HttpProbe, request_timeout: &str, args: &WaitArgs) -> Result<()> {
    let options = ctx.wait_options(args)?;
    let probe = probe.timeout(parse_duration(request_timeout)?);
    let target = format!("{} {}:{}{}", probe.method, probe.host, probe.port, probe.url);

    info!(%target, expected = probe.expected_status, "Waiting for HTTP status");
    let outcome = wait(|| probe.check(), &options)?;
    finish(ctx, target, outcome)
}

fn finish(ctx: &Context, target: String, outcome: WaitOutcome<bool>) -> Result<()> {
    let ready = outcome.is_ready();
    let report = Report {
        remaining_ms: outcome.remaining().map(|d| d.as_millis() as u64),
        target,
        ready,
        port: None,
    };
    ctx.emit(&report)?;
    if !ready {
        bail!("{} is not ready", report.target);
    }
    Ok(())
}

//! `standby free-port` — print an unused local port.

use anyhow::{Context as _, Result};
use standby::get_free_port_in;

use super::{Context, Report};

pub fn free_port(ctx: &Context) -> Result<()> {
    let range = ctx.config.port_range();
    let port = get_free_port_in(range)
        .with_context(|| format!("Scanned ports {}..={}", range.first, range.last))?;

    ctx.emit(&Report {
        target: "localhost".to_string(),
        ready: true,
        remaining_ms: None,
        port: Some(port),
    })
}

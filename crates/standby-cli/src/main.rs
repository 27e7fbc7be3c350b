use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "standby",
    about = "Standby — wait for hosts, ports, and endpoints to become ready",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to a standby.toml with default intervals, timeouts, and port range
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Output format: text or json
    #[arg(short, long, global = true, default_value = "text")]
    format: String,
    #[command(subcommand)]
    command: Commands,
}

/// Polling overrides shared by every wait subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct WaitArgs {
    /// Pause between checks, e.g. "5s" or "500ms"
    #[arg(short, long)]
    interval: Option<String>,
    /// Give up after this long; "0" or "none" checks exactly once
    #[arg(short, long)]
    timeout: Option<String>,
    /// Message reported when the timeout is reached
    #[arg(short, long)]
    message: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait until a TCP port accepts connections
    Tcp {
        #[arg(long)]
        host: String,
        #[arg(short, long)]
        port: String,
        /// Per-attempt connect timeout
        #[arg(long, default_value = "5s")]
        connect_timeout: String,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Wait until a host answers ICMP echo
    Icmp {
        #[arg(long)]
        host: String,
        /// Per-attempt reply timeout (defaults to [icmp].timeout or 1s)
        #[arg(long)]
        ping_timeout: Option<String>,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Wait until an HTTP endpoint answers with the expected status
    Http {
        #[arg(long, default_value = "localhost")]
        host: String,
        #[arg(short, long, default_value = "80")]
        port: u16,
        #[arg(long, default_value = "GET")]
        method: String,
        #[arg(short, long, default_value = "/")]
        url: String,
        /// Expected response status code
        #[arg(short, long, default_value = "200")]
        status: u16,
        /// Per-request timeout
        #[arg(long, default_value = "5s")]
        request_timeout: String,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Print the first local port in the configured range that is not in use
    FreePort,
    /// Write a standby.toml with every default spelled out
    Init {
        #[arg(short, long, default_value = "standby.toml")]
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("standby=info".parse()?)
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = commands::Context::load(cli.config.as_deref(), &cli.format)?;

    match cli.command {
        Commands::Tcp { host, port, connect_timeout, wait } => {
            commands::probe::tcp(&ctx, &host, &port, &connect_timeout, &wait)
        }
        Commands::Icmp { host, ping_timeout, wait } => {
            commands::probe::icmp(&ctx, &host, ping_timeout.as_deref(), &wait)
        }
        Commands::Http { host, port, method, url, status, request_timeout, wait } => {
            let probe = standby::HttpProbe::new(host, port)
                .method(method)
                .url(url)
                .expect(status);
            commands::probe::http(&ctx, probe, &request_timeout, &wait)
        }
        Commands::FreePort => commands::ports::free_port(&ctx),
        Commands::Init { path } => commands::init::init(&path),
    }
}

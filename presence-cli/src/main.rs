use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use presence_core::IceServerConfig;
use presence_server::{EchoPolicy, RelayConfig, RelayServer};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

mod bot;

#[derive(Parser)]
#[command(name = "presence")]
#[command(about = "Multi-user presence relay and headless test client")]
struct Cli {
    /// Tracing filter, e.g. `info,presence_server=debug`. Falls back to
    /// `RUST_LOG`, then `info`.
    #[arg(long, global = true)]
    log_filter: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay server.
    Relay(RelayArgs),
    /// Join a relay as a receive-only client that walks in a circle.
    Bot(BotArgs),
}

#[derive(Args)]
struct RelayArgs {
    #[arg(long, env = "PRESENCE_BIND", default_value = "0.0.0.0:3000")]
    bind: SocketAddr,

    /// STUN/TURN url handed to clients. Repeat for several; the public STUN
    /// list is used when none are given.
    #[arg(long = "ice-url", env = "PRESENCE_ICE_URLS", value_delimiter = ',')]
    ice_urls: Vec<String>,

    #[arg(long, env = "TURN_USERNAME")]
    turn_username: Option<String>,

    #[arg(long, env = "TURN_CREDENTIAL")]
    turn_credential: Option<String>,

    /// Bearer token for `PUT /api/config`. Writes are refused without it.
    #[arg(long, env = "ADMIN_TOKEN")]
    admin_token: Option<String>,

    /// Do not echo transforms back to their sender.
    #[arg(long)]
    exclude_sender: bool,

    /// Send newcomers the last known transform of everyone already present.
    #[arg(long)]
    snapshot_on_join: bool,
}

#[derive(Args)]
pub(crate) struct BotArgs {
    #[arg(long, env = "PRESENCE_URL", default_value = "ws://127.0.0.1:3000/ws")]
    pub url: String,

    #[arg(long, default_value_t = 100)]
    pub tick_ms: u64,

    /// Leave after this many seconds. Runs until Ctrl-C when omitted.
    #[arg(long)]
    pub duration_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_filter.as_deref())?;

    match cli.command {
        Commands::Relay(args) => run_relay(args).await,
        Commands::Bot(args) => bot::run(args).await,
    }
}

fn init_tracing(filter: Option<&str>) -> Result<()> {
    let filter = match filter {
        Some(directives) => EnvFilter::try_new(directives).context("Invalid --log-filter")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

impl RelayArgs {
    fn into_config(self) -> RelayConfig {
        let mut config = RelayConfig {
            bind_addr: self.bind,
            admin_token: self.admin_token,
            snapshot_on_join: self.snapshot_on_join,
            ..Default::default()
        };
        if self.exclude_sender {
            config.echo_policy = EchoPolicy::ExcludeSender;
        }
        if !self.ice_urls.is_empty() {
            config.ice_servers = vec![IceServerConfig {
                urls: self.ice_urls,
                username: self.turn_username,
                credential: self.turn_credential,
            }];
        }
        config
    }
}

async fn run_relay(args: RelayArgs) -> Result<()> {
    let config = args.into_config();
    let writes = if config.admin_token.is_some() {
        "enabled".green()
    } else {
        "disabled".yellow()
    };

    let server = RelayServer::bind(config).await?;
    let addr = server.local_addr()?;

    println!("{}", "Presence relay is up".green().bold());
    println!("   WebSocket:     ws://{}/ws", addr);
    println!("   Config API:    http://{}/api/config (writes {})", addr, writes);

    server.run(shutdown_signal()).await
}

pub(crate) async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // Without a signal handler the process runs until killed.
        std::future::pending::<()>().await;
    }
}

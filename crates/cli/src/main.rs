use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "eva-bridge")]
#[command(about = "Eva bridge: chat transport webhooks to a dialogue engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the webhook gateway. Channels come from the credentials file; messages are forwarded to engine.url.
    Serve {
        /// Config file path (default: EVA_BRIDGE_CONFIG_PATH or ~/.eva-bridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 5005)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Load config and credentials and list the channels that would be served.
    Check {
        /// Config file path (default: EVA_BRIDGE_CONFIG_PATH or ~/.eva-bridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("eva-bridge {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Check { config }) => {
            if let Err(e) = run_check(config) {
                log::error!("check failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = bridge::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!("starting gateway on {}:{}", config.gateway.bind, config.gateway.port);
    bridge::gateway::run_gateway(config, path).await
}

fn run_check(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let (config, path) = bridge::config::load_config(config_path)?;
    let credentials_path = bridge::config::resolve_credentials_path(&config, &path);
    let credentials = bridge::config::load_credentials(&credentials_path)?;
    let registry = bridge::channels::ChannelRegistry::from_credentials(credentials)?;
    println!("config: {}", path.display());
    println!("credentials: {}", credentials_path.display());
    match bridge::config::resolve_engine_url(&config) {
        Some(url) => println!("engine: {}", url),
        None => println!("engine: (not configured)"),
    }
    if registry.is_empty() {
        println!("channels: (none)");
    } else {
        for id in registry.ids() {
            println!("channel: {} -> /webhooks/{}/webhook", id, id);
        }
    }
    Ok(())
}

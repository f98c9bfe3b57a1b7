use clap::{Parser, Subcommand};
use rst_common::with_tokio::tokio;
use rst_common::with_tracing::tracing_subscriber::{
    self, layer::SubscriberExt, util::SubscriberInitExt,
};

use authenticator_cli::commands::config::{config_handler, ConfigArgs};
use authenticator_cli::commands::deeplink::{deeplink_handler, DeeplinkArgs};
use authenticator_cli::commands::handler::ContextHandler;
use authenticator_cli::commands::keys::{keys_handler, KeysArgs};
use authenticator_cli::types::CliError;

#[derive(Parser)]
#[command(name = "authenticator-cli")]
#[command(version = "0.1.0")]
#[command(long_about = None)]
struct Cli {
    /// Engine settings used by commands that need them
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "deeplink")]
    #[command(about = "Parse a connect or action link")]
    Deeplink(DeeplinkArgs),

    #[command(name = "config")]
    #[command(about = "Validate a config file and print the resolved settings")]
    Config(ConfigArgs),

    #[command(name = "keys")]
    #[command(about = "Generate device key material")]
    Keys(KeysArgs),
}

fn setup_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=info,authenticator_core=info", env!("CARGO_CRATE_NAME")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    setup_logging();

    let cli = Cli::parse();
    match cli.command {
        Commands::Deeplink(args) => deeplink_handler(args)?,
        Commands::Config(args) => config_handler(args)?,
        Commands::Keys(args) => {
            let ctx = ContextHandler::from_file(cli.config)?;
            keys_handler(&ctx, args.commands).await?
        }
    }

    Ok(())
}

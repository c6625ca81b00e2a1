use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use parkgate::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parkgate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Init => cli::commands::init().await,
        Commands::Login { phone, otp } => cli::commands::login(config, &phone, otp).await,
        Commands::Logout { local } => cli::commands::logout(config, local).await,
        Commands::Whoami { format } => cli::commands::whoami(config, format).await,
        Commands::Check { path } => cli::commands::check(config, &path).await,
        Commands::Routes => cli::commands::routes().await,
        Commands::Parking { action } => cli::commands::parking(config, action).await,
        Commands::Plan { action } => cli::commands::plan(config, action).await,
    }
}

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use justlog::cli::{execute, Cli, Commands};
use justlog::config::Config;
use justlog::storage::DynamoDbRepository;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "justlog=info,justlog_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::from_env();
    if let Some(table) = cli.table {
        config = config.with_table_name(table);
    }
    if let Some(endpoint) = cli.endpoint_url {
        config = config.with_endpoint_url(endpoint);
    }
    tracing::debug!(target_store = %config.target_display(), "Loaded configuration");

    let repo = DynamoDbRepository::from_config(&config).await;

    match cli.command {
        Commands::CreateTable => {
            repo.create_table().await?;
            println!("Created table {}", repo.table_name());
        }
        command => {
            let output = execute(command, &repo, Utc::now()).await?;
            println!("{output}");
        }
    }

    Ok(())
}

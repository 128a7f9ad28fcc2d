use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use civica_client::ApiClient;
use civica_console::cli::{
    handle_catalog_command, handle_category_command, handle_document_command, handle_inbox,
    handle_instance_command, handle_queue_command, handle_stats, handle_team_command,
    handle_user_command, handle_workflow_command, Cli, Commands, Context, OutputManager,
};
use civica_console::ConsoleConfig;
use civica_query::QueryCache;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // --- Logging ---
    let default_filter = if cli.verbose {
        "civica=debug"
    } else {
        "civica=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let output = OutputManager::new(cli.output, cli.quiet);
    if let Err(e) = run(cli).await {
        output.print_error(&format!("Error: {e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // --- Config ---
    let mut config = ConsoleConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config.client.api_url = url.trim_end_matches('/').to_string();
    }
    if cli.token.is_some() {
        config.client.api_token = cli.token.clone();
    }
    tracing::debug!(base_url = %config.client.base_url(), "Loaded configuration");

    // --- Client and cache ---
    let client = ApiClient::from_config(&config.client)?;
    let cache = QueryCache::new(config.query);
    let ctx = Context {
        config,
        client,
        cache: cache.clone(),
        output: OutputManager::new(cli.output, cli.quiet),
    };

    // --- Dispatch ---
    let result = match &cli.command {
        Commands::Instances(cmd) => handle_instance_command(&ctx, cmd).await,
        Commands::Queue(cmd) => handle_queue_command(&ctx, cmd).await,
        Commands::Inbox { paging, watch } => handle_inbox(&ctx, paging, *watch).await,
        Commands::Stats => handle_stats(&ctx).await,
        Commands::Catalogs(cmd) => handle_catalog_command(&ctx, cmd).await,
        Commands::Workflows(cmd) => handle_workflow_command(&ctx, cmd).await,
        Commands::Categories(cmd) => handle_category_command(&ctx, cmd).await,
        Commands::Teams(cmd) => handle_team_command(&ctx, cmd).await,
        Commands::Users(cmd) => handle_user_command(&ctx, cmd).await,
        Commands::Documents(cmd) => handle_document_command(&ctx, cmd).await,
    };

    cache.shutdown();
    result
}

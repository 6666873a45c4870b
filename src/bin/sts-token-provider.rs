use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;
use sts_token_provider::config::settings::ProviderSettings;
use sts_token_provider::provider::TokenProvider;
use sts_token_provider::resilience::retry::RetrySettings;
use sts_token_provider::server;
use sts_token_provider::server::tokens::{TokenState, TokenView};
use sts_token_provider::token::request::parse_uri;
use sts_token_provider::transport::HttpTransport;
use sts_token_provider::utils::config_loader;
use sts_token_provider::utils::logging;
use sts_token_provider::utils::logging::LogLevel;
use sts_token_provider::ProviderError;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "sts-token-provider.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    /// Acquire one token for the named target, print it as JSON and exit
    #[arg(long)]
    acquire: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // -------------------------------
    // 1. Load YAML config, init logging
    // -------------------------------

    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level);

    // -------------------------------
    // 2. Build provider: settings, transport, requirements
    // -------------------------------

    let settings = &service_config.settings;
    let provider_settings = ProviderSettings::try_from(&settings.provider)?;
    let issuer = parse_uri("settings.issuer.url", &settings.issuer.url)?;
    let timeout = settings.issuer.timeout();
    let transport = HttpTransport::with_timeout(issuer, timeout)?;
    let provider = Arc::new(TokenProvider::new(provider_settings, transport));
    let requirements = service_config.requirements()?;
    let retry = RetrySettings::from_config(settings.retry.as_ref());

    // -------------------------------
    // 3. One-shot acquisition
    // -------------------------------

    if let Some(target) = args.acquire {
        let requirement = requirements
            .get(&target)
            .ok_or_else(|| anyhow!("unknown target '{}'", target))?;
        let token = retry
            .run_with_retry(
                || provider.acquire_token(requirement, timeout),
                |e: &ProviderError| matches!(e, ProviderError::Issuance(_)),
            )
            .await?;
        println!("{}", serde_json::to_string_pretty(&TokenView::new(&target, &token))?);
        return Ok(());
    }

    // -------------------------------
    // 4. Serve targets and metrics
    // -------------------------------

    info!("Service starting...");
    let tokens = TokenState::new(provider, requirements, timeout, retry);
    server::server::start(settings, tokens).await
}

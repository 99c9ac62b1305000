//! Tokengate - shared-secret request authorizer
//!
//! Validates a client token against a secret held in SSM Parameter Store.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokengate::authz::TokenAuthorizer;
use tokengate::cache::TokenCache;
use tokengate::config::Config;
use tokengate::metrics::server::{MetricsServer, MetricsServerConfig};
use tokengate::secrets::SsmSecretStore;
use tokengate::Server;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// Tokengate - shared-secret authorizer with caching and circuit breaking
#[derive(Parser, Debug)]
#[command(name = "tokengate")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file; environment variables are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Tokengate v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = match &args.config {
        Some(path) => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => {
            let config = Config::from_env()?;
            info!("Loaded configuration from environment");
            config
        }
    };

    // Build the authorizer; a store client that cannot be built is fatal
    let store = SsmSecretStore::new(&config.secret_store).await?;
    let breaker = Arc::new(config.circuit_breaker());
    let cache_config = config.token_cache_config();
    info!(
        region = %config.secret_store.region,
        secret_name = %cache_config.secret_name,
        cache_ttl_secs = cache_config.ttl.as_secs(),
        fetch_timeout_secs = cache_config.fetch_timeout.as_secs(),
        breaker_threshold = breaker.threshold(),
        breaker_cool_down_secs = breaker.cool_down().as_secs(),
        stale_on_failure = cache_config.stale_on_failure,
        "Authorizer initialized"
    );
    let cache = TokenCache::new(cache_config, Arc::new(store), Arc::clone(&breaker));
    let authorizer = Arc::new(TokenAuthorizer::new(Arc::new(cache)));

    let mut metrics_server = if config.metrics.enabled {
        let mut server = MetricsServer::new(MetricsServerConfig {
            address: format!("0.0.0.0:{}", config.metrics.port),
        })
        .with_breaker(Arc::clone(&breaker));
        let addr = server.start().await?;
        info!("Metrics server listening on {}", addr);
        Some(server)
    } else {
        None
    };

    let server = Server::bind(&config.server.address, authorizer).await?;
    server.run().await?;

    if let Some(metrics_server) = metrics_server.as_mut() {
        metrics_server.shutdown().await;
    }

    Ok(())
}

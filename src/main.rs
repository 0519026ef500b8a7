//! CareShare - permission-scoped health record sharing service

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use careshare::{
    auth::JwtValidator,
    config::Args,
    db::MongoClient,
    logging::AuditLogger,
    policy::{CachedPolicyOracle, DecisionCacheConfig, HttpPolicyOracle, HttpPolicyOracleConfig},
    server::{self, AppState},
    store::{MongoStore, Stores},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("careshare={},info", args.log_level).into());
    if args.json_logs() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  CareShare");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Policy check: {}", args.policy_check_url);
    info!("Policy timeout: {}ms", args.policy_timeout_ms);
    info!("Policy cache TTL: {}s", args.policy_cache_ttl_secs);
    info!("======================================");

    let jwt = JwtValidator::new(args.jwt_secret()?)?;

    let audit = AuditLogger::new();
    if let Some(path) = &args.audit_log_path {
        audit.init_file(path.clone()).await?;
        info!("Audit trail: {}", path.display());
    }

    // MongoDB is required outside dev mode
    let stores = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => {
            let store = MongoStore::connect(&client).await?;
            info!("MongoDB store ready ({})", client.db_name());
            Stores::from_backend(Arc::new(store), "mongodb")
        }
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, using in-memory store): {}", e);
                Stores::memory()
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    let oracle = Arc::new(CachedPolicyOracle::new(
        Arc::new(HttpPolicyOracle::new(HttpPolicyOracleConfig::from_args(&args))?),
        DecisionCacheConfig {
            ttl: args.policy_cache_ttl(),
            max_entries: args.policy_cache_max_entries,
        },
    ));

    let state = Arc::new(AppState::new(args, jwt, oracle, stores, audit));

    server::run(state).await?;

    Ok(())
}

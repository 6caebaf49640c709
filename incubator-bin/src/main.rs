use std::sync::Arc;

use anyhow::Context;
use incubator_http_api::{IncubatorApiState, build_router};
use incubator_runtime::collaborators::{RegistryIdentityResolver, RpcContractReader};
use incubator_runtime::{IncubationEngine, IncubatorConfig};

const DEFAULT_BIND: &str = "0.0.0.0:9100";

fn setup_log() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};
    if tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .try_init()
        .is_err()
    {}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_log();

    let config = IncubatorConfig::from_env().context("loading INCUBATOR_* configuration")?;
    tracing::info!(
        chain = %config.chain,
        identity_chain = %config.identity_chain,
        parent_domain = %config.parent_domain,
        "configuration loaded"
    );

    let mut engine = IncubationEngine::new(config.clone());

    // Identity availability is only checked when an RPC endpoint is given.
    if let Ok(rpc_url) = std::env::var("INCUBATOR_RPC_URL") {
        let reader = RpcContractReader::new(&rpc_url)?;
        let registry = config.name_registry()?;
        engine = engine.with_resolver(Arc::new(RegistryIdentityResolver::new(reader, registry)));
        tracing::info!(%registry, "identity resolver enabled");
    } else {
        tracing::warn!("INCUBATOR_RPC_URL not set, identity availability is not checked");
    }

    let api_token = std::env::var("INCUBATOR_API_TOKEN").unwrap_or_default();
    if api_token.is_empty() {
        tracing::warn!("INCUBATOR_API_TOKEN not set, every authenticated route will reject");
    }

    let bind = std::env::var("INCUBATOR_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let state = Arc::new(IncubatorApiState::new(engine, api_token));
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    tracing::info!("Incubator API listening on {bind}");
    axum::serve(listener, router).await?;

    Ok(())
}

// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Custos Gateway Server
//!
//! Entry point for the `custos-node` binary. Parses CLI arguments, loads the
//! configuration file, initializes logging and metrics, and serves the
//! JSON-RPC API.
//!
//! - `run`          start the gateway
//! - `check-config` validate a configuration file and exit
//! - `version`      print build version information

mod api;
mod cli;
mod config;
mod logging;
mod metrics;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;

use custos_gateway::aliases::AliasResolver;
use custos_gateway::auth::PermissionAuthorizator;
use custos_gateway::config::DEFAULT_NODE_CALL_TIMEOUT;
use custos_gateway::session::build_http_client;
use custos_gateway::{InterceptorConfig, NodeInterceptor};

use cli::{Commands, CustosCli};
use config::GatewayConfig;
use logging::LogFormat;
use metrics::GatewayMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CustosCli::parse();

    match cli.command {
        Commands::Run(args) => run_gateway(args).await,
        Commands::CheckConfig(args) => check_config(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

async fn run_gateway(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        logging::DEFAULT_FILTER,
        LogFormat::from_str_lossy(&args.log_format),
    );

    let config = GatewayConfig::load(&args.config)?;
    tracing::info!(
        config = %args.config.display(),
        nodes = config.nodes.len(),
        http_port = args.http_port,
        metrics_port = args.metrics_port,
        "starting custos-node"
    );

    // --- Keys, aliases, identities ---
    let authorizator = Arc::new(PermissionAuthorizator);
    let accounts = Arc::new(config.build_accounts(authorizator.clone())?);
    let aliases = AliasResolver::new(Arc::new(config.build_alias_store()), authorizator);
    tracing::info!(
        accounts = accounts.len(),
        registries = config.registries.len(),
        api_keys = config.api_keys.len(),
        "configuration loaded"
    );

    let request_timeout =
        (args.request_timeout_ms > 0).then(|| Duration::from_millis(args.request_timeout_ms));
    let interceptor = NodeInterceptor::new(accounts, aliases, InterceptorConfig { request_timeout });

    let node_metrics = Arc::new(GatewayMetrics::new().context("failed to register metrics")?);
    let client = build_http_client(DEFAULT_NODE_CALL_TIMEOUT)
        .map_err(|e| anyhow::anyhow!(e.message))?;

    let app_state = api::AppState {
        interceptor: Arc::new(interceptor),
        nodes: Arc::new(config.node_routes()),
        users: Arc::new(config.users()),
        client,
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.http_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(node_metrics);
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    tracing::info!("custos-node stopped");
    Ok(())
}

/// Loads the configuration, including every key, and reports what it holds.
fn check_config(args: cli::CheckConfigArgs) -> Result<()> {
    logging::init_logging("custos_node=warn", LogFormat::Pretty);

    let config = GatewayConfig::load(&args.config)?;
    let accounts = config.build_accounts(Arc::new(PermissionAuthorizator))?;

    println!("Configuration is valid: {}", args.config.display());
    println!("  Nodes      : {}", config.nodes.len());
    println!("  Accounts   : {}", accounts.len());
    println!("  Registries : {}", config.registries.len());
    println!("  API keys   : {}", config.api_keys.len());
    Ok(())
}

fn print_version() {
    println!("custos-node {}", env!("CARGO_PKG_VERSION"));
    println!("jsonrpc     {}", custos_gateway::config::JSONRPC_VERSION);
    println!("rustc       {}", option_env!("RUSTC_VERSION").unwrap_or("unknown"));
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

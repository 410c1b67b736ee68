mod cli;
mod server;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use eyre::{eyre, WrapErr};
use tokio_util::sync::CancellationToken;

use walletscope_core::rpc::{HttpRpcClient, NodeRpc, WalletRpc, ANY_ACCOUNT};
use walletscope_core::{AccountLabel, AggregateOptions, BackendRegistry};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();

    // Connect to the node and verify the connection succeeds before
    // starting the server.
    let node: Arc<dyn NodeRpc> = Arc::new(
        HttpRpcClient::new(
            &args.node_url,
            args.rpc_user.as_deref(),
            args.rpc_pass.as_deref(),
            args.node_cert.as_deref(),
            args.rpc_requests_per_second,
        )
        .wrap_err("configure node RPC client")?,
    );

    let chain_info = node.get_chain_info().await.map_err(|err| {
        let message = format_rpc_connect_error(&args.node_url, &err.to_string());
        eyre!(message).wrap_err("while attempting to connect to the node RPC")
    })?;
    tracing::info!(
        chain = %chain_info.chain,
        blocks = chain_info.blocks,
        "connected to node"
    );
    if chain_info.pruned {
        tracing::warn!("node is pruned; old wallet transactions may fail to resolve");
    }

    let mut wallets = Vec::with_capacity(AccountLabel::ALL.len());
    for (account, url, cert) in wallet_endpoints(&args) {
        let client = HttpRpcClient::new(
            url,
            args.rpc_user.as_deref(),
            args.rpc_pass.as_deref(),
            cert,
            args.rpc_requests_per_second,
        )
        .wrap_err_with(|| format!("configure wallet RPC client for `{account}`"))?;

        client
            .list_account_transactions(ANY_ACCOUNT, 1)
            .await
            .map_err(|err| {
                let message = format_rpc_connect_error(url, &err.to_string());
                eyre!(message).wrap_err(format!(
                    "while attempting to connect to the `{account}` wallet RPC"
                ))
            })?;
        tracing::info!(%account, url, "connected to wallet");

        wallets.push((account, Arc::new(client) as Arc<dyn WalletRpc>));
    }
    let registry = BackendRegistry::new(wallets).wrap_err("build wallet registry")?;

    if args.enrich_concurrency == 0 {
        return Err(eyre!("--enrich-concurrency must be at least 1"));
    }
    let options = AggregateOptions {
        per_account_limit: args.per_account_limit,
        backend_timeout: Duration::from_secs(args.backend_timeout_secs),
        node_timeout: Duration::from_secs(args.node_timeout_secs),
        enrich_concurrency: args.enrich_concurrency,
    };

    let shutdown = CancellationToken::new();
    let state = server::AppState {
        registry,
        node,
        options,
        shutdown: shutdown.clone(),
    };
    let router = server::build_router(state);

    let bind_addr = format!("{}:{}", args.bind, args.port);
    if args.bind == "0.0.0.0" {
        tracing::warn!("server is bound to 0.0.0.0; wallet history is reachable from the network");
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .context("bind TCP listener")?;

    tracing::info!("listening on {bind_addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("run HTTP server")?;

    tracing::info!("server stopped");
    Ok(())
}

fn wallet_endpoints(args: &cli::Cli) -> [(AccountLabel, &str, Option<&Path>); 4] {
    [
        (
            AccountLabel::CoolDefault,
            args.cool_default_url.as_str(),
            args.cool_default_cert.as_deref(),
        ),
        (
            AccountLabel::CoolJuneCoins,
            args.cool_june_coins_url.as_str(),
            args.cool_june_coins_cert.as_deref(),
        ),
        (
            AccountLabel::CoolStakingRewards,
            args.cool_staking_rewards_url.as_str(),
            args.cool_staking_rewards_cert.as_deref(),
        ),
        (
            AccountLabel::HotWallet,
            args.hot_wallet_url.as_str(),
            args.hot_wallet_cert.as_deref(),
        ),
    ]
}

/// Wait for Ctrl-C, then cancel in-flight aggregations.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown requested");
    shutdown.cancel();
}

fn format_rpc_connect_error(rpc_url: &str, source_error: &str) -> String {
    let mut lines = vec![
        format!("could not connect to RPC endpoint `{rpc_url}`"),
        format!("RPC error: {source_error}"),
    ];

    if source_error.contains("dns error") {
        lines.push(
            "hint: hostname resolution failed; verify the endpoint hostname and your DNS/network"
                .into(),
        );
    } else if source_error.contains("certificate")
        || source_error.contains("tls")
        || source_error.contains("UnknownIssuer")
    {
        lines.push(
            "hint: TLS handshake failed; pass the daemon's rpc.cert with the matching --*-cert flag"
                .into(),
        );
    } else if source_error.contains("401") || source_error.contains("403") {
        lines.push("hint: authentication failed; verify --rpc-user/--rpc-pass".into());
    } else if source_error.contains("error sending request for url") {
        lines.push(
            "hint: request could not be sent; verify the daemon is running and listening on this address"
                .into(),
        );
    }

    lines.join("\n")
}

use std::path::PathBuf;

use clap::Parser;

/// walletscope: one deduplicated, node-verified transaction history across
/// several wallet accounts.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Address to bind the web server to.
    #[arg(long, default_value = "127.0.0.1", env = "WALLETSCOPE_BIND")]
    pub bind: String,

    /// Port to listen on.
    #[arg(long, default_value = "3090", env = "WALLETSCOPE_PORT")]
    pub port: u16,

    /// Full node RPC URL.
    #[arg(long, default_value = "https://127.0.0.1:9109", env = "WALLETSCOPE_NODE_URL")]
    pub node_url: String,

    /// PEM certificate of the node's RPC server.
    #[arg(long, env = "WALLETSCOPE_NODE_CERT")]
    pub node_cert: Option<PathBuf>,

    /// RPC username, shared by the node and all wallets.
    #[arg(long, env = "WALLETSCOPE_RPC_USER")]
    pub rpc_user: Option<String>,

    /// RPC password, shared by the node and all wallets.
    #[arg(long, env = "WALLETSCOPE_RPC_PASS")]
    pub rpc_pass: Option<String>,

    /// Wallet RPC URL for the `cool-default` account.
    #[arg(
        long,
        default_value = "https://127.0.0.1:19101",
        env = "WALLETSCOPE_COOL_DEFAULT_URL"
    )]
    pub cool_default_url: String,

    /// PEM certificate of the `cool-default` wallet's RPC server.
    #[arg(long, env = "WALLETSCOPE_COOL_DEFAULT_CERT")]
    pub cool_default_cert: Option<PathBuf>,

    /// Wallet RPC URL for the `cool-june-coins` account.
    #[arg(
        long,
        default_value = "https://127.0.0.1:19102",
        env = "WALLETSCOPE_COOL_JUNE_COINS_URL"
    )]
    pub cool_june_coins_url: String,

    /// PEM certificate of the `cool-june-coins` wallet's RPC server.
    #[arg(long, env = "WALLETSCOPE_COOL_JUNE_COINS_CERT")]
    pub cool_june_coins_cert: Option<PathBuf>,

    /// Wallet RPC URL for the `cool-staking-rewards` account.
    #[arg(
        long,
        default_value = "https://127.0.0.1:19103",
        env = "WALLETSCOPE_COOL_STAKING_REWARDS_URL"
    )]
    pub cool_staking_rewards_url: String,

    /// PEM certificate of the `cool-staking-rewards` wallet's RPC server.
    #[arg(long, env = "WALLETSCOPE_COOL_STAKING_REWARDS_CERT")]
    pub cool_staking_rewards_cert: Option<PathBuf>,

    /// Wallet RPC URL for the `hot-wallet` account.
    #[arg(
        long,
        default_value = "https://127.0.0.1:9110",
        env = "WALLETSCOPE_HOT_WALLET_URL"
    )]
    pub hot_wallet_url: String,

    /// PEM certificate of the `hot-wallet` wallet's RPC server.
    #[arg(long, env = "WALLETSCOPE_HOT_WALLET_CERT")]
    pub hot_wallet_cert: Option<PathBuf>,

    /// Maximum number of transactions requested from each wallet.
    #[arg(long, default_value = "999999")]
    pub per_account_limit: usize,

    /// Seconds to wait for one wallet before treating it as unreachable.
    #[arg(long, default_value = "30")]
    pub backend_timeout_secs: u64,

    /// Seconds to wait for one node lookup.
    #[arg(long, default_value = "30")]
    pub node_timeout_secs: u64,

    /// Maximum concurrent node lookups per request.
    #[arg(long, default_value = "4")]
    pub enrich_concurrency: usize,

    /// Per-endpoint cap on outbound RPC requests per second.
    #[arg(long)]
    pub rpc_requests_per_second: Option<u32>,
}

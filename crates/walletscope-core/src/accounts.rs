//! Wallet accounts, the backend registry, and selector resolution.
//!
//! Each account is served by its own wallet RPC endpoint. The registry is
//! assembled once at startup and never mutated afterwards; requests only
//! borrow from it.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AggregateError, CoreError};
use crate::rpc::WalletRpc;

// ==============================================================================
// Account Labels
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccountLabel {
    CoolDefault,
    CoolJuneCoins,
    CoolStakingRewards,
    HotWallet,
}

impl AccountLabel {
    /// Every known account, in canonical order.
    pub const ALL: [AccountLabel; 4] = [
        AccountLabel::CoolDefault,
        AccountLabel::CoolJuneCoins,
        AccountLabel::CoolStakingRewards,
        AccountLabel::HotWallet,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CoolDefault => "cool-default",
            Self::CoolJuneCoins => "cool-june-coins",
            Self::CoolStakingRewards => "cool-staking-rewards",
            Self::HotWallet => "hot-wallet",
        }
    }
}

impl std::fmt::Display for AccountLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==============================================================================
// Selector Table
// ==============================================================================

/// Selector accepted by [`resolve`] that expands to every account.
pub const ALL_SELECTOR: &str = "all";

/// Selector string -> accounts to query, in query order.
const SELECTORS: &[(&str, &[AccountLabel])] = &[
    ("cool-default", &[AccountLabel::CoolDefault]),
    ("cool-june-coins", &[AccountLabel::CoolJuneCoins]),
    ("cool-staking-rewards", &[AccountLabel::CoolStakingRewards]),
    ("hot-wallet", &[AccountLabel::HotWallet]),
    (ALL_SELECTOR, &AccountLabel::ALL),
];

/// All recognized selector strings, in table order.
pub fn selectors() -> impl Iterator<Item = &'static str> {
    SELECTORS.iter().map(|(selector, _)| *selector)
}

fn lookup_selector(selector: &str) -> Option<&'static [AccountLabel]> {
    SELECTORS
        .iter()
        .find(|(candidate, _)| *candidate == selector)
        .map(|(_, labels)| *labels)
}

// ==============================================================================
// Backend Registry
// ==============================================================================

/// One wallet's RPC session, tagged with the account it serves.
#[derive(Clone)]
pub struct WalletBackend {
    pub account: AccountLabel,
    pub rpc: Arc<dyn WalletRpc>,
}

impl std::fmt::Debug for WalletBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletBackend")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

/// Immutable map from account to its wallet backend.
#[derive(Debug)]
pub struct BackendRegistry {
    backends: HashMap<AccountLabel, WalletBackend>,
}

impl BackendRegistry {
    /// Build the registry, requiring exactly one backend per known account.
    ///
    /// Also checks that every label named by the selector table is covered,
    /// so a resolved selector can never point at a missing backend.
    pub fn new(
        backends: impl IntoIterator<Item = (AccountLabel, Arc<dyn WalletRpc>)>,
    ) -> Result<Self, CoreError> {
        let mut map = HashMap::with_capacity(AccountLabel::ALL.len());
        for (account, rpc) in backends {
            if map
                .insert(account, WalletBackend { account, rpc })
                .is_some()
            {
                return Err(CoreError::Config(format!(
                    "wallet backend for `{account}` registered twice"
                )));
            }
        }

        for account in AccountLabel::ALL {
            if !map.contains_key(&account) {
                return Err(CoreError::Config(format!(
                    "no wallet backend registered for `{account}`"
                )));
            }
        }
        for (selector, labels) in SELECTORS {
            if labels.is_empty() {
                return Err(CoreError::Config(format!(
                    "selector `{selector}` maps to no accounts"
                )));
            }
        }

        Ok(Self { backends: map })
    }

    pub fn get(&self, account: AccountLabel) -> Option<&WalletBackend> {
        self.backends.get(&account)
    }

    /// Backends in canonical account order.
    pub fn iter(&self) -> impl Iterator<Item = &WalletBackend> {
        AccountLabel::ALL
            .iter()
            .filter_map(|account| self.backends.get(account))
    }
}

// ==============================================================================
// Resolver
// ==============================================================================

/// Map a selector string to the backends it names, in canonical order.
///
/// Matching is exact and case-sensitive, so `"ALL"` or `"cool-default "`
/// are rejected like any other unknown token.
pub fn resolve<'r>(
    selector: &str,
    registry: &'r BackendRegistry,
) -> Result<Vec<&'r WalletBackend>, AggregateError> {
    let invalid = || AggregateError::InvalidAccountSelector(selector.to_owned());

    let labels = lookup_selector(selector).ok_or_else(invalid)?;
    labels
        .iter()
        .map(|account| registry.get(*account).ok_or_else(invalid))
        .collect()
}

pub mod accounts;
pub mod aggregate;
pub mod error;
pub mod rpc;
pub mod types;

#[cfg(test)]
mod test_util;

pub use accounts::{resolve, AccountLabel, BackendRegistry, WalletBackend};
pub use aggregate::{aggregate, AggregateOptions};
pub use error::{AggregateError, BackendUnreachable, CoreError};
pub use types::{AggregatedTransaction, Aggregation};

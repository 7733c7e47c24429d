//! Application configuration management.

use serde::Deserialize;

use crate::types::money::Currency;

/// Ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Settlement currency all budget debits are normalized to.
    #[serde(default = "default_settlement_currency")]
    pub settlement_currency: Currency,
    /// How many of the most recent finalized batches remain eligible for undo.
    #[serde(default = "default_undo_retention")]
    pub undo_retention: usize,
    /// Maximum compare-and-swap attempts when updating a budget-line balance.
    #[serde(default = "default_max_balance_retries")]
    pub max_balance_retries: u32,
    /// Timeout for a single backing-store operation, in seconds.
    #[serde(default = "default_store_timeout")]
    pub store_timeout_secs: u64,
}

fn default_settlement_currency() -> Currency {
    Currency::Ghs
}

fn default_undo_retention() -> usize {
    10
}

fn default_max_balance_retries() -> u32 {
    5
}

fn default_store_timeout() -> u64 {
    5
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            settlement_currency: default_settlement_currency(),
            undo_retention: default_undo_retention(),
            max_balance_retries: default_max_balance_retries(),
            store_timeout_secs: default_store_timeout(),
        }
    }
}

impl LedgerConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("PAYRUN").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.settlement_currency, Currency::Ghs);
        assert_eq!(config.undo_retention, 10);
        assert_eq!(config.max_balance_retries, 5);
        assert_eq!(config.store_timeout_secs, 5);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: LedgerConfig =
            serde_json::from_str(r#"{"undo_retention": 3}"#).expect("valid config");
        assert_eq!(config.undo_retention, 3);
        assert_eq!(config.settlement_currency, Currency::Ghs);
    }
}

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check chain identifiers against each chain's address format
//! - Detect duplicate credentials
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use serde::Serialize;

use crate::blockchain::types::{validate_address, Chain};
use crate::config::schema::{AppConfig, Settlement};

/// A single semantic problem with a field, in configuration or request input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "is not a socket address",
        ));
    }

    for chain in Chain::ALL {
        validate_chain(config, chain, &mut errors);
    }

    let mut seen_keys = HashSet::new();
    let mut seen_ids = HashSet::new();
    for (i, user) in config.auth.users.iter().enumerate() {
        if user.api_key.trim().is_empty() {
            errors.push(ValidationError::new(format!("auth.users[{}].api_key", i), "must not be empty"));
        } else if !seen_keys.insert(user.api_key.as_str()) {
            errors.push(ValidationError::new(format!("auth.users[{}].api_key", i), "duplicate api key"));
        }
        if !seen_ids.insert(user.id.as_str()) {
            errors.push(ValidationError::new(
                format!("auth.users[{}].id", i),
                format!("duplicate user id '{}'", user.id),
            ));
        }
    }

    let mut seen_datasets = HashSet::new();
    for (i, dataset) in config.catalog.datasets.iter().enumerate() {
        if !seen_datasets.insert(dataset.data_id.as_str()) {
            errors.push(ValidationError::new(
                format!("catalog.datasets[{}].data_id", i),
                format!("duplicate dataset '{}'", dataset.data_id),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_chain(config: &AppConfig, chain: Chain, errors: &mut Vec<ValidationError>) {
    let chain_config = config.chains.get(chain);
    if !chain_config.enabled {
        return;
    }
    let prefix = format!("chains.{}", chain);

    let rpc_url = chain_config.effective_rpc_url(chain);
    if url::Url::parse(&rpc_url).is_err() {
        errors.push(ValidationError::new(
            format!("{}.rpc_url", prefix),
            format!("'{}' is not a valid URL", rpc_url),
        ));
    }
    for (i, failover) in chain_config.failover_urls.iter().enumerate() {
        if url::Url::parse(failover).is_err() {
            errors.push(ValidationError::new(
                format!("{}.failover_urls[{}]", prefix, i),
                format!("'{}' is not a valid URL", failover),
            ));
        }
    }

    if chain_config.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new(format!("{}.rpc_timeout_secs", prefix), "must be greater than 0"));
    }

    if !chain_config.contract_id.is_empty() {
        if let Err(e) = validate_address(chain, &chain_config.contract_id) {
            errors.push(ValidationError::new(format!("{}.contract_id", prefix), e.to_string()));
        }
    }

    if chain_config.settlement == Settlement::OnChain {
        match chain {
            Chain::Solana => errors.push(ValidationError::new(
                format!("{}.settlement", prefix),
                "on-chain settlement is not available for solana",
            )),
            Chain::Bsc => {
                if chain_config.contract_id.is_empty() {
                    errors.push(ValidationError::new(
                        format!("{}.contract_id", prefix),
                        "required for on-chain settlement",
                    ));
                }
                if chain_config.gas_price_multiplier < 1.0 {
                    errors.push(ValidationError::new(
                        format!("{}.gas_price_multiplier", prefix),
                        "must be at least 1.0",
                    ));
                }
                if chain_config.confirmation_timeout_secs == 0 {
                    errors.push(ValidationError::new(
                        format!("{}.confirmation_timeout_secs", prefix),
                        "must be greater than 0",
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::UserConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.request_secs = 0;
        config.chains.solana.settlement = Settlement::OnChain;
        config.chains.bsc.contract_id = "0x1234".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"listener.bind_address"));
        assert!(fields.contains(&"timeouts.request_secs"));
        assert!(fields.contains(&"chains.solana.settlement"));
        assert!(fields.contains(&"chains.bsc.contract_id"));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_disabled_chain_is_not_checked() {
        let mut config = AppConfig::default();
        config.chains.bsc.enabled = false;
        config.chains.bsc.rpc_url = "::::".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_on_chain_bsc_requires_contract() {
        let mut config = AppConfig::default();
        config.chains.bsc.settlement = Settlement::OnChain;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "chains.bsc.contract_id");
        assert!(errors[0].message.contains("on-chain"));
    }

    #[test]
    fn test_duplicate_api_keys() {
        let mut config = AppConfig::default();
        for id in ["a", "b"] {
            config.auth.users.push(UserConfig {
                id: id.into(),
                api_key: "same".into(),
                wallets: Default::default(),
            });
        }
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "auth.users[1].api_key: duplicate api key");
    }
}

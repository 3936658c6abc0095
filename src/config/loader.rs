//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::blockchain::types::Chain;
use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file, then apply
/// environment overrides.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: AppConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build configuration from defaults and the process environment only.
pub fn load_from_env() -> Result<AppConfig, ConfigError> {
    let mut config = AppConfig::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply the deployment environment variables on top of file values.
///
/// `lookup` abstracts `std::env::var` so tests never touch process state.
/// An unparseable `BIOCOIN_ENV` is an error.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup("PORT") {
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{}:{}", host, port.trim());
    }

    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level;
    }

    if let Some(env) = lookup("BIOCOIN_ENV") {
        config.environment = env
            .parse()
            .map_err(|e: String| ConfigError::Validation(vec![ValidationError::new("BIOCOIN_ENV", e)]))?;
    }

    let chain_vars = [
        (Chain::Solana, "SOLANA_RPC_URL", "SOLANA_PROGRAM_ID"),
        (Chain::Bsc, "BSC_RPC_URL", "BSC_CONTRACT_ADDRESS"),
    ];
    for (chain, rpc_var, contract_var) in chain_vars {
        let chain_config = config.chains.get_mut(chain);
        if let Some(url) = lookup(rpc_var) {
            chain_config.rpc_url = url;
        }
        if let Some(contract) = lookup(contract_var) {
            chain_config.contract_id = contract;
        }
    }
    Ok(())
}

//! Dataset → data provider lookup.

use std::collections::HashMap;

use crate::config::{CatalogConfig, ProviderConfig};

#[derive(Debug, Clone, Default)]
pub struct DataCatalog {
    default_provider: ProviderConfig,
    datasets: HashMap<String, ProviderConfig>,
}

impl DataCatalog {
    pub fn from_config(config: &CatalogConfig) -> Self {
        let datasets = config
            .datasets
            .iter()
            .map(|d| (d.data_id.clone(), d.provider.clone()))
            .collect();
        Self {
            default_provider: config.default_provider.clone(),
            datasets,
        }
    }

    /// Provider selling `data_id`; datasets without an entry go to the default provider.
    pub fn provider_for(&self, data_id: &str) -> &ProviderConfig {
        self.datasets.get(data_id).unwrap_or(&self.default_provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Chain;
    use crate::config::{DatasetConfig, WalletMap};

    #[test]
    fn test_dataset_entry_overrides_default() {
        let config = CatalogConfig {
            default_provider: ProviderConfig::default(),
            datasets: vec![DatasetConfig {
                data_id: "genome-42".into(),
                provider: ProviderConfig {
                    id: "lab7".into(),
                    wallets: WalletMap {
                        solana: Some("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA".into()),
                        bsc: None,
                    },
                },
            }],
        };
        let catalog = DataCatalog::from_config(&config);

        let provider = catalog.provider_for("genome-42");
        assert_eq!(provider.id, "lab7");
        assert!(provider.wallets.get(Chain::Solana).is_some());
        assert!(provider.wallets.get(Chain::Bsc).is_none());

        assert_eq!(catalog.provider_for("unknown").id, "provider123");
    }
}

//! Service state management.

use std::sync::Arc;
use std::time::Instant;

use crate::analyzer::{AnalyzerError, CommandAnalyzer, LinkabilityAnalyzer};
use crate::cache::CacheConfig;
use crate::config::{Network, ProviderKind, ServiceConfig};
use crate::inspector::TxInspector;
use crate::provider::{build_provider, BlockchainProvider, ProviderError};

/// Inspector over boxed provider and analyzer.
pub type DynInspector = TxInspector<dyn BlockchainProvider, dyn LinkabilityAnalyzer>;

/// Error raised while building the service state.
#[derive(Debug, thiserror::Error)]
pub enum ServiceInitError {
    /// The provider could not be constructed.
    #[error("Provider setup failed: {0}")]
    Provider(#[from] ProviderError),
    /// The analyzer could not be constructed.
    #[error("Analyzer setup failed: {0}")]
    Analyzer(#[from] AnalyzerError),
}

/// Shared service state.
#[derive(Clone)]
pub struct ServiceState {
    /// The inspection pipeline.
    pub inspector: Arc<DynInspector>,
    /// Network used when a request does not name one.
    pub default_network: Network,
    /// Configured provider kind, reported by `/api/defaults`.
    pub provider_kind: ProviderKind,
    started_at: Instant,
}

impl ServiceState {
    /// Create state around an existing inspector.
    pub fn new(inspector: DynInspector, default_network: Network, provider_kind: ProviderKind) -> Self {
        Self {
            inspector: Arc::new(inspector),
            default_network,
            provider_kind,
            started_at: Instant::now(),
        }
    }

    /// Build provider, analyzer and cache from configuration.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServiceInitError> {
        let provider = build_provider(config.provider, config.network)?;
        let analyzer: Arc<dyn LinkabilityAnalyzer> =
            Arc::new(CommandAnalyzer::from_command_line(&config.analyzer_cmd)?);

        let inspector = TxInspector::new(provider, analyzer)
            .with_cache(&CacheConfig::with_capacity(config.cache_entries));

        Ok(Self::new(inspector, config.network, config.provider))
    }

    /// Seconds since the state was created.
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_requires_analyzer() {
        let config = ServiceConfig::from_lookup(|_| None);
        assert!(matches!(
            ServiceState::from_config(&config),
            Err(ServiceInitError::Analyzer(AnalyzerError::NotConfigured))
        ));
    }

    #[test]
    fn test_from_config() {
        let config = ServiceConfig::from_lookup(|key| match key {
            "TX_ENTROPY_ANALYZER_CMD" => Some("ludwig --json".to_string()),
            "TX_ENTROPY_NETWORK" => Some("testnet".to_string()),
            _ => None,
        });
        let state = ServiceState::from_config(&config).unwrap();

        assert_eq!(state.default_network, Network::Testnet);
        assert_eq!(state.provider_kind, ProviderKind::BlockchainInfo);
        assert_eq!(state.inspector.analyzer().descriptor(), "external analyzer command");
        assert_eq!(state.inspector.cache_stats().unwrap().cap, 1024);
    }
}

// Connector instance registry.
//
// Instances are cached per (connector, network) key and handed out as
// `Arc`s. The map is guarded by an async mutex held across instance
// construction, so two concurrent first requests for the same network get
// the same instance rather than racing to build two.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::connector::Aerodrome;
use crate::errors::ConnectorError;
use crate::settings::Settings;

pub struct ConnectorRegistry {
    settings: Settings,
    instances: Mutex<HashMap<String, Arc<Aerodrome>>>,
}

impl ConnectorRegistry {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached connector for `network`, constructing it on first
    /// use. Unknown networks fail with `UnsupportedNetwork`.
    pub async fn get_or_init(&self, network: &str) -> Result<Arc<Aerodrome>, ConnectorError> {
        let mut instances = self.instances.lock().await;
        if let Some(existing) = instances.get(network) {
            debug!(network, "reusing cached connector instance");
            return Ok(Arc::clone(existing));
        }

        let connector = Arc::new(Aerodrome::init(network, &self.settings)?);
        instances.insert(network.to_string(), Arc::clone(&connector));
        info!(network, "connector instance created");
        Ok(connector)
    }

    /// Drops the cached instance for `network`; the next `get_or_init`
    /// rebuilds it. In-flight holders keep their `Arc` until they finish.
    pub async fn close(&self, network: &str) {
        let mut instances = self.instances.lock().await;
        if instances.remove(network).is_some() {
            info!(network, "connector instance closed");
        }
    }

    /// Drops every cached instance.
    pub async fn close_all(&self) {
        self.instances.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn caches_instances_per_network() {
        let registry = ConnectorRegistry::new(Settings::with_base_defaults());

        let first = registry.get_or_init("base").await.unwrap();
        let second = registry.get_or_init("base").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn close_forces_a_fresh_instance() {
        let registry = ConnectorRegistry::new(Settings::with_base_defaults());

        let first = registry.get_or_init("base").await.unwrap();
        registry.close("base").await;
        let rebuilt = registry.get_or_init("base").await.unwrap();
        assert!(!Arc::ptr_eq(&first, &rebuilt));
    }

    #[tokio::test]
    async fn unknown_network_is_rejected() {
        let registry = ConnectorRegistry::new(Settings::with_base_defaults());
        let result = registry.get_or_init("solana").await;
        assert!(matches!(
            result,
            Err(ConnectorError::UnsupportedNetwork { .. })
        ));
    }
}

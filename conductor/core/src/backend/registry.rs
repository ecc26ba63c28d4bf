//! Provider-keyed client registry

use std::collections::HashMap;
use std::sync::Arc;

use super::traits::ProviderClient;
use crate::routing::target::ModelTarget;

/// Clients of one capability, keyed by provider name
pub struct ClientRegistry<C: ?Sized> {
    clients: HashMap<String, Arc<C>>,
}

impl<C: ?Sized> Default for ClientRegistry<C> {
    fn default() -> Self {
        Self {
            clients: HashMap::new(),
        }
    }
}

impl<C: ?Sized> Clone for ClientRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            clients: self.clients.clone(),
        }
    }
}

impl<C: ProviderClient + ?Sized> ClientRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of clients
    pub fn from_clients(clients: impl IntoIterator<Item = Arc<C>>) -> Self {
        let mut registry = Self::new();
        for client in clients {
            registry.register(client);
        }
        registry
    }

    /// Register a client under its provider name, replacing any previous one
    pub fn register(&mut self, client: Arc<C>) {
        let provider = client.provider().to_string();
        if self.clients.insert(provider.clone(), client).is_some() {
            tracing::warn!(provider = %provider, "Replacing registered client");
        }
    }

    #[must_use]
    pub fn get(&self, provider: &str) -> Option<Arc<C>> {
        self.clients.get(provider).cloned()
    }

    /// Client serving a target's provider
    #[must_use]
    pub fn resolve(&self, target: &ModelTarget) -> Option<Arc<C>> {
        self.get(target.provider_name())
    }

    /// Registered provider names, sorted
    #[must_use]
    pub fn providers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.clients.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

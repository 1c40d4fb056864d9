//! Open/closed registry of cloud provider factories.

use std::collections::HashMap;
use std::sync::Arc;

use super::{CloudProvider, LocalDirProvider, ProviderKind, ProviderSettings, S3Provider};
use crate::{Error, Result};

/// Constructor for a provider, given connection settings.
pub type ProviderFactory =
    Box<dyn Fn(&ProviderSettings) -> Result<Arc<dyn CloudProvider>> + Send + Sync>;

/// Maps a [`ProviderKind`] to the factory that produces its provider.
///
/// New vendors are supported purely by registration; nothing else changes.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: HashMap<ProviderKind, ProviderFactory>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in providers registered.
    #[must_use]
    pub fn with_builtin_providers() -> Self {
        let mut registry = Self::new();
        registry.register(
            ProviderKind::S3Compatible,
            Box::new(|settings: &ProviderSettings| {
                Ok(Arc::new(S3Provider::from_settings(settings)?) as Arc<dyn CloudProvider>)
            }),
        );
        registry.register(
            ProviderKind::LocalFolder,
            Box::new(|settings: &ProviderSettings| {
                Ok(Arc::new(LocalDirProvider::from_settings(settings)?) as Arc<dyn CloudProvider>)
            }),
        );
        registry
    }

    /// Register (or replace) the factory for a provider kind.
    pub fn register(&mut self, kind: ProviderKind, factory: ProviderFactory) {
        self.factories.insert(kind, factory);
    }

    /// Produce a provider for `kind`.
    ///
    /// Fails with [`Error::UnregisteredProvider`] when no factory is
    /// registered for the kind; this is the only error the registry itself
    /// produces.
    pub fn create(
        &self,
        kind: ProviderKind,
        settings: &ProviderSettings,
    ) -> Result<Arc<dyn CloudProvider>> {
        let factory = self
            .factories
            .get(&kind)
            .ok_or_else(|| Error::UnregisteredProvider(kind.to_string()))?;
        factory(settings)
    }

    /// Whether a factory is registered for `kind`.
    #[must_use]
    pub fn is_registered(&self, kind: ProviderKind) -> bool {
        self.factories.contains_key(&kind)
    }

    /// Kinds with a registered factory.
    #[must_use]
    pub fn available(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<ProviderKind> = self.factories.keys().copied().collect();
        kinds.sort_by_key(|kind| kind.as_str());
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_knows_both_kinds() {
        let registry = ProviderRegistry::with_builtin_providers();
        assert!(registry.is_registered(ProviderKind::S3Compatible));
        assert!(registry.is_registered(ProviderKind::LocalFolder));
        assert_eq!(
            registry.available(),
            vec![ProviderKind::LocalFolder, ProviderKind::S3Compatible]
        );
    }

    #[test]
    fn create_fails_for_unregistered_kind() {
        let registry = ProviderRegistry::new();
        let error = registry
            .create(ProviderKind::LocalFolder, &ProviderSettings::default())
            .err()
            .unwrap();
        assert!(matches!(error, Error::UnregisteredProvider(_)));
    }

    #[test]
    fn registration_is_open_for_extension() {
        let mut registry = ProviderRegistry::new();
        assert!(!registry.is_registered(ProviderKind::LocalFolder));

        registry.register(
            ProviderKind::LocalFolder,
            Box::new(|_settings: &ProviderSettings| {
                let dir = std::env::temp_dir().join("scrawl-registry-test");
                Ok(Arc::new(LocalDirProvider::new(dir)) as Arc<dyn CloudProvider>)
            }),
        );

        assert!(registry.is_registered(ProviderKind::LocalFolder));
        let provider = registry
            .create(ProviderKind::LocalFolder, &ProviderSettings::default())
            .unwrap();
        assert_eq!(provider.provider_name(), "Local Folder");
    }

    #[test]
    fn create_propagates_factory_validation() {
        let registry = ProviderRegistry::with_builtin_providers();
        // S3 factory rejects settings with no bucket/credentials
        let error = registry
            .create(ProviderKind::S3Compatible, &ProviderSettings::default())
            .err()
            .unwrap();
        assert!(matches!(error, Error::InvalidInput(_)));
    }
}

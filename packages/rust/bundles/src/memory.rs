//! In-memory bundle provider for tests and dry runs.

use std::collections::HashMap;

use crammese_shared::{BundlePair, CrammeseError, LanguageVariant, ModuleSpec, Result};

use crate::BundleProvider;

#[derive(Debug, Clone)]
enum ModuleEntry {
    Bundles(HashMap<String, BundlePair>),
    Broken(String),
}

/// Provider serving pre-built bundles keyed by variant code.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    base: HashMap<String, BundlePair>,
    modules: HashMap<String, ModuleEntry>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(mut self, variant: &str, pair: BundlePair) -> Self {
        self.base.insert(variant.to_string(), pair);
        self
    }

    /// Register a module bundle pair for one variant. A module registered
    /// for some variants reports `TranslationFileNotFound` for the others.
    pub fn with_module(mut self, id: &str, variant: &str, pair: BundlePair) -> Self {
        let entry = self
            .modules
            .entry(id.to_string())
            .or_insert_with(|| ModuleEntry::Bundles(HashMap::new()));
        if matches!(entry, ModuleEntry::Broken(_)) {
            *entry = ModuleEntry::Bundles(HashMap::new());
        }
        if let ModuleEntry::Bundles(variants) = entry {
            variants.insert(variant.to_string(), pair);
        }
        self
    }

    /// Register a module whose content fails to decode for every variant.
    pub fn with_broken_module(mut self, id: &str, message: &str) -> Self {
        self.modules
            .insert(id.to_string(), ModuleEntry::Broken(message.to_string()));
        self
    }
}

impl BundleProvider for StaticProvider {
    fn base_bundle(&self, variant: &LanguageVariant) -> Result<BundlePair> {
        self.base
            .get(variant.as_str())
            .cloned()
            .ok_or_else(|| CrammeseError::TranslationFileNotFound {
                module: "minecraft".into(),
                variant: variant.to_string(),
            })
    }

    fn module_bundle(&self, module: &ModuleSpec, variant: &LanguageVariant) -> Result<BundlePair> {
        match self.modules.get(&module.id) {
            None => Err(CrammeseError::ModuleNotFound {
                module: module.id.clone(),
            }),
            Some(ModuleEntry::Broken(message)) => {
                Err(CrammeseError::malformed(module.id.clone(), message.clone()))
            }
            Some(ModuleEntry::Bundles(variants)) => variants
                .get(variant.as_str())
                .cloned()
                .ok_or_else(|| CrammeseError::TranslationFileNotFound {
                    module: module.id.clone(),
                    variant: variant.to_string(),
                }),
        }
    }

    fn name(&self) -> &str {
        "static"
    }
}

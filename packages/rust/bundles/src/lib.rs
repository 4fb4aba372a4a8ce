//! Bundle providers: where translation bundles come from.
//!
//! This crate provides:
//! - [`BundleProvider`], the contract the merge engine and knowledge base
//!   builder depend on
//! - [`GameInstall`], reading a local game installation and its module jars
//! - [`StaticProvider`], serving bundles from memory

pub mod install;
pub mod json;
pub mod memory;

use crammese_shared::{BundlePair, LanguageVariant, ModuleSpec, Result, TranslationBundle};

pub use install::{GameInstall, InstallLayout};
pub use json::{decode_bundle, strip_line_comments};
pub use memory::StaticProvider;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Source of (target, reference) bundle pairs.
///
/// Implementations must keep the failure kinds apart:
/// [`ModuleNotFound`](crammese_shared::CrammeseError::ModuleNotFound) when the
/// module is absent,
/// [`TranslationFileNotFound`](crammese_shared::CrammeseError::TranslationFileNotFound)
/// when it ships no file for the variant, and
/// [`MalformedBundle`](crammese_shared::CrammeseError::MalformedBundle) when
/// the file cannot be decoded.
pub trait BundleProvider: Send + Sync {
    /// Base game bundles for `variant`, paired with the reference language.
    fn base_bundle(&self, variant: &LanguageVariant) -> Result<BundlePair>;

    /// One module's bundles for exactly `variant` (no fallback here).
    fn module_bundle(&self, module: &ModuleSpec, variant: &LanguageVariant) -> Result<BundlePair>;

    /// Base game target-language bundle alone. Must not require any
    /// reference-language file.
    fn base_source(&self, variant: &LanguageVariant) -> Result<TranslationBundle> {
        self.base_bundle(variant).map(|pair| pair.source)
    }

    /// One module's target-language bundle alone, for exactly `variant`.
    fn module_source(
        &self,
        module: &ModuleSpec,
        variant: &LanguageVariant,
    ) -> Result<TranslationBundle> {
        self.module_bundle(module, variant).map(|pair| pair.source)
    }

    /// Human-readable provider name for tracing.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crammese_shared::CrammeseError;

    fn pair(source: &[(&str, &str)], reference: &[(&str, &str)]) -> BundlePair {
        BundlePair {
            source: source.iter().copied().collect::<TranslationBundle>(),
            reference: reference.iter().copied().collect::<TranslationBundle>(),
        }
    }

    #[test]
    fn static_provider_serves_registered_bundles() {
        let provider = StaticProvider::new()
            .with_base("fr_fr", pair(&[("a", "A")], &[("a", "a")]))
            .with_module("jei", "fr_fr", pair(&[("b", "B")], &[("b", "b")]));
        let fr = LanguageVariant::parse("fr_fr").unwrap();

        assert_eq!(provider.base_bundle(&fr).unwrap().source.get("a"), Some("A"));
        let module = provider.module_bundle(&ModuleSpec::new("jei"), &fr).unwrap();
        assert_eq!(module.reference.get("b"), Some("b"));
    }

    #[test]
    fn static_provider_failure_kinds() {
        let provider = StaticProvider::new()
            .with_module("jei", "fr_fr", BundlePair::default())
            .with_broken_module("cfm", "unexpected end of input");
        let be = LanguageVariant::parse("fr_be").unwrap();

        assert!(matches!(
            provider.base_bundle(&be),
            Err(CrammeseError::TranslationFileNotFound { .. })
        ));
        assert!(matches!(
            provider.module_bundle(&ModuleSpec::new("jei"), &be),
            Err(CrammeseError::TranslationFileNotFound { .. })
        ));
        assert!(matches!(
            provider.module_bundle(&ModuleSpec::new("cfm"), &be),
            Err(CrammeseError::MalformedBundle { .. })
        ));
        assert!(matches!(
            provider.module_bundle(&ModuleSpec::new("absent"), &be),
            Err(CrammeseError::ModuleNotFound { .. })
        ));
    }
}

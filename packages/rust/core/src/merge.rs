//! Merge engine: base game bundle plus every module, folded into one map.
//!
//! Base failures abort the run. Module failures never do: each module load
//! yields a [`ModuleDiagnostic`] and the run moves on.

use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use crammese_annotate::{Annotator, BundleOrigin};
use crammese_bundles::BundleProvider;
use crammese_shared::{
    BundlePair, CrammeseError, KnowledgeBase, LanguageVariant, MergedTranslationMap, ModuleSpec,
    Result, TranslationBundle,
};

use crate::progress::ProgressReporter;

/// Configuration for one merge run.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Target language variant.
    pub variant: LanguageVariant,
    /// Modules in priority order; later modules override earlier ones.
    pub modules: Vec<ModuleSpec>,
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Why a module contributed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ModuleNotFound,
    TranslationFileNotFound,
    Failed,
}

impl SkipReason {
    pub fn from_error(error: &CrammeseError) -> Self {
        match error {
            CrammeseError::ModuleNotFound { .. } => Self::ModuleNotFound,
            CrammeseError::TranslationFileNotFound { .. } => Self::TranslationFileNotFound,
            _ => Self::Failed,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ModuleNotFound => "module not found",
            Self::TranslationFileNotFound => "translation file not found",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleOutcome {
    Loaded {
        /// Variant actually used (differs from the requested one on fallback).
        variant: LanguageVariant,
        /// Entries written into the output map.
        entries: usize,
        fallback: bool,
    },
    Skipped {
        reason: SkipReason,
        detail: String,
    },
}

/// Per-module result, in processing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDiagnostic {
    pub module: String,
    pub outcome: ModuleOutcome,
}

impl ModuleDiagnostic {
    pub fn is_loaded(&self) -> bool {
        matches!(self.outcome, ModuleOutcome::Loaded { .. })
    }
}

/// Result of a merge run.
#[derive(Debug)]
pub struct MergeReport {
    pub map: MergedTranslationMap,
    pub diagnostics: Vec<ModuleDiagnostic>,
    /// Entries contributed by the base game.
    pub base_entries: usize,
    pub elapsed: Duration,
}

impl MergeReport {
    pub fn loaded_modules(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_loaded()).count()
    }
}

// ---------------------------------------------------------------------------
// Module loading with regional fallback
// ---------------------------------------------------------------------------

/// A module bundle pair and the variant it was found under.
#[derive(Debug, Clone)]
pub struct LoadedModule {
    pub pair: BundlePair,
    pub variant: LanguageVariant,
    pub via_fallback: bool,
}

/// A module's target-language bundle and the variant it was found under.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub source: TranslationBundle,
    pub variant: LanguageVariant,
    pub via_fallback: bool,
}

/// Load `module` for `variant`, trying the variant's fallbacks in order.
///
/// An absent module is not retried. When every variant fails the error for
/// the requested variant is returned.
pub fn load_module_with_fallback(
    provider: &dyn BundleProvider,
    module: &ModuleSpec,
    variant: &LanguageVariant,
) -> Result<LoadedModule> {
    let (pair, variant, via_fallback) =
        with_fallback(module, variant, |v| provider.module_bundle(module, v))?;
    Ok(LoadedModule {
        pair,
        variant,
        via_fallback,
    })
}

/// Same fallback order as [`load_module_with_fallback`], reading only the
/// target-language bundle.
pub fn load_module_source_with_fallback(
    provider: &dyn BundleProvider,
    module: &ModuleSpec,
    variant: &LanguageVariant,
) -> Result<LoadedSource> {
    let (source, variant, via_fallback) =
        with_fallback(module, variant, |v| provider.module_source(module, v))?;
    Ok(LoadedSource {
        source,
        variant,
        via_fallback,
    })
}

fn with_fallback<T>(
    module: &ModuleSpec,
    variant: &LanguageVariant,
    load: impl Fn(&LanguageVariant) -> Result<T>,
) -> Result<(T, LanguageVariant, bool)> {
    let first_error = match load(variant) {
        Ok(loaded) => return Ok((loaded, variant.clone(), false)),
        Err(e @ CrammeseError::ModuleNotFound { .. }) => return Err(e),
        Err(e) => e,
    };

    for fallback in variant.fallbacks() {
        match load(&fallback) {
            Ok(loaded) => {
                warn!(
                    module = %module.id,
                    requested = %variant,
                    used = %fallback,
                    "using regional fallback"
                );
                return Ok((loaded, fallback, true));
            }
            Err(e) => debug!(module = %module.id, variant = %fallback, error = %e, "fallback failed"),
        }
    }

    Err(first_error)
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Build the merged translation map for `config.variant`.
///
/// 1. Load the base bundles (fatal on failure)
/// 2. Annotate every base entry
/// 3. For each module in order: load with fallback, annotate, overwrite
#[instrument(skip_all, fields(variant = %config.variant, modules = config.modules.len()))]
pub fn merge_translations(
    config: &MergeConfig,
    provider: &dyn BundleProvider,
    knowledge: Option<&KnowledgeBase>,
    progress: &dyn ProgressReporter,
) -> Result<MergeReport> {
    let start = Instant::now();
    let family = config.variant.family();
    let annotator = Annotator::new(family, knowledge);
    let mut map = MergedTranslationMap::new();

    // --- Base game ---
    progress.phase("Merging base game");
    let base = provider.base_bundle(&config.variant).map_err(|e| {
        CrammeseError::BaseBundleUnavailable {
            variant: config.variant.to_string(),
            reason: e.to_string(),
        }
    })?;
    let base_entries = fold_pair(&mut map, &base, &annotator);
    info!(
        provider = provider.name(),
        entries = base_entries,
        "base game merged"
    );

    // --- Modules ---
    progress.phase("Merging modules");
    let total = config.modules.len();
    let mut diagnostics = Vec::with_capacity(total);

    for (i, module) in config.modules.iter().enumerate() {
        let outcome = match load_module_with_fallback(provider, module, &config.variant) {
            Ok(loaded) => {
                let module_annotator = annotator.with_origin(BundleOrigin::Module {
                    via_fallback: loaded.via_fallback,
                });
                let entries = fold_pair(&mut map, &loaded.pair, &module_annotator);
                debug!(module = %module.id, entries, "module merged");
                ModuleOutcome::Loaded {
                    variant: loaded.variant,
                    entries,
                    fallback: loaded.via_fallback,
                }
            }
            Err(e) => {
                let reason = SkipReason::from_error(&e);
                match reason {
                    SkipReason::Failed => warn!(module = %module.id, error = %e, "module skipped"),
                    _ => debug!(module = %module.id, reason = reason.label(), "module skipped"),
                }
                ModuleOutcome::Skipped {
                    reason,
                    detail: e.to_string(),
                }
            }
        };

        let diagnostic = ModuleDiagnostic {
            module: module.id.clone(),
            outcome,
        };
        progress.module_done(&diagnostic, i + 1, total);
        diagnostics.push(diagnostic);
    }

    let report = MergeReport {
        map,
        diagnostics,
        base_entries,
        elapsed: start.elapsed(),
    };

    info!(
        entries = report.map.len(),
        loaded = report.loaded_modules(),
        skipped = total - report.loaded_modules(),
        duration_ms = report.elapsed.as_millis(),
        "merge completed"
    );

    Ok(report)
}

/// Fold one bundle pair into `map`.
///
/// Keys present in both bundles are annotated and overwrite earlier entries.
/// Reference-only keys fill gaps with the raw reference text but never
/// replace an entry that is already there. Source-only keys are dropped.
/// Returns the number of entries written.
fn fold_pair(map: &mut MergedTranslationMap, pair: &BundlePair, annotator: &Annotator<'_>) -> usize {
    let mut written = 0;
    for (key, reference) in pair.reference.iter() {
        match pair.source.get(key) {
            Some(source) => {
                map.insert(key, annotator.render(key, source, reference));
                written += 1;
            }
            None => {
                if map.insert_if_absent(key, reference) {
                    written += 1;
                }
            }
        }
    }
    written
}

//! Knowledge base builder: headword collection, concurrent lexical lookups,
//! gender resolution, and one atomic write at the end.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, instrument, warn};

use crammese_annotate::{correct_source, headword_of};
use crammese_bundles::BundleProvider;
use crammese_lexicon::{LexicalLookup, SenseRecord};
use crammese_shared::{
    CrammeseError, GenderTag, KnowledgeBase, LanguageFamily, LanguageVariant, LexiconConfig,
    ModuleSpec, Result, TranslationBundle,
};
use crammese_storage::{BuildRecord, KnowledgeStore};

use crate::merge::{ModuleDiagnostic, ModuleOutcome, SkipReason, load_module_source_with_fallback};
use crate::progress::ProgressReporter;

/// Headwords this short or shorter are never looked up.
const MIN_HEADWORD_CHARS: usize = 3;

/// Runtime build configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub variant: LanguageVariant,
    pub modules: Vec<ModuleSpec>,
    /// Maximum concurrent lookups.
    pub concurrency: usize,
    /// Per-lookup timeout.
    pub timeout: Duration,
    /// Pause before each lookup, per worker.
    pub rate_limit: Duration,
}

impl BuildConfig {
    pub fn new(variant: LanguageVariant, modules: Vec<ModuleSpec>, lexicon: &LexiconConfig) -> Self {
        Self {
            variant,
            modules,
            concurrency: lexicon.concurrency.max(1) as usize,
            timeout: Duration::from_secs(lexicon.timeout_secs),
            rate_limit: Duration::from_millis(lexicon.rate_limit_ms),
        }
    }
}

/// Summary of a completed build.
#[derive(Debug)]
pub struct BuildReport {
    pub knowledge: KnowledgeBase,
    /// Distinct headwords queried.
    pub candidates: usize,
    /// Headwords that were skipped, with the reason.
    pub failures: Vec<(String, String)>,
    /// Module load results from headword collection.
    pub modules: Vec<ModuleDiagnostic>,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Headword collection
// ---------------------------------------------------------------------------

/// Add the headwords of every noun-bearing entry in `bundle` to `into`.
///
/// Module text is corrected first so headwords match what the annotator
/// will look up.
pub fn collect_headwords(
    family: LanguageFamily,
    bundle: &TranslationBundle,
    is_module: bool,
    into: &mut BTreeSet<String>,
) {
    for (key, text) in bundle.iter() {
        let text = if is_module {
            correct_source(family, text)
        } else {
            text.to_string()
        };
        if let Some(headword) = headword_of(family, key, &text) {
            if headword.chars().count() >= MIN_HEADWORD_CHARS {
                into.insert(headword);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Gender resolution
// ---------------------------------------------------------------------------

/// Gender of the first noun record, by tag priority
/// plural > masculine > neuter > feminine.
pub fn resolve_gender(records: &[SenseRecord]) -> Option<GenderTag> {
    let noun = records.iter().find(|r| r.is_noun())?;
    let has = |tag: &str| noun.tags.iter().any(|t| t == tag);

    if has("plural") {
        Some(GenderTag::Plural)
    } else if has("masculine") {
        Some(GenderTag::Masculine)
    } else if has("neuter") {
        Some(GenderTag::Neuter)
    } else if has("feminine") {
        Some(GenderTag::Feminine)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

/// Build and persist the knowledge base for `config.variant`.
///
/// Individual lookup failures and timeouts are recorded and skipped. The
/// store is written once, after every lookup has finished.
#[instrument(skip_all, fields(variant = %config.variant, concurrency = config.concurrency))]
pub async fn build_knowledge_base(
    config: &BuildConfig,
    provider: &dyn BundleProvider,
    lookup: Arc<dyn LexicalLookup>,
    store: &KnowledgeStore,
    progress: &dyn ProgressReporter,
) -> Result<BuildReport> {
    let start = Instant::now();
    let family = config.variant.family();

    if family.lexicon_name().is_none() {
        return Err(CrammeseError::config(format!(
            "cannot build a knowledge base for {}: no lexicon for this language",
            config.variant
        )));
    }

    // --- Phase 1: collect headwords ---
    progress.phase("Collecting headwords");
    let base = provider.base_source(&config.variant).map_err(|e| {
        CrammeseError::BaseBundleUnavailable {
            variant: config.variant.to_string(),
            reason: e.to_string(),
        }
    })?;

    let mut headwords = BTreeSet::new();
    collect_headwords(family, &base, false, &mut headwords);

    let mut modules = Vec::with_capacity(config.modules.len());
    for module in &config.modules {
        let outcome = match load_module_source_with_fallback(provider, module, &config.variant) {
            Ok(loaded) => {
                collect_headwords(family, &loaded.source, true, &mut headwords);
                ModuleOutcome::Loaded {
                    entries: loaded.source.len(),
                    variant: loaded.variant,
                    fallback: loaded.via_fallback,
                }
            }
            Err(e) => {
                debug!(module = %module.id, error = %e, "module skipped for headwords");
                ModuleOutcome::Skipped {
                    reason: SkipReason::from_error(&e),
                    detail: e.to_string(),
                }
            }
        };
        modules.push(ModuleDiagnostic {
            module: module.id.clone(),
            outcome,
        });
    }

    let candidates = headwords.len();
    info!(candidates, "headwords collected");

    // --- Phase 2: lookups ---
    progress.phase("Looking up headwords");
    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let accumulator: Arc<Mutex<BTreeMap<String, GenderTag>>> =
        Arc::new(Mutex::new(BTreeMap::new()));

    let mut handles = Vec::with_capacity(candidates);
    for word in headwords {
        let sem = semaphore.clone();
        let lookup = lookup.clone();
        let acc = accumulator.clone();
        let timeout = config.timeout;
        let rate_limit = config.rate_limit;

        let handle = tokio::spawn({
            let word = word.clone();
            async move {
                let Ok(_permit) = sem.acquire().await else {
                    return Err("lookup pool closed".to_string());
                };

                if !rate_limit.is_zero() {
                    tokio::time::sleep(rate_limit).await;
                }

                let records = match tokio::time::timeout(timeout, lookup.lookup(&word, family)).await
                {
                    Ok(Ok(records)) => records,
                    Ok(Err(e)) => return Err(e.to_string()),
                    Err(_) => return Err(format!("timed out after {}s", timeout.as_secs_f32())),
                };

                match resolve_gender(&records) {
                    Some(tag) => {
                        acc.lock().await.insert(word, tag);
                        Ok(())
                    }
                    None => Err("no noun sense with a gender tag".to_string()),
                }
            }
        });
        handles.push((word, handle));
    }

    // Collect results
    let mut failures = Vec::new();
    for (i, (word, handle)) in handles.into_iter().enumerate() {
        let outcome = match handle.await {
            Ok(result) => result,
            Err(e) => Err(format!("lookup task failed: {e}")),
        };
        if let Err(reason) = outcome {
            debug!(headword = %word, %reason, "headword skipped");
            failures.push((word.clone(), reason));
        }
        progress.headword_done(&word, i + 1, candidates);
    }

    let entries = std::mem::take(&mut *accumulator.lock().await);
    let knowledge: KnowledgeBase = entries.into_iter().collect();

    if !failures.is_empty() {
        warn!(failed = failures.len(), "some headwords could not be resolved");
    }

    // --- Phase 3: persist ---
    progress.phase("Saving knowledge base");
    let record = BuildRecord::new(
        &config.variant,
        candidates as u64,
        knowledge.len() as u64,
        failures.len() as u64,
    );
    store.replace_all(&knowledge, &record).await?;

    let report = BuildReport {
        knowledge,
        candidates,
        failures,
        modules,
        elapsed: start.elapsed(),
    };

    info!(
        candidates = report.candidates,
        resolved = report.knowledge.len(),
        failed = report.failures.len(),
        duration_ms = report.elapsed.as_millis(),
        "knowledge base build completed"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use async_trait::async_trait;

    use super::*;
    use crammese_bundles::StaticProvider;
    use crammese_shared::BundlePair;

    use crate::progress::SilentProgress;

    struct MockLookup {
        entries: HashMap<String, Vec<SenseRecord>>,
        slow: Vec<String>,
    }

    #[async_trait]
    impl LexicalLookup for MockLookup {
        async fn lookup(&self, word: &str, _family: LanguageFamily) -> Result<Vec<SenseRecord>> {
            if self.slow.iter().any(|w| w == word) {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            self.entries
                .get(word)
                .cloned()
                .ok_or_else(|| CrammeseError::lookup(word, "HTTP 404 Not Found"))
        }
    }

    fn temp_db() -> PathBuf {
        std::env::temp_dir().join(format!("cm_builder_{}.db", uuid::Uuid::now_v7()))
    }

    fn bundle(entries: &[(&str, &str)]) -> TranslationBundle {
        entries.iter().copied().collect()
    }

    fn build_config(modules: &[&str]) -> BuildConfig {
        BuildConfig {
            variant: LanguageVariant::parse("fr_fr").unwrap(),
            modules: modules.iter().map(|m| ModuleSpec::new(*m)).collect(),
            concurrency: 4,
            timeout: Duration::from_millis(200),
            rate_limit: Duration::ZERO,
        }
    }

    #[test]
    fn collect_filters_categories_and_short_words() {
        let mut out = BTreeSet::new();
        collect_headwords(
            LanguageFamily::French,
            &bundle(&[
                ("item.minecraft.apple", "Pomme"),
                ("block.minecraft.stone", "Pierre taillée"),
                ("item.minecraft.egg", "Œuf"),
                ("entity.minecraft.ox", "Un bœuf"),
                ("gui.done", "Terminé"),
            ]),
            false,
            &mut out,
        );
        let words: Vec<_> = out.into_iter().collect();
        assert_eq!(words, vec!["pierre", "pomme", "œuf"]);
    }

    #[test]
    fn collect_applies_module_corrections() {
        let mut out = BTreeSet::new();
        collect_headwords(
            LanguageFamily::German,
            &bundle(&[("item.mod.milk", "Kokusnuss-Milch")]),
            true,
            &mut out,
        );
        assert!(out.contains("Milch"));

        let mut out = BTreeSet::new();
        collect_headwords(
            LanguageFamily::German,
            &bundle(&[("item.mod.nut", "Kokusnuss")]),
            true,
            &mut out,
        );
        assert!(out.contains("Kokosnuss"));
    }

    #[test]
    fn gender_priority() {
        let feminine = [SenseRecord::new("noun", &["feminine"])];
        assert_eq!(resolve_gender(&feminine), Some(GenderTag::Feminine));

        let plural = [SenseRecord::new("noun", &["masculine", "plural"])];
        assert_eq!(resolve_gender(&plural), Some(GenderTag::Plural));

        let neuter = [SenseRecord::new("noun", &["feminine", "neuter"])];
        assert_eq!(resolve_gender(&neuter), Some(GenderTag::Neuter));
    }

    #[test]
    fn first_noun_record_wins() {
        let records = [
            SenseRecord::new("verb", &["masculine"]),
            SenseRecord::new("noun", &["feminine"]),
            SenseRecord::new("noun", &["masculine"]),
        ];
        assert_eq!(resolve_gender(&records), Some(GenderTag::Feminine));

        let untagged = [SenseRecord::new("noun", &["countable"])];
        assert_eq!(resolve_gender(&untagged), None);
        assert_eq!(resolve_gender(&[]), None);
    }

    #[tokio::test]
    async fn build_resolves_and_skips() {
        let provider = StaticProvider::new()
            .with_base(
                "fr_fr",
                BundlePair {
                    source: bundle(&[
                        ("item.minecraft.apple", "Pomme"),
                        ("item.minecraft.bread", "Pain"),
                        ("item.minecraft.stick", "Bâton"),
                        ("item.minecraft.slow", "Lenteur"),
                    ]),
                    reference: TranslationBundle::new(),
                },
            )
            .with_module(
                "mod",
                "fr_fr",
                BundlePair {
                    source: bundle(&[("block.mod.eggs", "Œufs brouillés")]),
                    reference: TranslationBundle::new(),
                },
            );

        let lookup = MockLookup {
            entries: HashMap::from([
                ("pomme".to_string(), vec![SenseRecord::new("noun", &["feminine"])]),
                ("pain".to_string(), vec![SenseRecord::new("noun", &["masculine"])]),
                (
                    "œufs".to_string(),
                    vec![SenseRecord::new("noun", &["masculine", "plural"])],
                ),
                ("bâton".to_string(), vec![SenseRecord::new("verb", &[])]),
                ("lenteur".to_string(), vec![SenseRecord::new("noun", &["feminine"])]),
            ]),
            slow: vec!["lenteur".to_string()],
        };

        let store = KnowledgeStore::open(&temp_db()).await.unwrap();
        let report = build_knowledge_base(
            &build_config(&["mod", "absent"]),
            &provider,
            Arc::new(lookup),
            &store,
            &SilentProgress,
        )
        .await
        .expect("build");

        assert_eq!(report.candidates, 5);
        assert_eq!(report.knowledge.len(), 3);
        assert_eq!(report.knowledge.get("pomme"), Some(GenderTag::Feminine));
        assert_eq!(report.knowledge.get("œufs"), Some(GenderTag::Plural));

        let failed: Vec<_> = report.failures.iter().map(|(w, _)| w.as_str()).collect();
        assert_eq!(failed, vec!["bâton", "lenteur"]);
        assert!(!report.modules[1].is_loaded());

        let stored = store.load().await.unwrap();
        assert_eq!(stored, report.knowledge);
        let last = store.last_build().await.unwrap().expect("build record");
        assert_eq!((last.candidates, last.resolved, last.failed), (5, 3, 2));
    }

    #[tokio::test]
    async fn build_refuses_languages_without_lexicon() {
        let store = KnowledgeStore::open(&temp_db()).await.unwrap();
        let mut config = build_config(&[]);
        config.variant = LanguageVariant::parse("ja_jp").unwrap();

        let err = build_knowledge_base(
            &config,
            &StaticProvider::new(),
            Arc::new(MockLookup {
                entries: HashMap::new(),
                slow: Vec::new(),
            }),
            &store,
            &SilentProgress,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CrammeseError::Config { .. }));
    }

    /// Installation without any reference-language files: pair loads fail,
    /// target-language loads succeed.
    struct TargetOnlyInstall;

    impl BundleProvider for TargetOnlyInstall {
        fn base_bundle(&self, _variant: &LanguageVariant) -> Result<BundlePair> {
            Err(CrammeseError::io(
                "versions/1.21/1.21.jar",
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ))
        }

        fn module_bundle(&self, module: &ModuleSpec, _variant: &LanguageVariant) -> Result<BundlePair> {
            Err(CrammeseError::TranslationFileNotFound {
                module: module.id.clone(),
                variant: "en_us".into(),
            })
        }

        fn base_source(&self, _variant: &LanguageVariant) -> Result<TranslationBundle> {
            Ok(bundle(&[("item.minecraft.apple", "Pomme")]))
        }

        fn module_source(
            &self,
            module: &ModuleSpec,
            _variant: &LanguageVariant,
        ) -> Result<TranslationBundle> {
            Ok(bundle(&[(format!("block.{}.chair", module.id).as_str(), "Chaise")]))
        }

        fn name(&self) -> &str {
            "target-only"
        }
    }

    #[tokio::test]
    async fn build_reads_target_bundles_only() {
        let lookup = MockLookup {
            entries: HashMap::from([
                ("pomme".to_string(), vec![SenseRecord::new("noun", &["feminine"])]),
                ("chaise".to_string(), vec![SenseRecord::new("noun", &["feminine"])]),
            ]),
            slow: Vec::new(),
        };

        let store = KnowledgeStore::open(&temp_db()).await.unwrap();
        let report = build_knowledge_base(
            &build_config(&["cfm"]),
            &TargetOnlyInstall,
            Arc::new(lookup),
            &store,
            &SilentProgress,
        )
        .await
        .expect("build without reference files");

        assert!(report.modules[0].is_loaded());
        assert_eq!(report.knowledge.get("pomme"), Some(GenderTag::Feminine));
        assert_eq!(report.knowledge.get("chaise"), Some(GenderTag::Feminine));
    }
}

//! Pipelines for Crammese.
//!
//! Ties the annotation rules, bundle providers, lexical lookup, and
//! knowledge base storage together into the two end-to-end workflows:
//! merging a bilingual language file and building a knowledge base.

pub mod builder;
pub mod merge;
pub mod progress;
pub mod writer;

pub use builder::{BuildConfig, BuildReport, build_knowledge_base, collect_headwords, resolve_gender};
pub use merge::{
    LoadedModule, LoadedSource, MergeConfig, MergeReport, ModuleDiagnostic, ModuleOutcome,
    SkipReason, load_module_source_with_fallback, load_module_with_fallback, merge_translations,
};
pub use progress::{ProgressReporter, SilentProgress};
pub use writer::{
    WriteSummary, ensure_pack_metadata, language_file_path, pack_language_code,
    write_language_file,
};

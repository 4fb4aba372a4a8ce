//! Shared types, error model, and configuration for Crammese.
//!
//! This crate is the foundation depended on by all other Crammese crates.
//! It provides:
//! - [`CrammeseError`], the unified error type
//! - Domain types ([`TranslationBundle`], [`LanguageVariant`], [`KnowledgeBase`], ...)
//! - Configuration ([`AppConfig`] and config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, InstallConfig, LexiconConfig, PackConfig, config_dir,
    config_file_path, init_config, init_config_at, load_config, load_config_from,
};
pub use error::{CrammeseError, Result};
pub use types::{
    BundlePair, Category, GenderTag, KnowledgeBase, LanguageFamily, LanguageVariant,
    MergedTranslationMap, ModuleSpec, TranslationBundle,
};

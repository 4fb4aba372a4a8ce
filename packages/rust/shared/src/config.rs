//! Application configuration for Crammese.
//!
//! User config lives at `~/.crammese/crammese.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CrammeseError, Result};
use crate::types::ModuleSpec;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "crammese.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".crammese";

// ---------------------------------------------------------------------------
// Config structs (matching crammese.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Game installation paths. Detected when unset.
    #[serde(default)]
    pub install: InstallConfig,

    /// Lexical source settings used by `build-kb`.
    #[serde(default)]
    pub lexicon: LexiconConfig,

    /// Resource pack metadata.
    #[serde(default)]
    pub pack: PackConfig,

    /// Modules to merge, in priority order (later wins).
    #[serde(default = "default_modules")]
    pub modules: Vec<ModuleSpec>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            defaults: DefaultsConfig::default(),
            install: InstallConfig::default(),
            lexicon: LexiconConfig::default(),
            pack: PackConfig::default(),
            modules: default_modules(),
        }
    }
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Target language variant (the language being learned).
    #[serde(default = "default_language")]
    pub language: String,

    /// Reference language variant (the learner's own language).
    #[serde(default = "default_reference_language")]
    pub reference_language: String,

    /// Game version whose jar supplies the reference bundle.
    #[serde(default = "default_game_version")]
    pub game_version: String,

    /// Launcher instance holding the `mods/` directory.
    #[serde(default = "default_instance")]
    pub instance: String,

    /// Resource pack output directory.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Directory holding the per-language knowledge base databases.
    #[serde(default = "default_knowledge_dir")]
    pub knowledge_dir: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            reference_language: default_reference_language(),
            game_version: default_game_version(),
            instance: default_instance(),
            output_dir: default_output_dir(),
            knowledge_dir: default_knowledge_dir(),
        }
    }
}

fn default_language() -> String {
    "fr_fr".into()
}
fn default_reference_language() -> String {
    "en_us".into()
}
fn default_game_version() -> String {
    "1.21".into()
}
fn default_instance() -> String {
    "1.21".into()
}
fn default_output_dir() -> String {
    "resourcepacks/crammese".into()
}
fn default_knowledge_dir() -> String {
    "knowledgebase".into()
}

/// `[install]` section. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallConfig {
    /// Game home (contains `assets/` and `versions/`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_dir: Option<String>,

    /// Directory containing the module jars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mods_dir: Option<String>,

    /// Asset index name to use instead of the newest one (e.g. `"17"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_index: Option<String>,
}

/// `[lexicon]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexiconConfig {
    /// Base URL of the Kaikki dictionary extract.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Maximum concurrent lookups.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Per-lookup timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Minimum ms between lookups, per worker.
    #[serde(default)]
    pub rate_limit_ms: u64,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
            rate_limit_ms: 0,
        }
    }
}

fn default_base_url() -> String {
    "https://kaikki.org/dictionary".into()
}
fn default_concurrency() -> u32 {
    4
}
fn default_timeout_secs() -> u64 {
    10
}

/// `[pack]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackConfig {
    /// `pack_format` written to `pack.mcmeta`.
    #[serde(default = "default_pack_format")]
    pub pack_format: u32,

    #[serde(default = "default_description")]
    pub description: String,

    /// Display name of the generated language in the game's language menu.
    #[serde(default = "default_language_name")]
    pub language_name: String,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            pack_format: default_pack_format(),
            description: default_description(),
            language_name: default_language_name(),
        }
    }
}

fn default_pack_format() -> u32 {
    34
}
fn default_description() -> String {
    "Crammese: learn a language while you play".into()
}
fn default_language_name() -> String {
    "Crammese".into()
}

/// Supported modules, in merge priority order.
fn default_modules() -> Vec<ModuleSpec> {
    const IDS: &[&str] = &[
        "advancementframes",
        "areas",
        "betterlily",
        "betterpvp",
        "biomesoplenty",
        "cfm",
        "comforts",
        "croptopia",
        "curios",
        "dummmmmmy",
        "explorerscompass",
        "farmersdelight",
        "goated",
        "hauntedharvest",
        "heartstone",
        "jade",
        "jeed",
        "jei",
        "labels",
        "map_atlases",
        "mcw-bridges",
        "mcw-doors",
        "mcw-fences",
        "mcw-lights",
        "mcw-paintings",
        "mcw-paths",
        "mcw-roofs",
        "mcw-trapdoors",
        "mcw-windows",
        "modmenu",
        "moonlight",
        "moyai",
        "naturescompass",
        "oculus",
        "polytone",
        "sereneseasons",
        "sleep_tight",
        "smarterfarmers",
        "snowyspirit",
        "supplementaries",
        "suppsquared",
        "terralith",
        "toughasnails",
        "wthit",
        "xaeros_minimap",
    ];

    IDS.iter()
        .map(|id| match *id {
            "betterpvp" => ModuleSpec::with_namespace(*id, "xaerobetterpvp"),
            "mcw-trapdoors" => ModuleSpec::with_namespace(*id, "mcwtrpdoors"),
            "oculus" => ModuleSpec::with_namespace(*id, "iris"),
            "wthit" => ModuleSpec::with_namespace(*id, "waila"),
            "xaeros_minimap" => ModuleSpec::with_namespace(*id, "xaerominimap"),
            _ => ModuleSpec::new(*id),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.crammese/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CrammeseError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.crammese/crammese.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CrammeseError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| CrammeseError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}

/// Write a default config file at `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| CrammeseError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CrammeseError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| CrammeseError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(())
}

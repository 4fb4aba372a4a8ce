//! Bundle provider backed by a local game installation.
//!
//! Layout:
//! - base source text: `assets/indexes/<n>.json` → object hash →
//!   `assets/objects/<hh>/<hash>`
//! - base reference text: `versions/<v>/<v>.jar!assets/minecraft/lang/<ref>.json`
//! - module text: `<mods>/<id>*.jar!assets/<namespace>/lang/<variant>.json`

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crammese_shared::{
    AppConfig, BundlePair, CrammeseError, LanguageVariant, ModuleSpec, Result, TranslationBundle,
};

use crate::BundleProvider;
use crate::json::decode_bundle;

/// Namespace of the base game's assets.
const BASE_NAMESPACE: &str = "minecraft";

// ---------------------------------------------------------------------------
// Layout detection
// ---------------------------------------------------------------------------

/// Resolved installation directories.
#[derive(Debug, Clone)]
pub struct InstallLayout {
    /// Game home containing `assets/` and `versions/`.
    pub game_dir: PathBuf,
    /// Directory holding module jars.
    pub mods_dir: PathBuf,
    /// Asset index to read; the newest numeric index when `None`.
    pub asset_index: Option<String>,
}

impl InstallLayout {
    /// Resolve directories from config overrides, falling back to detection.
    ///
    /// A CurseForge install (`~/curseforge/minecraft`) takes precedence over
    /// the launcher's default `.minecraft` directory.
    pub fn detect(config: &AppConfig) -> Result<Self> {
        let install = &config.install;
        let home = dirs::home_dir()
            .ok_or_else(|| CrammeseError::config("could not determine home directory"))?;

        let curseforge = home.join("curseforge").join("minecraft");
        let (detected_game, detected_mods) = if curseforge.exists() {
            debug!(path = ?curseforge, "detected CurseForge install");
            (
                curseforge.join("Install"),
                curseforge
                    .join("Instances")
                    .join(&config.defaults.instance)
                    .join("mods"),
            )
        } else {
            let game = default_game_dir(&home);
            let mods = game.join("mods");
            (game, mods)
        };

        Ok(Self {
            game_dir: install
                .game_dir
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or(detected_game),
            mods_dir: install
                .mods_dir
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or(detected_mods),
            asset_index: install.asset_index.clone(),
        })
    }
}

/// Default launcher directory for the current platform.
fn default_game_dir(home: &Path) -> PathBuf {
    if cfg!(target_os = "windows") {
        dirs::data_dir()
            .unwrap_or_else(|| home.join("AppData").join("Roaming"))
            .join(".minecraft")
    } else if cfg!(target_os = "macos") {
        home.join("Library")
            .join("Application Support")
            .join("minecraft")
    } else {
        home.join(".minecraft")
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Reads bundles straight out of the installation's files and jars.
#[derive(Debug, Clone)]
pub struct GameInstall {
    layout: InstallLayout,
    reference: LanguageVariant,
    game_version: String,
}

impl GameInstall {
    pub fn new(
        layout: InstallLayout,
        reference: LanguageVariant,
        game_version: impl Into<String>,
    ) -> Self {
        Self {
            layout,
            reference,
            game_version: game_version.into(),
        }
    }

    /// Path of the asset index in use.
    fn index_path(&self) -> Result<PathBuf> {
        let dir = self.layout.game_dir.join("assets").join("indexes");

        if let Some(name) = &self.layout.asset_index {
            return Ok(dir.join(format!("{name}.json")));
        }

        let entries = std::fs::read_dir(&dir).map_err(|e| CrammeseError::io(&dir, e))?;
        let newest = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let path = entry.path();
                let number = path.file_stem()?.to_str()?.parse::<u32>().ok()?;
                Some((number, path))
            })
            .max_by_key(|(number, _)| *number);

        newest.map(|(_, path)| path).ok_or_else(|| {
            CrammeseError::config(format!("no numeric asset index in {}", dir.display()))
        })
    }

    /// Load the base game's target-language text through the object store.
    fn read_base_source(&self, variant: &LanguageVariant) -> Result<TranslationBundle> {
        let index_path = self.index_path()?;
        debug!(path = ?index_path, "reading asset index");

        let raw = std::fs::read(&index_path).map_err(|e| CrammeseError::io(&index_path, e))?;
        let index: serde_json::Value = serde_json::from_slice(&raw)
            .map_err(|e| CrammeseError::malformed(index_path.display().to_string(), e.to_string()))?;

        let object_key = format!("{BASE_NAMESPACE}/lang/{variant}.json");
        let hash = index
            .get("objects")
            .and_then(|objects| objects.get(&object_key))
            .and_then(|object| object.get("hash"))
            .and_then(|hash| hash.as_str())
            .ok_or_else(|| CrammeseError::TranslationFileNotFound {
                module: BASE_NAMESPACE.into(),
                variant: variant.to_string(),
            })?;

        if hash.len() < 2 || !hash.is_ascii() {
            return Err(CrammeseError::malformed(
                index_path.display().to_string(),
                format!("invalid object hash '{hash}'"),
            ));
        }

        let object_path = self
            .layout
            .game_dir
            .join("assets")
            .join("objects")
            .join(&hash[..2])
            .join(hash);
        let bytes = std::fs::read(&object_path).map_err(|e| CrammeseError::io(&object_path, e))?;
        decode_bundle(&object_path.display().to_string(), &bytes)
    }

    /// First jar (sorted by name) matching `<mods>/<id>*.jar`.
    fn find_module_jar(&self, module: &ModuleSpec) -> Result<PathBuf> {
        let dir = glob::Pattern::escape(&self.layout.mods_dir.to_string_lossy());
        let id = glob::Pattern::escape(&module.id);
        let pattern = format!("{dir}/{id}*.jar");

        let mut jars: Vec<PathBuf> = glob::glob(&pattern)
            .map_err(|e| CrammeseError::config(format!("bad module pattern '{pattern}': {e}")))?
            .filter_map(|entry| entry.ok())
            .collect();
        jars.sort();

        jars.into_iter()
            .next()
            .ok_or_else(|| CrammeseError::ModuleNotFound {
                module: module.id.clone(),
            })
    }
}

impl BundleProvider for GameInstall {
    #[instrument(skip_all, fields(variant = %variant))]
    fn base_bundle(&self, variant: &LanguageVariant) -> Result<BundlePair> {
        let source = self.read_base_source(variant)?;

        let jar = self
            .layout
            .game_dir
            .join("versions")
            .join(&self.game_version)
            .join(format!("{}.jar", self.game_version));
        let reference = read_jar_bundle(&jar, BASE_NAMESPACE, BASE_NAMESPACE, &self.reference)?;

        debug!(
            source = source.len(),
            reference = reference.len(),
            "loaded base bundles"
        );
        Ok(BundlePair { source, reference })
    }

    #[instrument(skip_all, fields(module = %module.id, variant = %variant))]
    fn module_bundle(&self, module: &ModuleSpec, variant: &LanguageVariant) -> Result<BundlePair> {
        let jar = self.find_module_jar(module)?;
        let namespace = module.asset_namespace();

        let source = read_jar_bundle(&jar, &module.id, &namespace, variant)?;
        let reference = read_jar_bundle(&jar, &module.id, &namespace, &self.reference)?;

        debug!(jar = ?jar, entries = source.len(), "loaded module bundles");
        Ok(BundlePair { source, reference })
    }

    #[instrument(skip_all, fields(variant = %variant))]
    fn base_source(&self, variant: &LanguageVariant) -> Result<TranslationBundle> {
        self.read_base_source(variant)
    }

    #[instrument(skip_all, fields(module = %module.id, variant = %variant))]
    fn module_source(
        &self,
        module: &ModuleSpec,
        variant: &LanguageVariant,
    ) -> Result<TranslationBundle> {
        let jar = self.find_module_jar(module)?;
        read_jar_bundle(&jar, &module.id, &module.asset_namespace(), variant)
    }

    fn name(&self) -> &str {
        "game-install"
    }
}

/// Read `assets/<namespace>/lang/<variant>.json` from a jar.
fn read_jar_bundle(
    jar: &Path,
    module_id: &str,
    namespace: &str,
    variant: &LanguageVariant,
) -> Result<TranslationBundle> {
    let file = File::open(jar).map_err(|e| CrammeseError::io(jar, e))?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| CrammeseError::malformed(jar.display().to_string(), e.to_string()))?;

    let entry_name = format!("assets/{namespace}/lang/{variant}.json");
    let origin = format!("{}!{entry_name}", jar.display());

    let mut entry = match archive.by_name(&entry_name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(CrammeseError::TranslationFileNotFound {
                module: module_id.to_string(),
                variant: variant.to_string(),
            });
        }
        Err(e) => return Err(CrammeseError::malformed(origin, e.to_string())),
    };

    let mut bytes = Vec::new();
    entry
        .read_to_end(&mut bytes)
        .map_err(|e| CrammeseError::malformed(origin.clone(), e.to_string()))?;

    decode_bundle(&origin, &bytes)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    struct Fixture {
        root: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let root = std::env::temp_dir().join(format!("cm_install_{}", uuid::Uuid::now_v7()));
            std::fs::create_dir_all(root.join("game/assets/indexes")).unwrap();
            std::fs::create_dir_all(root.join("game/versions/1.21")).unwrap();
            std::fs::create_dir_all(root.join("mods")).unwrap();
            Self { root }
        }

        fn game(&self) -> PathBuf {
            self.root.join("game")
        }

        fn mods(&self) -> PathBuf {
            self.root.join("mods")
        }

        fn write_object(&self, index: &str, variant: &str, hash: &str, body: &str) {
            let index_body = format!(
                r#"{{"objects": {{"minecraft/lang/{variant}.json": {{"hash": "{hash}", "size": 1}}}}}}"#
            );
            std::fs::write(
                self.game().join(format!("assets/indexes/{index}.json")),
                index_body,
            )
            .unwrap();

            let dir = self.game().join("assets/objects").join(&hash[..2]);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join(hash), body).unwrap();
        }

        fn provider(&self) -> GameInstall {
            let layout = InstallLayout {
                game_dir: self.game(),
                mods_dir: self.mods(),
                asset_index: None,
            };
            GameInstall::new(layout, LanguageVariant::parse("en_us").unwrap(), "1.21")
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.root);
        }
    }

    fn write_jar(path: &Path, files: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, body) in files {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn base_bundle_uses_newest_index() {
        let fx = Fixture::new();
        fx.write_object("5", "fr_fr", "aa11", r#"{"item.minecraft.apple": "Vieille"}"#);
        fx.write_object("17", "fr_fr", "bb22", r#"{"item.minecraft.apple": "Pomme"}"#);
        write_jar(
            &fx.game().join("versions/1.21/1.21.jar"),
            &[("assets/minecraft/lang/en_us.json", r#"{"item.minecraft.apple": "Apple"}"#)],
        );

        let pair = fx
            .provider()
            .base_bundle(&LanguageVariant::parse("fr_fr").unwrap())
            .expect("base bundle");
        assert_eq!(pair.source.get("item.minecraft.apple"), Some("Pomme"));
        assert_eq!(pair.reference.get("item.minecraft.apple"), Some("Apple"));
    }

    #[test]
    fn base_bundle_missing_variant() {
        let fx = Fixture::new();
        fx.write_object("17", "fr_fr", "bb22", "{}");

        let err = fx
            .provider()
            .base_bundle(&LanguageVariant::parse("de_de").unwrap())
            .unwrap_err();
        assert!(matches!(err, CrammeseError::TranslationFileNotFound { .. }));
    }

    #[test]
    fn module_bundle_reads_namespaced_entries() {
        let fx = Fixture::new();
        write_jar(
            &fx.mods().join("wthit-forge-12.0.jar"),
            &[
                (
                    "assets/waila/lang/fr_fr.json",
                    "{\n// translated\n\"config.waila.x\": \"Option\"\n}",
                ),
                ("assets/waila/lang/en_us.json", r#"{"config.waila.x": "Setting"}"#),
            ],
        );

        let module = ModuleSpec::with_namespace("wthit", "waila");
        let pair = fx
            .provider()
            .module_bundle(&module, &LanguageVariant::parse("fr_fr").unwrap())
            .expect("module bundle");
        assert_eq!(pair.source.get("config.waila.x"), Some("Option"));
        assert_eq!(pair.reference.get("config.waila.x"), Some("Setting"));
    }

    #[test]
    fn module_failure_kinds_are_distinct() {
        let fx = Fixture::new();
        write_jar(
            &fx.mods().join("jei-1.21.jar"),
            &[("assets/jei/lang/en_us.json", "{}")],
        );
        write_jar(
            &fx.mods().join("cfm-7.0.jar"),
            &[
                ("assets/cfm/lang/fr_fr.json", "{ broken"),
                ("assets/cfm/lang/en_us.json", "{}"),
            ],
        );
        let provider = fx.provider();
        let fr = LanguageVariant::parse("fr_fr").unwrap();

        let missing = provider.module_bundle(&ModuleSpec::new("absent"), &fr).unwrap_err();
        assert!(matches!(missing, CrammeseError::ModuleNotFound { .. }));

        let no_file = provider.module_bundle(&ModuleSpec::new("jei"), &fr).unwrap_err();
        assert!(matches!(no_file, CrammeseError::TranslationFileNotFound { .. }));

        let broken = provider.module_bundle(&ModuleSpec::new("cfm"), &fr).unwrap_err();
        assert!(matches!(broken, CrammeseError::MalformedBundle { .. }));
    }

    #[test]
    fn source_only_reads_need_no_reference_files() {
        let fx = Fixture::new();
        fx.write_object("17", "fr_fr", "bb22", r#"{"item.minecraft.apple": "Pomme"}"#);
        write_jar(
            &fx.mods().join("cfm-7.0.jar"),
            &[("assets/cfm/lang/fr_fr.json", r#"{"block.cfm.chair": "Chaise"}"#)],
        );
        let provider = fx.provider();
        let fr = LanguageVariant::parse("fr_fr").unwrap();

        // No version jar and no en_us.json in the module jar.
        assert!(provider.base_bundle(&fr).is_err());
        assert!(provider.module_bundle(&ModuleSpec::new("cfm"), &fr).is_err());

        let base = provider.base_source(&fr).expect("base source");
        assert_eq!(base.get("item.minecraft.apple"), Some("Pomme"));

        let module = provider
            .module_source(&ModuleSpec::new("cfm"), &fr)
            .expect("module source");
        assert_eq!(module.get("block.cfm.chair"), Some("Chaise"));

        let missing = provider
            .module_source(&ModuleSpec::new("absent"), &fr)
            .unwrap_err();
        assert!(matches!(missing, CrammeseError::ModuleNotFound { .. }));
    }
}

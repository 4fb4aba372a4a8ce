//! Output writer: the merged language file and the resource pack metadata.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};
use tracing::{debug, info, instrument};

use crammese_shared::{CrammeseError, LanguageVariant, MergedTranslationMap, PackConfig, Result};

/// Result of writing a language file.
#[derive(Debug, Clone)]
pub struct WriteSummary {
    pub path: PathBuf,
    pub entries: usize,
    pub bytes: usize,
}

/// Language code declared by the pack, e.g. `cm_fr` or `cm_ar`.
pub fn pack_language_code(variant: &LanguageVariant) -> String {
    format!("cm_{}", variant.output_code())
}

/// Path of the language file for `variant` under `output_dir`.
pub fn language_file_path(output_dir: &Path, variant: &LanguageVariant) -> PathBuf {
    output_dir
        .join("assets")
        .join("minecraft")
        .join("lang")
        .join(format!("{}.json", pack_language_code(variant)))
}

/// Write `map` as the pack language file for `variant`.
///
/// Keys are sorted and the file is written to a temp file then renamed into
/// place, so a reader never sees a partial file.
#[instrument(skip_all, fields(output_dir = %output_dir.display(), variant = %variant))]
pub fn write_language_file(
    output_dir: &Path,
    variant: &LanguageVariant,
    map: &MergedTranslationMap,
) -> Result<WriteSummary> {
    let target = language_file_path(output_dir, variant);
    let json = serde_json::to_string_pretty(map).map_err(|e| {
        CrammeseError::validation(format!("JSON serialization failed: {e}"))
    })?;

    write_atomic(&target, &json)?;

    let summary = WriteSummary {
        path: target,
        entries: map.len(),
        bytes: json.len(),
    };
    info!(
        path = %summary.path.display(),
        entries = summary.entries,
        bytes = summary.bytes,
        "language file written"
    );
    Ok(summary)
}

/// Create or update `pack.mcmeta` so it declares the language for `variant`.
///
/// Other languages and keys already present in the file are kept.
#[instrument(skip_all, fields(output_dir = %output_dir.display(), variant = %variant))]
pub fn ensure_pack_metadata(
    output_dir: &Path,
    variant: &LanguageVariant,
    pack: &PackConfig,
) -> Result<PathBuf> {
    let path = output_dir.join("pack.mcmeta");

    let mut root = if path.exists() {
        let content =
            std::fs::read_to_string(&path).map_err(|e| CrammeseError::io(&path, e))?;
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(CrammeseError::validation(
                    "invalid pack.mcmeta: root is not an object",
                ));
            }
            Err(e) => {
                return Err(CrammeseError::validation(format!("invalid pack.mcmeta: {e}")));
            }
        }
    } else {
        Map::new()
    };

    root.entry("pack").or_insert_with(|| {
        json!({
            "pack_format": pack.pack_format,
            "description": pack.description,
        })
    });

    let languages = root
        .entry("language")
        .or_insert_with(|| Value::Object(Map::new()));
    let Value::Object(languages) = languages else {
        return Err(CrammeseError::validation(
            "invalid pack.mcmeta: `language` is not an object",
        ));
    };
    languages.insert(
        pack_language_code(variant),
        json!({
            "name": pack.language_name,
            "region": variant.family().display_name(),
            "bidirectional": false,
        }),
    );

    let json = serde_json::to_string_pretty(&Value::Object(root)).map_err(|e| {
        CrammeseError::validation(format!("JSON serialization failed: {e}"))
    })?;
    write_atomic(&path, &json)?;

    debug!(path = %path.display(), "pack metadata updated");
    Ok(path)
}

fn write_atomic(target: &Path, content: &str) -> Result<()> {
    let dir = target
        .parent()
        .ok_or_else(|| CrammeseError::validation(format!("no parent for {}", target.display())))?;
    std::fs::create_dir_all(dir).map_err(|e| CrammeseError::io(dir, e))?;

    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = dir.join(format!(".{file_name}.tmp"));

    std::fs::write(&temp, content).map_err(|e| CrammeseError::io(&temp, e))?;
    std::fs::rename(&temp, target).map_err(|e| CrammeseError::io(target, e))?;
    Ok(())
}

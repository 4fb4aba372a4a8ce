//! Core domain types: language variants, translation bundles, gender tags,
//! knowledge bases and the merged output map.

use std::collections::{BTreeMap, HashMap, btree_map};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CrammeseError, Result};

// ---------------------------------------------------------------------------
// LanguageFamily
// ---------------------------------------------------------------------------

/// Language family of a target variant. Drives which rule tables apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageFamily {
    French,
    Spanish,
    German,
    Other,
}

impl LanguageFamily {
    /// Resolve the family from a two-letter language code (`fr`, `es`, `de`, ...).
    pub fn from_language(language: &str) -> Self {
        match language {
            "fr" => Self::French,
            "es" => Self::Spanish,
            "de" => Self::German,
            _ => Self::Other,
        }
    }

    /// Human-readable family name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::French => "French",
            Self::Spanish => "Spanish",
            Self::German => "German",
            Self::Other => "Other",
        }
    }

    /// Directory name used by the lexical source, if the family has one.
    pub fn lexicon_name(&self) -> Option<&'static str> {
        match self {
            Self::French => Some("French"),
            Self::Spanish => Some("Spanish"),
            Self::German => Some("German"),
            Self::Other => None,
        }
    }

    /// Compounding languages key their headwords on the last hyphen segment.
    pub fn is_compounding(&self) -> bool {
        matches!(self, Self::German)
    }

    /// Normalize a first token into a knowledge-base headword.
    ///
    /// Compounding families keep case (nouns are capitalized) and take the
    /// final hyphen segment; every other family lowercases the token.
    pub fn normalize_headword(&self, token: &str) -> String {
        if self.is_compounding() {
            token.rsplit('-').next().unwrap_or(token).to_string()
        } else {
            token.to_lowercase()
        }
    }
}

// ---------------------------------------------------------------------------
// LanguageVariant
// ---------------------------------------------------------------------------

/// A regional language variant code such as `fr_fr` or `es_ar`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageVariant(String);

impl LanguageVariant {
    /// Parse and validate a `ll_rr` code. Input is lowercased.
    pub fn parse(code: &str) -> Result<Self> {
        let code = code.trim().to_lowercase();
        let valid = match code.split_once('_') {
            Some((lang, region)) => {
                !lang.is_empty()
                    && !region.is_empty()
                    && lang.chars().all(|c| c.is_ascii_lowercase())
                    && region.chars().all(|c| c.is_ascii_alphanumeric())
            }
            None => false,
        };

        if !valid {
            return Err(CrammeseError::validation(format!(
                "invalid language variant '{code}': expected a code like 'fr_fr'"
            )));
        }
        Ok(Self(code))
    }

    /// The full code, e.g. `es_ar`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The language part, e.g. `es` for `es_ar`.
    pub fn language(&self) -> &str {
        self.0.split('_').next().unwrap_or(&self.0)
    }

    pub fn family(&self) -> LanguageFamily {
        LanguageFamily::from_language(self.language())
    }

    /// Ordered regional variants to try when a module lacks this exact variant.
    pub fn fallbacks(&self) -> Vec<LanguageVariant> {
        let codes: &[&str] = match (self.language(), self.as_str()) {
            (_, "es_ar") => &["es_mx", "es_es"],
            ("es", code) if code != "es_es" => &["es_es"],
            ("fr", code) if code != "fr_fr" => &["fr_fr"],
            ("de", code) if code != "de_de" => &["de_de"],
            _ => &[],
        };
        codes.iter().map(|c| Self((*c).to_string())).collect()
    }

    /// Code used for the generated language file (`cm_<code>.json`).
    pub fn output_code(&self) -> String {
        if self.0 == "es_ar" {
            "ar".to_string()
        } else {
            self.language().to_string()
        }
    }
}

impl std::fmt::Display for LanguageVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LanguageVariant {
    type Err = CrammeseError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LanguageVariant {
    type Error = CrammeseError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<LanguageVariant> for String {
    fn from(value: LanguageVariant) -> Self {
        value.0
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Noun-bearing translation key categories (the key's first dotted segment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Item,
    Block,
    Entity,
    Biome,
    Container,
}

impl Category {
    /// Category of a dotted key like `item.minecraft.apple`, if noun-bearing.
    pub fn of_key(key: &str) -> Option<Self> {
        let (prefix, _) = key.split_once('.')?;
        match prefix {
            "item" => Some(Self::Item),
            "block" => Some(Self::Block),
            "entity" => Some(Self::Entity),
            "biome" => Some(Self::Biome),
            "container" => Some(Self::Container),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// GenderTag
// ---------------------------------------------------------------------------

/// Grammatical category assigned to a headword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenderTag {
    Masculine,
    Feminine,
    Neuter,
    Plural,
    Unknown,
}

impl GenderTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Masculine => "masculine",
            Self::Feminine => "feminine",
            Self::Neuter => "neuter",
            Self::Plural => "plural",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for GenderTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenderTag {
    type Err = CrammeseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "masculine" => Ok(Self::Masculine),
            "feminine" => Ok(Self::Feminine),
            "neuter" => Ok(Self::Neuter),
            "plural" => Ok(Self::Plural),
            "unknown" => Ok(Self::Unknown),
            other => Err(CrammeseError::parse(format!("unknown gender tag '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// TranslationBundle
// ---------------------------------------------------------------------------

/// Immutable mapping from translation key to literal text, for one content
/// source and one language variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationBundle(BTreeMap<String, String>);

impl TranslationBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a JSON language file.
    ///
    /// `@`-prefixed metadata keys are ignored and non-string values are
    /// skipped. `origin` names the file for error messages.
    pub fn from_json_str(origin: &str, text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| CrammeseError::malformed(origin, e.to_string()))?;

        let obj = value
            .as_object()
            .ok_or_else(|| CrammeseError::malformed(origin, "root must be an object"))?;

        let mut entries = BTreeMap::new();
        for (key, value) in obj {
            if key.starts_with('@') {
                continue;
            }
            match value.as_str() {
                Some(text) => {
                    entries.insert(key.clone(), text.to_string());
                }
                None => tracing::warn!(origin, key = %key, "value is not a string, skipping"),
            }
        }
        Ok(Self(entries))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TranslationBundle {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Source-language and reference-language bundles of one content source.
#[derive(Debug, Clone, Default)]
pub struct BundlePair {
    /// Target-language text (the language being learned).
    pub source: TranslationBundle,
    /// Reference-language text (the learner's own language).
    pub reference: TranslationBundle,
}

// ---------------------------------------------------------------------------
// KnowledgeBase
// ---------------------------------------------------------------------------

/// Headword → gender table for one target language. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    entries: HashMap<String, GenderTag>,
}

impl KnowledgeBase {
    pub fn get(&self, headword: &str) -> Option<GenderTag> {
        self.entries.get(headword).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by headword.
    pub fn sorted_entries(&self) -> Vec<(&str, GenderTag)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(word, tag)| (word.as_str(), *tag))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl<K: Into<String>> FromIterator<(K, GenderTag)> for KnowledgeBase {
    fn from_iter<I: IntoIterator<Item = (K, GenderTag)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// MergedTranslationMap
// ---------------------------------------------------------------------------

/// Final merged output. Keys are kept sorted for stable serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MergedTranslationMap(BTreeMap<String, String>);

impl MergedTranslationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. A later write for the same key replaces the earlier one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Insert an entry only if the key has no value yet. Returns whether it
    /// was written.
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        match self.0.entry(key.into()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(value.into());
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ModuleSpec
// ---------------------------------------------------------------------------

/// An add-on module to merge, identified by its archive name prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSpec {
    /// Archive file name prefix (`<id>*.jar`).
    pub id: String,
    /// Asset namespace inside the archive, when it differs from the id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ModuleSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            namespace: None,
        }
    }

    pub fn with_namespace(id: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            namespace: Some(namespace.into()),
        }
    }

    /// Namespace under `assets/`; defaults to the id with hyphens removed.
    pub fn asset_namespace(&self) -> String {
        self.namespace
            .clone()
            .unwrap_or_else(|| self.id.replace('-', ""))
    }
}

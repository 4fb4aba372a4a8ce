//! Annotation engine: turns one target-language entry into the bilingual
//! display string shown in game.
//!
//! `annotate` runs three ordered stages over the source text:
//! 1. Source corrections (module bundles only)
//! 2. Article prefixing from the knowledge base (noun-bearing keys only)
//! 3. The family's phonetic rule table
//!
//! [`Annotator::render`] then joins the result with the reference text.

pub mod grammar;
mod rules;

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crammese_shared::{KnowledgeBase, LanguageFamily};

pub use grammar::{article_for, correct_source, headword_of};

/// Separator between annotated source text and the reference text.
pub const SEPARATOR: &str = " / ";

/// Glyph replacing runtime placeholders in the reference text.
pub const PLACEHOLDER_GLYPH: &str = "●";

/// Where the entry being annotated came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BundleOrigin {
    /// The base game bundle.
    #[default]
    Base,
    /// A module bundle, possibly loaded through a regional fallback variant.
    Module { via_fallback: bool },
}

/// Pure per-entry annotator for one language family.
#[derive(Debug, Clone, Copy)]
pub struct Annotator<'kb> {
    family: LanguageFamily,
    knowledge: Option<&'kb KnowledgeBase>,
    origin: BundleOrigin,
}

impl<'kb> Annotator<'kb> {
    pub fn new(family: LanguageFamily, knowledge: Option<&'kb KnowledgeBase>) -> Self {
        Self {
            family,
            knowledge,
            origin: BundleOrigin::Base,
        }
    }

    /// Same annotator, configured for entries from `origin`.
    pub fn with_origin(self, origin: BundleOrigin) -> Self {
        Self { origin, ..self }
    }

    /// Annotate target-language text. Never fails; missing data leaves the
    /// text unchanged at that stage.
    pub fn annotate(&self, key: &str, source: &str) -> String {
        let corrected = match self.origin {
            BundleOrigin::Base => source.to_string(),
            BundleOrigin::Module { .. } => grammar::correct_source(self.family, source),
        };

        let prefixed = self.prefix_article(key, &corrected);

        let via_fallback = matches!(self.origin, BundleOrigin::Module { via_fallback: true });
        rules::apply_all(rules::table_for(self.family, via_fallback), &prefixed)
    }

    /// Final display string for one entry.
    ///
    /// When annotation leaves the source equal to the reference, only the
    /// reference surfaces. Otherwise `annotated / reference`.
    pub fn render(&self, key: &str, source: &str, reference: &str) -> String {
        let annotated = self.annotate(key, source);
        let reference_display = substitute_placeholders(reference);

        if annotated == reference {
            reference_display
        } else {
            format!("{annotated}{SEPARATOR}{reference_display}")
        }
    }

    fn prefix_article(&self, key: &str, text: &str) -> String {
        let Some(knowledge) = self.knowledge else {
            return text.to_string();
        };
        if !grammar::has_articles(self.family) {
            return text.to_string();
        }
        let Some(headword) = grammar::headword_of(self.family, key, text) else {
            return text.to_string();
        };

        match knowledge
            .get(&headword)
            .and_then(|tag| grammar::article_for(self.family, tag))
        {
            Some(article) => {
                trace!(key, %headword, article, "prefixing article");
                format!("{article} {text}")
            }
            None => text.to_string(),
        }
    }
}

/// Replace `%s`, `%d` and positional `%1$s` placeholders with a bullet.
pub fn substitute_placeholders(text: &str) -> String {
    static PLACEHOLDER_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"%(?:\d+\$)?[sd]").expect("valid regex"));

    PLACEHOLDER_RE
        .replace_all(text, PLACEHOLDER_GLYPH)
        .into_owned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crammese_shared::GenderTag;

    fn kb(entries: &[(&str, GenderTag)]) -> KnowledgeBase {
        entries.iter().map(|(w, t)| (*w, *t)).collect()
    }

    #[test]
    fn unchanged_french_entry_keeps_separator_when_texts_differ() {
        let annotator = Annotator::new(LanguageFamily::French, None);
        assert_eq!(
            annotator.render("item.minecraft.apple", "Pomme", "Apple"),
            "Pomme / Apple"
        );
    }

    #[test]
    fn article_prefix_from_knowledge_base() {
        let kb = kb(&[("pomme", GenderTag::Feminine)]);
        let annotator = Annotator::new(LanguageFamily::French, Some(&kb));
        assert_eq!(
            annotator.render("item.minecraft.apple", "Pomme", "Apple"),
            "Une Pomme / Apple"
        );
    }

    #[test]
    fn identical_text_surfaces_reference_only() {
        let annotator = Annotator::new(LanguageFamily::Other, None);
        let out = annotator.render("death.attack.generic", "Takes %s damage", "Takes %s damage");
        assert_eq!(out, "Takes ● damage");
        assert!(!out.contains(SEPARATOR));
    }

    #[test]
    fn placeholders_only_replaced_on_reference_side() {
        let annotator = Annotator::new(LanguageFamily::Other, None);
        let out = annotator.render("chat.msg", "%s a rejoint", "%s joined");
        assert_eq!(out, "%s a rejoint / ● joined");
    }

    #[test]
    fn placeholder_forms() {
        assert_eq!(substitute_placeholders("%1$s hit %2$s for %d"), "● hit ● for ●");
        assert_eq!(substitute_placeholders("100% sure"), "100% sure");
    }

    #[test]
    fn no_prefix_outside_noun_bearing_categories() {
        let kb = kb(&[("pomme", GenderTag::Feminine)]);
        let annotator = Annotator::new(LanguageFamily::French, Some(&kb));
        assert_eq!(annotator.annotate("gui.pomme", "Pomme"), "Pomme");
        assert_eq!(annotator.annotate("block.minecraft.x", "Pomme"), "Une Pomme");
    }

    #[test]
    fn prefix_then_phonetics() {
        let kb = kb(&[("hache", GenderTag::Feminine)]);
        let annotator = Annotator::new(LanguageFamily::French, Some(&kb));
        assert_eq!(
            annotator.annotate("item.minecraft.iron_axe", "Hache en fer"),
            "Une <H>ache en fer"
        );
    }

    #[test]
    fn german_uses_last_compound_segment_and_keeps_case() {
        let kb = kb(&[("Holzbretter", GenderTag::Plural), ("Apfel", GenderTag::Masculine)]);
        let annotator = Annotator::new(LanguageFamily::German, Some(&kb));
        assert_eq!(
            annotator.annotate("block.minecraft.oak_planks", "Eichen-Holzbretter"),
            "(pl.) Eichen-Holzbretter"
        );
        assert_eq!(annotator.annotate("item.minecraft.apple", "Apfel"), "Der Apfel");
        assert_eq!(annotator.annotate("item.minecraft.apple", "apfel"), "apfel");
    }

    #[test]
    fn unknown_tag_leaves_text() {
        let kb = kb(&[("truc", GenderTag::Unknown)]);
        let annotator = Annotator::new(LanguageFamily::French, Some(&kb));
        assert_eq!(annotator.annotate("item.x", "Truc"), "Truc");
    }

    #[test]
    fn module_corrections_apply_before_prefixing() {
        let kb = kb(&[("bloc", GenderTag::Masculine)]);
        let base = Annotator::new(LanguageFamily::French, Some(&kb));
        let module = base.with_origin(BundleOrigin::Module { via_fallback: false });

        assert_eq!(module.annotate("block.mod.x", "Block de vérification"), "Un Bloc à damiers");
        assert_eq!(base.annotate("block.mod.x", "Block de vérification"), "Block de vérification");
    }

    #[test]
    fn spanish_fallback_origin_switches_table() {
        let annotator = Annotator::new(LanguageFamily::Spanish, None);
        let fallback = annotator.with_origin(BundleOrigin::Module { via_fallback: true });
        assert_eq!(annotator.annotate("gui.x", "Shaker"), "Shaker");
        assert_eq!(fallback.annotate("gui.x", "Shaker"), "S<h>aker");
    }
}

//! Headword extraction, article tables, and module source corrections.

use crammese_shared::{Category, GenderTag, LanguageFamily};

/// Indefinite article (or plural marker) for a tag, if the family has one.
pub fn article_for(family: LanguageFamily, tag: GenderTag) -> Option<&'static str> {
    match (family, tag) {
        (LanguageFamily::French, GenderTag::Masculine) => Some("Un"),
        (LanguageFamily::French, GenderTag::Feminine) => Some("Une"),
        (LanguageFamily::French, GenderTag::Plural) => Some("Des"),

        (LanguageFamily::German, GenderTag::Masculine) => Some("Der"),
        (LanguageFamily::German, GenderTag::Feminine) => Some("Die"),
        (LanguageFamily::German, GenderTag::Neuter) => Some("Das"),
        (LanguageFamily::German, GenderTag::Plural) => Some("(pl.)"),

        (LanguageFamily::Spanish, GenderTag::Masculine) => Some("Un"),
        (LanguageFamily::Spanish, GenderTag::Feminine) => Some("Una"),
        (LanguageFamily::Spanish, GenderTag::Plural) => Some("Unos"),

        _ => None,
    }
}

/// Whether the family carries an article table at all.
pub fn has_articles(family: LanguageFamily) -> bool {
    !matches!(family, LanguageFamily::Other)
}

/// Normalized headword of a noun-bearing entry, or `None` for other keys
/// and blank text.
pub fn headword_of(family: LanguageFamily, key: &str, text: &str) -> Option<String> {
    Category::of_key(key)?;
    let token = text.split_whitespace().next()?;
    Some(family.normalize_headword(token))
}

/// Fix known typos in module translations before any other processing.
/// Base-game text is never passed through here.
pub fn correct_source(family: LanguageFamily, text: &str) -> String {
    match family {
        LanguageFamily::French => text
            .replace("éé", "é")
            .replace(" de vérification", " à damiers")
            .replace("Block ", "Bloc ")
            .replace("Pattes", "Pâtes"),
        LanguageFamily::German => text.replace("Kokusnuss", "Kokosnuss"),
        LanguageFamily::Spanish | LanguageFamily::Other => text.to_string(),
    }
}

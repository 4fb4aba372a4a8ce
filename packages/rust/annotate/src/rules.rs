//! Per-family phonetic rule tables.
//!
//! Each rule is a pure `&str -> String` pass; a table is applied left to
//! right. Tables are kept as separate literal lists per family: the letter
//! sets excluded before a silent `h` differ between them.

use std::sync::LazyLock;

use regex::Regex;

use crammese_shared::LanguageFamily;

/// One substitution pass.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Rule {
    /// Replace every occurrence of a literal.
    Literal(&'static str, &'static str),
    /// Wrap `target` unless the preceding character is in `excluded`.
    Unpreceded {
        target: char,
        excluded: &'static [char],
        wrapped: &'static str,
    },
    /// Replace `ending` when it closes a word (followed by a space or end of text).
    WordFinal {
        ending: &'static str,
        replacement: &'static str,
    },
    /// Arbitrary pass for rules that need a pattern scan.
    Pass(fn(&str) -> String),
}

impl Rule {
    pub(crate) fn apply(&self, text: &str) -> String {
        match self {
            Self::Literal(from, to) => text.replace(from, to),
            Self::Unpreceded {
                target,
                excluded,
                wrapped,
            } => wrap_unpreceded(text, *target, excluded, wrapped),
            Self::WordFinal {
                ending,
                replacement,
            } => replace_word_final(text, ending, replacement),
            Self::Pass(pass) => pass(text),
        }
    }
}

/// Run a table over `text`, left to right.
pub(crate) fn apply_all(rules: &[Rule], text: &str) -> String {
    rules
        .iter()
        .fold(text.to_string(), |acc, rule| rule.apply(&acc))
}

/// Rule table for a family. `via_fallback` selects the table used for module
/// bundles that were loaded through a regional fallback variant.
pub(crate) fn table_for(family: LanguageFamily, via_fallback: bool) -> &'static [Rule] {
    match (family, via_fallback) {
        (LanguageFamily::French, _) => FRENCH,
        (LanguageFamily::Spanish, false) => SPANISH,
        (LanguageFamily::Spanish, true) => SPANISH_FALLBACK,
        (LanguageFamily::German | LanguageFamily::Other, _) => &[],
    }
}

// ---------------------------------------------------------------------------
// French
// ---------------------------------------------------------------------------

const FRENCH: &[Rule] = &[
    Rule::Unpreceded {
        target: 'H',
        excluded: &['C', 'S', 'P', 'c', 's', 'p'],
        wrapped: "<H>",
    },
    Rule::Unpreceded {
        target: 'h',
        excluded: &['C', 'S', 'P', 'c', 's', 'p'],
        wrapped: "<h>",
    },
    Rule::WordFinal {
        ending: "mp",
        replacement: "<mp>",
    },
    Rule::WordFinal {
        ending: "iz",
        replacement: "i<z>",
    },
    Rule::Literal("ufs", "<ufs>"),
    Rule::Pass(mark_qui_agreement),
];

/// Mark the silent plural verb ending after a relative `qui`:
/// `les mobs qui attaquent` becomes `les mobs qui attaque<nt>`.
fn mark_qui_agreement(text: &str) -> String {
    static QUI_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#" qui (?:se )?[a-zéèç"]+nt"#).expect("valid regex")
    });

    let mut out = String::with_capacity(text.len() + 8);
    let mut last = 0;

    for m in QUI_RE.find_iter(text) {
        let next = text[m.end()..].chars().next();
        if !matches!(next, None | Some(' ') | Some('.')) {
            continue;
        }
        let stem_end = m.end() - "nt".len();
        out.push_str(&text[last..stem_end]);
        out.push_str("<nt>");
        last = m.end();
    }

    out.push_str(&text[last..]);
    out
}

// ---------------------------------------------------------------------------
// Spanish
// ---------------------------------------------------------------------------

const SPANISH: &[Rule] = &[
    Rule::Literal("iencio", "`iencio"),
    Rule::Literal("iencia", "`iencia"),
    Rule::Literal("ienso", "`ienso"),
    Rule::Literal("iensa", "`iensa"),
    Rule::Literal("iense", "`iense"),
    Rule::Literal("iento", "`iento"),
    Rule::Literal("ienta", "`ienta"),
    Rule::Literal("iente", "`iente"),
    Rule::Literal("iende", "`iende"),
    Rule::Literal("iando", "`iando"),
    Rule::Literal("ianda", "`ianda"),
    Rule::Literal("uevo", "`uevo"),
    Rule::Literal("ueva", "`ueva"),
    Rule::Literal("ueve", "`ueve"),
    Rule::Literal("ier", "`ier"),
    Rule::Literal("uer", "`uer"),
    Rule::Literal("v", "v(b)"),
    Rule::Literal("H", "<H>"),
    Rule::Literal("V", "V(B)"),
    Rule::Unpreceded {
        target: 'h',
        excluded: &['C', 'S', 'P', 'c', 's', 'p'],
        wrapped: "<h>",
    },
];

const SPANISH_FALLBACK: &[Rule] = &[
    Rule::Literal("iencio", "`iencio"),
    Rule::Literal("iencia", "`iencia"),
    Rule::Literal("ienso", "`ienso"),
    Rule::Literal("iensa", "`iensa"),
    Rule::Literal("iense", "`iense"),
    Rule::Literal("iento", "`iento"),
    Rule::Literal("ienta", "`ienta"),
    Rule::Literal("iente", "`iente"),
    Rule::Literal("iende", "`iende"),
    Rule::Literal("iando", "`iando"),
    Rule::Literal("ianda", "`ianda"),
    Rule::Literal("uevo", "`uevo"),
    Rule::Literal("ueva", "`ueva"),
    Rule::Literal("ueve", "`ueve"),
    Rule::Literal("ier", "`ier"),
    Rule::Literal("uer", "`uer"),
    Rule::Literal("v", "v(b)"),
    Rule::Literal("H", "<H>"),
    Rule::Literal("V", "V(B)"),
    Rule::Unpreceded {
        target: 'h',
        excluded: &['C', 'c'],
        wrapped: "<h>",
    },
];

// ---------------------------------------------------------------------------
// Scanners
// ---------------------------------------------------------------------------

fn wrap_unpreceded(text: &str, target: char, excluded: &[char], wrapped: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;

    for c in text.chars() {
        if c == target && !prev.is_some_and(|p| excluded.contains(&p)) {
            out.push_str(wrapped);
        } else {
            out.push(c);
        }
        prev = Some(c);
    }

    out
}

fn replace_word_final(text: &str, ending: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for (idx, _) in text.match_indices(ending) {
        let end = idx + ending.len();
        if end == text.len() || text[end..].starts_with(' ') {
            out.push_str(&text[last..idx]);
            out.push_str(replacement);
            last = end;
        }
    }

    out.push_str(&text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn french(text: &str) -> String {
        apply_all(table_for(LanguageFamily::French, false), text)
    }

    fn spanish(text: &str) -> String {
        apply_all(table_for(LanguageFamily::Spanish, false), text)
    }

    #[test]
    fn french_silent_h() {
        assert_eq!(french("Hache"), "<H>ache");
        assert_eq!(french("Bloc de thé"), "Bloc de t<h>é");
        // ch, sh and ph are left alone
        assert_eq!(french("Chat"), "Chat");
        assert_eq!(french("Graphite"), "Graphite");
    }

    #[test]
    fn french_word_final_endings() {
        assert_eq!(french("Camp"), "Ca<mp>");
        assert_eq!(french("Camp de base"), "Ca<mp> de base");
        assert_eq!(french("Lampe"), "Lampe");
        assert_eq!(french("Riz"), "Ri<z>");
        assert_eq!(french("Bœufs"), "Bœ<ufs>");
    }

    #[test]
    fn french_qui_agreement() {
        assert_eq!(
            french("Des mobs qui attaquent."),
            "Des mobs qui attaque<nt>."
        );
        assert_eq!(
            french("Les blocs qui se cassent vite"),
            "Les blocs qui se casse<nt> vite"
        );
        assert_eq!(french("Un mob qui mentionne"), "Un mob qui mentionne");
    }

    #[test]
    fn spanish_stress_and_letters() {
        assert_eq!(spanish("Viento"), "V(B)`iento");
        assert_eq!(spanish("Hierro"), "<H>`ierro");
        assert_eq!(spanish("Nuevo"), "N`uev(b)o");
        assert_eq!(spanish("ahora"), "a<h>ora");
        assert_eq!(spanish("Chorizo"), "Chorizo");
        assert_eq!(spanish("lava"), "lav(b)a");
    }

    #[test]
    fn spanish_fallback_table_keeps_narrower_exclusions() {
        let fallback = table_for(LanguageFamily::Spanish, true);
        assert_eq!(spanish("Shaker"), "Shaker");
        assert_eq!(apply_all(fallback, "Shaker"), "S<h>aker");
        assert_eq!(apply_all(fallback, "Chorizo"), "Chorizo");
    }

    #[test]
    fn families_without_tables_pass_through() {
        assert!(table_for(LanguageFamily::German, false).is_empty());
        assert!(table_for(LanguageFamily::Other, true).is_empty());
    }
}

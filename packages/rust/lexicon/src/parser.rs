//! Kaikki JSON-lines parser.
//!
//! A Kaikki word page is one JSON object per line, one per part of speech
//! (and etymology). Only `pos` and the first sense's `tags` matter here.

use serde::Deserialize;
use tracing::debug;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One lexical record: a part of speech with its grammatical tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenseRecord {
    pub part_of_speech: String,
    pub tags: Vec<String>,
}

impl SenseRecord {
    pub fn new(part_of_speech: impl Into<String>, tags: &[&str]) -> Self {
        Self {
            part_of_speech: part_of_speech.into(),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    pub fn is_noun(&self) -> bool {
        self.part_of_speech == "noun"
    }
}

#[derive(Debug, Deserialize)]
struct KaikkiEntry {
    pos: Option<String>,
    #[serde(default)]
    senses: Vec<KaikkiSense>,
}

#[derive(Debug, Deserialize)]
struct KaikkiSense {
    #[serde(default)]
    tags: Vec<String>,
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse a JSON-lines body into sense records, in file order.
///
/// Blank, unparsable and `pos`-less lines are skipped.
pub fn parse_entries(body: &str) -> Vec<SenseRecord> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<KaikkiEntry>(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, "skipping unparsable lexicon line");
                None
            }
        })
        .filter_map(|entry| {
            let pos = entry.pos?;
            let tags = entry
                .senses
                .into_iter()
                .next()
                .map(|sense| sense.tags)
                .unwrap_or_default();
            Some(SenseRecord {
                part_of_speech: pos,
                tags,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fixture_in_order() {
        let body = std::fs::read_to_string("../../../fixtures/kaikki/pomme.jsonl")
            .expect("read kaikki fixture");
        let records = parse_entries(&body);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].part_of_speech, "verb");
        assert!(records[1].is_noun());
        assert_eq!(records[1].tags, vec!["feminine".to_string()]);
        assert_eq!(records[2].tags, vec!["masculine".to_string()]);
    }

    #[test]
    fn entry_without_senses_has_no_tags() {
        let records = parse_entries(r#"{"pos": "noun", "word": "x"}"#);
        assert_eq!(records, vec![SenseRecord::new("noun", &[])]);
    }

    #[test]
    fn entries_without_pos_are_skipped() {
        let records = parse_entries("{\"word\": \"x\"}\n\n[1, 2]\n");
        assert!(records.is_empty());
    }
}

//! Lexical lookup: grammatical information for a headword.
//!
//! The knowledge base builder only depends on [`LexicalLookup`]. The
//! production implementation, [`KaikkiClient`], reads the per-word JSON-lines
//! pages of the Kaikki Wiktionary extract.

mod parser;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use crammese_shared::{CrammeseError, LanguageFamily, LexiconConfig, Result};

pub use parser::{SenseRecord, parse_entries};

/// User-Agent string for lookup requests.
const USER_AGENT: &str = concat!("Crammese/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Query-by-word lexical source.
#[async_trait]
pub trait LexicalLookup: Send + Sync {
    /// All sense records for `word`, in source order. An unknown word is an
    /// error, not an empty list.
    async fn lookup(&self, word: &str, family: LanguageFamily) -> Result<Vec<SenseRecord>>;
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Connection settings for [`KaikkiClient`].
#[derive(Debug, Clone)]
pub struct LexiconOptions {
    /// Dictionary root, e.g. `https://kaikki.org/dictionary`.
    pub base_url: String,
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
}

impl From<&LexiconConfig> for LexiconOptions {
    fn from(config: &LexiconConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

// ---------------------------------------------------------------------------
// Kaikki client
// ---------------------------------------------------------------------------

/// HTTP client for Kaikki word pages.
#[derive(Debug, Clone)]
pub struct KaikkiClient {
    client: Client,
    base_url: Url,
}

impl KaikkiClient {
    pub fn new(opts: &LexiconOptions) -> Result<Self> {
        let base_url = Url::parse(&opts.base_url).map_err(|e| {
            CrammeseError::config(format!("invalid lexicon base URL '{}': {e}", opts.base_url))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| CrammeseError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// `<base>/<Family>/meaning/<w[0]>/<w[0..2]>/<w>.json`
    pub fn entry_url(&self, word: &str, family: LanguageFamily) -> Result<Url> {
        let lexicon = family.lexicon_name().ok_or_else(|| {
            CrammeseError::config(format!(
                "no lexicon available for {} words",
                family.display_name()
            ))
        })?;

        if word.is_empty() {
            return Err(CrammeseError::lookup(word, "empty headword"));
        }

        let first: String = word.chars().take(1).collect();
        let prefix: String = word.chars().take(2).collect();
        let file = format!("{word}.json");

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CrammeseError::config("lexicon base URL cannot hold a path"))?
            .pop_if_empty()
            .extend([lexicon, "meaning", first.as_str(), prefix.as_str(), file.as_str()]);

        Ok(url)
    }
}

#[async_trait]
impl LexicalLookup for KaikkiClient {
    #[instrument(skip(self, family), fields(family = family.display_name()))]
    async fn lookup(&self, word: &str, family: LanguageFamily) -> Result<Vec<SenseRecord>> {
        let url = self.entry_url(word, family)?;
        debug!(%url, "fetching lexicon entry");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| CrammeseError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrammeseError::lookup(word, format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CrammeseError::Network(format!("{url}: failed to read body: {e}")))?;

        let records = parse_entries(&body);
        if records.is_empty() {
            return Err(CrammeseError::lookup(word, "no parsable entries"));
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(base: &str) -> KaikkiClient {
        KaikkiClient::new(&LexiconOptions {
            base_url: base.to_string(),
            timeout_secs: 2,
        })
        .expect("client")
    }

    #[test]
    fn entry_url_layout() {
        let client = client_for("https://kaikki.org/dictionary");
        let url = client.entry_url("pomme", LanguageFamily::French).unwrap();
        assert_eq!(
            url.as_str(),
            "https://kaikki.org/dictionary/French/meaning/p/po/pomme.json"
        );
    }

    #[test]
    fn entry_url_is_char_based_and_encoded() {
        let client = client_for("https://kaikki.org/dictionary/");
        let url = client.entry_url("épée", LanguageFamily::French).unwrap();
        assert_eq!(
            url.as_str(),
            "https://kaikki.org/dictionary/French/meaning/%C3%A9/%C3%A9p/%C3%A9p%C3%A9e.json"
        );
    }

    #[test]
    fn entry_url_rejects_unsupported_family() {
        let client = client_for("https://kaikki.org/dictionary");
        let err = client.entry_url("neko", LanguageFamily::Other).unwrap_err();
        assert!(matches!(err, CrammeseError::Config { .. }));
    }

    #[tokio::test]
    async fn lookup_against_mock_server() {
        let server = wiremock::MockServer::start().await;
        let body = std::fs::read_to_string("../../../fixtures/kaikki/pomme.jsonl")
            .expect("read kaikki fixture");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/French/meaning/p/po/pomme.json"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let records = client.lookup("pomme", LanguageFamily::French).await.unwrap();
        let noun = records.iter().find(|r| r.is_noun()).expect("noun record");
        assert_eq!(noun.tags, vec!["feminine".to_string()]);
    }

    #[tokio::test]
    async fn missing_word_is_lookup_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let err = client
            .lookup("zzzz", LanguageFamily::French)
            .await
            .unwrap_err();
        assert!(matches!(err, CrammeseError::Lookup { .. }));
    }
}

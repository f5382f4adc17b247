pub mod github;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::engine::ResearchCollaborator;
use crate::engine::constants::{
    RESEARCH_PREFIX_SCROLLS, RESEARCH_PREFIX_TRAVELS, RESEARCH_PREFIX_WIKI,
};
use crate::engine::safety::{SafetyFilter, Verdict};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "wise-old-man-bot/1.0";

const DUCKDUCKGO_API: &str = "https://api.duckduckgo.com/";
const RUNESCAPE_WIKI_API: &str = "https://runescape.wiki/api.php";

/// Returned instead of a fetched answer that itself talks about forbidden trades
const FETCHED_FORBIDDEN: &str =
    "The Wise Old Man will not speak of forbidden trades or dealings!";

#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// Research over public JSON APIs: DuckDuckGo instant answers first, the
/// RuneScape Wiki as fallback. Every fetched answer is re-screened by the
/// safety filter before it reaches the channel.
pub struct WebResearcher {
    client: reqwest::Client,
    safety: SafetyFilter,
}

impl WebResearcher {
    pub fn new() -> eyre::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            safety: SafetyFilter::new(),
        })
    }

    async fn duckduckgo(&self, query: &str) -> Result<Option<String>, ResearchError> {
        let mut url = Url::parse(DUCKDUCKGO_API)?;
        url.query_pairs_mut()
            .append_pair("q", &format!("{query} runescape 3"))
            .append_pair("format", "json")
            .append_pair("no_redirect", "1")
            .append_pair("no_html", "1")
            .append_pair("skip_disambig", "1");

        let json: Value = self.client.get(url.as_str()).send().await?.json().await?;
        Ok(instant_answer(&json).map(|(prefix, text)| self.screened(prefix, &text)))
    }

    async fn wiki(&self, title: &str) -> Result<Option<String>, ResearchError> {
        let mut url = Url::parse(RUNESCAPE_WIKI_API)?;
        url.query_pairs_mut()
            .append_pair("action", "query")
            .append_pair("format", "json")
            .append_pair("prop", "extracts")
            .append_pair("exintro", "1")
            .append_pair("explaintext", "1")
            .append_pair("titles", title);

        let json: Value = self.client.get(url.as_str()).send().await?.json().await?;
        Ok(wiki_extract(&json).map(|text| self.screened(RESEARCH_PREFIX_WIKI, &text)))
    }

    fn screened(&self, prefix: &str, answer: &str) -> String {
        match self.safety.classify(answer) {
            Verdict::Forbidden => FETCHED_FORBIDDEN.to_string(),
            _ => format!("{prefix}{answer}"),
        }
    }
}

#[async_trait]
impl ResearchCollaborator for WebResearcher {
    async fn query(&self, text: &str) -> Option<String> {
        match self.duckduckgo(text).await {
            Ok(Some(answer)) => return Some(answer),
            Ok(None) => {}
            Err(e) => warn!(error = %e, query = text, "DuckDuckGo lookup failed"),
        }
        match self.wiki(text).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, query = text, "Wiki lookup failed");
                None
            }
        }
    }

    async fn repo_info(&self, owner: &str, repo: &str) -> Option<String> {
        github::fetch_repo_summary(&self.client, owner, repo).await
    }
}

/// Pull the best text out of a DuckDuckGo instant-answer payload: the
/// abstract if present, otherwise the first related topic.
fn instant_answer(json: &Value) -> Option<(&'static str, String)> {
    if let Some(text) = json
        .get("AbstractText")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
    {
        return Some((RESEARCH_PREFIX_SCROLLS, text.to_string()));
    }
    json.get("RelatedTopics")
        .and_then(Value::as_array)
        .and_then(|topics| topics.first())
        .and_then(|topic| topic.get("Text"))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(|text| (RESEARCH_PREFIX_TRAVELS, text.to_string()))
}

/// MediaWiki extract from a `prop=extracts` response; pages are keyed by id,
/// so take the first page carrying a non-empty extract.
fn wiki_extract(json: &Value) -> Option<String> {
    json.get("query")
        .and_then(|q| q.get("pages"))
        .and_then(Value::as_object)
        .and_then(|pages| {
            pages
                .values()
                .filter_map(|page| page.get("extract").and_then(Value::as_str))
                .find(|s| !s.trim().is_empty())
        })
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn instant_answer_prefers_the_abstract() {
        let json = json!({
            "AbstractText": "Slayer is a members-only skill.",
            "RelatedTopics": [{"Text": "Something else"}]
        });
        let (prefix, text) = instant_answer(&json).unwrap();
        assert_eq!(prefix, RESEARCH_PREFIX_SCROLLS);
        assert_eq!(text, "Slayer is a members-only skill.");
    }

    #[test]
    fn instant_answer_falls_back_to_related_topics() {
        let json = json!({
            "AbstractText": "",
            "RelatedTopics": [{"Text": "Telos is a boss."}, {"Text": "ignored"}]
        });
        let (prefix, text) = instant_answer(&json).unwrap();
        assert_eq!(prefix, RESEARCH_PREFIX_TRAVELS);
        assert_eq!(text, "Telos is a boss.");
    }

    #[test]
    fn instant_answer_is_none_for_empty_payload() {
        assert!(instant_answer(&json!({})).is_none());
        assert!(instant_answer(&json!({"AbstractText": "  ", "RelatedTopics": []})).is_none());
    }

    #[test]
    fn wiki_extract_reads_the_first_nonempty_page() {
        let json = json!({
            "query": {
                "pages": {
                    "1234": {"extract": "The Wise Old Man lives in Draynor Village."}
                }
            }
        });
        assert_eq!(
            wiki_extract(&json).unwrap(),
            "The Wise Old Man lives in Draynor Village."
        );
        assert!(wiki_extract(&json!({"query": {"pages": {}}})).is_none());
    }

    #[test]
    fn fetched_forbidden_answers_are_suppressed() {
        let researcher = WebResearcher::new().unwrap();
        let screened = researcher.screened(RESEARCH_PREFIX_SCROLLS, "you can buy gold here");
        assert_eq!(screened, FETCHED_FORBIDDEN);
        let ok = researcher.screened(RESEARCH_PREFIX_SCROLLS, "Slayer is a skill.");
        assert!(ok.contains("Slayer is a skill."));
    }
}

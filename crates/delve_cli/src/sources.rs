//! Pattern loading from the command line, configuration, files, and URLs.

use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use delve_core::parse_pattern_file;
use delve_core::prelude::*;
#[cfg(feature = "tracing")]
use tracing::{debug, warn};

use crate::ui::{print_info, print_warning};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("delve/", env!("CARGO_PKG_VERSION"));

/// Assembles the pattern set for a run.
///
/// Sources are merged in order: `term`, the config's inline patterns, the
/// config's `pattern_sources`, then `extra_sources`. The first occurrence of
/// a pattern text wins. An unreadable source is a warning; when nothing
/// yields a pattern the built-in set is used.
pub fn load_patterns(term: Option<&str>, config: &Config, extra_sources: &[String]) -> anyhow::Result<PatternSet> {
    let mut set = PatternSet::new();

    if let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) {
        set.insert(Pattern::new(term));
    }

    set.extend(config.patterns.iter().cloned());

    let sources = config
        .pattern_sources
        .iter()
        .chain(extra_sources)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());

    for source in sources {
        match read_source(source) {
            Ok(content) => {
                let patterns = parse_pattern_file(&content);
                #[cfg(feature = "tracing")]
                debug!(source, count = patterns.len(), "loaded pattern source");
                set.extend(patterns);
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                warn!(source, error = %e, "pattern source unavailable");
                print_warning(&format!("skipping pattern source {source}: {e:#}"));
            }
        }
    }

    if set.is_empty() {
        print_info("no patterns given, using the built-in pattern set");
        set = PatternSet::builtin();
    }

    set.validate().context("invalid pattern")?;
    Ok(set)
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

fn read_source(source: &str) -> anyhow::Result<String> {
    if is_remote(source) {
        fetch_remote(source)
    } else {
        std::fs::read_to_string(Path::new(source)).with_context(|| format!("failed to read {source}"))
    }
}

fn fetch_remote(url: &str) -> anyhow::Result<String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start HTTP runtime")?;

    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build HTTP client")?;

    runtime.block_on(fetch_text(&client, url))
}

async fn fetch_text(client: &reqwest::Client, url: &str) -> anyhow::Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("{url} returned {status}");
    }

    response.text().await.context("failed to read response body")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn pattern_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn texts(set: &PatternSet) -> Vec<&str> {
        set.iter().map(|p| p.text.as_str()).collect()
    }

    #[test]
    fn falls_back_to_builtin_set() {
        let set = load_patterns(None, &Config::default(), &[]).unwrap();
        assert_eq!(set.len(), PatternSet::builtin().len());
    }

    #[test]
    fn term_alone_replaces_builtin_set() {
        let set = load_patterns(Some("frabjous"), &Config::default(), &[]).unwrap();
        assert_eq!(texts(&set), ["frabjous"]);
        assert!(set.get("frabjous").unwrap().label.is_none());
    }

    #[test]
    fn sources_merge_in_order_and_first_occurrence_wins() {
        let file = pattern_file("# Secrets\nfrabjous\ntoken\n");
        let config = Config {
            patterns: vec![Pattern::labelled("token", "Inline")],
            ..Config::default()
        };
        let sources = vec![file.path().display().to_string()];

        let set = load_patterns(Some("callooh"), &config, &sources).unwrap();

        assert_eq!(texts(&set), ["callooh", "token", "frabjous"]);
        assert_eq!(set.get("token").unwrap().label.as_deref(), Some("Inline"));
        assert_eq!(set.get("frabjous").unwrap().label.as_deref(), Some("Secrets"));
    }

    #[test]
    fn missing_source_is_skipped() {
        let sources = vec!["/nonexistent/patterns.txt".to_string()];
        let set = load_patterns(Some("frabjous"), &Config::default(), &sources).unwrap();
        assert_eq!(texts(&set), ["frabjous"]);
    }

    #[test]
    fn invalid_regex_is_an_error() {
        let err = load_patterns(Some("pass(word"), &Config::default(), &[]).unwrap_err();
        assert!(format!("{err:#}").contains("pass(word"));
    }

    #[test]
    fn remote_detection() {
        assert!(is_remote("https://example.com/p.txt"));
        assert!(is_remote("http://example.com/p.txt"));
        assert!(!is_remote("patterns/http.txt"));
    }

    #[tokio::test]
    async fn fetch_text_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/patterns.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# Remote\nfrabjous\n"))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let body = fetch_text(&client, &format!("{}/patterns.txt", server.uri())).await.unwrap();

        let patterns = parse_pattern_file(&body);
        assert_eq!(patterns, [Pattern::labelled("frabjous", "Remote")]);
    }

    #[tokio::test]
    async fn fetch_text_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = fetch_text(&reqwest::Client::new(), &format!("{}/missing.txt", server.uri()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn remote_source_is_loaded_through_blocking_fetch() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let server = runtime.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/team.txt"))
                .respond_with(ResponseTemplate::new(200).set_body_string("callooh\n"))
                .mount(&server)
                .await;
            server
        });

        let sources = vec![format!("{}/team.txt", server.uri())];
        let set = load_patterns(None, &Config::default(), &sources).unwrap();
        assert_eq!(texts(&set), ["callooh"]);
    }
}

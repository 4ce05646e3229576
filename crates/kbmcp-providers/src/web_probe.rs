//! HTML/robots `WebProbePort` adapter.
//!
//! Fetches one page, reads its `<meta name="robots">` directive and
//! partitions its outbound links into `urls_to_crawl`/`skipped_urls`
//! per-anchor `rel="nofollow"`, restricted to links matching the caller's
//! domain and path filters. This is the `extract_urls(url, domain_filter,
//! path_filter)` primitive the overview's "Explicitly out of scope"
//! section names as an opaque collaborator.

use kbmcp_domain::error::{Error, Result};
use kbmcp_domain::value_objects::WebProbeResult;
use kbmcp_domain::WebProbePort;
use scraper::{Html, Selector};

/// The HTTP/HTML web probe adapter.
#[derive(Debug)]
pub struct HttpWebProbe {
    client: reqwest::Client,
}

impl HttpWebProbe {
    /// Build a new probe with a short, crawl-validation-appropriate
    /// timeout: this runs synchronously in front of every `learn_*`
    /// tool call and must not stall the caller indefinitely.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| Error::generic(format!("failed to build web probe HTTP client: {e}")))?;
        Ok(Self { client })
    }

    fn robots_directives(document: &Html) -> (bool, bool) {
        let selector = Selector::parse(r#"meta[name="robots" i]"#).expect("valid selector");
        let Some(content) = document
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr("content"))
        else {
            return (false, false);
        };
        let lower = content.to_ascii_lowercase();
        (lower.contains("noindex"), lower.contains("nofollow"))
    }

    fn partition_links(
        document: &Html,
        base: &url::Url,
        domain_filter: &str,
        path_filter: &str,
    ) -> (Vec<String>, Vec<String>) {
        let selector = Selector::parse("a[href]").expect("valid selector");
        let mut urls_to_crawl = Vec::new();
        let mut skipped_urls = Vec::new();

        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else { continue };
            let Ok(resolved) = base.join(href) else { continue };

            let domain = format!(
                "{}://{}",
                resolved.scheme(),
                resolved.host_str().unwrap_or_default()
            );
            if domain != domain_filter {
                continue;
            }
            if !resolved.path().starts_with(path_filter) {
                continue;
            }

            let is_nofollow = element
                .value()
                .attr("rel")
                .map(|rel| rel.split_whitespace().any(|token| token.eq_ignore_ascii_case("nofollow")))
                .unwrap_or(false);

            let url_string = resolved.to_string();
            if is_nofollow {
                skipped_urls.push(url_string);
            } else {
                urls_to_crawl.push(url_string);
            }
        }

        (urls_to_crawl, skipped_urls)
    }
}

impl Default for HttpWebProbe {
    fn default() -> Self {
        Self::new().expect("default reqwest client configuration is always valid")
    }
}

#[async_trait::async_trait]
impl WebProbePort for HttpWebProbe {
    #[tracing::instrument(skip(self))]
    async fn probe(&self, url: &str, domain_filter: &str, path_filter: &str) -> Result<WebProbeResult> {
        let parsed = url::Url::parse(url)
            .map_err(|e| Error::generic(format!("invalid probe URL {url}: {e}")))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::generic(format!("web probe transport error: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::generic(format!("web probe received {status} fetching {url}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::generic(format!("web probe failed to read response body: {e}")))?;

        let document = Html::parse_document(&body);
        let (noindex, nofollow) = Self::robots_directives(&document);
        let (urls_to_crawl, skipped_urls) =
            Self::partition_links(&document, &parsed, domain_filter, path_filter);

        Ok(WebProbeResult { noindex, nofollow, urls_to_crawl, skipped_urls })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> url::Url {
        url::Url::parse("https://example.com/docs/").unwrap()
    }

    #[test]
    fn robots_directives_reads_noindex_and_nofollow() {
        let document =
            Html::parse_document(r#"<html><head><meta name="robots" content="noindex, nofollow"></head></html>"#);
        assert_eq!(HttpWebProbe::robots_directives(&document), (true, true));
    }

    #[test]
    fn robots_directives_defaults_to_false_without_meta_tag() {
        let document = Html::parse_document("<html><head></head></html>");
        assert_eq!(HttpWebProbe::robots_directives(&document), (false, false));
    }

    #[test]
    fn partition_links_filters_by_domain_and_path_and_splits_on_nofollow() {
        let html = r#"
            <html><body>
                <a href="/docs/a">a</a>
                <a href="/docs/b" rel="nofollow">b</a>
                <a href="/other/c">c</a>
                <a href="https://other.example.com/docs/d">d</a>
            </body></html>
        "#;
        let document = Html::parse_document(html);
        let (crawl, skipped) =
            HttpWebProbe::partition_links(&document, &base(), "https://example.com", "/docs");

        assert_eq!(crawl, vec!["https://example.com/docs/a".to_string()]);
        assert_eq!(skipped, vec!["https://example.com/docs/b".to_string()]);
    }
}

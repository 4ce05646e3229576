//! Pure crawl-parameter derivation from a seed URL (§4.2).

use kbmcp_domain::error::{Error, Result};
use kbmcp_domain::value_objects::CrawlParams;
use url::Url;

/// Derive `{seed_url, domain, filter_pattern}` from a seed URL.
///
/// `domain` is `scheme://authority`. `filter_pattern` is the URL path,
/// truncated to end at the last `/` when the final path segment contains
/// a `.` and does not itself end with `/`; an empty result becomes `/`.
pub fn derive_crawl_params(seed_url: &str) -> Result<CrawlParams> {
    let parsed = Url::parse(seed_url)
        .map_err(|e| Error::creation(format!("invalid crawl seed URL '{seed_url}': {e}")))?;

    let authority = parsed
        .host_str()
        .ok_or_else(|| Error::creation(format!("crawl seed URL '{seed_url}' has no host")))?;
    let domain = match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), authority, port),
        None => format!("{}://{}", parsed.scheme(), authority),
    };

    let path = parsed.path();
    let filter_pattern = derive_filter_pattern(path);

    Ok(CrawlParams { seed_url: seed_url.to_string(), domain, filter_pattern })
}

fn derive_filter_pattern(path: &str) -> String {
    let final_segment_has_dot_and_no_trailing_slash = !path.ends_with('/')
        && path.rsplit('/').next().is_some_and(|segment| segment.contains('.'));

    let truncated = if final_segment_has_dot_and_no_trailing_slash {
        match path.rfind('/') {
            Some(idx) => path[..=idx].to_string(),
            None => String::new(),
        }
    } else {
        path.to_string()
    };

    if truncated.is_empty() { "/".to_string() } else { truncated }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_domain_and_filter_pattern_for_a_trailing_slash_path() {
        let params = derive_crawl_params("https://ex.com/docs/").unwrap();
        assert_eq!(params.domain, "https://ex.com");
        assert_eq!(params.filter_pattern, "/docs/");
    }

    #[test]
    fn truncates_filter_pattern_when_final_segment_looks_like_a_file() {
        let params = derive_crawl_params("https://docs.python.org/3/index.html").unwrap();
        assert_eq!(params.domain, "https://docs.python.org");
        assert_eq!(params.filter_pattern, "/3/");
    }

    #[test]
    fn root_path_without_dot_is_unchanged() {
        let params = derive_crawl_params("https://example.com/").unwrap();
        assert_eq!(params.filter_pattern, "/");
    }

    #[test]
    fn empty_path_becomes_root() {
        let params = derive_crawl_params("https://example.com").unwrap();
        assert_eq!(params.filter_pattern, "/");
    }

    #[test]
    fn preserves_explicit_port_in_domain() {
        let params = derive_crawl_params("http://localhost:8080/a/b").unwrap();
        assert_eq!(params.domain, "http://localhost:8080");
    }
}

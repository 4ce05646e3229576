//! The search fan-out engine embedded in the Knowledge Base Manager
//! (§4.3): phrase-to-query translation, batch dispatch and hit
//! projection.

use kbmcp_domain::entities::{Document, KnowledgeBaseSummary, SearchOutcome, SearchResult, SearchResultError};
use kbmcp_domain::value_objects::{SearchHit, SearchQuery, SearchResponse};

/// Relevance floor below which a phrase is considered to have no hits.
pub const MIN_SCORE: f64 = 10.0;
/// Highlight fragment length, in characters, requested on `body`.
pub const FRAGMENT_SIZE: u32 = 500;
/// Unprojected knowledge-base-name placeholder (§4.3.1).
const UNKNOWN_KB: &str = "<Unknown KB>";
/// Unprojected title placeholder (§4.3.1).
const NO_TITLE: &str = "<No Title>";

/// Build the backend query for one phrase.
pub fn build_query(knowledge_base_names: &[String], phrase: &str, n_hits: u32, n_fragments: u32) -> SearchQuery {
    SearchQuery {
        knowledge_base_names: knowledge_base_names.to_vec(),
        phrase: phrase.to_string(),
        min_score: MIN_SCORE,
        size: n_hits,
        n_fragments,
        fragment_size: FRAGMENT_SIZE,
    }
}

/// Project one backend hit into a [`Document`] per §4.3.1.
pub fn hit_to_document(hit: &SearchHit) -> Document {
    let content = if !hit.highlight_body.is_empty() {
        hit.highlight_body.join(" … ")
    } else {
        hit.body.clone().unwrap_or_default()
    };

    Document {
        id: hit.id.clone(),
        knowledge_base_name: hit.knowledge_base_name.clone().unwrap_or_else(|| UNKNOWN_KB.to_string()),
        title: hit.title.clone().unwrap_or_else(|| NO_TITLE.to_string()),
        content,
        url: hit.url.clone(),
        indexed_at: None,
        score: Some(hit.score),
    }
}

/// Assemble one phrase's [`SearchOutcome`] from its backend response.
pub fn assemble_outcome(phrase: &str, response: SearchResponse) -> SearchOutcome {
    if response.hits.is_empty() {
        return SearchOutcome::Error(SearchResultError {
            phrase: phrase.to_string(),
            error: "No hits found in one of the search responses.".to_string(),
        });
    }

    let results = response.hits.iter().map(hit_to_document).collect();
    let mut summaries: Vec<KnowledgeBaseSummary> = response
        .aggregations
        .into_iter()
        .map(|(knowledge_base_name, matches)| KnowledgeBaseSummary { knowledge_base_name, matches })
        .collect();
    summaries.sort_by(|a, b| a.knowledge_base_name.cmp(&b.knowledge_base_name));

    SearchOutcome::Hit(SearchResult { phrase: phrase.to_string(), results, summaries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_hits_become_a_search_result_error() {
        let outcome = assemble_outcome("foo", SearchResponse::default());
        match outcome {
            SearchOutcome::Error(e) => {
                assert_eq!(e.phrase, "foo");
                assert!(e.error.contains("No hits"));
            }
            _ => panic!("expected an error outcome"),
        }
    }

    #[test]
    fn hit_projection_falls_back_to_placeholders() {
        let hit = SearchHit {
            id: "1".into(),
            score: 12.5,
            knowledge_base_name: None,
            title: None,
            url: None,
            body: Some("raw body".into()),
            highlight_body: vec![],
        };
        let doc = hit_to_document(&hit);
        assert_eq!(doc.knowledge_base_name, UNKNOWN_KB);
        assert_eq!(doc.title, NO_TITLE);
        assert_eq!(doc.content, "raw body");
        assert_eq!(doc.score, Some(12.5));
    }

    #[test]
    fn hit_projection_prefers_highlight_fragments_over_raw_body() {
        let hit = SearchHit {
            id: "1".into(),
            score: 42.0,
            knowledge_base_name: Some("py-docs".into()),
            title: Some("Intro".into()),
            url: Some("https://docs.python.org".into()),
            body: Some("raw body".into()),
            highlight_body: vec!["frag one".into(), "frag two".into()],
        };
        let doc = hit_to_document(&hit);
        assert_eq!(doc.content, "frag one … frag two");
    }

    #[test]
    fn non_empty_response_sums_summaries_at_least_as_large_as_hit_count() {
        let mut aggregations = HashMap::new();
        aggregations.insert("py-docs".to_string(), 3u64);
        let response = SearchResponse {
            hits: vec![SearchHit {
                id: "1".into(),
                score: 20.0,
                knowledge_base_name: Some("py-docs".into()),
                title: Some("t".into()),
                url: None,
                body: Some("b".into()),
                highlight_body: vec![],
            }],
            aggregations,
        };
        let outcome = assemble_outcome("bar", response);
        match outcome {
            SearchOutcome::Hit(r) => {
                let total_matches: u64 = r.summaries.iter().map(|s| s.matches).sum();
                assert!(total_matches >= r.results.len() as u64);
            }
            _ => panic!("expected a hit outcome"),
        }
    }
}

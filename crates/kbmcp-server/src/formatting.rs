//! Hierarchical-text response rendering and truncation (§6.1).
//!
//! §6.1's serialization rule: "any structured response is rendered as a
//! hierarchical document with field names matching those in §3 and
//! §4.3.1, omitting null unless documented." The renderers below produce
//! that document as an indented `field: value` text block; [`success`]
//! wraps it as a tool result and [`truncate_call_tool_result`] caps its
//! size before it reaches the transport.

use rmcp::model::{CallToolResult, Content, RawContent};

use kbmcp_domain::entities::{CrawlJob, Document, KnowledgeBase, SearchOutcome};

/// Maximum response size in bytes. Responses exceeding this are
/// truncated to keep a single bulk-dispatch result from exhausting an
/// LLM consumer's context window.
const MAX_RESPONSE_BYTES: usize = 512 * 1024;

/// Wrap already-rendered text as a successful, size-capped tool result.
pub fn success(text: String) -> CallToolResult {
    truncate_call_tool_result(CallToolResult::success(vec![Content::text(text)]))
}

/// Wrap a message as an error tool result, per §7's "emits `{isError:
/// true, content: <message>}`" propagation rule.
pub fn error(message: impl Into<String>) -> CallToolResult {
    CallToolResult::error(vec![Content::text(message.into())])
}

/// Concatenate a [`CallToolResult`]'s text content blocks, for embedding
/// one tool's result inside another's rendering (the bulk-dispatch tools'
/// per-call `content` field).
pub fn render_call_tool_result(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(text) => Some(text.text.clone()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncate large text content within a [`CallToolResult`], appending a
/// truncation notice.
pub fn truncate_call_tool_result(mut result: CallToolResult) -> CallToolResult {
    for content in &mut result.content {
        if let RawContent::Text(ref mut text) = content.raw {
            if text.text.len() > MAX_RESPONSE_BYTES {
                text.text = truncate_response(std::mem::take(&mut text.text));
            }
        }
    }
    result
}

/// Truncate a text response at a clean boundary before the limit,
/// appending a notice recording its original length.
fn truncate_response(mut text: String) -> String {
    if text.len() <= MAX_RESPONSE_BYTES {
        return text;
    }
    let original_len = text.len();
    let search_region = &text[..MAX_RESPONSE_BYTES];
    let cut_point = search_region.rfind(',').or_else(|| search_region.rfind('\n')).unwrap_or(MAX_RESPONSE_BYTES);
    let safe_cut = floor_char_boundary(&text, cut_point + 1);
    text.truncate(safe_cut);
    text.push_str(&format!("...\n[TRUNCATED: response exceeded {original_len} bytes, showing first {safe_cut}]"));
    text
}

/// The largest index `<= index` that lands on a UTF-8 char boundary of `s`.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut idx = index;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Render one [`KnowledgeBase`] as a `field: value` block (§3).
pub fn render_knowledge_base(kb: &KnowledgeBase) -> String {
    format!(
        "name: {}\ntype: {}\ndescription: {}\ndata_source: {}\nbackend_id: {}\ndoc_count: {}",
        kb.name, kb.kb_type, kb.description, kb.data_source, kb.backend_id, kb.doc_count
    )
}

/// Render a list of knowledge bases as blocks separated by a blank line.
pub fn render_knowledge_base_list(kbs: &[KnowledgeBase]) -> String {
    if kbs.is_empty() {
        return "(no knowledge bases)".to_string();
    }
    kbs.iter().map(render_knowledge_base).collect::<Vec<_>>().join("\n\n")
}

/// Render one [`Document`] (§4.3.1), omitting `url`/`score`/`@timestamp`
/// when absent.
pub fn render_document(doc: &Document) -> String {
    let mut out = format!(
        "id: {}\nknowledge_base_name: {}\ntitle: {}\ncontent: {}",
        doc.id, doc.knowledge_base_name, doc.title, doc.content
    );
    if let Some(url) = &doc.url {
        out.push_str(&format!("\nurl: {url}"));
    }
    if let Some(timestamp) = &doc.indexed_at {
        out.push_str(&format!("\n@timestamp: {timestamp}"));
    }
    if let Some(score) = doc.score {
        out.push_str(&format!("\nscore: {score}"));
    }
    out
}

/// Render a list of documents as blocks separated by a blank line.
pub fn render_document_list(docs: &[Document]) -> String {
    if docs.is_empty() {
        return "(no documents)".to_string();
    }
    docs.iter().map(render_document).collect::<Vec<_>>().join("\n\n")
}

/// Render one phrase's [`SearchOutcome`] (§3: `SearchResult`/`SearchResultError`).
pub fn render_search_outcome(outcome: &SearchOutcome) -> String {
    match outcome {
        SearchOutcome::Hit(result) => {
            let summaries = result
                .summaries
                .iter()
                .map(|s| format!("  - knowledge_base_name: {}\n    matches: {}", s.knowledge_base_name, s.matches))
                .collect::<Vec<_>>()
                .join("\n");
            let results = if result.results.is_empty() {
                "(no hits)".to_string()
            } else {
                result
                    .results
                    .iter()
                    .map(|d| indent(&render_document(d), "  "))
                    .collect::<Vec<_>>()
                    .join("\n\n")
            };
            format!(
                "phrase: {}\nresults:\n{}\nsummaries:\n{}",
                result.phrase, results, summaries
            )
        }
        SearchOutcome::Error(err) => format!("phrase: {}\nerror: {}", err.phrase, err.error),
    }
}

/// Render a batch of phrase outcomes as blocks separated by a blank line,
/// preserving input-phrase order (§4.3 "Ordering guarantees").
pub fn render_search_outcomes(outcomes: &[SearchOutcome]) -> String {
    if outcomes.is_empty() {
        return "(no phrases)".to_string();
    }
    outcomes.iter().map(render_search_outcome).collect::<Vec<_>>().join("\n\n")
}

/// Render one [`CrawlJob`] (§3).
pub fn render_crawl_job(job: &CrawlJob) -> String {
    format!("id: {}\ndomain: {}\nstate: {:?}", job.id, job.domain, job.state)
}

/// Render a list of crawl jobs as blocks separated by a blank line.
pub fn render_crawl_job_list(jobs: &[CrawlJob]) -> String {
    if jobs.is_empty() {
        return "(no active crawls)".to_string();
    }
    jobs.iter().map(render_crawl_job).collect::<Vec<_>>().join("\n\n")
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines().map(|line| format!("{prefix}{line}")).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_response_is_noop_under_limit() {
        let text = "short response".to_string();
        assert_eq!(truncate_response(text.clone()), text);
    }

    #[test]
    fn truncate_response_cuts_at_last_comma_and_appends_notice() {
        let segment = "field,";
        let repeats = (MAX_RESPONSE_BYTES / segment.len()) + 10;
        let input = segment.repeat(repeats);
        assert!(input.len() > MAX_RESPONSE_BYTES);

        let result = truncate_response(input.clone());
        assert!(result.len() <= MAX_RESPONSE_BYTES + 200);
        assert!(result.contains("[TRUNCATED: response exceeded"));
    }

    #[test]
    fn truncate_response_falls_back_to_byte_limit_without_separators() {
        let input = "x".repeat(MAX_RESPONSE_BYTES + 1000);
        let result = truncate_response(input);
        assert!(result.contains("[TRUNCATED"));
    }

    #[test]
    fn floor_char_boundary_never_splits_a_multibyte_char() {
        let s = "a€b";
        // byte 2 is mid-way through the 3-byte € character.
        let idx = floor_char_boundary(s, 2);
        assert!(s.is_char_boundary(idx));
    }

    #[test]
    fn render_knowledge_base_list_handles_empty_input() {
        assert_eq!(render_knowledge_base_list(&[]), "(no knowledge bases)");
    }
}

//! The `S` data-source sanitization function and `backend_id` derivation
//! (§4.1).

use rand::RngCore;

/// Deterministically sanitize a data-source descriptor (a URL or any
/// opaque origin string) into the middle segment of a `backend_id`.
///
/// Steps, applied in order:
/// 1. Strip a leading `http://` or `https://` scheme.
/// 2. Replace `.` → `_`, `/` → `.`, `-` → `_`.
/// 3. Drop any character not in `[a-z0-9._-]`, case-folding first.
/// 4. Truncate to 50 characters.
/// 5. Strip leading/trailing `._-`.
/// 6. Lower-case the result.
pub fn sanitize_data_source(input: &str) -> String {
    let without_scheme = input
        .strip_prefix("https://")
        .or_else(|| input.strip_prefix("http://"))
        .unwrap_or(input);

    let mapped: String = without_scheme
        .chars()
        .map(|c| match c {
            '.' => '_',
            '/' => '.',
            '-' => '_',
            other => other,
        })
        .collect();

    let filtered: String = mapped
        .chars()
        .filter(|c| {
            let folded = c.to_ascii_lowercase();
            folded.is_ascii_lowercase() || folded.is_ascii_digit() || matches!(folded, '.' | '_' | '-')
        })
        .collect();

    let truncated: String = filtered.chars().take(50).collect();
    let trimmed = truncated.trim_matches(|c| matches!(c, '.' | '_' | '-'));
    trimmed.to_lowercase()
}

/// Generate the random 8 hex-character suffix every `backend_id` ends
/// with.
pub fn random_suffix() -> String {
    let mut bytes = [0u8; 4];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Build a `backend_id` of the form `<prefix>-<type>.<S(data_source)>-<suffix>`.
pub fn derive_backend_id(prefix: &str, kb_type: &str, data_source: &str) -> String {
    format!(
        "{prefix}-{kb_type}.{sanitized}-{suffix}",
        sanitized = sanitize_data_source(data_source),
        suffix = random_suffix()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_the_python_docs_example_from_the_spec() {
        assert_eq!(sanitize_data_source("https://docs.python.org/3/"), "docs_python_org.3");
    }

    #[test]
    fn strips_scheme_and_lowercases() {
        assert_eq!(sanitize_data_source("HTTP://Example.COM"), "example_com");
    }

    #[test]
    fn drops_disallowed_characters() {
        assert_eq!(sanitize_data_source("Workspace-\"my project\"!"), "workspace_my_project");
    }

    #[test]
    fn truncates_to_fifty_characters_then_trims() {
        let long = format!("https://{}.example.com/", "a".repeat(60));
        let sanitized = sanitize_data_source(&long);
        assert!(sanitized.chars().count() <= 50);
        assert!(!sanitized.starts_with(['.', '_', '-']));
        assert!(!sanitized.ends_with(['.', '_', '-']));
    }

    #[test]
    fn derive_backend_id_matches_the_invariant_shape() {
        let id = derive_backend_id("kbmcp", "docs", "https://docs.python.org/3/");
        let re = regex::Regex::new(r"^kbmcp-(docs|memory|[a-z0-9_]+)\.[a-z0-9._-]{0,50}-[0-9a-f]{8}$").unwrap();
        assert!(re.is_match(&id), "{id} did not match the backend_id invariant");
    }
}

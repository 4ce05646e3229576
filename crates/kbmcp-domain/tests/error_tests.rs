//! Unit tests for the domain error taxonomy

#[cfg(test)]
mod tests {
    use kbmcp_domain::Error;

    #[test]
    fn test_not_found_error() {
        let error = Error::not_found("knowledge base 'py-docs'");
        match error {
            Error::NotFound { resource } => assert_eq!(resource, "knowledge base 'py-docs'"),
            _ => panic!("expected NotFound error"),
        }
    }

    #[test]
    fn test_already_exists_error() {
        let error = Error::already_exists("py-docs");
        match error {
            Error::AlreadyExists { resource } => assert_eq!(resource, "py-docs"),
            _ => panic!("expected AlreadyExists error"),
        }
    }

    #[test]
    fn test_non_unique_error() {
        let error = Error::non_unique("py-docs");
        assert!(matches!(error, Error::NonUnique { .. }));
    }

    #[test]
    fn test_container_not_found_error() {
        let error = Error::container_not_found("abc123");
        match error {
            Error::ContainerNotFound { id } => assert_eq!(id, "abc123"),
            _ => panic!("expected ContainerNotFound error"),
        }
    }

    #[test]
    fn test_crawler_validation_too_many_urls_message() {
        let error = Error::CrawlerValidationTooManyUrls { found: 501, limit: 500 };
        assert!(error.to_string().contains("501"));
        assert!(error.to_string().contains("500"));
    }

    #[test]
    fn test_is_fatal_at_startup() {
        assert!(Error::backend_auth("bad key").is_fatal_at_startup());
        assert!(Error::backend_connection("refused").is_fatal_at_startup());
        assert!(!Error::not_found("x").is_fatal_at_startup());
    }
}

//! Error taxonomy shared by every layer of kbmcp.
//!
//! Adapters classify raw backend/container failures into one of the
//! variants below; the application layer re-classifies by operation so
//! that, for example, a backend 4xx seen during `update` surfaces as
//! [`Error::Update`] rather than a generic backend failure.

use thiserror::Error;

/// Result type alias for operations that can fail with a [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// The kbmcp error taxonomy.
#[derive(Error, Debug)]
pub enum Error {
    /// A named resource (knowledge base, document, crawl job) does not exist.
    #[error("not found: {resource}")]
    NotFound {
        /// Description of the missing resource.
        resource: String,
    },

    /// Creation was attempted against an already-occupied unique key.
    #[error("already exists: {resource}")]
    AlreadyExists {
        /// Description of the conflicting resource.
        resource: String,
    },

    /// A lookup that should be unique matched more than one record.
    #[error("non-unique result: {resource}")]
    NonUnique {
        /// Description of the ambiguous lookup.
        resource: String,
    },

    /// A create operation failed for a reason other than a uniqueness conflict.
    #[error("creation failed: {message}")]
    Creation {
        /// Description of the failure.
        message: String,
    },

    /// A delete operation failed.
    #[error("deletion failed: {message}")]
    Deletion {
        /// Description of the failure.
        message: String,
    },

    /// An update operation failed.
    #[error("update failed: {message}")]
    Update {
        /// Description of the failure.
        message: String,
    },

    /// A read operation failed.
    #[error("retrieval failed: {message}")]
    Retrieval {
        /// Description of the failure.
        message: String,
    },

    /// A search operation failed.
    #[error("search failed: {message}")]
    Search {
        /// Description of the failure.
        message: String,
    },

    /// The web probe used during crawl validation failed at the transport level.
    #[error("crawl validation transport error: {message}")]
    CrawlerValidationHttp {
        /// Description of the transport failure.
        message: String,
    },

    /// Crawl validation found more crawlable URLs than the configured limit.
    #[error("crawl validation rejected: {found} URLs exceed the limit of {limit}")]
    CrawlerValidationTooManyUrls {
        /// The number of crawlable URLs the probe found.
        found: usize,
        /// The configured ceiling.
        limit: usize,
    },

    /// Crawl validation found a page marked both `noindex` and `nofollow`.
    #[error("crawl validation rejected: page reports noindex and nofollow")]
    CrawlerValidationNoIndexNofollow,

    /// Container creation or start failed.
    #[error("container start failed: {message}")]
    ContainerStartFailed {
        /// Description of the failure.
        message: String,
    },

    /// A container referenced by id could not be located.
    #[error("container not found: {id}")]
    ContainerNotFound {
        /// The opaque container id.
        id: String,
    },

    /// The backend rejected credentials or otherwise failed authentication.
    #[error("backend authentication failed: {message}")]
    BackendAuth {
        /// Description of the failure.
        message: String,
    },

    /// The backend could not be reached.
    #[error("backend connection failed: {message}")]
    BackendConnection {
        /// Description of the failure.
        message: String,
    },

    /// A catch-all for failures that do not fit the taxonomy above.
    #[error("{message}")]
    Generic {
        /// Description of the failure.
        message: String,
    },
}

impl Error {
    /// Build a [`Error::NotFound`].
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    /// Build a [`Error::AlreadyExists`].
    pub fn already_exists<S: Into<String>>(resource: S) -> Self {
        Self::AlreadyExists { resource: resource.into() }
    }

    /// Build a [`Error::NonUnique`].
    pub fn non_unique<S: Into<String>>(resource: S) -> Self {
        Self::NonUnique { resource: resource.into() }
    }

    /// Build a [`Error::Creation`].
    pub fn creation<S: Into<String>>(message: S) -> Self {
        Self::Creation { message: message.into() }
    }

    /// Build a [`Error::Deletion`].
    pub fn deletion<S: Into<String>>(message: S) -> Self {
        Self::Deletion { message: message.into() }
    }

    /// Build a [`Error::Update`].
    pub fn update<S: Into<String>>(message: S) -> Self {
        Self::Update { message: message.into() }
    }

    /// Build a [`Error::Retrieval`].
    pub fn retrieval<S: Into<String>>(message: S) -> Self {
        Self::Retrieval { message: message.into() }
    }

    /// Build a [`Error::Search`].
    pub fn search<S: Into<String>>(message: S) -> Self {
        Self::Search { message: message.into() }
    }

    /// Build a [`Error::ContainerStartFailed`].
    pub fn container_start_failed<S: Into<String>>(message: S) -> Self {
        Self::ContainerStartFailed { message: message.into() }
    }

    /// Build a [`Error::ContainerNotFound`].
    pub fn container_not_found<S: Into<String>>(id: S) -> Self {
        Self::ContainerNotFound { id: id.into() }
    }

    /// Build a [`Error::BackendAuth`].
    pub fn backend_auth<S: Into<String>>(message: S) -> Self {
        Self::BackendAuth { message: message.into() }
    }

    /// Build a [`Error::BackendConnection`].
    pub fn backend_connection<S: Into<String>>(message: S) -> Self {
        Self::BackendConnection { message: message.into() }
    }

    /// Build a [`Error::Generic`].
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic { message: message.into() }
    }

    /// True for failures that are fatal at startup (auth/connection).
    pub fn is_fatal_at_startup(&self) -> bool {
        matches!(self, Self::BackendAuth { .. } | Self::BackendConnection { .. })
    }
}

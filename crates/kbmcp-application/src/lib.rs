//! # Application Layer
//!
//! Use-case code for the knowledge base service: the Knowledge Base
//! Manager, the Crawl Orchestrator, the search fan-out engine and the
//! pure helpers they're built from. Depends only on `kbmcp-domain` — no
//! concrete backend, container runtime or HTTP client lives here.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`knowledge_base_manager`] | Collection lifecycle, document CRUD, search entry points |
//! | [`crawl_orchestrator`] | Crawl validation, config generation, worker launch and fleet management |
//! | [`search`] | Phrase-to-query translation, batch assembly, hit projection |
//! | [`crawl_params`] | Pure seed-URL → `{domain, filter_pattern}` derivation |
//! | [`sanitize`] | The `S` data-source sanitization function and `backend_id` derivation |

/// Pure crawl-parameter derivation from a seed URL.
pub mod crawl_params;
/// The Crawl Orchestrator: validation, config generation, launch and fleet management.
pub mod crawl_orchestrator;
/// The Knowledge Base Manager.
pub mod knowledge_base_manager;
/// The `S` data-source sanitization function.
pub mod sanitize;
/// The search fan-out engine embedded in the Knowledge Base Manager.
pub mod search;

pub use crawl_orchestrator::CrawlOrchestrator;
pub use knowledge_base_manager::KnowledgeBaseManager;

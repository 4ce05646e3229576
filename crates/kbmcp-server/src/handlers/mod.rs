//! Per-sub-server tool handlers (§4.4).
//!
//! Each handler owns the `Arc`-shared application-layer collaborators its
//! tools need and exposes one method per tool, already shaped as
//! `Result<CallToolResult, McpError>` so the `#[tool_router]`-annotated
//! [`crate::mcp_server::KbmcpServer`] methods are one-line delegations.

/// The Ask sub-server: documentation discovery and question answering.
pub mod ask;
/// The Learn sub-server: crawl-target discovery and web-documentation ingestion.
pub mod learn;
/// The Manage sub-server: knowledge base CRUD.
pub mod manage;
/// The Remember sub-server: project-scoped free-form memories.
pub mod remember;

pub use ask::AskHandler;
pub use learn::LearnHandler;
pub use manage::ManageHandler;
pub use remember::RememberHandler;

//! # MCP Tool Surface
//!
//! Wires the Knowledge Base Manager and Crawl Orchestrator to the Model
//! Context Protocol: Manage/Ask/Learn/Remember sub-servers (§4.4), tool
//! registration and bulk dispatch (§4.5), and the request-scoped
//! `ProjectContext` slot the Remember sub-server reads and writes.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`args`] | Tool parameter schemas (`schemars::JsonSchema`) |
//! | [`handlers`] | Per-sub-server tool handlers |
//! | [`tools`] | Tool registry and name-indexed dispatch |
//! | [`project_context`] | The Remember sub-server's request-scoped active-project slot |
//! | [`formatting`] | Hierarchical-text response rendering and truncation |
//! | [`mcp_server`] | The `rmcp::ServerHandler` implementation |
//! | [`transport`] | Stdio/SSE transport startup |

/// Tool parameter schemas.
pub mod args;
/// Response formatting and truncation.
pub mod formatting;
/// Per-sub-server tool handlers.
pub mod handlers;
/// The `KbmcpServer` `ServerHandler` implementation.
pub mod mcp_server;
/// The request-scoped active-project slot.
pub mod project_context;
/// Tool registry and dispatch.
pub mod tools;
/// Stdio/SSE transport startup.
pub mod transport;

pub use mcp_server::KbmcpServer;
pub use project_context::ProjectSlot;

//! Stdio/SSE transport startup (§6.5 "Transport: identifier selecting
//! stdio or server-sent events").

use rmcp::transport::sse_server::SseServer;
use rmcp::transport::stdio;
use rmcp::ServiceExt;

use kbmcp_domain::error::{Error, Result};

use crate::mcp_server::KbmcpServer;

/// Serve `server` over stdio until the client disconnects.
pub async fn serve_stdio(server: KbmcpServer) -> Result<()> {
    let service = server
        .serve(stdio())
        .await
        .map_err(|e| Error::generic(format!("failed to start stdio transport: {e}")))?;
    service.waiting().await.map_err(|e| Error::generic(format!("stdio transport error: {e}")))?;
    Ok(())
}

/// Serve `server` over Server-Sent Events at `bind_addr` until cancelled
/// (`Ctrl-C`).
pub async fn serve_sse(server: KbmcpServer, bind_addr: &str) -> Result<()> {
    let addr = bind_addr
        .parse()
        .map_err(|e| Error::generic(format!("invalid SSE bind address '{bind_addr}': {e}")))?;

    let sse_server = SseServer::serve(addr)
        .await
        .map_err(|e| Error::generic(format!("failed to start SSE transport: {e}")))?;
    let cancellation = sse_server.with_service(move || server.clone());

    tokio::signal::ctrl_c().await.map_err(|e| Error::generic(format!("failed to await ctrl-c: {e}")))?;
    cancellation.cancel();
    Ok(())
}

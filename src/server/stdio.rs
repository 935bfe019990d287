//! MCP over stdio: one JSON-RPC message per line.
//!
//! Logs go to stderr so stdout carries protocol messages only.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use super::McpServer;
use super::transport::{JsonRpcResponse, PARSE_ERROR};

pub async fn serve(server: McpServer) -> std::io::Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    run(server, stdin, stdout).await
}

/// Serve requests from `reader` until EOF, writing responses to `writer`.
///
/// A line that is not valid UTF-8 gets a parse error reply; the loop keeps
/// going.
pub async fn run<R, W>(server: McpServer, mut reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let response = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => server.handle_str(line.trim()).await,
            Err(e) => {
                tracing::warn!("Dropping non UTF-8 input line: {}", e);
                Some(JsonRpcResponse::error(None, PARSE_ERROR, "Parse error"))
            }
        };

        if let Some(response) = response {
            let mut out = serde_json::to_vec(&response)?;
            out.push(b'\n');
            writer.write_all(&out).await?;
            writer.flush().await?;
        }
    }
    tracing::info!("stdin closed, shutting down");
    Ok(())
}

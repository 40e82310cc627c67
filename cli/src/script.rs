//! JSONL request loop for `leancup run`
//!
//! Reads one request per line and writes one reply per line, flushing after
//! each so a client driving the process over pipes sees replies as they
//! happen. Blank lines and lines starting with `#` are skipped.

use anyhow::{Context, Result};
use leancup_application::Coordinator;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// Serve requests until the reader is exhausted; returns the number handled
pub async fn serve<R, W>(coordinator: &Coordinator, reader: R, mut writer: W) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut handled = 0;

    while let Some(line) = lines.next_line().await.context("Failed to read request")? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let reply = coordinator.handle_json(line).await;
        debug!(ok = reply.get("ok").is_some(), "Request handled");

        let mut encoded = serde_json::to_string(&reply)?;
        encoded.push('\n');
        writer
            .write_all(encoded.as_bytes())
            .await
            .context("Failed to write reply")?;
        writer.flush().await?;
        handled += 1;
    }

    info!(handled, "Request stream finished");
    Ok(handled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wiring;
    use leancup_infrastructure::FileConfig;

    #[tokio::test]
    async fn test_serve_answers_each_request() {
        let services = wiring::build(&FileConfig::default());
        let input = b"# comment\n{\"op\": \"session.create\", \"name\": \"Retro\"}\n\nnot json\n";
        let mut output = Vec::new();

        let handled = serve(&services.coordinator, &input[..], &mut output)
            .await
            .unwrap();
        assert_eq!(handled, 2);

        let text = String::from_utf8(output).unwrap();
        let replies: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert!(replies[0]["ok"]["short_code"].is_string());
        assert_eq!(replies[1]["error"]["kind"], "validation");
    }
}

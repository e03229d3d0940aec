//! Minimal SMTP listener: the delivery transport feeding ingestion.
//!
//! Supports HELO/EHLO, MAIL FROM, RCPT TO, DATA, RSET, NOOP, QUIT. Each
//! completed DATA triggers one ingestion invocation per accepted recipient.

use crate::{
    app::AppState,
    error::Result,
    ingest::{self, Envelope, IngestOutcome},
};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
};
use tracing::{debug, error, info, warn};

/// Bind the configured address and serve SMTP sessions forever.
pub async fn start_smtp(state: AppState) -> Result<()> {
    let addr =
        std::env::var("DRIFTMAIL_SMTP_ADDR").unwrap_or_else(|_| "127.0.0.1:2525".to_string());
    let listener = TcpListener::bind(&addr).await?;
    info!("smtp listener: {}", addr);
    serve(state, listener).await
}

/// Accept loop over an already-bound listener. Each connection runs as its
/// own task; deliveries on different connections ingest concurrently.
pub async fn serve(state: AppState, listener: TcpListener) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_session(state, stream).await {
                warn!("smtp connection error from {}: {}", peer, e);
            }
        });
    }
}

async fn handle_session(state: AppState, stream: TcpStream) -> Result<()> {
    let (read_half, mut writer) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    writer.write_all(b"220 driftmail esmtp\r\n").await?;
    writer.flush().await?;

    let mut mail_from: Option<String> = None;
    let mut rcpts: Vec<String> = Vec::new();
    let mut buf = String::new();

    loop {
        buf.clear();
        let n = reader.read_line(&mut buf).await?;
        if n == 0 {
            break;
        }
        let line = buf.trim_end_matches(['\r', '\n']);
        debug!("smtp <= {}", line);
        let upper = line.to_uppercase();

        if upper.starts_with("EHLO") || upper.starts_with("HELO") {
            writer.write_all(b"250 driftmail\r\n").await?;
        } else if upper.starts_with("MAIL FROM:") {
            mail_from = Some(line[10..].trim().trim_matches(['<', '>']).to_string());
            rcpts.clear();
            writer.write_all(b"250 OK\r\n").await?;
        } else if upper.starts_with("RCPT TO:") {
            rcpts.push(line[8..].trim().trim_matches(['<', '>']).to_string());
            writer.write_all(b"250 Accepted\r\n").await?;
        } else if upper == "DATA" {
            if rcpts.is_empty() {
                writer.write_all(b"554 No valid recipients\r\n").await?;
                continue;
            }
            writer
                .write_all(b"354 End data with <CR><LF>.<CR><LF>\r\n")
                .await?;
            let mut data = Vec::new();
            // Read until line with single '.'
            loop {
                let mut line = String::new();
                let n = reader.read_line(&mut line).await?;
                if n == 0 {
                    break;
                }
                if line == ".\r\n" || line == ".\n" {
                    break;
                }
                data.extend_from_slice(line.as_bytes());
            }

            let from = mail_from.take().unwrap_or_default();
            let mut store_failed = false;
            for to in rcpts.drain(..) {
                let envelope = Envelope {
                    from: from.clone(),
                    to,
                };
                match ingest::handle_delivery(&state, &envelope, &data).await {
                    Ok(IngestOutcome::Stored(msg)) => {
                        debug!("smtp delivery stored as {}", msg.id);
                    }
                    // Drops were already logged by the handler; the transport
                    // still answers 250 because there is no redelivery path.
                    Ok(_) => {}
                    Err(e) => {
                        error!("ingestion failed for {}: {e}", envelope.to);
                        store_failed = true;
                    }
                }
            }
            if store_failed {
                writer
                    .write_all(b"451 Requested action aborted: local error\r\n")
                    .await?;
            } else {
                writer.write_all(b"250 OK\r\n").await?;
            }
        } else if upper == "RSET" {
            mail_from = None;
            rcpts.clear();
            writer.write_all(b"250 OK\r\n").await?;
        } else if upper == "NOOP" {
            writer.write_all(b"250 OK\r\n").await?;
        } else if upper == "QUIT" {
            writer.write_all(b"221 Bye\r\n").await?;
            break;
        } else {
            writer.write_all(b"502 Command not implemented\r\n").await?;
        }
    }
    Ok(())
}

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::error::ClientError;
use crate::worker::LanguageWorker;

// Reject absurdly large messages to prevent memory exhaustion (32 MB limit)
const MAX_MESSAGE_SIZE: usize = 32 * 1024 * 1024;

/// The byte-message channel pair a language client runs over.
///
/// `outbound` carries JSON-RPC bodies to the server, `inbound` delivers the
/// bodies the server sent; framing stays inside the transport. `closed`
/// flips to true once the underlying socket or pipe is gone.
pub struct TransportChannels {
    pub(crate) outbound: mpsc::UnboundedSender<Vec<u8>>,
    pub(crate) inbound: mpsc::UnboundedReceiver<Vec<u8>>,
    pub(crate) closed: watch::Receiver<bool>,
}

/// Connect a WebSocket and pump JSON-RPC bodies as text messages.
///
/// Fails before any client is started if the socket cannot be opened.
pub async fn open_websocket(url: &str) -> Result<TransportChannels, ClientError> {
    let (stream, _) = connect_async(url)
        .await
        .map_err(|e| ClientError::connection_with(format!("failed to connect to {}", url), e))?;
    log::info!("WebSocket transport connected to {}", url);
    let (mut write, mut read) = stream.split();

    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<WsMessage>();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let (closed_tx, closed_rx) = watch::channel(false);

    let body_tx = frame_tx.clone();
    tokio::spawn(async move {
        while let Some(body) = out_rx.recv().await {
            let text = match String::from_utf8(body) {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("dropping non-UTF-8 outbound message: {}", e);
                    continue;
                }
            };
            if body_tx.send(WsMessage::Text(text)).is_err() {
                break;
            }
        }
    });

    tokio::spawn(async move {
        while let Some(msg) = frame_rx.recv().await {
            if write.send(msg).await.is_err() {
                break;
            }
        }
        let _ = write.close().await;
    });

    tokio::spawn(async move {
        loop {
            match read.next().await {
                Some(Ok(WsMessage::Text(text))) => {
                    if in_tx.send(text.into_bytes()).is_err() {
                        break;
                    }
                }
                Some(Ok(WsMessage::Binary(data))) => {
                    if in_tx.send(data).is_err() {
                        break;
                    }
                }
                Some(Ok(WsMessage::Ping(payload))) => {
                    let _ = frame_tx.send(WsMessage::Pong(payload));
                }
                Some(Ok(WsMessage::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    log::warn!("WebSocket read error: {}", e);
                    break;
                }
            }
        }
        let _ = closed_tx.send(true);
    });

    Ok(TransportChannels {
        outbound: out_tx,
        inbound: in_rx,
        closed: closed_rx,
    })
}

/// Wire a worker's stdio with Content-Length framing.
pub fn open_worker(worker: &mut LanguageWorker) -> Result<TransportChannels, ClientError> {
    let (stdin, stdout, stderr) = worker.take_io()?;
    let command = worker.command().to_string();

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let (closed_tx, closed_rx) = watch::channel(false);

    tokio::spawn(async move {
        let mut stdin = stdin;
        while let Some(body) = out_rx.recv().await {
            let header = format!("Content-Length: {}\r\n\r\n", body.len());
            if stdin.write_all(header.as_bytes()).await.is_err() {
                break;
            }
            if stdin.write_all(&body).await.is_err() {
                break;
            }
            if stdin.flush().await.is_err() {
                break;
            }
        }
    });

    if let Some(stderr) = stderr {
        let command = command.clone();
        tokio::spawn(async move {
            let mut reader = BufReader::new(stderr);
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => break,
                    Ok(_) => {
                        let trimmed = line.trim();
                        if !trimmed.is_empty() {
                            log::warn!("language worker stderr [{}]: {}", command, trimmed);
                        }
                    }
                    Err(_) => break,
                }
            }
        });
    }

    tokio::spawn(async move {
        let mut reader = BufReader::new(stdout);
        loop {
            let mut content_length: usize = 0;
            let mut header_line = String::new();
            loop {
                header_line.clear();
                match reader.read_line(&mut header_line).await {
                    Ok(0) => {
                        let _ = closed_tx.send(true);
                        return;
                    }
                    Ok(_) => {
                        let trimmed = header_line.trim();
                        if trimmed.is_empty() {
                            break;
                        }
                        if let Some(len) = trimmed.strip_prefix("Content-Length: ") {
                            if let Ok(len) = len.parse::<usize>() {
                                content_length = len;
                            }
                        }
                    }
                    Err(_) => {
                        let _ = closed_tx.send(true);
                        return;
                    }
                }
            }

            if content_length == 0 {
                continue;
            }

            if content_length > MAX_MESSAGE_SIZE {
                log::warn!(
                    "language worker message too large ({} bytes), skipping",
                    content_length
                );
                // Drain the oversized body to keep the stream in sync
                let mut remaining = content_length;
                let mut discard = vec![0u8; 8192];
                while remaining > 0 {
                    let take = remaining.min(discard.len());
                    match reader.read_exact(&mut discard[..take]).await {
                        Ok(_) => remaining -= take,
                        Err(_) => {
                            let _ = closed_tx.send(true);
                            return;
                        }
                    }
                }
                continue;
            }

            let mut body = vec![0u8; content_length];
            if reader.read_exact(&mut body).await.is_err() {
                let _ = closed_tx.send(true);
                return;
            }
            if in_tx.send(body).is_err() {
                let _ = closed_tx.send(true);
                return;
            }
        }
    });

    Ok(TransportChannels {
        outbound: out_tx,
        inbound: in_rx,
        closed: closed_rx,
    })
}

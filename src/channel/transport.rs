//! TCP transport for the command channel
//!
//! Newline-delimited JSON over one persistent socket. A reader task decodes
//! each line into the inbox; a writer task drains the outbound queue.
//! Reconnects are left to whoever owns the channel: once the socket closes,
//! the channel stays closed and sends are dropped. Lines that are not UTF-8
//! or exceed [`MAX_LINE_BYTES`] are discarded like any other bad payload.

use super::{accept_payload, CommandChannel, CommandInbox};
use crate::error::ChannelError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Longest inbound line accepted, newline included
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// One newline-delimited frame off the socket
#[derive(Debug, PartialEq)]
enum Frame {
    Line(Vec<u8>),
    Oversized,
    Eof,
}

/// Read the next frame, holding at most `MAX_LINE_BYTES` in memory
async fn next_frame<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> io::Result<Frame> {
    buf.clear();
    let n = (&mut *reader)
        .take(MAX_LINE_BYTES as u64)
        .read_until(b'\n', buf)
        .await?;
    if n == 0 {
        return Ok(Frame::Eof);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        return Ok(Frame::Line(std::mem::take(buf)));
    }
    if buf.len() < MAX_LINE_BYTES {
        // Final line without a newline before EOF
        return Ok(Frame::Line(std::mem::take(buf)));
    }

    buf.clear();
    loop {
        let (found, used) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(Frame::Oversized);
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(i) => (true, i + 1),
                None => (false, available.len()),
            }
        };
        reader.consume(used);
        if found {
            return Ok(Frame::Oversized);
        }
    }
}

impl CommandChannel {
    /// Connect to a command source
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, ChannelError> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::from_stream(stream))
    }

    /// Wrap an established socket. Must be called inside a tokio runtime.
    pub fn from_stream(stream: TcpStream) -> Self {
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "<unknown>".to_string());
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY: {}", e);
        }
        info!("Command channel connected to {}", peer);

        let inbox = Arc::new(CommandInbox::new());
        let open = Arc::new(AtomicBool::new(true));
        let (read_half, mut write_half) = stream.into_split();
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let reader_inbox = Arc::clone(&inbox);
        let reader_open = Arc::clone(&open);
        let reader_peer = peer.clone();
        let reader = tokio::spawn(async move {
            let mut reader = BufReader::new(read_half);
            let mut buf = Vec::new();
            loop {
                match next_frame(&mut reader, &mut buf).await {
                    Ok(Frame::Line(bytes)) => match String::from_utf8(bytes) {
                        Ok(line) => {
                            if line.trim().is_empty() {
                                continue;
                            }
                            // Failures are already logged and never stop the reader
                            let _ = accept_payload(&reader_inbox, &line);
                        }
                        Err(e) => {
                            let e = ChannelError::MalformedPayload(e.to_string());
                            warn!("Discarding inbound payload: {}", e);
                        }
                    },
                    Ok(Frame::Oversized) => {
                        let e = ChannelError::MalformedPayload(format!(
                            "line longer than {} bytes",
                            MAX_LINE_BYTES
                        ));
                        warn!("Discarding inbound payload: {}", e);
                    }
                    Ok(Frame::Eof) => {
                        info!("Command source {} disconnected", reader_peer);
                        break;
                    }
                    Err(e) => {
                        warn!("Command channel read failed: {}", e);
                        break;
                    }
                }
            }
            reader_open.store(false, Ordering::Release);
        });

        let writer_open = Arc::clone(&open);
        tokio::spawn(async move {
            while let Some(mut line) = rx.recv().await {
                line.push('\n');
                if let Err(e) = write_half.write_all(line.as_bytes()).await {
                    warn!("Command channel write to {} failed: {}", peer, e);
                    break;
                }
            }
            writer_open.store(false, Ordering::Release);
        });

        CommandChannel {
            inbox,
            outbound: Mutex::new(Some(tx)),
            open,
            reader: Mutex::new(Some(reader)),
        }
    }
}

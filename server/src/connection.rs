//! Per-connection transport tasks
//!
//! Each accepted socket is split in two. The read half decodes lines and
//! forwards them to the dispatcher; the write half drains the session's
//! outbound queue. Whichever side stops first ends the connection, dropping
//! both halves and closing the socket, and the dispatcher is told to forget
//! the session.

use crate::error::ConnectionError;
use crate::inbound::{InboundEvent, InboundSender};
use log::{debug, info, warn};
use shared::{LineBuffer, SessionId};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

/// Sizes governing how a session's bytes are read and framed
#[derive(Debug, Clone, Copy)]
pub struct ReadLimits {
    pub buffer_size: usize,
    pub max_line_length: usize,
}

/// Runs a session's transport until either direction fails or closes
pub async fn handle_connection(
    id: SessionId,
    stream: TcpStream,
    limits: ReadLimits,
    outbound: mpsc::UnboundedReceiver<String>,
    inbound: InboundSender,
) {
    let (reader, writer) = stream.into_split();

    let result = tokio::select! {
        result = read_loop(id, reader, limits, &inbound) => result,
        result = write_loop(writer, outbound) => result,
    };

    match &result {
        Ok(()) => info!("Player {} closed the connection", id),
        Err(e) => warn!("Player {} connection ended: {}", id, e),
    }

    if inbound
        .send(InboundEvent::Disconnected {
            id,
            reason: result.err(),
        })
        .is_err()
    {
        debug!("Dispatcher gone before player {} disconnect was reported", id);
    }
}

/// Reads transport bytes and forwards every complete line to the dispatcher
///
/// Returns `Ok` on a zero-length read. A peer that goes silent without
/// closing keeps this loop parked on the read; there is no timeout. A line
/// longer than `limits.max_line_length` ends the session.
pub async fn read_loop<R>(
    id: SessionId,
    mut reader: R,
    limits: ReadLimits,
    inbound: &InboundSender,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = vec![0u8; limits.buffer_size];
    let mut lines = LineBuffer::with_max_line_length(limits.max_line_length);

    loop {
        let len = reader.read(&mut buffer).await.map_err(ConnectionError::Read)?;

        if len == 0 {
            if !lines.is_empty() {
                debug!(
                    "Player {} closed with {} unterminated bytes",
                    id,
                    lines.pending().len()
                );
            }
            return Ok(());
        }

        for line in lines.push(&buffer[..len]).map_err(ConnectionError::Framing)? {
            inbound
                .send(InboundEvent::Line { id, line })
                .map_err(|_| ConnectionError::DispatcherClosed)?;
        }
    }
}

/// Writes queued lines to the transport until the queue closes or a write fails
pub async fn write_loop<W>(
    mut writer: W,
    mut outbound: mpsc::UnboundedReceiver<String>,
) -> Result<(), ConnectionError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = outbound.recv().await {
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(ConnectionError::Write)?;
    }
    Ok(())
}

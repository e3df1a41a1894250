//! Protocol client speaking the relay's line protocol

use log::{debug, warn};
use shared::{
    AttackUpdate, ClientCommand, LineBuffer, PositionUpdate, ProtocolError, ServerMessage,
};
use std::collections::VecDeque;
use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

const READ_BUFFER_SIZE: usize = 1024;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Connection to a relay server
///
/// Generic over the transport so it can run over a TCP socket or an
/// in-memory mock.
pub struct RelayClient<S = TcpStream> {
    stream: S,
    lines: LineBuffer,
    pending: VecDeque<String>,
    buffer: Vec<u8>,
}

impl RelayClient<TcpStream> {
    pub async fn connect(addr: &str) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| ClientError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        stream.set_nodelay(true)?;
        Ok(Self::from_stream(stream))
    }
}

impl<S> RelayClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn from_stream(stream: S) -> Self {
        Self {
            stream,
            lines: LineBuffer::new(),
            pending: VecDeque::new(),
            buffer: vec![0u8; READ_BUFFER_SIZE],
        }
    }

    pub async fn send(&mut self, command: &ClientCommand) -> Result<(), ClientError> {
        self.send_raw(&command.encode()).await
    }

    /// Writes text exactly as given, terminator included
    pub async fn send_raw(&mut self, text: &str) -> Result<(), ClientError> {
        self.stream.write_all(text.as_bytes()).await?;
        self.stream.flush().await?;
        Ok(())
    }

    pub async fn join(&mut self, name: &str, character: &str) -> Result<(), ClientError> {
        self.send(&ClientCommand::PlayerData {
            name: name.to_string(),
            character: character.to_string(),
        })
        .await
    }

    pub async fn ready(&mut self) -> Result<(), ClientError> {
        self.send(&ClientCommand::Ready).await
    }

    pub async fn send_position(&mut self, update: PositionUpdate) -> Result<(), ClientError> {
        self.send(&ClientCommand::Position(update)).await
    }

    pub async fn send_attack(&mut self, update: AttackUpdate) -> Result<(), ClientError> {
        self.send(&ClientCommand::Attack(update)).await
    }

    /// Next complete line from the server, or None once it closes the connection
    ///
    /// Cancel safe: no received bytes are lost if the future is dropped.
    pub async fn next_line(&mut self) -> Result<Option<String>, ClientError> {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Ok(Some(line));
            }

            let len = self.stream.read(&mut self.buffer).await?;
            if len == 0 {
                if !self.lines.is_empty() {
                    debug!("Server closed with {} unterminated bytes", self.lines.pending().len());
                }
                return Ok(None);
            }
            self.pending.extend(self.lines.push(&self.buffer[..len])?);
        }
    }

    /// Next server message, skipping lines that fail to parse
    pub async fn next_message(&mut self) -> Result<Option<ServerMessage>, ClientError> {
        while let Some(line) = self.next_line().await? {
            match ServerMessage::parse(&line) {
                Ok(message) => return Ok(Some(message)),
                Err(e) => warn!("Ignoring unexpected line {:?}: {}", line, e),
            }
        }
        Ok(None)
    }
}

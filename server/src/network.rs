//! TCP listener and task wiring for the relay

use crate::config::RelayConfig;
use crate::connection::{handle_connection, ReadLimits};
use crate::dispatcher::Dispatcher;
use crate::error::RelayError;
use crate::inbound::{self, InboundEvent, InboundSender};
use crate::rate_limiter::RateLimiter;
use log::{error, info, warn};
use shared::SessionId;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Pause after a failed accept before trying again
const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

/// Relay server bound to its listening socket
pub struct Server {
    listener: TcpListener,
    config: RelayConfig,
}

impl Server {
    pub async fn bind(config: RelayConfig) -> Result<Self, RelayError> {
        config.validate()?;

        let addr = config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| RelayError::Bind {
                addr: addr.clone(),
                source,
            })?;
        info!("The server is running on {}", addr);

        Ok(Server { listener, config })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RelayError> {
        self.listener.local_addr().map_err(RelayError::LocalAddr)
    }

    /// Starts the dispatcher and accepts connections until the dispatcher stops
    pub async fn run(self) -> Result<(), RelayError> {
        let (inbound_tx, inbound_rx) = inbound::channel();

        let rate_limiter = RateLimiter::new(self.config.broadcast_interval(), self.config.rate_limit);
        let dispatcher = Dispatcher::new(rate_limiter, self.config.dispatch_pacing());
        info!(
            "Broadcast interval {:?} ({:?} scope), dispatch pacing {:?}",
            self.config.broadcast_interval(),
            self.config.rate_limit,
            self.config.dispatch_pacing()
        );
        tokio::spawn(dispatcher.run(inbound_rx));

        self.accept_loop(inbound_tx).await
    }

    async fn accept_loop(&self, inbound: InboundSender) -> Result<(), RelayError> {
        let mut next_id: SessionId = 1;
        let limits = ReadLimits {
            buffer_size: self.config.read_buffer_size,
            max_line_length: self.config.max_line_length,
        };

        loop {
            let (stream, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Accept error: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };

            let id = next_id;
            next_id = next_id.wrapping_add(1).max(1);

            if let Err(e) = stream.set_nodelay(true) {
                warn!("Failed to disable Nagle for {}: {}", addr, e);
            }

            let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

            // Registration is queued before the connection task can queue
            // any of its lines.
            inbound
                .send(InboundEvent::Connected {
                    id,
                    addr,
                    outbound: outbound_tx,
                })
                .map_err(|_| RelayError::DispatcherStopped)?;

            tokio::spawn(handle_connection(
                id,
                stream,
                limits,
                outbound_rx,
                inbound.clone(),
            ));
        }
    }
}

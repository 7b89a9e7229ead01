//! TCP accept loop of the price stream server.
//!
//! Every accepted connection is split into a JSON-lines sink and source and served by
//! its own `ServerSession` on a dedicated thread, with a fresh registry. A failing
//! session is logged and never stops the accept loop.
use log::{debug, error, info};
use quote_common::transport::tcp::{JsonLineSink, JsonLineSource, split_stream};
use quote_common::{PriceUpdate, Result, SubscriptionRequest};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;

use crate::model::price::GeneratorKind;
use crate::session::{ServerSession, SessionConfig};

/// Settings applied to every accepted session.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Timing of each session.
    pub session: SessionConfig,
    /// Price generator built fresh for each session.
    pub generator: GeneratorKind,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            generator: GeneratorKind::Uniform,
        }
    }
}

/// TCP listener that accepts price stream connections.
///
/// Every accepted connection becomes an independent `ServerSession` with its own
/// registry, running on its own thread. A failing session is logged and never stops
/// the listener from accepting new ones.
pub struct QuoteListener {
    /// The underlying TCP listening socket.
    pub(crate) socket: TcpListener,
    config: ServerConfig,
}

impl QuoteListener {
    /// Bind a new listener to `bind_addr` (e.g., `0.0.0.0:50051`).
    pub fn bind(bind_addr: &str, config: ServerConfig) -> Result<Self> {
        let socket = TcpListener::bind(bind_addr)?;
        Ok(Self { socket, config })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Blocking accept loop; one session thread per connection.
    pub fn serve(self) -> Result<()> {
        info!(
            "Price stream server is started on {} (tick {:?}, generator {})",
            self.socket.local_addr()?,
            self.config.session.tick_interval,
            self.config.generator
        );

        for stream in self.socket.incoming() {
            match stream {
                Ok(stream) => {
                    let config = self.config.clone();
                    let spawned = thread::Builder::new()
                        .name("session".to_string())
                        .spawn(move || handle_connection(stream, config));
                    if let Err(e) = spawned {
                        error!("Failed to spawn session thread: {}", e);
                    }
                }
                Err(e) => error!("TCP connection error: {}", e),
            }
        }
        Ok(())
    }
}

/// Run one session to completion and log its outcome.
fn handle_connection(stream: TcpStream, config: ServerConfig) {
    let peer = match stream.peer_addr() {
        Ok(addr) => addr.to_string(),
        Err(e) => {
            error!("Dropping connection without peer address: {}", e);
            return;
        }
    };
    debug!("Accepted connection from {}", peer);

    let halves: Result<(JsonLineSink<PriceUpdate>, JsonLineSource<SubscriptionRequest>)> =
        split_stream(stream);
    let (sink, source) = match halves {
        Ok(halves) => halves,
        Err(e) => {
            error!("Failed to set up stream for {}: {}", peer, e);
            return;
        }
    };

    let session = ServerSession::new(sink, source, config.generator.build(), config.session)
        .with_peer(peer.clone());
    match session.run() {
        Ok(()) => info!("Session {} closed", peer),
        Err(e) => error!("Session {} ended with error: {}", peer, e),
    }
}

//! UDP datagram radio.
//!
//! Stands in for an 802.15.4 link on hosts: every frame is one datagram sent
//! to the configured broadcast address. Datagrams carry no link-level
//! acknowledgement, so a send the OS accepted is reported as
//! [`TransmitOutcome::Acknowledged`].

use crate::error::RadioError;
use crate::frame;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};
use trickle_core::RadioConfig;
use trickle_mesh::{BroadcastChannel, EventSender, TransmitOutcome, TrickleResult, TrickleValue};

/// Largest datagram we bother reading.
const MAX_FRAME_LEN: usize = 127;

/// Transmit half of the link; the receive half runs as a spawned task.
#[derive(Debug, Clone)]
pub struct UdpRadio {
    socket: Arc<UdpSocket>,
    broadcast_addr: SocketAddr,
    pan_id: u16,
    short_address: u16,
    events: EventSender,
}

impl UdpRadio {
    /// Bind the socket described by `config`; outcomes and inbound values go
    /// to `events`.
    pub async fn bind(config: &RadioConfig, events: EventSender) -> Result<Self, RadioError> {
        let socket = UdpSocket::bind(config.bind_addr).await?;
        socket.set_broadcast(true)?;
        info!(
            local_addr = %socket.local_addr()?,
            broadcast_addr = %config.broadcast_addr,
            pan_id = config.pan_id,
            short_address = config.short_address,
            "Radio bound"
        );

        Ok(Self {
            socket: Arc::new(socket),
            broadcast_addr: config.broadcast_addr,
            pan_id: config.pan_id,
            short_address: config.short_address,
            events,
        })
    }

    /// Address the socket is bound to
    pub fn local_addr(&self) -> Result<SocketAddr, RadioError> {
        Ok(self.socket.local_addr()?)
    }

    /// Spawn the receive loop. It filters frames and forwards values until
    /// the node stops or the socket fails.
    pub fn spawn_receiver(&self) -> JoinHandle<()> {
        let socket = Arc::clone(&self.socket);
        let events = self.events.clone();
        let pan_id = self.pan_id;
        let own_address = self.short_address;

        tokio::spawn(async move {
            let mut buf = [0u8; MAX_FRAME_LEN];
            loop {
                let (len, peer) = match socket.recv_from(&mut buf).await {
                    Ok(received) => received,
                    Err(err) => {
                        warn!(error = %err, "Radio receive failed");
                        break;
                    }
                };

                let inbound = match frame::decode(&buf[..len], pan_id) {
                    Ok(inbound) => inbound,
                    Err(err) => {
                        debug!(%peer, error = %err, "Dropping frame");
                        continue;
                    }
                };
                if inbound.src == own_address {
                    trace!(%peer, "Ignoring own frame");
                    continue;
                }

                trace!(%peer, src = inbound.src, value = inbound.value, "Frame received");
                if !events.value_received(inbound.value) {
                    debug!("Node stopped, radio receiver exiting");
                    break;
                }
            }
        })
    }
}

impl BroadcastChannel for UdpRadio {
    fn send(&mut self, value: TrickleValue) -> TrickleResult<()> {
        let payload = frame::encode_broadcast(self.pan_id, self.short_address, value);
        let socket = Arc::clone(&self.socket);
        let events = self.events.clone();
        let target = self.broadcast_addr;

        tokio::spawn(async move {
            let outcome = match socket.send_to(&payload, target).await {
                Ok(_) => TransmitOutcome::Acknowledged,
                Err(err) => {
                    warn!(%target, error = %err, "Datagram send failed");
                    TransmitOutcome::TransportError(err.raw_os_error().unwrap_or(-1))
                }
            };
            events.transmit_completed(outcome);
        });
        Ok(())
    }
}

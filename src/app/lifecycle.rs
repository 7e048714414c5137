//! Connection / advertising lifecycle.
//!
//! ```text
//!              on_start
//!                 │
//!                 ▼
//!   ┌──────▶ Advertising ──on_connect──▶ Connected(peer)
//!   │             ▲                           │
//!   │             │ restart                   │ on_disconnect
//!   │             │                           ▼
//!   └── tick ─────┴──────────────────── Disconnected
//! ```
//!
//! Two independent paths restart advertising: the disconnect callback and
//! the periodic peer enumeration.  Either is enough on its own, so a lost
//! disconnect callback still converges to `Advertising` within one tick.

use log::{error, info, warn};

use crate::config::PEER_SCAN_PERIOD_MS;

use super::attributes::PeerHandle;
use super::ports::{AdvertisingPort, RadioError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Advertising,
    Connected(PeerHandle),
    Disconnected,
}

#[derive(Debug)]
pub struct ConnectionLifecycle {
    state: ConnectionState,
    period_ms: u64,
    last_tick_ms: u64,
}

impl Default for ConnectionLifecycle {
    fn default() -> Self {
        Self::new(PEER_SCAN_PERIOD_MS)
    }
}

impl ConnectionLifecycle {
    pub fn new(period_ms: u64) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            period_ms,
            last_tick_ms: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Begin advertising at peripheral start.  An error here is fatal to
    /// the caller.
    pub fn on_start(&mut self, radio: &mut dyn AdvertisingPort) -> Result<(), RadioError> {
        radio.start_advertising().inspect_err(|e| {
            error!("Lifecycle: advertising failed at start-up: {}", e);
        })?;
        info!("Lifecycle: advertising");
        self.state = ConnectionState::Advertising;
        Ok(())
    }

    /// A central connected.  Accepted in any state, including right after a
    /// restart was issued.
    pub fn on_connect(&mut self, peer: PeerHandle) {
        info!("Lifecycle: peer {} connected", peer.0);
        self.state = ConnectionState::Connected(peer);
    }

    /// A central disconnected.  Forgets the peer and restarts advertising.
    pub fn on_disconnect(&mut self, peer: PeerHandle, radio: &mut dyn AdvertisingPort) {
        info!("Lifecycle: peer {} disconnected", peer.0);
        self.state = ConnectionState::Disconnected;
        self.ensure_advertising(radio);
    }

    /// Call every main cycle; runs [`tick`](Self::tick) once per period.
    pub fn poll(&mut self, now_ms: u64, radio: &mut dyn AdvertisingPort) {
        if now_ms.saturating_sub(self.last_tick_ms) >= self.period_ms {
            self.last_tick_ms = now_ms;
            self.tick(radio);
        }
    }

    /// Enumerate peers and converge: advertising whenever nobody is
    /// connected.
    pub fn tick(&mut self, radio: &mut dyn AdvertisingPort) {
        let peers = radio.connected_peers();
        info!("Lifecycle: {} peer(s) connected", peers.len());

        match peers.first() {
            Some(&peer) => {
                if !matches!(self.state, ConnectionState::Connected(_)) {
                    self.state = ConnectionState::Connected(peer);
                }
            }
            None => {
                if matches!(self.state, ConnectionState::Connected(_)) {
                    warn!("Lifecycle: link lost without a disconnect event");
                    self.state = ConnectionState::Disconnected;
                }
                self.ensure_advertising(radio);
            }
        }
    }

    fn ensure_advertising(&mut self, radio: &mut dyn AdvertisingPort) {
        if radio.is_advertising() {
            self.state = ConnectionState::Advertising;
            return;
        }
        match radio.start_advertising() {
            Ok(()) => {
                info!("Lifecycle: advertising restarted");
                self.state = ConnectionState::Advertising;
            }
            Err(e) => warn!("Lifecycle: advertising restart failed ({}), retrying next tick", e),
        }
    }
}

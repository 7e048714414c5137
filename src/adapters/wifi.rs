//! WiFi station-mode adapter.
//!
//! Implements [`ScannerPort`] (blocking scan for the network-list
//! attribute) and [`ConnectivityPort`] (joining the persisted network at
//! boot).
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `BlockingWifi<EspWifi>` from `esp_idf_svc::wifi`.
//!   The modem is split with the BLE controller, so both radios share it.
//! - **all other targets**: simulation with a configurable scan result and
//!   injectable connect failures for host-side tests.

use log::{error, info, warn};

use crate::app::ports::{ConnectivityError, ConnectivityPort, ScannerPort};
use crate::config::{DeviceSettings, WIFI_CONNECT_ATTEMPTS, WIFI_CONNECT_WAIT_MS};

use super::utils::validate_credentials;

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::WifiModem,
    wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    /// Simulation: what the next scan reports.
    #[cfg(not(target_os = "espidf"))]
    sim_networks: Vec<String>,
    /// Simulation: number of upcoming connect attempts that fail.
    #[cfg(not(target_os = "espidf"))]
    sim_failures: u32,
}

impl WifiAdapter {
    /// Bring up the station interface (started, not associated) so that
    /// scans work before any credentials exist.
    #[cfg(target_os = "espidf")]
    pub fn new(modem: WifiModem, sysloop: EspSystemEventLoop) -> Result<Self, ConnectivityError> {
        let driver = EspWifi::new(modem, sysloop.clone(), None).map_err(|e| {
            error!("WiFi: driver init failed: {}", e);
            ConnectivityError::ConnectionFailed
        })?;
        let mut wifi = BlockingWifi::wrap(driver, sysloop).map_err(|e| {
            error!("WiFi: event loop wrap failed: {}", e);
            ConnectivityError::ConnectionFailed
        })?;
        wifi.set_configuration(&Configuration::Client(ClientConfiguration::default()))
            .and_then(|()| wifi.start())
            .map_err(|e| {
                error!("WiFi: station start failed: {}", e);
                ConnectivityError::ConnectionFailed
            })?;
        info!("WiFi: station started");

        Ok(Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            wifi,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            sim_networks: Vec::new(),
            sim_failures: 0,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_networks(&mut self, names: &[&str]) {
        self.sim_networks = names.iter().map(|n| (*n).to_string()).collect();
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_next_connects(&mut self, count: u32) {
        self.sim_failures = count;
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_scan(&mut self) -> Vec<String> {
        match self.wifi.scan() {
            Ok(aps) => aps
                .into_iter()
                .filter(|ap| !ap.ssid.is_empty())
                .map(|ap| ap.ssid.as_str().to_string())
                .collect(),
            Err(e) => {
                warn!("WiFi: scan failed: {}", e);
                Vec::new()
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_scan(&mut self) -> Vec<String> {
        self.sim_networks
            .iter()
            .filter(|n| !n.is_empty())
            .cloned()
            .collect()
    }

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: self
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });

        self.wifi
            .set_configuration(&config)
            .and_then(|()| self.wifi.connect())
            .and_then(|()| self.wifi.wait_netif_up())
            .map_err(|e| {
                warn!("WiFi: join failed: {}", e);
                ConnectivityError::ConnectionFailed
            })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        if self.sim_failures > 0 {
            self.sim_failures -= 1;
            return Err(ConnectivityError::ConnectionFailed);
        }
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Err(e) = self.wifi.disconnect() {
            warn!("WiFi: disconnect failed: {}", e);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {}

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.state == WifiState::Connected
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// ScannerPort
// ───────────────────────────────────────────────────────────────

impl ScannerPort for WifiAdapter {
    fn scan(&mut self) -> Vec<String> {
        let networks = self.platform_scan();
        info!("WiFi: scan found {} network(s)", networks.len());
        networks
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_credentials(ssid, password)?;
        self.ssid.clear();
        self.ssid
            .push_str(ssid)
            .map_err(|()| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|()| ConnectivityError::InvalidPassword)?;
        info!(
            "WiFi: credentials updated (SSID='{}', password {} bytes)",
            self.ssid,
            self.password.len()
        );
        Ok(())
    }

    fn connect(&mut self) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        if self.state == WifiState::Connected {
            return Err(ConnectivityError::AlreadyConnected);
        }

        info!("WiFi: connecting to '{}'", self.ssid);
        self.state = WifiState::Connecting;
        match self.platform_connect() {
            Ok(()) => {
                self.state = WifiState::Connected;
                info!("WiFi: connected");
                Ok(())
            }
            Err(e) => {
                self.state = WifiState::Failed;
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        self.state = WifiState::Disconnected;
        info!("WiFi: disconnected");
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }
}

// ───────────────────────────────────────────────────────────────
// Boot-time join
// ───────────────────────────────────────────────────────────────

/// Join the persisted network if Wi-Fi is enabled and an SSID is stored.
///
/// Tries up to [`WIFI_CONNECT_ATTEMPTS`] times, calling `pause` with
/// [`WIFI_CONNECT_WAIT_MS`] between attempts.  Never fatal; returns whether
/// the station ended up connected.
pub fn join_configured_network<C: ConnectivityPort>(
    wifi: &mut C,
    settings: &DeviceSettings,
    mut pause: impl FnMut(u32),
) -> bool {
    if !settings.wifi_enabled {
        info!("WiFi: disabled in settings, not joining");
        return false;
    }
    if settings.wifi_ssid.is_empty() {
        info!("WiFi: no SSID configured, not joining");
        return false;
    }
    if let Err(e) = wifi.set_credentials(&settings.wifi_ssid, &settings.wifi_password) {
        warn!("WiFi: stored credentials rejected: {}", e);
        return false;
    }

    for attempt in 1..=WIFI_CONNECT_ATTEMPTS {
        match wifi.connect() {
            Ok(()) | Err(ConnectivityError::AlreadyConnected) => return true,
            Err(e) => {
                warn!(
                    "WiFi: attempt {}/{} failed: {}",
                    attempt, WIFI_CONNECT_ATTEMPTS, e
                );
                if attempt < WIFI_CONNECT_ATTEMPTS {
                    pause(WIFI_CONNECT_WAIT_MS);
                }
            }
        }
    }
    error!("WiFi: giving up after {} attempts", WIFI_CONNECT_ATTEMPTS);
    false
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────

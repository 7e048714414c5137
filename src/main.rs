//! PhotonIQ firmware entry point.
//!
//! BLE light-sensor peripheral with hexagonal ports/adapters.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  Tsl2591        BleAdapter        NvsAdapter     WifiAdapter   │
//! │  (SensorPort)   (Advertising +    (StoragePort)  (Scanner +    │
//! │                  EventSink)                       Connectivity)│
//! │  LogEventSink   UptimeClock                                    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │           AttributeServer (pure logic)                 │    │
//! │  │  Registry · Dispatcher · ScanOrchestrator · Settings   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  ConnectionLifecycle (5 s safety net) · StatePublisher (light) │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::{Arc, Mutex};

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::units::Hertz;

use photoniq::adapters::ble::{BleAdapter, GattLayout};
use photoniq::adapters::lock;
use photoniq::adapters::log_sink::LogEventSink;
use photoniq::adapters::nvs::NvsAdapter;
use photoniq::adapters::time::UptimeClock;
use photoniq::adapters::wifi::{join_configured_network, WifiAdapter};
use photoniq::app::lifecycle::ConnectionLifecycle;
use photoniq::app::ports::SettingsPort;
use photoniq::app::publisher::StatePublisher;
use photoniq::app::server::AttributeServer;
use photoniq::app::settings::SettingsStore;
use photoniq::config::{BLE_READY_TIMEOUT_MS, I2C_BAUDRATE_HZ, MAIN_CYCLE_PERIOD_MS};
use photoniq::error::Error;
use photoniq::sensors::tsl2591::Tsl2591;

/// Fatal boot failure: log and park the task.  The task watchdog resets
/// the chip in production builds.
fn halt(e: &Error) -> ! {
    error!("Fatal: {}, halting", e);
    loop {
        FreeRtos::delay_ms(1_000);
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  PhotonIQ v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Settings ───────────────────────────────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            NvsAdapter::default()
        }
    };
    let settings = SettingsStore::new(nvs);
    let loaded = settings.load();
    info!("Settings loaded (name={:?})", loaded.name);

    // ── 3. Wi-Fi station + boot-time join ─────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let (wifi_modem, bt_modem) = peripherals.modem.split();

    let mut wifi = WifiAdapter::new(wifi_modem, sysloop).map_err(Error::from)?;
    if join_configured_network(&mut wifi, &loaded, FreeRtos::delay_ms) {
        info!("WiFi: joined {:?}", loaded.wifi_ssid);
    }

    // ── 4. Light sensor (non-fatal) ───────────────────────────
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio22,
        &I2cConfig::new().baudrate(Hertz(I2C_BAUDRATE_HZ)),
    )?;
    let mut sensor = Tsl2591::new(i2c);
    if let Err(e) = sensor.begin() {
        warn!("TSL2591 unavailable ({}), publishing placeholder readings", e);
    }
    let mut publisher = StatePublisher::new(sensor);

    // ── 5. BLE stack ──────────────────────────────────────────
    let ble = match BleAdapter::new(bt_modem) {
        Ok(b) => b,
        Err(e) => halt(&e.into()),
    };

    // ── 6. Attribute server + connection lifecycle ────────────
    let server = Arc::new(Mutex::new(AttributeServer::new(
        settings,
        wifi,
        (ble.clone(), LogEventSink::new()),
    )));
    let lifecycle = Arc::new(Mutex::new(ConnectionLifecycle::default()));

    let layout = {
        let srv = lock(&server);
        GattLayout::build(srv.registry(), &srv.snapshot())
    };
    if let Err(e) = ble
        .start(layout, server.clone(), lifecycle.clone())
        .and_then(|()| ble.wait_ready(BLE_READY_TIMEOUT_MS))
    {
        halt(&e.into());
    }

    let mut radio = ble.clone();
    if let Err(e) = lock(&lifecycle).on_start(&mut radio) {
        halt(&e.into());
    }

    info!("System ready. Entering main cycle.");

    // ── 7. Main cycle ─────────────────────────────────────────
    let clock = UptimeClock::new();
    loop {
        lock(&lifecycle).poll(clock.uptime_ms(), &mut radio);

        // Sample outside the server lock so radio writes are not held
        // up by the I2C transaction.
        let reading = publisher.sample();
        lock(&server).publish_light(&reading);

        FreeRtos::delay_ms(MAIN_CYCLE_PERIOD_MS);
    }
}

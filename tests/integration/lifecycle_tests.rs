//! End-to-end tests through the simulated radio: connection lifecycle,
//! writes arriving on the radio callback and values mirrored back into
//! the GATT table.

use std::sync::{Arc, Mutex};
use std::thread;

use photoniq::adapters::ble::{BleAdapter, GattLayout};
use photoniq::adapters::lock;
use photoniq::adapters::time::UptimeClock;
use photoniq::app::attributes::{
    PeerHandle, CHAR_LIGHT_LEVEL, CHAR_SENSOR_NAME, CHAR_WIFI_NETWORKS, CHAR_WIFI_SCAN_CMD,
};
use photoniq::app::lifecycle::{ConnectionLifecycle, ConnectionState};
use photoniq::app::ports::{AdvertisingPort, SettingsPort};
use photoniq::app::server::AttributeServer;
use photoniq::app::settings::SettingsStore;
use photoniq::config::PEER_SCAN_PERIOD_MS;

use crate::mock_hw::{MockNvs, MockScanner, RecordingSink};

type RadioServer = AttributeServer<SettingsStore<MockNvs>, MockScanner, (BleAdapter, RecordingSink)>;

struct Device {
    radio: BleAdapter,
    server: Arc<Mutex<RadioServer>>,
    lifecycle: Arc<Mutex<ConnectionLifecycle>>,
    clock: UptimeClock,
}

impl Device {
    fn boot(scanner: MockScanner) -> Self {
        let radio = BleAdapter::new();
        let server = Arc::new(Mutex::new(AttributeServer::new(
            SettingsStore::new(MockNvs::new()),
            scanner,
            (radio.clone(), RecordingSink::new()),
        )));
        let lifecycle = Arc::new(Mutex::new(ConnectionLifecycle::default()));

        let layout = {
            let srv = lock(&server);
            GattLayout::build(srv.registry(), &srv.snapshot())
        };
        radio.start(layout, server.clone(), lifecycle.clone()).unwrap();
        radio.wait_ready(0).unwrap();

        let mut handle = radio.clone();
        lock(&lifecycle).on_start(&mut handle).unwrap();

        Self {
            radio,
            server,
            lifecycle,
            clock: UptimeClock::new(),
        }
    }

    fn state(&self) -> ConnectionState {
        lock(&self.lifecycle).state()
    }

    /// Advance one lifecycle period and run the main-cycle poll.
    fn next_tick(&mut self) {
        self.clock.advance_ms(PEER_SCAN_PERIOD_MS);
        let mut handle = self.radio.clone();
        lock(&self.lifecycle).poll(self.clock.uptime_ms(), &mut handle);
    }
}

// ── Lifecycle ─────────────────────────────────────────────────

#[test]
fn boot_starts_advertising() {
    let dev = Device::boot(MockScanner::default());
    assert_eq!(dev.state(), ConnectionState::Advertising);
    assert!(dev.radio.is_advertising());
    assert_eq!(dev.radio.advertising_starts(), 1);
}

#[test]
fn boot_fails_when_advertising_cannot_start() {
    let radio = BleAdapter::new();
    radio.sim_fail_advertising(true);
    let mut lifecycle = ConnectionLifecycle::default();
    let mut handle = radio.clone();
    assert!(lifecycle.on_start(&mut handle).is_err());
    assert_eq!(lifecycle.state(), ConnectionState::Disconnected);
}

#[test]
fn connect_then_disconnect_resumes_advertising() {
    let dev = Device::boot(MockScanner::default());

    dev.radio.sim_connect(PeerHandle(1));
    assert_eq!(dev.state(), ConnectionState::Connected(PeerHandle(1)));
    assert!(!dev.radio.is_advertising());

    dev.radio.sim_disconnect(PeerHandle(1));
    assert_eq!(dev.state(), ConnectionState::Advertising);
    assert!(dev.radio.is_advertising());
}

#[test]
fn dropped_disconnect_recovers_within_one_tick() {
    let mut dev = Device::boot(MockScanner::default());
    dev.radio.sim_connect(PeerHandle(3));
    dev.radio.sim_drop_link(PeerHandle(3));

    // No callback arrived; the lifecycle still believes it is connected.
    assert_eq!(dev.state(), ConnectionState::Connected(PeerHandle(3)));

    dev.next_tick();
    assert_eq!(dev.state(), ConnectionState::Advertising);
    assert!(dev.radio.is_advertising());
}

#[test]
fn late_advertising_failure_is_retried_next_tick() {
    let mut dev = Device::boot(MockScanner::default());
    dev.radio.sim_advertising_failed();
    assert!(!dev.radio.is_advertising());

    dev.next_tick();
    assert_eq!(dev.state(), ConnectionState::Advertising);
    assert!(dev.radio.is_advertising());
    assert_eq!(dev.radio.advertising_starts(), 2);
}

#[test]
fn dropped_link_among_several_peers_keeps_the_live_one() {
    let mut dev = Device::boot(MockScanner::default());
    dev.radio.sim_connect(PeerHandle(1));
    dev.radio.sim_connect(PeerHandle(2));
    dev.radio.sim_drop_link(PeerHandle(2));
    let starts = dev.radio.advertising_starts();

    dev.next_tick();
    assert_eq!(dev.radio.connected_peers().as_slice(), &[PeerHandle(1)]);
    assert_eq!(dev.radio.advertising_starts(), starts);
}

#[test]
fn tick_keeps_connected_peer() {
    let mut dev = Device::boot(MockScanner::default());
    dev.radio.sim_connect(PeerHandle(2));
    let starts = dev.radio.advertising_starts();

    dev.next_tick();
    assert_eq!(dev.state(), ConnectionState::Connected(PeerHandle(2)));
    assert_eq!(dev.radio.advertising_starts(), starts);
}

#[test]
fn failed_restart_is_retried_next_tick() {
    let mut dev = Device::boot(MockScanner::default());
    dev.radio.sim_connect(PeerHandle(1));

    dev.radio.sim_fail_advertising(true);
    dev.radio.sim_disconnect(PeerHandle(1));
    assert!(!dev.radio.is_advertising());

    dev.radio.sim_fail_advertising(false);
    dev.next_tick();
    assert_eq!(dev.state(), ConnectionState::Advertising);
    assert!(dev.radio.is_advertising());
}

#[test]
fn connect_accepted_while_restart_pending() {
    let dev = Device::boot(MockScanner::default());
    dev.radio.sim_fail_advertising(true);
    dev.radio.sim_connect(PeerHandle(1));
    dev.radio.sim_disconnect(PeerHandle(1));

    dev.radio.sim_connect(PeerHandle(5));
    assert_eq!(dev.state(), ConnectionState::Connected(PeerHandle(5)));
}

// ── Writes over the radio ─────────────────────────────────────

#[test]
fn radio_write_reaches_settings() {
    let dev = Device::boot(MockScanner::default());
    dev.radio.sim_connect(PeerHandle(1));
    assert!(dev.radio.sim_write(CHAR_SENSOR_NAME, b"Kitchen"));

    let srv = lock(&dev.server);
    assert_eq!(srv.text(CHAR_SENSOR_NAME), "Kitchen");
    assert_eq!(srv.settings().load().name, "Kitchen");
    assert_eq!(dev.radio.value(CHAR_SENSOR_NAME), Some(b"Kitchen".to_vec()));
}

#[test]
fn radio_scan_command_round_trip() {
    let dev = Device::boot(MockScanner::with(&["Net-A", "Net-B"]));
    dev.radio.sim_connect(PeerHandle(1));
    assert!(dev.radio.sim_write(CHAR_WIFI_SCAN_CMD, &[0x01]));

    assert_eq!(
        dev.radio.value(CHAR_WIFI_NETWORKS),
        Some(b"Net-A, Net-B".to_vec())
    );
    assert_eq!(dev.radio.value(CHAR_WIFI_SCAN_CMD), Some(vec![0x00]));
    assert_eq!(dev.radio.notifications(), 1);
}

#[test]
fn light_notifies_without_subscribers() {
    let dev = Device::boot(MockScanner::default());
    lock(&dev.server).publish_light("42.00 lux");
    lock(&dev.server).publish_light("42.00 lux");

    assert_eq!(dev.radio.value(CHAR_LIGHT_LEVEL), Some(b"42.00 lux".to_vec()));
    assert_eq!(dev.radio.notifications(), 2);
    assert_eq!(lock(&dev.server).sink().1.notifications(CHAR_LIGHT_LEVEL), 2);
}

#[test]
fn radio_writes_interleave_with_main_cycle_publishes() {
    const ROUNDS: u32 = 50;
    let dev = Device::boot(MockScanner::default());
    dev.radio.sim_connect(PeerHandle(1));

    let radio = dev.radio.clone();
    let writer = thread::spawn(move || {
        for i in 0..ROUNDS {
            assert!(radio.sim_write(CHAR_SENSOR_NAME, format!("Name-{i}").as_bytes()));
            thread::yield_now();
        }
    });

    for i in 0..ROUNDS {
        lock(&dev.server).publish_light(&format!("{i}.00 lux"));
        thread::yield_now();
    }
    writer.join().unwrap();

    let last_name = format!("Name-{}", ROUNDS - 1);
    let last_light = format!("{}.00 lux", ROUNDS - 1);

    let srv = lock(&dev.server);
    assert_eq!(srv.text(CHAR_SENSOR_NAME), last_name);
    assert_eq!(srv.settings().load().name, last_name);
    assert_eq!(srv.text(CHAR_LIGHT_LEVEL), last_light);
    assert_eq!(srv.sink().1.notifications(CHAR_LIGHT_LEVEL), ROUNDS as usize);
    drop(srv);

    assert_eq!(dev.radio.value(CHAR_SENSOR_NAME), Some(last_name.into_bytes()));
    assert_eq!(dev.radio.value(CHAR_LIGHT_LEVEL), Some(last_light.into_bytes()));
}

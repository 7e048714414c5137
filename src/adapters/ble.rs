//! BLE GATT server adapter.
//!
//! Implements [`AdvertisingPort`] and [`EventSink`] for the attribute
//! server, and feeds inbound characteristic writes into a [`WriteTarget`].
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid GATT server via `esp_idf_svc::bt::ble`.
//! - **all other targets**: simulation that mirrors values in memory and
//!   lets tests inject connects, disconnects, dropped links and writes.
//!
//! ## Shared context
//!
//! `BleAdapter` is a `Clone` handle over `Arc<Mutex<RadioState>>`.
//! The GAP/GATTS subscriptions capture a clone of the adapter plus the
//! `Arc<Mutex<_>>` handles of the write target (the attribute server) and
//! the connection lifecycle.  Lock order is always
//! server | lifecycle → radio state; the radio lock is never held while
//! calling out.
//!
//! ## Peer tracking
//!
//! Connect and disconnect callbacks maintain the peer table.  When the
//! lifecycle enumerates peers, each tracked peer is also checked against
//! the controller's live links (`esp_ble_gap_get_current_conn_params` on
//! the device), and peers without a link are dropped.  A lost disconnect
//! callback therefore cannot keep a stale peer alive.
//!
//! The advertising flag is raised when a start is handed to the stack and
//! settled by the GAP `AdvertisingStarted` event, so a failure reported
//! before the start call returns is never overwritten.
//!
//! ## Advertising payload
//!
//! | Packet        | Content                                         |
//! |---------------|-------------------------------------------------|
//! | Advertising   | flags, sensor service UUID                      |
//! | Scan response | device name `LightSensor`, configuration UUID   |
//!
//! A 128-bit UUID takes 18 of the 31 bytes per packet, so the network-scan
//! service is discovered through the GATT table only.

use std::sync::{Arc, Mutex};

use log::{info, warn};

use crate::app::attributes::{Access, AttributeId, PeerHandle, ServiceGroup};
use crate::app::events::AttributeEvent;
use crate::app::lifecycle::ConnectionLifecycle;
use crate::app::ports::{AdvertisingPort, EventSink, RadioError, WriteTarget};
use crate::app::registry::AttributeRegistry;
use crate::config::MAX_PEERS;

use super::utils::lock;

#[cfg(target_os = "espidf")]
use crate::config::{ADVERTISED_NAME, MAX_ATTRIBUTE_LEN};

#[cfg(target_os = "espidf")]
use log::{debug, error};

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    bt::{
        ble::{
            gap::{AdvConfiguration, BleGapEvent, EspBleGap},
            gatt::{
                server::{EspGatts, GattsEvent},
                AutoResponse, GattCharacteristic, GattDescriptor, GattId, GattInterface,
                GattServiceId, GattStatus, Handle, Permission, Property,
            },
        },
        BdAddr, Ble, BtDriver, BtStatus, BtUuid,
    },
    hal::{delay::FreeRtos, modem::BluetoothModem},
    sys::{esp_ble_gap_get_current_conn_params, esp_err_t, esp_gap_conn_params_t, EspError, ESP_OK},
};

#[cfg(target_os = "espidf")]
use enumset::EnumSet;

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
const APP_ID: u16 = 0;

/// Client Characteristic Configuration descriptor.
#[cfg(target_os = "espidf")]
const CCCD_UUID: u16 = 0x2902;

#[cfg(target_os = "espidf")]
const READY_POLL_MS: u32 = 50;

#[cfg(target_os = "espidf")]
type BleDriver = BtDriver<'static, Ble>;
#[cfg(target_os = "espidf")]
type Gap = EspBleGap<'static, Ble, Arc<BleDriver>>;
#[cfg(target_os = "espidf")]
type Gatts = EspGatts<'static, Ble, Arc<BleDriver>>;

type SharedTarget = Arc<Mutex<dyn WriteTarget + Send>>;
type SharedLifecycle = Arc<Mutex<ConnectionLifecycle>>;

// ───────────────────────────────────────────────────────────────
// GATT layout
// ───────────────────────────────────────────────────────────────

/// One characteristic as it is created in the stack.
#[derive(Debug, Clone)]
pub struct GattChar {
    pub id: AttributeId,
    pub service: ServiceGroup,
    pub access: Access,
    pub initial: Vec<u8>,
}

/// The GATT table derived from the attribute registry, seeded with the
/// server's current values.
#[derive(Debug, Clone, Default)]
pub struct GattLayout {
    chars: Vec<GattChar>,
}

impl GattLayout {
    pub fn build(registry: &AttributeRegistry, snapshot: &[(AttributeId, Vec<u8>)]) -> Self {
        let chars = registry
            .iter()
            .map(|d| GattChar {
                id: d.id,
                service: d.service,
                access: d.access,
                initial: snapshot
                    .iter()
                    .find(|(id, _)| *id == d.id)
                    .map_or_else(|| d.initial.to_vec(), |(_, v)| v.clone()),
            })
            .collect();
        Self { chars }
    }

    pub fn chars(&self) -> &[GattChar] {
        &self.chars
    }

    pub fn in_service(&self, service: ServiceGroup) -> impl Iterator<Item = &GattChar> {
        self.chars.iter().filter(move |c| c.service == service)
    }

    /// Attribute handles a service needs: its declaration, declaration +
    /// value per characteristic, and a CCCD per notifiable one.
    pub fn handle_count(&self, service: ServiceGroup) -> u16 {
        self.in_service(service)
            .map(|c| if c.access.notify { 3 } else { 2 })
            .sum::<u16>()
            + 1
    }
}

// ───────────────────────────────────────────────────────────────
// Radio state
// ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct RadioState {
    layout: GattLayout,
    /// Last value pushed into the stack per characteristic.
    values: Vec<(AttributeId, Vec<u8>)>,
    peers: heapless::Vec<PeerHandle, MAX_PEERS>,
    advertising: bool,
    /// A start was handed to the stack and its outcome is not known yet.
    advertising_pending: bool,
    started: bool,
    notifications: u32,
    #[cfg(target_os = "espidf")]
    gatt_if: Option<GattInterface>,
    #[cfg(target_os = "espidf")]
    handles: Vec<(AttributeId, Handle)>,
    #[cfg(target_os = "espidf")]
    adv_configs_pending: u8,
    #[cfg(target_os = "espidf")]
    ready: bool,
    #[cfg(target_os = "espidf")]
    failed: bool,
    /// Remote address per tracked peer, for the link check.
    #[cfg(target_os = "espidf")]
    addrs: heapless::Vec<(PeerHandle, BdAddr), MAX_PEERS>,
    /// Links the simulated controller holds.
    #[cfg(not(target_os = "espidf"))]
    links: heapless::Vec<PeerHandle, MAX_PEERS>,
    #[cfg(not(target_os = "espidf"))]
    target: Option<SharedTarget>,
    #[cfg(not(target_os = "espidf"))]
    lifecycle: Option<SharedLifecycle>,
    #[cfg(not(target_os = "espidf"))]
    advertising_starts: u32,
    #[cfg(not(target_os = "espidf"))]
    fail_advertising: bool,
}

impl RadioState {
    fn advertising_requested(&mut self) {
        self.advertising_pending = true;
    }

    fn advertising_settled(&mut self, started: bool) {
        self.advertising_pending = false;
        self.advertising = started;
    }

    fn is_advertising(&self) -> bool {
        self.advertising || self.advertising_pending
    }

    /// A central connected; the controller stops advertising.
    fn track(&mut self, peer: PeerHandle) -> bool {
        self.advertising_settled(false);
        if self.peers.contains(&peer) {
            return true;
        }
        self.peers.push(peer).is_ok()
    }

    fn forget(&mut self, peer: PeerHandle) {
        self.peers.retain(|p| *p != peer);
        #[cfg(target_os = "espidf")]
        self.addrs.retain(|(p, _)| *p != peer);
        #[cfg(not(target_os = "espidf"))]
        self.links.retain(|p| *p != peer);
    }

    fn mirror(&mut self, id: AttributeId, value: &[u8]) -> bool {
        match self.values.iter_mut().find(|(slot, _)| *slot == id) {
            Some((_, v)) => {
                v.clear();
                v.extend_from_slice(value);
                true
            }
            None => false,
        }
    }

    fn load_layout(&mut self, layout: GattLayout) {
        self.values = layout
            .chars()
            .iter()
            .map(|c| (c.id, c.initial.clone()))
            .collect();
        self.layout = layout;
    }

    #[cfg(target_os = "espidf")]
    fn id_for(&self, handle: Handle) -> Option<AttributeId> {
        self.handles
            .iter()
            .find(|(_, h)| *h == handle)
            .map(|(id, _)| *id)
    }

    #[cfg(target_os = "espidf")]
    fn handle_for(&self, id: AttributeId) -> Option<Handle> {
        self.handles.iter().find(|(i, _)| *i == id).map(|(_, h)| *h)
    }
}

// ───────────────────────────────────────────────────────────────
// BLE adapter
// ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct BleAdapter {
    state: Arc<Mutex<RadioState>>,
    #[cfg(target_os = "espidf")]
    gap: Arc<Gap>,
    #[cfg(target_os = "espidf")]
    gatts: Arc<Gatts>,
}

impl BleAdapter {
    /// Bring up the controller and Bluedroid host.  Fails fatally if the
    /// stack cannot be initialised.
    #[cfg(target_os = "espidf")]
    pub fn new(modem: BluetoothModem) -> Result<Self, RadioError> {
        let bt = Arc::new(BtDriver::new(modem, None).map_err(|e| {
            error!("BLE: controller init failed: {}", e);
            RadioError::StackInitFailed
        })?);
        let gap = EspBleGap::new(bt.clone()).map_err(|e| {
            error!("BLE: GAP init failed: {}", e);
            RadioError::StackInitFailed
        })?;
        let gatts = EspGatts::new(bt).map_err(|e| {
            error!("BLE: GATTS init failed: {}", e);
            RadioError::StackInitFailed
        })?;
        info!("BLE: Bluedroid stack initialised");
        Ok(Self {
            state: Arc::new(Mutex::new(RadioState::default())),
            gap: Arc::new(gap),
            gatts: Arc::new(gatts),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RadioState::default())),
        }
    }

    /// Register the GATT application and wire the callbacks.  The table is
    /// built asynchronously; call [`wait_ready`](Self::wait_ready) before
    /// the first advertising start.
    #[cfg(target_os = "espidf")]
    pub fn start<T>(
        &self,
        layout: GattLayout,
        target: Arc<Mutex<T>>,
        lifecycle: SharedLifecycle,
    ) -> Result<(), RadioError>
    where
        T: WriteTarget + Send + 'static,
    {
        {
            let mut st = lock(&self.state);
            st.load_layout(layout);
            st.adv_configs_pending = 2;
            st.started = true;
        }

        let target: SharedTarget = target;

        let gap_radio = self.clone();
        self.gap
            .subscribe(move |event| gap_radio.on_gap_event(event))
            .map_err(|e| {
                error!("BLE: GAP subscribe failed: {}", e);
                RadioError::StackInitFailed
            })?;

        let gatts_radio = self.clone();
        self.gatts
            .subscribe(move |(gatt_if, event)| {
                gatts_radio.on_gatts_event(gatt_if, event, &target, &lifecycle);
            })
            .map_err(|e| {
                error!("BLE: GATTS subscribe failed: {}", e);
                RadioError::StackInitFailed
            })?;

        self.gatts.register_app(APP_ID).map_err(|e| {
            error!("BLE: GATT app registration failed: {}", e);
            RadioError::GattFailed
        })?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn start<T>(
        &self,
        layout: GattLayout,
        target: Arc<Mutex<T>>,
        lifecycle: SharedLifecycle,
    ) -> Result<(), RadioError>
    where
        T: WriteTarget + Send + 'static,
    {
        let mut st = lock(&self.state);
        st.load_layout(layout);
        st.target = Some(target);
        st.lifecycle = Some(lifecycle);
        st.started = true;
        info!(
            "BLE(sim): GATT table ready ({} characteristics)",
            st.layout.chars().len()
        );
        Ok(())
    }

    /// Block until the services exist and the advertising payload is set.
    #[cfg(target_os = "espidf")]
    pub fn wait_ready(&self, timeout_ms: u32) -> Result<(), RadioError> {
        let mut waited = 0;
        loop {
            {
                let st = lock(&self.state);
                if st.failed {
                    return Err(RadioError::GattFailed);
                }
                if st.ready {
                    return Ok(());
                }
            }
            if waited >= timeout_ms {
                error!("BLE: GATT setup timed out after {}ms", timeout_ms);
                return Err(RadioError::StackInitFailed);
            }
            FreeRtos::delay_ms(READY_POLL_MS);
            waited += READY_POLL_MS;
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn wait_ready(&self, _timeout_ms: u32) -> Result<(), RadioError> {
        if lock(&self.state).started {
            Ok(())
        } else {
            Err(RadioError::StackInitFailed)
        }
    }

    /// Last value mirrored into the stack for `id`.
    pub fn value(&self, id: AttributeId) -> Option<Vec<u8>> {
        lock(&self.state)
            .values
            .iter()
            .find(|(slot, _)| *slot == id)
            .map(|(_, v)| v.clone())
    }

    /// Notifications requested since start.
    pub fn notifications(&self) -> u32 {
        lock(&self.state).notifications
    }

    // ── Simulation hooks ──────────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    pub fn advertising_starts(&self) -> u32 {
        lock(&self.state).advertising_starts
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_advertising(&self, fail: bool) {
        lock(&self.state).fail_advertising = fail;
    }

    /// A central connects: the controller stops advertising, then the
    /// connect callback fires.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_connect(&self, peer: PeerHandle) {
        let lifecycle = {
            let mut st = lock(&self.state);
            if st.track(peer) {
                if !st.links.contains(&peer) {
                    let _ = st.links.push(peer);
                }
            } else {
                warn!("BLE(sim): peer table full, {} not tracked", peer.0);
            }
            st.lifecycle.clone()
        };
        if let Some(lc) = lifecycle {
            lock(&lc).on_connect(peer);
        }
    }

    /// A central disconnects and the disconnect callback fires.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_disconnect(&self, peer: PeerHandle) {
        let lifecycle = {
            let mut st = lock(&self.state);
            st.forget(peer);
            st.lifecycle.clone()
        };
        if let Some(lc) = lifecycle {
            let mut radio = self.clone();
            lock(&lc).on_disconnect(peer, &mut radio);
        }
    }

    /// The link is lost but the disconnect callback never arrives.  The
    /// peer stays in the table until the next enumeration.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop_link(&self, peer: PeerHandle) {
        lock(&self.state).links.retain(|p| *p != peer);
    }

    /// The stack reports an advertising start as failed after the start
    /// call already returned.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_advertising_failed(&self) {
        lock(&self.state).advertising_settled(false);
    }

    /// A central writes a characteristic.  The stack stores the bytes, then
    /// the write callback fires.  Returns `false` if `id` is not in the
    /// GATT table or the server is not attached.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_write(&self, id: AttributeId, value: &[u8]) -> bool {
        let target = {
            let mut st = lock(&self.state);
            if !st.mirror(id, value) {
                return false;
            }
            st.target.clone()
        };
        match target {
            Some(t) => {
                lock(&t).on_write(id, value);
                true
            }
            None => false,
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_publish(&self, id: AttributeId, value: &[u8], notify: bool) {
        let (handle, gatt_if, peers) = {
            let st = lock(&self.state);
            (st.handle_for(id), st.gatt_if, st.peers.clone())
        };
        let Some(handle) = handle else {
            debug!("BLE: {} not in GATT table yet", id);
            return;
        };
        if let Err(e) = self.gatts.set_attr(handle, value) {
            warn!("BLE: set_attr({}) failed: {}", id, e);
        }
        if let (true, Some(gatt_if)) = (notify, gatt_if) {
            for peer in &peers {
                if let Err(e) = self.gatts.notify(gatt_if, peer.0, handle, value) {
                    warn!("BLE: notify peer {} failed: {}", peer.0, e);
                }
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(&self, _id: AttributeId, _value: &[u8], _notify: bool) {}

    /// The outcome arrives as a GAP event, possibly before this returns.
    #[cfg(target_os = "espidf")]
    fn platform_start_advertising(&self) -> Result<(), RadioError> {
        lock(&self.state).advertising_requested();
        self.gap.start_advertising().map_err(|e| {
            warn!("BLE: start_advertising failed: {}", e);
            lock(&self.state).advertising_settled(false);
            RadioError::AdvertisingFailed
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start_advertising(&self) -> Result<(), RadioError> {
        let mut st = lock(&self.state);
        st.advertising_starts += 1;
        if st.fail_advertising {
            return Err(RadioError::AdvertisingFailed);
        }
        st.advertising_requested();
        st.advertising_settled(true);
        Ok(())
    }

    /// Whether the controller still holds a link to `peer`.
    #[cfg(target_os = "espidf")]
    fn link_alive(&self, peer: PeerHandle) -> bool {
        let addr = lock(&self.state)
            .addrs
            .iter()
            .find(|(p, _)| *p == peer)
            .map(|(_, a)| *a);
        let Some(addr) = addr else {
            return true;
        };
        let mut raw = addr.raw();
        // SAFETY: plain C struct; all-zero is a valid value.
        let mut params: esp_gap_conn_params_t = unsafe { core::mem::zeroed() };
        // SAFETY: `raw` and `params` outlive the call; the stack only
        // copies the current parameters out.
        let ret = unsafe { esp_ble_gap_get_current_conn_params(raw.as_mut_ptr(), &mut params) };
        ret == ESP_OK as esp_err_t
    }

    #[cfg(not(target_os = "espidf"))]
    fn link_alive(&self, peer: PeerHandle) -> bool {
        lock(&self.state).links.contains(&peer)
    }

    // ── ESP-IDF callbacks ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn on_gap_event(&self, event: BleGapEvent) {
        match event {
            BleGapEvent::AdvertisingConfigured(status)
            | BleGapEvent::ScanResponseConfigured(status) => {
                let mut st = lock(&self.state);
                if status != BtStatus::Success {
                    error!("BLE: advertising payload rejected ({:?})", status);
                    st.failed = true;
                    return;
                }
                st.adv_configs_pending = st.adv_configs_pending.saturating_sub(1);
                if st.adv_configs_pending == 0 {
                    st.ready = true;
                    info!("BLE: advertising payload configured");
                }
            }
            BleGapEvent::AdvertisingStarted(status) => {
                let started = status == BtStatus::Success;
                if started {
                    info!("BLE: advertising started");
                } else {
                    warn!("BLE: advertising start failed ({:?})", status);
                }
                lock(&self.state).advertising_settled(started);
            }
            BleGapEvent::AdvertisingStopped(_) => {
                lock(&self.state).advertising_settled(false);
            }
            _ => {}
        }
    }

    #[cfg(target_os = "espidf")]
    fn on_gatts_event(
        &self,
        gatt_if: GattInterface,
        event: GattsEvent<'_>,
        target: &SharedTarget,
        lifecycle: &SharedLifecycle,
    ) {
        match event {
            GattsEvent::ServiceRegistered { status, app_id } => {
                if status != GattStatus::Ok || app_id != APP_ID {
                    self.fail("GATT app registration", status);
                    return;
                }
                if let Err(e) = self.create_services(gatt_if) {
                    error!("BLE: service creation failed: {}", e);
                    lock(&self.state).failed = true;
                }
            }
            GattsEvent::ServiceCreated {
                status,
                service_handle,
                service_id,
            } => {
                if status != GattStatus::Ok {
                    self.fail("service creation", status);
                    return;
                }
                if let Err(e) = self.populate_service(service_handle, &service_id) {
                    error!("BLE: adding characteristics failed: {}", e);
                    lock(&self.state).failed = true;
                }
            }
            GattsEvent::CharacteristicAdded {
                status,
                attr_handle,
                char_uuid,
                ..
            } => {
                if status != GattStatus::Ok {
                    self.fail("characteristic creation", status);
                    return;
                }
                self.bind_handle(attr_handle, &char_uuid);
            }
            GattsEvent::PeerConnected { conn_id, addr, .. } => {
                let peer = PeerHandle(u16::from(conn_id));
                {
                    let mut st = lock(&self.state);
                    if st.track(peer) {
                        st.addrs.retain(|(p, _)| *p != peer);
                        let _ = st.addrs.push((peer, addr));
                    } else {
                        warn!("BLE: peer table full, {} not tracked", peer.0);
                    }
                }
                lock(lifecycle).on_connect(peer);
            }
            GattsEvent::PeerDisconnected { conn_id, .. } => {
                let peer = PeerHandle(u16::from(conn_id));
                lock(&self.state).forget(peer);
                let mut radio = self.clone();
                lock(lifecycle).on_disconnect(peer, &mut radio);
            }
            GattsEvent::Write {
                handle,
                is_prep,
                value,
                ..
            } => {
                if is_prep {
                    warn!("BLE: prepared (long) write on handle {} ignored", handle);
                    return;
                }
                let id = {
                    let mut st = lock(&self.state);
                    let id = st.id_for(handle);
                    if let Some(id) = id {
                        st.mirror(id, value);
                    }
                    id
                };
                match id {
                    Some(id) => lock(target).on_write(id, value),
                    // CCCD subscriptions are answered by the stack.
                    None => debug!("BLE: write to descriptor handle {}", handle),
                }
            }
            _ => {}
        }
    }

    #[cfg(target_os = "espidf")]
    fn fail(&self, what: &str, status: GattStatus) {
        error!("BLE: {} failed ({:?})", what, status);
        lock(&self.state).failed = true;
    }

    #[cfg(target_os = "espidf")]
    fn create_services(&self, gatt_if: GattInterface) -> Result<(), EspError> {
        let counts = {
            let mut st = lock(&self.state);
            st.gatt_if = Some(gatt_if);
            ServiceGroup::ALL.map(|s| (s, st.layout.handle_count(s)))
        };

        self.gap.set_device_name(ADVERTISED_NAME)?;
        self.gap.set_adv_conf(&AdvConfiguration {
            include_name: false,
            include_txpower: false,
            flag: 0x06,
            service_uuid: Some(BtUuid::uuid128(ServiceGroup::Sensor.id().as_u128())),
            ..Default::default()
        })?;
        self.gap.set_adv_conf(&AdvConfiguration {
            set_scan_rsp: true,
            include_name: true,
            include_txpower: false,
            service_uuid: Some(BtUuid::uuid128(ServiceGroup::Configuration.id().as_u128())),
            ..Default::default()
        })?;

        for (service, handles) in counts {
            self.gatts.create_service(
                gatt_if,
                &GattServiceId {
                    id: GattId {
                        uuid: BtUuid::uuid128(service.id().as_u128()),
                        inst_id: 0,
                    },
                    is_primary: true,
                },
                handles,
            )?;
        }
        info!("BLE: GATT application registered (if={})", gatt_if);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn populate_service(
        &self,
        service_handle: Handle,
        service_id: &GattServiceId,
    ) -> Result<(), EspError> {
        let Some(service) = ServiceGroup::ALL
            .into_iter()
            .find(|s| BtUuid::uuid128(s.id().as_u128()) == service_id.id.uuid)
        else {
            return Ok(());
        };

        let chars: Vec<GattChar> = lock(&self.state).layout.in_service(service).cloned().collect();

        self.gatts.start_service(service_handle)?;
        for chr in &chars {
            self.gatts.add_characteristic(
                service_handle,
                &GattCharacteristic {
                    uuid: BtUuid::uuid128(chr.id.as_u128()),
                    permissions: permissions(chr.access),
                    properties: properties(chr.access),
                    max_len: MAX_ATTRIBUTE_LEN,
                    auto_rsp: AutoResponse::ByGatt,
                },
                &chr.initial,
            )?;
            if chr.access.notify {
                let mut cccd = EnumSet::empty();
                cccd.insert(Permission::Read);
                cccd.insert(Permission::Write);
                self.gatts.add_descriptor(
                    service_handle,
                    &GattDescriptor {
                        uuid: BtUuid::uuid16(CCCD_UUID),
                        permissions: cccd,
                    },
                )?;
            }
        }
        info!("BLE: service {:?} started ({} characteristics)", service, chars.len());
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn bind_handle(&self, attr_handle: Handle, char_uuid: &BtUuid) {
        let mut st = lock(&self.state);
        let id = st
            .layout
            .chars()
            .iter()
            .map(|c| c.id)
            .find(|id| BtUuid::uuid128(id.as_u128()) == *char_uuid);
        match id {
            Some(id) => {
                st.handles.push((id, attr_handle));
                debug!("BLE: {} -> handle {}", id, attr_handle);
            }
            None => warn!("BLE: unexpected characteristic {:?}", char_uuid),
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for BleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "espidf")]
fn permissions(access: Access) -> EnumSet<Permission> {
    let mut set = EnumSet::empty();
    if access.read {
        set.insert(Permission::Read);
    }
    if access.write {
        set.insert(Permission::Write);
    }
    set
}

#[cfg(target_os = "espidf")]
fn properties(access: Access) -> EnumSet<Property> {
    let mut set = EnumSet::empty();
    if access.read {
        set.insert(Property::Read);
    }
    if access.write {
        set.insert(Property::Write);
    }
    if access.notify {
        set.insert(Property::Notify);
    }
    set
}

// ───────────────────────────────────────────────────────────────
// Port implementations
// ───────────────────────────────────────────────────────────────

impl AdvertisingPort for BleAdapter {
    fn start_advertising(&mut self) -> Result<(), RadioError> {
        self.platform_start_advertising()
    }

    fn is_advertising(&self) -> bool {
        lock(&self.state).is_advertising()
    }

    /// Tracked peers that still hold a link.  Peers whose link is gone are
    /// dropped from the table here.
    fn connected_peers(&self) -> heapless::Vec<PeerHandle, MAX_PEERS> {
        let tracked = lock(&self.state).peers.clone();
        let mut live = heapless::Vec::<PeerHandle, MAX_PEERS>::new();
        for peer in tracked {
            if self.link_alive(peer) {
                let _ = live.push(peer);
            } else {
                warn!("BLE: link to peer {} gone without a disconnect event", peer.0);
                lock(&self.state).forget(peer);
            }
        }
        live
    }
}

impl EventSink for BleAdapter {
    fn emit(&mut self, event: &AttributeEvent) {
        let AttributeEvent::ValueChanged { id, value, notify } = event else {
            return;
        };
        {
            let mut st = lock(&self.state);
            st.mirror(*id, value);
            if *notify {
                st.notifications = st.notifications.wrapping_add(1);
            }
        }
        self.platform_publish(*id, value, *notify);
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────

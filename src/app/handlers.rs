//! Write handlers bound in the [`AttributeRegistry`](super::registry::AttributeRegistry).
//!
//! Persistence is best-effort: a failed settings write is logged and
//! reported as [`AttributeEvent::PersistFailed`], the reflected value keeps
//! what the central wrote, and nothing is retried.

use log::{info, warn};

use super::attributes::{AttributeValue, CHAR_WIFI_PASSWORD, CHAR_WIFI_SSID};
use super::codec;
use super::dispatcher::HandlerContext;
use super::events::AttributeEvent;
use super::ports::StorageError;

fn persisted(ctx: &mut HandlerContext<'_>, what: &str, result: Result<(), StorageError>) {
    if let Err(e) = result {
        warn!("Settings: failed to persist {}: {}", what, e);
        ctx.sink.emit(&AttributeEvent::PersistFailed(ctx.id));
    }
}

pub(super) fn sensor_name(ctx: &mut HandlerContext<'_>, value: AttributeValue) {
    let name = value.as_text().unwrap_or_default();
    info!("Settings: sensor name -> {:?}", name);
    let result = ctx.settings.set_name(name);
    persisted(ctx, "sensor name", result);
}

pub(super) fn scan_interval(ctx: &mut HandlerContext<'_>, value: AttributeValue) {
    let secs = value.as_integer().unwrap_or_default();
    info!("Settings: scan interval -> {}s", secs);
    ctx.reflect(&codec::encode(&value));
    let result = ctx.settings.set_scan_interval(secs);
    persisted(ctx, "scan interval", result);
}

pub(super) fn wifi_ssid(ctx: &mut HandlerContext<'_>, value: AttributeValue) {
    let ssid = value.as_text().unwrap_or_default();
    let password = ctx.values.text(CHAR_WIFI_PASSWORD);
    info!("Settings: WiFi SSID -> {:?}", ssid);
    let result = ctx.settings.set_wifi_credentials(ssid, &password);
    persisted(ctx, "WiFi SSID", result);
}

pub(super) fn wifi_password(ctx: &mut HandlerContext<'_>, value: AttributeValue) {
    let password = value.as_text().unwrap_or_default();
    let ssid = ctx.values.text(CHAR_WIFI_SSID);
    info!("Settings: WiFi password updated ({} bytes)", password.len());
    let result = ctx.settings.set_wifi_credentials(&ssid, password);
    persisted(ctx, "WiFi password", result);
}

pub(super) fn wifi_enabled(ctx: &mut HandlerContext<'_>, value: AttributeValue) {
    let enabled = value.as_flag().unwrap_or_default();
    info!("Settings: WiFi enabled -> {}", enabled);
    ctx.reflect(codec::encode_flag(enabled));
    let result = ctx.settings.set_wifi_enabled(enabled);
    persisted(ctx, "WiFi enabled flag", result);
}

/// A write that starts no scan puts the idle sentinel back.
pub(super) fn scan_command(ctx: &mut HandlerContext<'_>, value: AttributeValue) {
    let requested = value.as_flag().unwrap_or_default();
    let scanned = ctx
        .scan
        .on_command(requested, &mut *ctx.scanner, &mut *ctx.values, &mut *ctx.sink);
    if !scanned {
        ctx.reflect(&codec::FLAG_RESET);
    }
}

//! Shared adapter helpers: credential validation and lock recovery.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::app::ports::ConnectivityError;

/// Lock a mutex shared with radio callbacks.  A panic on another task
/// poisons the lock but leaves the data usable, so keep going.
pub fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Returns `true` if every byte of `s` is in the printable ASCII range
/// `0x20..=0x7E` (space through tilde, inclusive).
pub(super) fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// SSID: 1-32 bytes of printable ASCII.  Password: empty (open network) or
/// 8-64 bytes (WPA2).
pub(super) fn validate_credentials(ssid: &str, password: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    if !password.is_empty() && !(8..=64).contains(&password.len()) {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Process-wide defaults store for dependent-monitor configuration.
//!
//! Setup installs default values for the timer, socket, and
//! message-queue-manager monitors here. A default never overwrites a value the
//! host application has already set, so applications may configure monitors
//! either before or after calling [`setup`](crate::setup).

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

static SETTINGS: Mutex<BTreeMap<&'static str, u64>> = Mutex::new(BTreeMap::new());

fn settings_table() -> MutexGuard<'static, BTreeMap<&'static str, u64>> {
    return SETTINGS.lock().unwrap_or_else(PoisonError::into_inner);
}

/// Sets a value, replacing any existing value for the key.
pub fn set_uint(key: &'static str, value: u64) {
    settings_table().insert(key, value);
}

/// Returns the value for a key, or `None` if the key has never been set.
pub fn get_uint(key: &str) -> Option<u64> {
    return settings_table().get(key).copied();
}

/// Installs a default: sets the value only if the key is absent.
pub fn apply_default_uint(key: &'static str, value: u64) {
    settings_table().entry(key).or_insert(value);
}

/// For testing purposes: removes every stored value.
#[doc(hidden)]
pub fn clear() {
    settings_table().clear();
}

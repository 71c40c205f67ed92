// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use core::sync::atomic::AtomicU32;
use core::sync::atomic::AtomicU64;
use core::sync::atomic::Ordering;

use std::sync::Mutex;
use std::sync::PoisonError;

use uuid::Uuid;

use crate::enums::Level;
use crate::provider;
use crate::provider::Provider;
use crate::settings;
use crate::subsystem;
use crate::subsystem::Subsystem;

/// Default eventing level applied to the crate's subsystem during setup if
/// the host application has not configured one.
pub const SETTING_DEFAULT_EVENTING_LEVEL: &str = "eventprov/logging/default-eventing-level";

/// Scheduling priority for the timer monitor's service thread.
pub const SETTING_TIMER_MONITOR_THREAD_PRIORITY: &str =
    "eventprov/timer/monitor-thread-priority";

/// Scheduling priority for the socket monitor's service thread.
pub const SETTING_SOCKET_MONITOR_THREAD_PRIORITY: &str =
    "eventprov/socket/monitor-thread-priority";

/// Number of service threads the socket monitor may spread sockets across.
pub const SETTING_SOCKET_MONITOR_THREAD_COUNT: &str =
    "eventprov/socket/monitor-thread-count";

/// Number of pooled dispatcher threads in the message queue manager.
pub const SETTING_MESSAGE_QUEUE_MANAGER_POOL_THREAD_COUNT: &str =
    "eventprov/message-queue-manager/pool-thread-count";

/// The crate's own provider, registered once during [`setup`].
pub static PROVIDER: Provider = Provider::new(
    "eventprov",
    Uuid::from_u128(0x6586_4e2e_2a5f_5e83_8be2_0c7a_77a8_5671),
);

/// The crate's own subsystem. Starts at [`Level::None`]; setup raises it to
/// the configured default eventing level.
pub static SUBSYSTEM: Subsystem = Subsystem::new("eventprov");

const UNINITIALIZED: u32 = 0;
const INITIALIZING: u32 = 1;
const READY: u32 = 2;
const UNREGISTERING: u32 = 3;
const TORN_DOWN: u32 = 4;

/// Process setup singleton.
///
/// State machine: Uninitialized -> Initializing -> Ready -> Unregistering ->
/// TornDown. The first `setup()` caller performs initialization while holding
/// the init lock; racing callers block on the lock and then observe Ready.
/// The PUID counter lives here so it is usable in every state, including
/// before setup completes.
struct Setup {
    state: AtomicU32,
    puid: AtomicU64,
}

static SETUP: Setup = Setup {
    state: AtomicU32::new(UNINITIALIZED),
    puid: AtomicU64::new(0),
};

// Held only for the duration of first-time initialization (and the test
// reset hook); never held on any steady-state path.
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Performs one-time process-wide initialization.
///
/// Must be invoked (directly or transitively) before the first filter or
/// emission call. Idempotent: redundant and concurrent calls are safe, and
/// every caller returns only after initialization is complete.
///
/// Initialization order is fixed because later steps read state established
/// by earlier ones: subsystem table, then logging defaults, then native
/// logger warm-up, then provider registration, then dependent-monitor
/// defaults (timer, socket, message queue manager).
///
/// Teardown is automatic at process exit and unregisters the provider; no
/// explicit teardown call is required or supported.
pub fn setup() {
    if SETUP.state.load(Ordering::Acquire) >= READY {
        return;
    }

    let _guard = INIT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    if SETUP.state.load(Ordering::Relaxed) != UNINITIALIZED {
        // Another caller won the race and finished while we waited.
        return;
    }

    SETUP.state.store(INITIALIZING, Ordering::Relaxed);

    init_subsystems();
    init_logging();
    init_native_logger();
    provider::register(&PROVIDER);
    install_timer_monitor_defaults();
    install_socket_monitor_defaults();
    install_message_queue_manager_defaults();
    #[cfg(target_os = "linux")]
    install_exit_handler();

    SETUP.state.store(READY, Ordering::Release);
}

/// Returns the next process-unique identifier.
///
/// Strictly increasing within the process, pairwise distinct across callers,
/// first value 1. Never blocks, never fails, and is valid in every setup
/// state, including before [`setup`] completes.
#[inline]
pub fn create_puid() -> u64 {
    return SETUP.puid.fetch_add(1, Ordering::Relaxed) + 1;
}

fn init_subsystems() {
    subsystem::register_subsystem(&SUBSYSTEM);
}

fn init_logging() {
    settings::apply_default_uint(
        SETTING_DEFAULT_EVENTING_LEVEL,
        Level::Basic.as_int() as u64,
    );
    if SUBSYSTEM.eventing_level() == Level::None {
        if let Some(value) = settings::get_uint(SETTING_DEFAULT_EVENTING_LEVEL) {
            SUBSYSTEM.set_eventing_level(Level::from_int(value as u8));
        }
    }
}

// Pre-opens the event delivery file so provider registration below does not
// pay the open cost, and so a missing facility is diagnosed early. Trivial
// on the no-op backend.
fn init_native_logger() {
    crate::native::warm_up();
}

fn install_timer_monitor_defaults() {
    settings::apply_default_uint(SETTING_TIMER_MONITOR_THREAD_PRIORITY, 7);
}

fn install_socket_monitor_defaults() {
    settings::apply_default_uint(SETTING_SOCKET_MONITOR_THREAD_PRIORITY, 7);
    settings::apply_default_uint(SETTING_SOCKET_MONITOR_THREAD_COUNT, 1);
}

fn install_message_queue_manager_defaults() {
    settings::apply_default_uint(SETTING_MESSAGE_QUEUE_MANAGER_POOL_THREAD_COUNT, 4);
}

#[cfg(target_os = "linux")]
fn install_exit_handler() {
    extern "C" fn teardown_at_exit() {
        teardown();
    }
    unsafe { libc::atexit(teardown_at_exit) };
}

/// Unregisters every provider and closes the native facility. Runs exactly
/// once, at process exit.
#[cfg(target_os = "linux")]
fn teardown() {
    if SETUP
        .state
        .compare_exchange(READY, UNREGISTERING, Ordering::AcqRel, Ordering::Relaxed)
        .is_err()
    {
        return;
    }

    provider::unregister_all();
    crate::native::shut_down();
    SETUP.state.store(TORN_DOWN, Ordering::Release);
}

/// For testing purposes: returns the singleton to the uninitialized state so
/// test cases can exercise setup in isolation. Unregisters all providers and
/// clears the settings store.
#[doc(hidden)]
pub fn reset_for_tests() {
    let _guard = INIT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    provider::unregister_all();
    settings::clear();
    SETUP.state.store(UNINITIALIZED, Ordering::Release);
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use core::ffi;
use core::fmt;
use core::fmt::Write;
use core::sync::atomic::AtomicI32;
use core::sync::atomic::AtomicUsize;
use core::sync::atomic::Ordering;

use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use uuid::Uuid;

use crate::descriptors::EventDataDescriptor;
use crate::descriptors::EventDescriptor;
use crate::descriptors::EventParameterDescriptor;
use crate::enums::Level;
use crate::enums::Severity;
use crate::native::ProviderState;

/// Maximum length of a provider name "Name\0" (includes nul).
pub const PROVIDER_NAME_MAX: usize = 256;

/// Field layout declared to the backend for the header block that precedes
/// every event's payload.
const PROVIDER_COMMAND_TYPES: &str =
    "u8 severity;u16 id;u8 version;u8 channel;u8 level;u8 opcode;u16 task;u64 keyword";

/// Maximum length needed for a registration command "Name CommandTypes\0".
const PROVIDER_COMMAND_MAX: usize = PROVIDER_NAME_MAX + 1 + PROVIDER_COMMAND_TYPES.len();

/// Namespace for name-derived provider ids ([`Provider::id_from_name`]).
const PROVIDER_ID_NAMESPACE: Uuid = Uuid::from_u128(0x482c2db2_c390_47c8_87f8_1a15bfc130fb);

const fn name_hash(name: &str) -> u64 {
    // FNV-1a.
    let bytes = name.as_bytes();
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        i += 1;
    }
    return hash;
}

/// A named source of trace events.
///
/// # Overview
///
/// 1. Define a static provider with [`Provider::new`].
/// 2. During process setup, call [`register`] exactly once to bind it to the
///    native tracing facility.
/// 3. At each call site, guard with [`is_enabled`](crate::is_enabled), build
///    descriptors only if the guard passes, then call
///    [`Provider::write_event`].
/// 4. [`unregister`] runs once during process teardown.
///
/// Registration failure is swallowed: the errno is recorded on the handle and
/// the provider behaves as permanently disabled for the process. Tracing is
/// best-effort infrastructure and must never crash or block the host
/// application.
pub struct Provider {
    id: Uuid,
    name: &'static str,
    unique_hash: u64,
    state: ProviderState,
    errno: AtomicI32,
}

impl Provider {
    /// Creates an unregistered provider handle with the specified name and
    /// provider id. The unique hash is derived from the name.
    ///
    /// `name` must be less than 256 bytes and should contain only ASCII
    /// identifier characters `[A-Za-z0-9_]`.
    pub const fn new(name: &'static str, id: Uuid) -> Provider {
        assert!(name.len() < PROVIDER_NAME_MAX, "provider name too long");
        return Provider {
            id,
            name,
            unique_hash: name_hash(name),
            state: ProviderState::new(0),
            errno: AtomicI32::new(0),
        };
    }

    /// For testing purposes: creates an unregistered provider whose backend
    /// reports a listening session, so that filter decisions can be exercised
    /// without a native tracing facility.
    #[doc(hidden)]
    pub const fn new_enabled(name: &'static str, id: Uuid) -> Provider {
        return Provider {
            id,
            name,
            unique_hash: name_hash(name),
            state: ProviderState::new(1),
            errno: AtomicI32::new(0),
        };
    }

    /// Returns a stable provider id derived from a provider name. The same
    /// name always yields the same id.
    pub fn id_from_name(name: &str) -> Uuid {
        return Uuid::new_v5(&PROVIDER_ID_NAMESPACE, name.as_bytes());
    }

    /// Returns this provider's id.
    pub const fn id(&self) -> Uuid {
        return self.id;
    }

    /// Returns this provider's name.
    pub const fn name(&self) -> &'static str {
        return self.name;
    }

    /// Returns this provider's unique name hash.
    pub const fn unique_hash(&self) -> u64 {
        return self.unique_hash;
    }

    /// Returns 0 if the provider registered cleanly, or the errno recorded
    /// when the backend refused the registration. Diagnostic only: a failed
    /// provider is simply never enabled.
    pub fn errno(&self) -> i32 {
        return self.errno.load(Ordering::Relaxed);
    }

    /// Returns true if the backend reports the provider+keyword combination
    /// as listened to. This is the backend half of the filter; call sites
    /// normally use [`is_enabled`](crate::is_enabled), which also applies the
    /// subsystem's level.
    #[inline(always)]
    pub fn enabled(&self, keyword: u64) -> bool {
        return self.state.enabled(keyword);
    }

    /// For testing purposes: backend state access.
    #[doc(hidden)]
    pub fn state(&self) -> &ProviderState {
        return &self.state;
    }

    /// Forwards an event to the backend for delivery.
    ///
    /// Fire-and-forget: backend failures never propagate to the caller, and
    /// there is no filtering at this layer. Call sites are required to guard
    /// with [`is_enabled`](crate::is_enabled) and skip this call entirely when
    /// the guard fails; that skip, not this function, is what keeps disabled
    /// tracing free of cost.
    ///
    /// `parameters` declares the type of each payload fragment in `data`;
    /// the two slices correspond by index. Data descriptors reference
    /// caller-owned memory and are not retained beyond this call.
    pub fn write_event(
        &self,
        severity: Severity,
        level: Level,
        descriptor: &EventDescriptor,
        parameters: &[EventParameterDescriptor],
        data: &[EventDataDescriptor],
    ) {
        debug_assert!(
            descriptor.level == level.as_int(),
            "event descriptor level must match the call site's level"
        );
        debug_assert!(parameters.len() == data.len());
        let _ = parameters;
        let _ = self.state.write(severity, descriptor, data);
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(
            f,
            "Provider {{ name: \"{}\", id: {}, unique_hash: {:#x}, errno: {} }}",
            self.name,
            self.id,
            self.unique_hash,
            self.errno(),
        );
    }
}

struct CommandStringBuffer {
    buf: [u8; PROVIDER_COMMAND_MAX],
    pos: usize,
}

impl CommandStringBuffer {
    fn write(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }
}

impl Write for CommandStringBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write(s.as_bytes());
        return fmt::Result::Ok(());
    }
}

/// Helper for creating the backend registration command for a provider, e.g.
/// `MyProvider u8 severity;u16 id;...;u64 keyword`.
pub struct CommandString(CommandStringBuffer);

impl CommandString {
    /// Creates a CommandString object.
    pub const fn new() -> Self {
        return Self(CommandStringBuffer {
            buf: [0; PROVIDER_COMMAND_MAX],
            pos: 0,
        });
    }

    /// Gets the CStr for the specified provider name:
    /// `Name u8 severity;u16 id;u8 version;u8 channel;u8 level;u8 opcode;u16 task;u64 keyword`.
    pub fn format(&mut self, provider_name: &[u8]) -> &ffi::CStr {
        self.0.pos = 0;
        self.0.write(provider_name);
        write!(self.0, " {}", PROVIDER_COMMAND_TYPES).unwrap();
        self.0.buf[self.0.pos] = b'\0';
        self.0.pos += 1;
        return ffi::CStr::from_bytes_with_nul(&self.0.buf[0..self.0.pos]).unwrap();
    }
}

impl Default for CommandString {
    fn default() -> Self {
        return Self::new();
    }
}

// Process-wide table of registered providers. Written only by register and
// unregister (i.e. setup and teardown); emission call sites hold their own
// &'static Provider and never touch the table.
static REGISTRY: Mutex<Vec<&'static Provider>> = Mutex::new(Vec::new());

// Total successful register() calls. Test-visible.
static REGISTRATION_COUNT: AtomicUsize = AtomicUsize::new(0);

fn registry_table() -> MutexGuard<'static, Vec<&'static Provider>> {
    // A poisoned table must not take the host application down with it.
    return REGISTRY.lock().unwrap_or_else(PoisonError::into_inner);
}

/// Binds a provider to the native tracing facility and adds it to the
/// process-wide registry.
///
/// Call exactly once per provider identity, from process setup. Calling it
/// again for the same provider within one process lifetime is a programming
/// error and is not guarded against at this layer.
///
/// Backend failure is non-fatal: the errno is recorded on the handle
/// ([`Provider::errno`]) and the provider stays permanently disabled.
pub fn register(provider: &'static Provider) {
    let mut command_string = CommandString::new();
    let name_args = command_string.format(provider.name.as_bytes());
    let err = provider.state.register(name_args);
    provider.errno.store(err, Ordering::Relaxed);

    registry_table().push(provider);
    REGISTRATION_COUNT.fetch_add(1, Ordering::Relaxed);
}

/// Unbinds a provider from the native tracing facility and removes it from
/// the process-wide registry.
///
/// Safe to call when the backend never successfully registered. Afterwards
/// the provider's backend-enabled check reads false, so emission attempts
/// gated by [`is_enabled`](crate::is_enabled) are filtered out.
pub fn unregister(provider: &Provider) {
    registry_table().retain(|p| !core::ptr::eq(*p, provider));
    let _ = provider.state.unregister();
}

/// Unregisters every provider still in the registry. Called once from
/// process teardown.
pub(crate) fn unregister_all() {
    let mut table = registry_table();
    for provider in table.drain(..) {
        let _ = provider.state.unregister();
    }
}

/// For testing purposes: number of successful register() calls so far.
#[doc(hidden)]
pub fn registration_count() -> usize {
    return REGISTRATION_COUNT.load(Ordering::Relaxed);
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

#![allow(clippy::needless_return)]
#![warn(missing_docs)]

//! # Event provider lifecycle and filtering
//!
//! `eventprov` lets instrumented code emit structured, severity- and
//! keyword-filtered trace events through one interface while the actual event
//! sink is either a native OS tracing facility (Linux user_events, when the
//! `native_events` feature is enabled on Linux) or a no-op that delivers
//! nothing (every other configuration). Both configurations are
//! source-compatible: the same code compiles and behaves identically apart
//! from actual trace delivery.
//!
//! ## Providers, subsystems, levels, keywords
//!
//! A **provider** is a named, globally registered source of trace events,
//! bound to the OS facility once per process ([`register`]) and unbound at
//! process exit. A **subsystem** is a logical component of the host
//! application whose current verbosity ([`Level`]) gates emission at runtime.
//! Each event type additionally carries a static required level and a
//! **keyword** bitmask for category filtering.
//!
//! ## Call-site pattern
//!
//! Filtering is a guard evaluated before any event data is constructed. The
//! guard is one or two integer reads when tracing is disabled, which is the
//! dominant runtime case; descriptor construction and the write call are
//! skipped entirely when it fails:
//!
//! ```
//! use eventprov as ep;
//!
//! static PROV: ep::Provider =
//!     ep::Provider::new("MyComponent", uuid::Uuid::from_u128(0x1234));
//! static SUB: ep::Subsystem = ep::Subsystem::with_level("my_component", ep::Level::Detail);
//!
//! const CONNECT_KEYWORD: u64 = 0x2;
//! const CONNECT_EVENT: ep::EventDescriptor =
//!     ep::EventDescriptor::from_parts(1, 0, 0, ep::Level::Detail, 0, 0, CONNECT_KEYWORD);
//! const CONNECT_PARAMS: [ep::EventParameterDescriptor; 1] =
//!     [ep::EventParameterDescriptor::new(ep::ParameterType::UInt64)];
//!
//! ep::setup();
//! let remote_id: u64 = ep::create_puid();
//! if ep::is_enabled(&PROV, &SUB, CONNECT_KEYWORD, ep::Level::Detail) {
//!     let data = [ep::EventDataDescriptor::from_value(&remote_id)];
//!     PROV.write_event(
//!         ep::Severity::Informational,
//!         ep::Level::Detail,
//!         &CONNECT_EVENT,
//!         &CONNECT_PARAMS,
//!         &data,
//!     );
//! }
//! ```
//!
//! ## Lifecycle and failure policy
//!
//! [`setup`] performs one-time, ordered process initialization (subsystem
//! table, logging defaults, native warm-up, provider registration, monitor
//! defaults) and is safe to call redundantly or concurrently. Teardown is
//! automatic at process exit.
//!
//! Tracing is best-effort infrastructure. A missing or refusing backend
//! degrades to "no trace output": registration errors are recorded on the
//! handle for diagnostics and swallowed, emission never reports errors, and
//! no failure in this crate propagates into instrumented application logic.

pub use descriptors::EventDataDescriptor;
pub use descriptors::EventDescriptor;
pub use descriptors::EventParameterDescriptor;
pub use enums::Level;
pub use enums::ParameterType;
pub use enums::Severity;
pub use filter::is_enabled;
pub use filter::is_enabled_at;
pub use native::NativeImplementation;
pub use native::ProviderState;
pub use native::NATIVE_IMPLEMENTATION;
pub use platform::generate_random_uuid;
pub use platform::set_current_thread_name;
pub use provider::register;
pub use provider::unregister;
pub use provider::CommandString;
pub use provider::Provider;
pub use provider::PROVIDER_NAME_MAX;
pub use setup::create_puid;
pub use setup::setup;
pub use setup::PROVIDER;
pub use setup::SETTING_DEFAULT_EVENTING_LEVEL;
pub use setup::SETTING_MESSAGE_QUEUE_MANAGER_POOL_THREAD_COUNT;
pub use setup::SETTING_SOCKET_MONITOR_THREAD_COUNT;
pub use setup::SETTING_SOCKET_MONITOR_THREAD_PRIORITY;
pub use setup::SETTING_TIMER_MONITOR_THREAD_PRIORITY;
pub use setup::SUBSYSTEM;

#[doc(hidden)]
pub use provider::registration_count;
#[doc(hidden)]
pub use setup::reset_for_tests;
pub use subsystem::get_eventing_level;
pub use subsystem::register_subsystem;
pub use subsystem::set_eventing_level_by_name;
pub use subsystem::Subsystem;

pub mod settings;

mod descriptors;
mod enums;
mod filter;
mod native;
mod platform;
mod provider;
mod setup;
mod subsystem;

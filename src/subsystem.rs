// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use core::fmt;
use core::sync::atomic::AtomicU8;
use core::sync::atomic::Ordering;

use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use crate::enums::Level;

/// A logical, independently-leveled component of the host application.
///
/// Each subsystem carries a current eventing level that the filter reads on
/// every call. The level is mutable at runtime ([`set_eventing_level_by_name`])
/// and reads are a single relaxed atomic load, so a disabled subsystem costs
/// one integer read at the call site.
///
/// Subsystems are defined as statics and announced to the process-wide table
/// with [`register_subsystem`], typically once during setup.
pub struct Subsystem {
    name: &'static str,
    level: AtomicU8,
}

impl Subsystem {
    /// Creates a subsystem with the specified name and an eventing level of
    /// [`Level::None`] (nothing emitted until a level is set).
    pub const fn new(name: &'static str) -> Subsystem {
        return Subsystem {
            name,
            level: AtomicU8::new(0),
        };
    }

    /// Creates a subsystem with the specified name and initial eventing level.
    pub const fn with_level(name: &'static str, level: Level) -> Subsystem {
        return Subsystem {
            name,
            level: AtomicU8::new(level.as_int()),
        };
    }

    /// Returns this subsystem's name.
    pub const fn name(&self) -> &'static str {
        return self.name;
    }

    /// Returns this subsystem's current eventing level.
    #[inline(always)]
    pub fn eventing_level(&self) -> Level {
        return Level::from_int(self.level.load(Ordering::Relaxed));
    }

    /// Sets this subsystem's eventing level. Takes effect for all subsequent
    /// filter decisions on any thread.
    pub fn set_eventing_level(&self, level: Level) {
        self.level.store(level.as_int(), Ordering::Relaxed);
    }
}

impl fmt::Debug for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(
            f,
            "Subsystem {{ name: \"{}\", level: {} }}",
            self.name,
            self.eventing_level(),
        );
    }
}

// Name lookup table. Written during setup and by level administration;
// filter call sites read their subsystem's atomic directly and never lock.
static SUBSYSTEMS: Mutex<Vec<&'static Subsystem>> = Mutex::new(Vec::new());

fn subsystem_table() -> MutexGuard<'static, Vec<&'static Subsystem>> {
    return SUBSYSTEMS.lock().unwrap_or_else(PoisonError::into_inner);
}

/// Adds a subsystem to the process-wide name table so its level can be
/// administered by name. Re-registering the same subsystem is a no-op.
pub fn register_subsystem(subsystem: &'static Subsystem) {
    let mut table = subsystem_table();
    if !table.iter().any(|s| core::ptr::eq(*s, subsystem)) {
        table.push(subsystem);
    }
}

/// Returns the current eventing level of the named subsystem, or `None` if no
/// subsystem with that name is registered.
pub fn get_eventing_level(name: &str) -> Option<Level> {
    let table = subsystem_table();
    return table
        .iter()
        .find(|s| s.name == name)
        .map(|s| s.eventing_level());
}

/// Sets the eventing level of the named subsystem. Unknown names are ignored:
/// level administration is best-effort configuration, not a correctness
/// dependency.
pub fn set_eventing_level_by_name(name: &str, level: Level) {
    let table = subsystem_table();
    if let Some(subsystem) = table.iter().find(|s| s.name == name) {
        subsystem.set_eventing_level(level);
    }
}

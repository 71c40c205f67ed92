// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use crate::enums::Level;
use crate::provider::Provider;
use crate::subsystem::Subsystem;

/// Returns true if an event with the specified keyword and required level
/// should be constructed and delivered right now.
///
/// True iff the backend reports the provider+keyword combination as listened
/// to AND the subsystem's current eventing level is numerically >= the event's
/// required level. The backend check runs first: on the native build the
/// kernel marks the provider disabled at the OS level, and on the no-op build
/// the enable word can never become nonzero, so in the dominant
/// tracing-disabled case this reads one integer and stops.
///
/// Call sites must use this as a guard and skip descriptor construction and
/// [`Provider::write_event`] entirely when it returns false.
///
/// Pure: the decision is a function of the subsystem's current level and the
/// event's static level/keyword only. Passing an unregistered provider is a
/// precondition violation with an undefined (but memory-safe) outcome.
#[inline(always)]
pub fn is_enabled(
    provider: &Provider,
    subsystem: &Subsystem,
    keyword: u64,
    level: Level,
) -> bool {
    return provider.enabled(keyword)
        && subsystem.eventing_level().as_int() >= level.as_int();
}

/// [`is_enabled`] with the required level supplied as a raw numeric value,
/// for call sites whose level is computed rather than a `Level` constant.
#[inline(always)]
pub fn is_enabled_at(
    provider: &Provider,
    subsystem: &Subsystem,
    keyword: u64,
    level_value: u8,
) -> bool {
    return provider.enabled(keyword)
        && subsystem.eventing_level().as_int() >= level_value;
}

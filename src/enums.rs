// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

#![allow(non_upper_case_globals)]

use core::fmt;

/// Subsystem eventing level.
///
/// Each subsystem has a current level that gates event emission: an event with
/// required level `E` is emitted only while the subsystem's level is numerically
/// greater than or equal to `E`. Levels are ordered
/// `None < Basic < Detail < Debug < Trace < Insane`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Level(u8);

impl Level {
    /// Returns a level with the specified value.
    #[inline(always)]
    pub const fn from_int(value: u8) -> Self {
        return Self(value);
    }

    /// Returns the numeric value corresponding to this level.
    #[inline(always)]
    pub const fn as_int(self) -> u8 {
        return self.0;
    }

    /// No events.
    pub const None: Level = Level(0);

    /// Major milestones only.
    pub const Basic: Level = Level(1);

    /// Detailed operational events.
    pub const Detail: Level = Level(2);

    /// Events useful when debugging.
    pub const Debug: Level = Level(3);

    /// High-volume tracing events.
    pub const Trace: Level = Level(4);

    /// Everything, including events too noisy for normal tracing.
    pub const Insane: Level = Level(5);
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return self.0.fmt(f);
    }
}

impl From<u8> for Level {
    fn from(val: u8) -> Self {
        return Self(val);
    }
}

impl From<Level> for u8 {
    fn from(val: Level) -> Self {
        return val.0;
    }
}

/// Event severity, recorded alongside the event's level.
///
/// Severity describes how bad the condition is; level describes how verbose a
/// session must be before the event is delivered. The two are independent.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Severity(u8);

impl Severity {
    /// Returns a severity with the specified value.
    #[inline(always)]
    pub const fn from_int(value: u8) -> Self {
        return Self(value);
    }

    /// Returns the numeric value corresponding to this severity.
    #[inline(always)]
    pub const fn as_int(self) -> u8 {
        return self.0;
    }

    /// Normal operation.
    pub const Informational: Severity = Severity(0);

    /// Unexpected but recoverable condition.
    pub const Warning: Severity = Severity(1);

    /// Operation failed.
    pub const Error: Severity = Severity(2);

    /// Process integrity is compromised.
    pub const Fatal: Severity = Severity(3);
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return self.0.fmt(f);
    }
}

impl From<u8> for Severity {
    fn from(val: u8) -> Self {
        return Self(val);
    }
}

impl From<Severity> for u8 {
    fn from(val: Severity) -> Self {
        return val.0;
    }
}

/// The declared type of one event parameter slot.
///
/// Used in [`EventParameterDescriptor`](crate::EventParameterDescriptor) to
/// describe the payload fragment that the corresponding
/// [`EventDataDescriptor`](crate::EventDataDescriptor) points at.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ParameterType(u8);

impl ParameterType {
    /// Returns a parameter type with the specified value.
    #[inline(always)]
    pub const fn from_int(value: u8) -> Self {
        return Self(value);
    }

    /// Returns the numeric value corresponding to this parameter type.
    #[inline(always)]
    pub const fn as_int(self) -> u8 {
        return self.0;
    }

    /// Invalid parameter type.
    pub const Invalid: ParameterType = ParameterType(0);

    /// 1-byte boolean.
    pub const Bool: ParameterType = ParameterType(1);

    /// Unsigned 8-bit integer.
    pub const UInt8: ParameterType = ParameterType(2);

    /// Signed 8-bit integer.
    pub const Int8: ParameterType = ParameterType(3);

    /// Unsigned 16-bit integer.
    pub const UInt16: ParameterType = ParameterType(4);

    /// Signed 16-bit integer.
    pub const Int16: ParameterType = ParameterType(5);

    /// Unsigned 32-bit integer.
    pub const UInt32: ParameterType = ParameterType(6);

    /// Signed 32-bit integer.
    pub const Int32: ParameterType = ParameterType(7);

    /// Unsigned 64-bit integer.
    pub const UInt64: ParameterType = ParameterType(8);

    /// Signed 64-bit integer.
    pub const Int64: ParameterType = ParameterType(9);

    /// 32-bit float.
    pub const Float32: ParameterType = ParameterType(10);

    /// 64-bit float.
    pub const Float64: ParameterType = ParameterType(11);

    /// Pointer-sized integer.
    pub const Pointer: ParameterType = ParameterType(12);

    /// Nul-terminated 8-bit string.
    pub const AStr: ParameterType = ParameterType(13);

    /// Nul-terminated 16-bit string.
    pub const WStr: ParameterType = ParameterType(14);

    /// Counted binary blob.
    pub const Binary: ParameterType = ParameterType(15);
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return self.0.fmt(f);
    }
}

impl From<u8> for ParameterType {
    fn from(val: u8) -> Self {
        return Self(val);
    }
}

impl From<ParameterType> for u8 {
    fn from(val: ParameterType) -> Self {
        return val.0;
    }
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use core::marker::PhantomData;
use core::mem::size_of;

use crate::enums::Level;
use crate::enums::ParameterType;

/// Static identity of one event type: id, version, channel, level, opcode,
/// task, keyword.
///
/// One `EventDescriptor` is defined per distinct event type, typically as a
/// `const` or `static`, and is never mutated. The `level` and `keyword` fields
/// must match the values the call site passes to
/// [`is_enabled`](crate::is_enabled) so that filter decisions and delivered
/// events stay consistent.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EventDescriptor {
    /// Stable event id, or 0 if no id is assigned.
    pub id: u16,

    /// Event version, incremented for each breaking change to the event's
    /// fields. 0 unless `id` is assigned.
    pub version: u8,

    /// Delivery channel. Provider-defined; 0 if unused.
    pub channel: u8,

    /// Required eventing level, stored as the level's numeric value.
    pub level: u8,

    /// Special semantics for the event: 0 = informational,
    /// 1 = activity-start, 2 = activity-stop.
    pub opcode: u8,

    /// Provider-defined task grouping; 0 if unused.
    pub task: u16,

    /// Category bitmask for keyword-based filtering.
    pub keyword: u64,
}

impl EventDescriptor {
    /// Creates a descriptor for an informational event with the specified
    /// level and keyword. All other fields are 0.
    pub const fn new(level: Level, keyword: u64) -> EventDescriptor {
        return EventDescriptor {
            id: 0,
            version: 0,
            channel: 0,
            level: level.as_int(),
            opcode: 0,
            task: 0,
            keyword,
        };
    }

    /// Creates a descriptor from values.
    pub const fn from_parts(
        id: u16,
        version: u8,
        channel: u8,
        level: Level,
        opcode: u8,
        task: u16,
        keyword: u64,
    ) -> EventDescriptor {
        return EventDescriptor {
            id,
            version,
            channel,
            level: level.as_int(),
            opcode,
            task,
            keyword,
        };
    }
}

/// Static description of one event parameter slot.
///
/// Each event type has a fixed sequence of parameter descriptors, defined once
/// alongside its [`EventDescriptor`] and never mutated. Slot `n` describes the
/// payload fragment carried by the `n`th [`EventDataDescriptor`] passed to
/// [`Provider::write_event`](crate::Provider::write_event).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EventParameterDescriptor {
    /// Declared type of this parameter slot.
    pub typ: ParameterType,
}

impl EventParameterDescriptor {
    /// Creates a parameter descriptor for the specified type.
    pub const fn new(typ: ParameterType) -> EventParameterDescriptor {
        return EventParameterDescriptor { typ };
    }
}

/// One payload fragment of an emission call: pointer, size, type slot.
///
/// Data descriptors are constructed on the caller's stack for a single call to
/// [`Provider::write_event`](crate::Provider::write_event) and reference
/// caller-owned memory. The lifetime parameter ties each descriptor to the
/// borrowed data so the pointer cannot outlive it; the emission pipeline never
/// retains a descriptor beyond the synchronous call.
#[repr(C)]
#[derive(Debug, Default)]
pub struct EventDataDescriptor<'a> {
    ptr: usize,
    size: usize,
    typ: usize,
    lifetime: PhantomData<&'a [u8]>,
}

impl<'a> EventDataDescriptor<'a> {
    /// Strings longer than this many code units are truncated.
    const MAX_LEN: usize = 65535;

    /// Returns an EventDataDescriptor initialized with { null, 0 }.
    pub const fn zero() -> Self {
        return Self {
            ptr: 0,
            size: 0,
            typ: 0,
            lifetime: PhantomData,
        };
    }

    /// Returns true if this descriptor's size is 0.
    pub const fn is_empty(&self) -> bool {
        return self.size == 0;
    }

    /// Returns this descriptor's payload size in bytes.
    pub const fn size(&self) -> usize {
        return self.size;
    }

    /// Returns this descriptor's pointer value. 0 for an empty descriptor
    /// created from a null/absent payload.
    pub const fn as_ptr_value(&self) -> usize {
        return self.ptr;
    }

    /// Returns an EventDataDescriptor for the specified value's bytes.
    /// Size is `size_of::<T>()`.
    pub fn from_value<T: Copy>(value: &'a T) -> Self {
        return Self {
            ptr: value as *const T as usize,
            size: size_of::<T>(),
            typ: 0,
            lifetime: PhantomData,
        };
    }

    /// Returns an EventDataDescriptor for the specified slice's bytes.
    pub fn from_bytes(value: &'a [u8]) -> Self {
        return Self {
            ptr: value.as_ptr() as usize,
            size: value.len(),
            typ: 0,
            lifetime: PhantomData,
        };
    }

    /// Returns an EventDataDescriptor for a nul-terminated string of 8-bit or
    /// 16-bit code units.
    ///
    /// Size covers the code units up to and including the first terminator
    /// element; if the slice contains no terminator the entire slice is used.
    /// An absent string (`None`, the null-pointer case) yields `{ null, 0 }`
    /// and never faults.
    pub fn from_cstr<T: Copy + Default + Eq>(value: Option<&'a [T]>) -> Self {
        let value = match value {
            None => return Self::zero(),
            Some(value) => value,
        };

        let zero = T::default();
        let mut len = value.len();
        if len > Self::MAX_LEN {
            len = Self::MAX_LEN;
        }

        let mut pos = 0;
        while pos < len {
            if value[pos] == zero {
                len = pos + 1; // Terminator is part of the payload.
                break;
            }

            pos += 1;
        }

        return Self {
            ptr: value.as_ptr() as usize,
            size: size_of::<T>() * len,
            typ: 0,
            lifetime: PhantomData,
        };
    }

    /// Returns an EventDataDescriptor initialized with the specified raw ptr
    /// and size.
    ///
    /// # Safety
    ///
    /// This bypasses lifetime tracking. Caller must ensure that the descriptor
    /// is not used after the referenced data's lifetime, typically by
    /// overwriting it with [`EventDataDescriptor::zero`] after use.
    pub const unsafe fn from_raw_ptr(ptr: usize, size: usize) -> Self {
        return Self {
            ptr,
            size,
            typ: 0,
            lifetime: PhantomData,
        };
    }
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use core::ffi;
use core::sync::atomic::AtomicI32;
use core::sync::atomic::AtomicU32;
use core::sync::atomic::AtomicU64;
use core::sync::atomic::Ordering;

use crate::descriptors::EventDataDescriptor;
use crate::descriptors::EventDescriptor;
use crate::enums::Severity;

#[cfg(all(target_os = "linux", feature = "native_events"))]
use libc as linux;

// Shared by all providers in the process. Teardown closes it explicitly.
static EVENTS_FILE: EventsFile = EventsFile::new();

/// Requires: an errno-setting operation has failed.
///
/// Returns the current value of `linux::errno`.
#[cfg(all(target_os = "linux", feature = "native_events"))]
fn get_failure_errno() -> i32 {
    let errno = unsafe { *linux::__errno_location() };
    debug_assert!(errno > 0);
    return errno;
}

/// Sets `linux::errno` to 0.
#[cfg(all(target_os = "linux", feature = "native_events"))]
fn clear_errno() {
    unsafe { *linux::__errno_location() = 0 };
}

/// Copies the specified value into the buffer at `pos`.
/// Returns the position after the end of the copy.
#[cfg(all(target_os = "linux", feature = "native_events"))]
fn append_bytes<T: Sized>(buf: &mut [u8], pos: usize, src: &T) -> usize {
    let size = core::mem::size_of::<T>();
    let src_bytes =
        unsafe { core::slice::from_raw_parts(src as *const T as *const u8, size) };
    buf[pos..pos + size].copy_from_slice(src_bytes);
    return pos + size;
}

/// Lazily-opened handle to the kernel's event delivery file.
struct EventsFile {
    /// Initial value is -EAGAIN.
    /// Negative value is -errno with the error code from a failed open.
    /// Non-negative value is the file descriptor.
    file_or_error: AtomicI32,
}

impl EventsFile {
    const EAGAIN_ERROR: i32 = -11;

    // Initial state is -EAGAIN.
    pub const fn new() -> Self {
        return Self {
            file_or_error: AtomicI32::new(Self::EAGAIN_ERROR),
        };
    }

    /// Opens the `user_events_data` file at its conventional tracefs or
    /// debugfs location. Atomically publishes either a negative value
    /// (-errno from the failed open) or the non-negative file descriptor.
    /// If another thread already published a descriptor, the existing value
    /// is retained and the new descriptor is closed. In all cases, returns
    /// the final value of `self.file_or_error`.
    fn update(&self) -> i32 {
        let new_file_or_error;

        #[cfg(not(all(target_os = "linux", feature = "native_events")))]
        {
            new_file_or_error = 0;
        }
        #[cfg(all(target_os = "linux", feature = "native_events"))]
        {
            const PATHS: [&[u8]; 2] = [
                b"/sys/kernel/tracing/user_events_data\0",
                b"/sys/kernel/debug/tracing/user_events_data\0",
            ];

            let mut result = -linux::ENOTSUP;
            for path in PATHS {
                clear_errno();
                let new_file =
                    unsafe { linux::open(path.as_ptr().cast::<ffi::c_char>(), linux::O_RDWR) };
                if new_file >= 0 {
                    result = new_file;
                    break;
                }

                result = -get_failure_errno();
            }

            new_file_or_error = result;
        }

        let mut old_file_or_error = Self::EAGAIN_ERROR;
        loop {
            match self.file_or_error.compare_exchange(
                old_file_or_error,
                new_file_or_error,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    return new_file_or_error;
                }
                Err(current_file_or_error) => {
                    // Somebody else updated file_or_error to current.
                    if current_file_or_error >= 0 || new_file_or_error < 0 {
                        // prefer current.
                        #[cfg(all(target_os = "linux", feature = "native_events"))]
                        if new_file_or_error >= 0 {
                            unsafe { linux::close(new_file_or_error) };
                        }
                        return current_file_or_error;
                    }

                    // current is an error, new is a file, try again.
                    old_file_or_error = current_file_or_error;
                }
            }
        }
    }

    // If the file is open, closes it. Sets state to -EAGAIN.
    #[cfg(target_os = "linux")]
    pub fn close(&self) {
        let file_or_error = self
            .file_or_error
            .swap(Self::EAGAIN_ERROR, Ordering::Relaxed);
        if file_or_error >= 0 {
            #[cfg(all(target_os = "linux", feature = "native_events"))]
            unsafe {
                linux::close(file_or_error)
            };
        }
    }

    // Returns existing state without attempting an open.
    #[cfg(all(target_os = "linux", feature = "native_events"))]
    pub fn peek(&self) -> i32 {
        return self.file_or_error.load(Ordering::Relaxed);
    }

    // If we have not already tried to open the events file, try to open it,
    // atomically update state, and return the new state. Otherwise, return
    // the existing state. Non-negative file descriptor on success, -errno
    // for error.
    #[inline]
    pub fn get(&self) -> i32 {
        let file_or_error = self.file_or_error.load(Ordering::Relaxed);
        return if file_or_error == Self::EAGAIN_ERROR {
            self.update()
        } else {
            file_or_error
        };
    }
}

/// Pre-opens the event delivery file so that provider registration during
/// setup does not pay the open cost on the first emission. Failure is
/// recorded in the shared handle and surfaces later as a registration errno.
pub(crate) fn warm_up() {
    let _ = EVENTS_FILE.get();
}

/// Closes the shared event delivery file. Called from process teardown after
/// all providers have been unregistered.
#[cfg(target_os = "linux")]
pub(crate) fn shut_down() {
    EVENTS_FILE.close();
}

/// Backend registration state for one provider.
///
/// On the native build the kernel updates `enable_status` whenever a trace
/// session starts or stops listening; the no-op build never registers, so
/// `enable_status` stays 0 and [`ProviderState::enabled`] is a single load of
/// an integer that always reads false.
pub struct ProviderState {
    /// The kernel updates this word with listener state:
    /// 0 if no session is listening, nonzero otherwise.
    enable_status: AtomicU32,

    /// Keyword bits some session is listening to. All-ones after a
    /// successful registration (the kernel tracks listeners per provider,
    /// not per keyword); narrowed only by test hooks.
    keyword_mask: AtomicU64,

    /// Backend-assigned value if registered, `UNREGISTERED_WRITE_INDEX` or
    /// `BUSY_WRITE_INDEX` if not registered.
    write_index: AtomicU32,
}

impl ProviderState {
    const UNREGISTERED_WRITE_INDEX: u32 = u32::MAX;
    const BUSY_WRITE_INDEX: u32 = u32::MAX - 1;
    const HIGHEST_VALID_WRITE_INDEX: u32 = u32::MAX - 2;

    #[cfg(all(target_os = "linux", feature = "native_events"))]
    const IOC_WRITE: ffi::c_ulong = 1;

    #[cfg(all(target_os = "linux", feature = "native_events"))]
    const IOC_READ: ffi::c_ulong = 2;

    #[cfg(all(target_os = "linux", feature = "native_events"))]
    const DIAG_IOC_MAGIC: ffi::c_ulong = '*' as ffi::c_ulong;

    #[cfg(all(target_os = "linux", feature = "native_events"))]
    const DIAG_IOCSREG: ffi::c_ulong =
        Self::ioc(Self::IOC_WRITE | Self::IOC_READ, Self::DIAG_IOC_MAGIC, 0);

    #[cfg(all(target_os = "linux", feature = "native_events"))]
    const DIAG_IOCSUNREG: ffi::c_ulong = Self::ioc(Self::IOC_WRITE, Self::DIAG_IOC_MAGIC, 2);

    #[cfg(all(target_os = "linux", feature = "native_events"))]
    const fn ioc(dir: ffi::c_ulong, typ: ffi::c_ulong, nr: ffi::c_ulong) -> ffi::c_ulong {
        const IOC_NRBITS: u8 = 8;
        const IOC_TYPEBITS: u8 = 8;
        const IOC_SIZEBITS: u8 = 14;
        const IOC_NRSHIFT: u8 = 0;
        const IOC_TYPESHIFT: u8 = IOC_NRSHIFT + IOC_NRBITS;
        const IOC_SIZESHIFT: u8 = IOC_TYPESHIFT + IOC_TYPEBITS;
        const IOC_DIRSHIFT: u8 = IOC_SIZESHIFT + IOC_SIZEBITS;

        return (dir << IOC_DIRSHIFT)
            | (typ << IOC_TYPESHIFT)
            | (nr << IOC_NRSHIFT)
            | ((core::mem::size_of::<usize>() as ffi::c_ulong) << IOC_SIZESHIFT);
    }

    /// Creates a new unregistered provider state.
    ///
    /// `initial_enable_status` should be 0 for normal use. Tests pass a
    /// nonzero value to simulate a listening session without a backend.
    pub const fn new(initial_enable_status: u32) -> Self {
        return Self {
            enable_status: AtomicU32::new(initial_enable_status),
            keyword_mask: AtomicU64::new(u64::MAX),
            write_index: AtomicU32::new(Self::UNREGISTERED_WRITE_INDEX),
        };
    }

    /// Returns true if the backend reports the provider+keyword combination
    /// as listened to. A keyword of 0 means "uncategorized" and passes
    /// whenever any session is listening.
    #[inline(always)]
    pub fn enabled(&self, keyword: u64) -> bool {
        return 0 != self.enable_status.load(Ordering::Relaxed)
            && (keyword == 0 || 0 != keyword & self.keyword_mask.load(Ordering::Relaxed));
    }

    /// For testing purposes: narrows the keyword bits the simulated session
    /// listens to.
    #[doc(hidden)]
    pub fn set_keyword_mask(&self, mask: u64) {
        self.keyword_mask.store(mask, Ordering::Relaxed);
    }

    /// Registers this provider state under the specified command string.
    ///
    /// Requires: this state is not currently registered (verified at runtime,
    /// failure = panic). The `&'static` receiver keeps the enable word at a
    /// stable address for as long as the kernel may update it.
    ///
    /// Returns 0 for success or an errno. Callers record the errno for
    /// diagnostics and otherwise ignore it.
    pub fn register(&'static self, _name_args: &ffi::CStr) -> i32 {
        let error;
        let new_write_index;

        let old_write_index = self
            .write_index
            .swap(Self::BUSY_WRITE_INDEX, Ordering::Relaxed);
        assert!(
            old_write_index == Self::UNREGISTERED_WRITE_INDEX,
            "register of active provider (already-registered or being-unregistered)"
        );

        let events_file = EVENTS_FILE.get();
        if events_file < 0 {
            error = -events_file;
            new_write_index = Self::UNREGISTERED_WRITE_INDEX;
        } else {
            #[cfg(not(all(target_os = "linux", feature = "native_events")))]
            {
                error = 0;
                new_write_index = 0;
            }

            #[cfg(all(target_os = "linux", feature = "native_events"))]
            {
                #[repr(C, packed)]
                struct user_reg {
                    size: u32,
                    enable_bit: u8,
                    enable_size: u8,
                    flags: u16,
                    enable_addr: u64,
                    name_args: u64,
                    write_index: u32,
                }

                let mut reg = user_reg {
                    size: core::mem::size_of::<user_reg>() as u32,
                    enable_bit: 0,
                    enable_size: 4,
                    flags: 0,
                    enable_addr: &self.enable_status as *const AtomicU32 as usize as u64,
                    name_args: _name_args.as_ptr() as usize as u64,
                    write_index: 0,
                };

                clear_errno();
                let ioctl_result =
                    unsafe { linux::ioctl(events_file, Self::DIAG_IOCSREG, &mut reg) };
                if 0 > ioctl_result {
                    error = get_failure_errno();
                    new_write_index = Self::UNREGISTERED_WRITE_INDEX;
                } else {
                    error = 0;
                    new_write_index = reg.write_index;
                    debug_assert!(new_write_index <= Self::HIGHEST_VALID_WRITE_INDEX);
                }
            }
        }

        let old_write_index = self.write_index.swap(new_write_index, Ordering::Relaxed);
        debug_assert!(old_write_index == Self::BUSY_WRITE_INDEX);

        return error;
    }

    /// Unregisters this provider state.
    ///
    /// Safe to call when the backend never registered (returns EALREADY).
    /// Afterwards [`ProviderState::enabled`] reads false until a new
    /// registration occurs.
    pub fn unregister(&self) -> i32 {
        let error;

        let old_write_index = self
            .write_index
            .swap(Self::BUSY_WRITE_INDEX, Ordering::Relaxed);
        match old_write_index {
            Self::BUSY_WRITE_INDEX => {
                error = 16; // EBUSY: Another thread is registering/unregistering. Do nothing.
                return error; // Return immediately, need to leave write_index = BUSY.
            }
            Self::UNREGISTERED_WRITE_INDEX => {
                error = 114; // EALREADY: Already unregistered. No action needed.
            }
            _ => {
                #[cfg(not(all(target_os = "linux", feature = "native_events")))]
                {
                    error = 0;
                }

                #[cfg(all(target_os = "linux", feature = "native_events"))]
                {
                    #[repr(C, packed)]
                    struct user_unreg {
                        size: u32,
                        disable_bit: u8,
                        reserved1: u8,
                        reserved2: u16,
                        disable_addr: u64,
                    }

                    let unreg = user_unreg {
                        size: core::mem::size_of::<user_unreg>() as u32,
                        disable_bit: 0,
                        reserved1: 0,
                        reserved2: 0,
                        disable_addr: &self.enable_status as *const AtomicU32 as usize as u64,
                    };

                    clear_errno();
                    let ioctl_result = unsafe {
                        linux::ioctl(EVENTS_FILE.peek(), Self::DIAG_IOCSUNREG, &unreg)
                    };
                    if 0 > ioctl_result {
                        error = get_failure_errno();
                    } else {
                        error = 0;
                    }
                }
            }
        }

        // Emission is gated on enable_status, so clear it even if the
        // backend refused the unregister call.
        self.enable_status.store(0, Ordering::Relaxed);

        let old_write_index = self
            .write_index
            .swap(Self::UNREGISTERED_WRITE_INDEX, Ordering::Relaxed);
        debug_assert!(old_write_index == Self::BUSY_WRITE_INDEX);

        return error;
    }

    /// Sends the event to the backend: a header block carrying the backend
    /// write index, the severity, and the event's descriptor, followed by the
    /// payload fragments. Does nothing if the backend is not listening or the
    /// state was never registered.
    ///
    /// Returns 0 for success or an errno; callers treat emission as
    /// fire-and-forget and ignore the result.
    pub fn write(
        &self,
        _severity: Severity,
        _descriptor: &EventDescriptor,
        _data: &[EventDataDescriptor],
    ) -> i32 {
        let enable_status = self.enable_status.load(Ordering::Relaxed);
        let write_index = self.write_index.load(Ordering::Relaxed);
        if enable_status == 0 || write_index > Self::HIGHEST_VALID_WRITE_INDEX {
            return 0;
        }

        #[cfg(all(target_os = "linux", feature = "native_events"))]
        {
            const HEADERS_SIZE_MAX: usize = core::mem::size_of::<u32>()
                + core::mem::size_of::<u8>()
                + core::mem::size_of::<EventDescriptor>();
            let mut headers: [u8; HEADERS_SIZE_MAX] = [0; HEADERS_SIZE_MAX];
            let mut headers_len = 0;
            headers_len = append_bytes(&mut headers, headers_len, &write_index);
            headers_len = append_bytes(&mut headers, headers_len, &_severity.as_int());
            headers_len = append_bytes(&mut headers, headers_len, _descriptor);

            let mut vecs = Vec::with_capacity(1 + _data.len());
            vecs.push(linux::iovec {
                iov_base: headers.as_ptr() as *mut ffi::c_void,
                iov_len: headers_len,
            });
            for item in _data {
                vecs.push(linux::iovec {
                    iov_base: item.as_ptr_value() as *mut ffi::c_void,
                    iov_len: item.size(),
                });
            }

            let writev_result = unsafe {
                linux::writev(EVENTS_FILE.peek(), vecs.as_ptr(), vecs.len() as ffi::c_int)
            };
            if 0 > writev_result {
                return get_failure_errno();
            }
        }

        return 0;
    }
}

/// Possible configurations under which this crate can be compiled:
/// `LinuxUserEvents` or `Noop`.
pub enum NativeImplementation {
    /// Crate compiled without a native tracing facility: every backend
    /// operation is a constant/empty operation and no events are delivered.
    Noop,

    /// Crate compiled for the Linux user_events configuration: events are
    /// delivered through the `user_events_data` file.
    LinuxUserEvents,
}

/// The configuration under which this crate was compiled.
pub const NATIVE_IMPLEMENTATION: NativeImplementation =
    if cfg!(all(target_os = "linux", feature = "native_events")) {
        NativeImplementation::LinuxUserEvents
    } else {
        NativeImplementation::Noop
    };

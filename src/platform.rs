// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use uuid::Uuid;

/// Returns a freshly-generated random 128-bit UUID.
///
/// Uses the platform's random source through the `uuid` crate; there is no
/// platform without a usable fallback, so this never fails.
pub fn generate_random_uuid() -> Uuid {
    return Uuid::new_v4();
}

/// Names the current thread for debuggers and trace viewers.
///
/// Best-effort: on Linux the name is applied via `pthread_setname_np` and
/// silently truncated to the kernel's 15-byte limit; on platforms without a
/// thread-naming primitive this is a no-op. Never fails.
pub fn set_current_thread_name(name: &str) {
    #[cfg(not(target_os = "linux"))]
    {
        let _ = name;
    }
    #[cfg(target_os = "linux")]
    {
        // TASK_COMM_LEN is 16 including the nul.
        const NAME_MAX: usize = 15;
        let mut buf = [0u8; NAME_MAX + 1];
        let mut len = 0;
        for &byte in name.as_bytes() {
            if len == NAME_MAX || byte == 0 {
                break;
            }
            buf[len] = byte;
            len += 1;
        }

        unsafe {
            libc::pthread_setname_np(
                libc::pthread_self(),
                buf.as_ptr().cast::<core::ffi::c_char>(),
            );
        }
    }
}

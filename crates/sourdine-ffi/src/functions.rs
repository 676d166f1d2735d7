//! Exported `extern "C"` functions.
//!
//! Every function catches panics at the boundary. Functions that can fail
//! return an [`SdnError`]; queries on a null filter return a neutral value.

use std::ffi::c_char;
use std::{ptr, slice};

use sourdine::{AudioBuffer, Config, NoiseFilter, num_bands_for_frames};

use crate::panic_guard::{ffi_guard, ffi_guard_or, ffi_guard_ptr};
use crate::types::{
    SdnEngineVTable, SdnError, SdnNoiseFilter, SdnSession, VTableEngine,
    connection_state_from_raw, opt_string,
};

// ─── Version ─────────────────────────────────────────────────────────

/// Returns a pointer to a static NUL-terminated version string.
///
/// The returned pointer is valid for the lifetime of the process.
#[unsafe(no_mangle)]
pub extern "C" fn sdn_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr().cast()
}

// ─── Lifecycle ───────────────────────────────────────────────────────

/// Creates a noise filter around a C engine, named `sourdine_noise_filter`.
///
/// Runs the engine's `global_init` once. Returns `NULL` if `vtable` is null,
/// has no `process` callback, or on internal error. The vtable is copied; on
/// success the filter owns `user_data` and calls `destroy` on it from
/// [`sdn_filter_destroy()`].
///
/// # Safety
///
/// `vtable` must be null or point to a valid [`SdnEngineVTable`] whose
/// callbacks honor its threading contract.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sdn_filter_create(
    vtable: *const SdnEngineVTable,
) -> *mut SdnNoiseFilter {
    // Safety: forwarded from the caller.
    unsafe { sdn_filter_create_with_name(vtable, ptr::null()) }
}

/// Like [`sdn_filter_create()`], with a custom processor name. A null `name`
/// uses the default.
///
/// # Safety
///
/// As [`sdn_filter_create()`]; `name` must be null or a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sdn_filter_create_with_name(
    vtable: *const SdnEngineVTable,
    name: *const c_char,
) -> *mut SdnNoiseFilter {
    ffi_guard_ptr! {
        // Safety: the caller guarantees the pointer is null or valid.
        let Some(vtable) = (unsafe { vtable.as_ref() }) else {
            return ptr::null_mut();
        };
        let Some(engine) = VTableEngine::new(*vtable) else {
            tracing::warn!("engine vtable has no process callback");
            return ptr::null_mut();
        };

        let mut config = Config::default();
        // Safety: the caller guarantees `name` is null or NUL-terminated.
        if let Some(name) = unsafe { opt_string(name) } {
            config.name = name;
        }

        let filter = NoiseFilter::builder(engine).config(config).build();
        Box::into_raw(Box::new(SdnNoiseFilter { filter }))
    }
}

/// Destroys a filter and calls the engine's `destroy` callback.
///
/// Passing `NULL` is a safe no-op. After this call the pointer is invalid.
///
/// # Safety
///
/// `filter` must be null or a live handle owned by the caller.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sdn_filter_destroy(filter: *mut SdnNoiseFilter) {
    ffi_guard_or! { ();
        if !filter.is_null() {
            // Safety: we created this pointer via Box::into_raw in
            // sdn_filter_create_with_name, and the caller guarantees single
            // ownership.
            drop(unsafe { Box::from_raw(filter) });
        }
    }
}

// ─── Control ─────────────────────────────────────────────────────────

/// Turns filtering on or off.
///
/// Returns `SdnError::NullPointer` if `filter` is null.
///
/// # Safety
///
/// `filter` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sdn_filter_set_enabled(
    filter: *const SdnNoiseFilter,
    enabled: bool,
) -> SdnError {
    ffi_guard! {
        // Safety: the caller guarantees the pointer is null or valid.
        let Some(filter) = (unsafe { filter.as_ref() }) else {
            return SdnError::NullPointer;
        };
        filter.filter.set_enabled(enabled);
        SdnError::None
    }
}

/// Whether filtering is on. `false` for a null filter.
///
/// # Safety
///
/// `filter` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sdn_filter_is_enabled(filter: *const SdnNoiseFilter) -> bool {
    ffi_guard_or! { false;
        // Safety: the caller guarantees the pointer is null or valid.
        unsafe { filter.as_ref() }.is_some_and(|f| f.filter.is_enabled())
    }
}

/// Sets up the engine on the first call, resets it to the new rate on every
/// later call.
///
/// Returns `SdnError::NullPointer` if `filter` is null.
///
/// # Safety
///
/// `filter` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sdn_filter_initialize(
    filter: *const SdnNoiseFilter,
    sample_rate_hz: u32,
    num_channels: usize,
) -> SdnError {
    ffi_guard! {
        // Safety: the caller guarantees the pointer is null or valid.
        let Some(filter) = (unsafe { filter.as_ref() }) else {
            return SdnError::NullPointer;
        };
        filter.filter.initialize(sample_rate_hz, num_channels);
        SdnError::None
    }
}

// ─── Processing ──────────────────────────────────────────────────────

/// Filters a channel-major block of `len` samples in place.
///
/// `num_bands == 0` picks the band count from the frame count (3 for 480
/// frames, 2 for 320, otherwise 1). Engine failures are recorded on the
/// filter, not returned.
///
/// Returns `SdnError::NullPointer` if `filter` or `data` is null, and
/// `SdnError::BadBufferLayout` if `len`, `num_channels` and `num_bands` do
/// not describe a valid block.
///
/// # Safety
///
/// `filter` must be null or a live handle. `data` must be null or valid for
/// `len` reads and writes, not accessed elsewhere during the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sdn_filter_process(
    filter: *const SdnNoiseFilter,
    data: *mut f32,
    len: usize,
    num_channels: usize,
    num_bands: usize,
) -> SdnError {
    ffi_guard! {
        if data.is_null() {
            return SdnError::NullPointer;
        }
        // Safety: the caller guarantees the pointer is null or valid.
        let Some(filter) = (unsafe { filter.as_ref() }) else {
            return SdnError::NullPointer;
        };
        // Safety: non-null and valid for `len` elements per the caller.
        let data = unsafe { slice::from_raw_parts_mut(data, len) };

        let num_bands = if num_bands == 0 && num_channels > 0 {
            num_bands_for_frames(len / num_channels)
        } else {
            num_bands
        };
        match AudioBuffer::new(data, num_channels, num_bands) {
            Ok(mut buffer) => {
                filter.filter.process(&mut buffer);
                SdnError::None
            }
            Err(e) => e.into(),
        }
    }
}

/// Pipeline teardown hook. Only logs.
///
/// Returns `SdnError::NullPointer` if `filter` is null.
///
/// # Safety
///
/// `filter` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sdn_filter_release(filter: *const SdnNoiseFilter) -> SdnError {
    ffi_guard! {
        // Safety: the caller guarantees the pointer is null or valid.
        let Some(filter) = (unsafe { filter.as_ref() }) else {
            return SdnError::NullPointer;
        };
        filter.filter.release();
        SdnError::None
    }
}

// ─── Queries ─────────────────────────────────────────────────────────

/// Whether the engine's process-wide initialization failed. `false` for a
/// null filter.
///
/// # Safety
///
/// `filter` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sdn_filter_failed_to_initialize(filter: *const SdnNoiseFilter) -> bool {
    ffi_guard_or! { false;
        // Safety: the caller guarantees the pointer is null or valid.
        unsafe { filter.as_ref() }.is_some_and(|f| f.filter.failed_to_initialize())
    }
}

/// Copies up to `capacity` failed channel indices, ascending, into `out`
/// and returns the total number of failed channels.
///
/// Call with `capacity == 0` to size the output. Returns 0 for a null filter.
///
/// # Safety
///
/// `filter` must be null or a live handle. `out` must be valid for
/// `capacity` writes, or may be null when `capacity` is 0.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sdn_filter_failed_channels(
    filter: *const SdnNoiseFilter,
    out: *mut usize,
    capacity: usize,
) -> usize {
    ffi_guard_or! { 0;
        // Safety: the caller guarantees the pointer is null or valid.
        let Some(filter) = (unsafe { filter.as_ref() }) else {
            return 0;
        };
        let failed = filter.filter.failed_channels();
        if !out.is_null() && capacity > 0 {
            let n = failed.len().min(capacity);
            // Safety: `out` is valid for `capacity >= n` writes.
            let out = unsafe { slice::from_raw_parts_mut(out, n) };
            out.copy_from_slice(&failed[..n]);
        }
        failed.len()
    }
}

// ─── Connection context ──────────────────────────────────────────────

/// Forwards a session connection change to the engine's `update` callback.
///
/// States are `SdnConnectionState` values; anything else is treated as
/// disconnected. A panic during forwarding is logged and swallowed.
///
/// Returns `SdnError::NullPointer` if `filter` or `session` is null.
///
/// # Safety
///
/// `filter` must be null or a live handle. `session` must be null or point
/// to an [`SdnSession`] whose strings are valid for the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sdn_filter_connection_state_changed(
    filter: *const SdnNoiseFilter,
    session: *const SdnSession,
    new_state: i32,
    old_state: i32,
) -> SdnError {
    ffi_guard! {
        // Safety: the caller guarantees both pointers are null or valid.
        let (Some(filter), Some(session)) =
            (unsafe { filter.as_ref() }, unsafe { session.as_ref() })
        else {
            return SdnError::NullPointer;
        };
        // Safety: string validity is guaranteed by the caller.
        let session = unsafe { session.to_rust() };
        filter.filter.on_connection_state_changed(
            &session,
            connection_state_from_raw(new_state),
            connection_state_from_raw(old_state),
        );
        SdnError::None
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::ffi::{CStr, c_void};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use crate::types::SdnRoomContext;

    use super::*;

    /// Engine state shared with the C callbacks through `user_data`.
    #[derive(Debug, Default)]
    struct Recorder {
        global_init_fails: bool,
        fail_channel_with_marker: AtomicBool,
        init_calls: AtomicUsize,
        reset_calls: AtomicUsize,
        process_calls: AtomicUsize,
        destroyed: AtomicUsize,
        last_layout: Mutex<Option<(usize, usize, usize, usize)>>,
        last_room: Mutex<Option<(Option<String>, i32)>>,
    }

    unsafe fn recorder<'a>(user_data: *mut c_void) -> &'a Recorder {
        unsafe { &*user_data.cast::<Recorder>() }
    }

    unsafe extern "C" fn global_init(user_data: *mut c_void) -> bool {
        !unsafe { recorder(user_data) }.global_init_fails
    }

    unsafe extern "C" fn initialize(user_data: *mut c_void, _rate: u32, _channels: usize) {
        unsafe { recorder(user_data) }
            .init_calls
            .fetch_add(1, Ordering::SeqCst);
    }

    unsafe extern "C" fn reset(user_data: *mut c_void, _rate: u32) {
        unsafe { recorder(user_data) }
            .reset_calls
            .fetch_add(1, Ordering::SeqCst);
    }

    /// Doubles every sample; fails a channel whose first sample is -1.
    unsafe extern "C" fn process(
        user_data: *mut c_void,
        num_bands: usize,
        num_frames: usize,
        num_frames_per_band: usize,
        buffer: *mut f32,
        buffer_len: usize,
    ) -> bool {
        let rec = unsafe { recorder(user_data) };
        rec.process_calls.fetch_add(1, Ordering::SeqCst);
        *rec.last_layout.lock().unwrap() =
            Some((num_bands, num_frames, num_frames_per_band, buffer_len));

        let samples = unsafe { slice::from_raw_parts_mut(buffer, buffer_len) };
        if rec.fail_channel_with_marker.load(Ordering::SeqCst) && samples[0] == -1.0 {
            return false;
        }
        for s in samples {
            *s *= 2.0;
        }
        true
    }

    unsafe extern "C" fn update(user_data: *mut c_void, context: *const SdnRoomContext) {
        let rec = unsafe { recorder(user_data) };
        let context = unsafe { &*context };
        let sid = (!context.sid.is_null()).then(|| {
            unsafe { CStr::from_ptr(context.sid) }
                .to_string_lossy()
                .into_owned()
        });
        *rec.last_room.lock().unwrap() = Some((sid, context.connection_state));
    }

    unsafe extern "C" fn destroy(user_data: *mut c_void) {
        unsafe { recorder(user_data) }
            .destroyed
            .fetch_add(1, Ordering::SeqCst);
    }

    fn vtable(rec: &Recorder) -> SdnEngineVTable {
        SdnEngineVTable {
            user_data: ptr::from_ref(rec).cast_mut().cast(),
            global_init: Some(global_init),
            initialize: Some(initialize),
            reset: Some(reset),
            process: Some(process),
            update: Some(update),
            destroy: Some(destroy),
        }
    }

    fn failed_channels(filter: *const SdnNoiseFilter) -> Vec<usize> {
        let count = unsafe { sdn_filter_failed_channels(filter, ptr::null_mut(), 0) };
        let mut out = vec![usize::MAX; count];
        let written = unsafe { sdn_filter_failed_channels(filter, out.as_mut_ptr(), out.len()) };
        assert_eq!(written, count);
        out
    }

    #[test]
    fn version_matches_crate() {
        let version = unsafe { CStr::from_ptr(sdn_version()) };
        assert_eq!(version.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn null_handles_are_rejected() {
        unsafe {
            assert!(sdn_filter_create(ptr::null()).is_null());
            sdn_filter_destroy(ptr::null_mut());

            let null = ptr::null();
            assert_eq!(sdn_filter_set_enabled(null, true), SdnError::NullPointer);
            assert!(!sdn_filter_is_enabled(null));
            assert_eq!(sdn_filter_initialize(null, 48_000, 1), SdnError::NullPointer);
            let mut data = [0.0f32; 480];
            assert_eq!(
                sdn_filter_process(null, data.as_mut_ptr(), data.len(), 1, 0),
                SdnError::NullPointer
            );
            assert_eq!(sdn_filter_release(null), SdnError::NullPointer);
            assert!(!sdn_filter_failed_to_initialize(null));
            assert_eq!(sdn_filter_failed_channels(null, ptr::null_mut(), 0), 0);
            assert_eq!(
                sdn_filter_connection_state_changed(null, ptr::null(), 3, 1),
                SdnError::NullPointer
            );
        }
    }

    #[test]
    fn destroy_runs_engine_destroy_once() {
        let rec = Recorder::default();
        let filter = unsafe { sdn_filter_create(&vtable(&rec)) };
        assert!(!filter.is_null());
        assert_eq!(rec.destroyed.load(Ordering::SeqCst), 0);

        unsafe {
            sdn_filter_destroy(filter);
            sdn_filter_destroy(ptr::null_mut());
        }
        assert_eq!(rec.destroyed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_process_callback_is_rejected() {
        let rec = Recorder::default();
        let mut table = vtable(&rec);
        table.process = None;
        assert!(unsafe { sdn_filter_create(&table) }.is_null());
        // The filter never took ownership.
        assert_eq!(rec.destroyed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dispatches_through_vtable() {
        let rec = Recorder::default();
        let filter = unsafe { sdn_filter_create(&vtable(&rec)) };
        assert!(!filter.is_null());

        unsafe {
            assert!(sdn_filter_is_enabled(filter));
            assert!(!sdn_filter_failed_to_initialize(filter));

            assert_eq!(sdn_filter_initialize(filter, 48_000, 2), SdnError::None);
            assert_eq!(sdn_filter_initialize(filter, 48_000, 2), SdnError::None);
            assert_eq!(rec.init_calls.load(Ordering::SeqCst), 1);
            assert_eq!(rec.reset_calls.load(Ordering::SeqCst), 1);

            let mut data = vec![1.0f32; 960];
            assert_eq!(
                sdn_filter_process(filter, data.as_mut_ptr(), data.len(), 2, 0),
                SdnError::None
            );
            assert!(data.iter().all(|&s| s == 2.0));
            assert_eq!(rec.process_calls.load(Ordering::SeqCst), 2);
            assert_eq!(*rec.last_layout.lock().unwrap(), Some((3, 480, 160, 480)));

            assert_eq!(sdn_filter_release(filter), SdnError::None);
            sdn_filter_destroy(filter);
        }
        assert_eq!(rec.destroyed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn explicit_band_count_is_forwarded() {
        let rec = Recorder::default();
        let filter = unsafe { sdn_filter_create(&vtable(&rec)) };
        unsafe {
            sdn_filter_initialize(filter, 48_000, 1);
            let mut data = vec![0.5f32; 480];
            assert_eq!(
                sdn_filter_process(filter, data.as_mut_ptr(), data.len(), 1, 2),
                SdnError::None
            );
            assert_eq!(*rec.last_layout.lock().unwrap(), Some((2, 480, 240, 480)));
            sdn_filter_destroy(filter);
        }
    }

    #[test]
    fn bad_layouts_are_reported() {
        let rec = Recorder::default();
        let filter = unsafe { sdn_filter_create(&vtable(&rec)) };
        unsafe {
            let mut data = vec![0.0f32; 481];
            assert_eq!(
                sdn_filter_process(filter, data.as_mut_ptr(), data.len(), 2, 0),
                SdnError::BadBufferLayout
            );
            assert_eq!(
                sdn_filter_process(filter, data.as_mut_ptr(), data.len(), 0, 1),
                SdnError::BadBufferLayout
            );
            assert_eq!(
                sdn_filter_process(filter, ptr::null_mut(), 480, 1, 0),
                SdnError::NullPointer
            );
            sdn_filter_destroy(filter);
        }
        assert_eq!(rec.process_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failed_channels_are_copied_out() {
        let rec = Recorder::default();
        rec.fail_channel_with_marker.store(true, Ordering::SeqCst);
        let filter = unsafe { sdn_filter_create(&vtable(&rec)) };
        unsafe {
            sdn_filter_initialize(filter, 16_000, 4);

            // Channels 1 and 3 start with the failure marker.
            let mut data = vec![0.0f32; 160 * 4];
            data[160] = -1.0;
            data[480] = -1.0;
            for _ in 0..2 {
                assert_eq!(
                    sdn_filter_process(filter, data.as_mut_ptr(), data.len(), 4, 0),
                    SdnError::None
                );
            }
        }
        assert_eq!(failed_channels(filter), vec![1, 3]);

        // Short output buffers get a prefix; the total is still returned.
        let mut first = [usize::MAX; 1];
        let total = unsafe { sdn_filter_failed_channels(filter, first.as_mut_ptr(), 1) };
        assert_eq!(total, 2);
        assert_eq!(first, [1]);

        unsafe { sdn_filter_destroy(filter) };
    }

    #[test]
    fn disabled_filter_skips_engine() {
        let rec = Recorder::default();
        let filter = unsafe { sdn_filter_create(&vtable(&rec)) };
        unsafe {
            assert_eq!(sdn_filter_set_enabled(filter, false), SdnError::None);
            assert!(!sdn_filter_is_enabled(filter));
            let mut data = vec![1.0f32; 480];
            sdn_filter_process(filter, data.as_mut_ptr(), data.len(), 1, 0);
            assert!(data.iter().all(|&s| s == 1.0));
            sdn_filter_destroy(filter);
        }
        assert_eq!(rec.process_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn global_init_failure_is_reported() {
        let rec = Recorder {
            global_init_fails: true,
            ..Default::default()
        };
        let filter = unsafe { sdn_filter_create(&vtable(&rec)) };
        assert!(!filter.is_null());
        assert!(unsafe { sdn_filter_failed_to_initialize(filter) });
        unsafe { sdn_filter_destroy(filter) };
    }

    #[test]
    fn custom_name_is_used() {
        let rec = Recorder::default();
        let filter = unsafe { sdn_filter_create_with_name(&vtable(&rec), c"studio_filter".as_ptr()) };
        assert_eq!(unsafe { &*filter }.filter.name(), "studio_filter");
        unsafe { sdn_filter_destroy(filter) };

        let filter = unsafe { sdn_filter_create(&vtable(&rec)) };
        assert_eq!(unsafe { &*filter }.filter.name(), Config::default().name);
        unsafe { sdn_filter_destroy(filter) };
    }

    #[test]
    fn connection_changes_reach_update_callback() {
        let rec = Recorder::default();
        let filter = unsafe { sdn_filter_create(&vtable(&rec)) };
        let session = SdnSession {
            sid: c"RM_c".as_ptr(),
            name: ptr::null(),
            server_version: ptr::null(),
            server_region: ptr::null(),
            server_node_id: ptr::null(),
            url: ptr::null(),
            token: c"secret".as_ptr(),
        };

        unsafe {
            assert_eq!(
                sdn_filter_connection_state_changed(filter, &session, 3, 1),
                SdnError::None
            );
        }
        assert_eq!(
            *rec.last_room.lock().unwrap(),
            Some((Some("RM_c".to_owned()), 3))
        );

        // Out-of-range states fall back to disconnected.
        unsafe {
            assert_eq!(
                sdn_filter_connection_state_changed(filter, &session, 42, 3),
                SdnError::None
            );
            assert_eq!(
                sdn_filter_connection_state_changed(filter, ptr::null(), 3, 1),
                SdnError::NullPointer
            );
            sdn_filter_destroy(filter);
        }
        assert_eq!(
            *rec.last_room.lock().unwrap(),
            Some((Some("RM_c".to_owned()), 0))
        );
    }
}

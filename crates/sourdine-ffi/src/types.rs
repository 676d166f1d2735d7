//! C-compatible types for the sourdine C API.

use std::ffi::{CStr, CString, c_char, c_void};
use std::ptr;

use sourdine::{ConnectionState, Error, FilterEngine, NoiseFilter, RoomContext, Session};

/// Result code returned by fallible C API functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdnError {
    /// Success.
    None = 0,
    /// A required pointer argument was null.
    NullPointer = -1,
    /// The audio data does not describe a valid channel-major block.
    BadBufferLayout = -2,
    /// An internal panic was caught at the API boundary.
    Internal = -3,
}

impl From<Error> for SdnError {
    fn from(_: Error) -> Self {
        Self::BadBufferLayout
    }
}

/// Connection state of a room session, as passed to
/// `sdn_filter_connection_state_changed`.
///
/// Unknown values are treated as `Disconnected`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdnConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Reconnecting = 2,
    Connected = 3,
}

/// Room session metadata. Every field is an optional NUL-terminated UTF-8
/// string; null means absent.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SdnSession {
    pub sid: *const c_char,
    pub name: *const c_char,
    pub server_version: *const c_char,
    pub server_region: *const c_char,
    pub server_node_id: *const c_char,
    pub url: *const c_char,
    pub token: *const c_char,
}

impl SdnSession {
    /// Copies the session into owned Rust strings.
    ///
    /// # Safety
    ///
    /// Every non-null field must point to a NUL-terminated string that stays
    /// valid for the duration of the call.
    pub(crate) unsafe fn to_rust(self) -> Session {
        // Safety: forwarded from the caller.
        unsafe {
            Session {
                sid: opt_string(self.sid),
                name: opt_string(self.name),
                server_version: opt_string(self.server_version),
                server_region: opt_string(self.server_region),
                server_node_id: opt_string(self.server_node_id),
                url: opt_string(self.url),
                token: opt_string(self.token),
            }
        }
    }
}

/// Room context handed to the engine's `update` callback.
///
/// The strings are only valid for the duration of the callback.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SdnRoomContext {
    pub sid: *const c_char,
    pub name: *const c_char,
    pub server_version: *const c_char,
    pub server_region: *const c_char,
    pub server_node_id: *const c_char,
    /// One of the `SdnConnectionState` values.
    pub connection_state: i32,
    pub url: *const c_char,
    pub token: *const c_char,
}

/// Callbacks implementing a noise-filter engine in C.
///
/// `process` is required; every other callback may be null. A missing
/// `global_init` counts as success. All callbacks receive `user_data` as
/// their first argument and may be invoked from several threads at once:
/// `process` from the audio thread while `reset` and `update` arrive from
/// control threads. `destroy` is called exactly once, when the filter is
/// destroyed.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SdnEngineVTable {
    pub user_data: *mut c_void,
    pub global_init: Option<unsafe extern "C" fn(user_data: *mut c_void) -> bool>,
    pub initialize: Option<
        unsafe extern "C" fn(user_data: *mut c_void, sample_rate_hz: u32, num_channels: usize),
    >,
    pub reset: Option<unsafe extern "C" fn(user_data: *mut c_void, sample_rate_hz: u32)>,
    pub process: Option<
        unsafe extern "C" fn(
            user_data: *mut c_void,
            num_bands: usize,
            num_frames: usize,
            num_frames_per_band: usize,
            buffer: *mut f32,
            buffer_len: usize,
        ) -> bool,
    >,
    pub update:
        Option<unsafe extern "C" fn(user_data: *mut c_void, context: *const SdnRoomContext)>,
    pub destroy: Option<unsafe extern "C" fn(user_data: *mut c_void)>,
}

/// [`FilterEngine`] dispatching to a C vtable.
#[derive(Debug)]
pub(crate) struct VTableEngine {
    vtable: SdnEngineVTable,
}

// Safety: the vtable contract requires callbacks and `user_data` to be usable
// from any thread, concurrently.
unsafe impl Send for VTableEngine {}
// Safety: see above.
unsafe impl Sync for VTableEngine {}

impl VTableEngine {
    /// Returns `None` if the required `process` callback is missing.
    pub(crate) fn new(vtable: SdnEngineVTable) -> Option<Self> {
        vtable.process.is_some().then_some(Self { vtable })
    }
}

impl Drop for VTableEngine {
    fn drop(&mut self) {
        if let Some(destroy) = self.vtable.destroy {
            // Safety: called once, with the caller's own user data.
            unsafe { destroy(self.vtable.user_data) };
        }
    }
}

impl FilterEngine for VTableEngine {
    fn global_init(&self) -> bool {
        match self.vtable.global_init {
            // Safety: vtable contract.
            Some(f) => unsafe { f(self.vtable.user_data) },
            None => true,
        }
    }

    fn initialize(&self, sample_rate_hz: u32, num_channels: usize) {
        if let Some(f) = self.vtable.initialize {
            // Safety: vtable contract.
            unsafe { f(self.vtable.user_data, sample_rate_hz, num_channels) };
        }
    }

    fn reset(&self, sample_rate_hz: u32) {
        if let Some(f) = self.vtable.reset {
            // Safety: vtable contract.
            unsafe { f(self.vtable.user_data, sample_rate_hz) };
        }
    }

    fn process(
        &self,
        num_bands: usize,
        num_frames: usize,
        num_frames_per_band: usize,
        buffer: &mut [f32],
    ) -> bool {
        let Some(f) = self.vtable.process else {
            return false;
        };
        // Safety: vtable contract; `buffer` is valid for `buffer.len()` writes.
        unsafe {
            f(
                self.vtable.user_data,
                num_bands,
                num_frames,
                num_frames_per_band,
                buffer.as_mut_ptr(),
                buffer.len(),
            )
        }
    }

    fn update(&self, context: &RoomContext) {
        let Some(f) = self.vtable.update else {
            return;
        };
        let strings = ContextStrings::new(context);
        let c_context = SdnRoomContext {
            sid: strings.sid.as_ptr(),
            name: strings.name.as_ptr(),
            server_version: strings.server_version.as_ptr(),
            server_region: strings.server_region.as_ptr(),
            server_node_id: strings.server_node_id.as_ptr(),
            connection_state: i32::from(context.connection_state.as_raw()),
            url: strings.url.as_ptr(),
            token: strings.token.as_ptr(),
        };
        // Safety: vtable contract; `strings` outlives the call.
        unsafe { f(self.vtable.user_data, &c_context) };
    }
}

/// Owned C strings backing an [`SdnRoomContext`].
struct ContextStrings {
    sid: OptCString,
    name: OptCString,
    server_version: OptCString,
    server_region: OptCString,
    server_node_id: OptCString,
    url: OptCString,
    token: OptCString,
}

impl ContextStrings {
    fn new(context: &RoomContext) -> Self {
        Self {
            sid: OptCString::new(context.sid.as_deref()),
            name: OptCString::new(context.name.as_deref()),
            server_version: OptCString::new(context.server_version.as_deref()),
            server_region: OptCString::new(context.server_region.as_deref()),
            server_node_id: OptCString::new(context.server_node_id.as_deref()),
            url: OptCString::new(context.url.as_deref()),
            token: OptCString::new(context.token.as_deref()),
        }
    }
}

/// A C string that is null when the value is absent or has an interior NUL.
struct OptCString(Option<CString>);

impl OptCString {
    fn new(value: Option<&str>) -> Self {
        Self(value.and_then(|v| CString::new(v).ok()))
    }

    fn as_ptr(&self) -> *const c_char {
        self.0.as_ref().map_or(ptr::null(), |s| s.as_ptr())
    }
}

/// Opaque noise filter handle.
#[derive(Debug)]
pub struct SdnNoiseFilter {
    pub(crate) filter: NoiseFilter<VTableEngine>,
}

/// Maps a raw C connection state, treating unknown values as disconnected.
pub(crate) fn connection_state_from_raw(raw: i32) -> ConnectionState {
    u8::try_from(raw).map_or(ConnectionState::Disconnected, ConnectionState::from_raw)
}

/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
pub(crate) unsafe fn opt_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    // Safety: non-null and NUL-terminated per the caller.
    let s = unsafe { CStr::from_ptr(ptr) };
    Some(s.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_connection_states() {
        assert_eq!(connection_state_from_raw(0), ConnectionState::Disconnected);
        assert_eq!(connection_state_from_raw(1), ConnectionState::Connecting);
        assert_eq!(connection_state_from_raw(2), ConnectionState::Reconnecting);
        assert_eq!(connection_state_from_raw(3), ConnectionState::Connected);
        assert_eq!(connection_state_from_raw(4), ConnectionState::Disconnected);
        assert_eq!(connection_state_from_raw(-1), ConnectionState::Disconnected);
        assert_eq!(connection_state_from_raw(259), ConnectionState::Disconnected);
    }

    #[test]
    fn c_enum_matches_rust_states() {
        for state in [
            SdnConnectionState::Disconnected,
            SdnConnectionState::Connecting,
            SdnConnectionState::Reconnecting,
            SdnConnectionState::Connected,
        ] {
            assert_eq!(
                connection_state_from_raw(state as i32).as_raw(),
                state as u8
            );
        }
    }

    #[test]
    fn session_strings_are_copied() {
        let sid = c"RM_ffi";
        let session = SdnSession {
            sid: sid.as_ptr(),
            name: ptr::null(),
            server_version: ptr::null(),
            server_region: c"eu-west".as_ptr(),
            server_node_id: ptr::null(),
            url: ptr::null(),
            token: ptr::null(),
        };
        let session = unsafe { session.to_rust() };
        assert_eq!(session.sid.as_deref(), Some("RM_ffi"));
        assert_eq!(session.server_region.as_deref(), Some("eu-west"));
        assert_eq!(session.name, None);
    }

    #[test]
    fn interior_nul_becomes_null() {
        assert!(OptCString::new(Some("a\0b")).as_ptr().is_null());
        assert!(OptCString::new(None).as_ptr().is_null());
        assert!(!OptCString::new(Some("ok")).as_ptr().is_null());
    }

    #[test]
    fn layout_errors_map_to_bad_buffer_layout() {
        assert_eq!(SdnError::from(Error::ZeroChannels), SdnError::BadBufferLayout);
        assert_eq!(
            SdnError::from(Error::DataLengthMismatch {
                len: 3,
                num_channels: 2
            }),
            SdnError::BadBufferLayout
        );
    }
}

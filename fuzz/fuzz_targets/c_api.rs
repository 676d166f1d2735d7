#![no_main]

use std::ffi::c_void;
use std::ptr;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sourdine_ffi::functions::*;
use sourdine_ffi::types::*;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    global_init_ok: bool,
    operations: Vec<FuzzOp>,
    samples: Vec<f32>,
}

#[derive(Debug, Arbitrary)]
enum FuzzOp {
    Initialize { rate: u32, channels: u8 },
    Process { len: u16, channels: u8, bands: u8 },
    SetEnabled(bool),
    FailedChannels { capacity: u8 },
    ConnectionStateChanged { new: i32, old: i32 },
    Release,
}

unsafe extern "C" fn global_init(user_data: *mut c_void) -> bool {
    !user_data.is_null()
}

unsafe extern "C" fn process(
    _user_data: *mut c_void,
    _num_bands: usize,
    _num_frames: usize,
    _num_frames_per_band: usize,
    buffer: *mut f32,
    buffer_len: usize,
) -> bool {
    let samples = unsafe { std::slice::from_raw_parts_mut(buffer, buffer_len) };
    let ok = samples.first().is_some_and(|s| s.is_finite());
    for s in samples {
        *s *= 0.5;
    }
    ok
}

fuzz_target!(|input: FuzzInput| {
    // `global_init` reports failure for a null `user_data`.
    let mut marker = 0u8;
    let vtable = SdnEngineVTable {
        user_data: if input.global_init_ok {
            ptr::from_mut(&mut marker).cast()
        } else {
            ptr::null_mut()
        },
        global_init: Some(global_init),
        initialize: None,
        reset: None,
        process: Some(process),
        update: None,
        destroy: None,
    };

    let filter = unsafe { sdn_filter_create(&vtable) };
    assert!(!filter.is_null());
    assert_eq!(
        unsafe { sdn_filter_failed_to_initialize(filter) },
        !input.global_init_ok
    );

    let mut samples = input.samples;
    let session = SdnSession {
        sid: c"RM_fuzz".as_ptr(),
        name: ptr::null(),
        server_version: ptr::null(),
        server_region: ptr::null(),
        server_node_id: ptr::null(),
        url: ptr::null(),
        token: ptr::null(),
    };

    for op in &input.operations {
        match *op {
            FuzzOp::Initialize { rate, channels } => {
                let err = unsafe { sdn_filter_initialize(filter, rate, usize::from(channels)) };
                assert_eq!(err, SdnError::None);
            }
            FuzzOp::Process {
                len,
                channels,
                bands,
            } => {
                let len = usize::from(len).min(samples.len());
                let err = unsafe {
                    sdn_filter_process(
                        filter,
                        samples.as_mut_ptr(),
                        len,
                        usize::from(channels),
                        usize::from(bands),
                    )
                };
                assert!(matches!(err, SdnError::None | SdnError::BadBufferLayout));
            }
            FuzzOp::SetEnabled(enabled) => {
                let _ = unsafe { sdn_filter_set_enabled(filter, enabled) };
            }
            FuzzOp::FailedChannels { capacity } => {
                let mut out = vec![usize::MAX; usize::from(capacity)];
                let total =
                    unsafe { sdn_filter_failed_channels(filter, out.as_mut_ptr(), out.len()) };
                let written = total.min(out.len());
                assert!(out[..written].windows(2).all(|w| w[0] < w[1]));
            }
            FuzzOp::ConnectionStateChanged { new, old } => {
                let err =
                    unsafe { sdn_filter_connection_state_changed(filter, &session, new, old) };
                assert_eq!(err, SdnError::None);
            }
            FuzzOp::Release => {
                let _ = unsafe { sdn_filter_release(filter) };
            }
        }
    }

    unsafe { sdn_filter_destroy(filter) };
});

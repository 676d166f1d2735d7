//! Panic guard macros for FFI boundary safety.
//!
//! Every `extern "C"` function must catch panics: unwinding across the C
//! boundary is undefined behaviour.

/// Wrap an FFI function body that returns [`SdnError`](crate::types::SdnError).
///
/// On panic the macro returns `SdnError::Internal`.
///
/// ```ignore
/// extern "C" fn sdn_do_thing(filter: *const SdnNoiseFilter) -> SdnError {
///     ffi_guard! {
///         // ... body ...
///         SdnError::None
///     }
/// }
/// ```
macro_rules! ffi_guard {
    ($($body:tt)*) => {
        $crate::panic_guard::ffi_guard_or!($crate::types::SdnError::Internal; $($body)*)
    };
}

/// Wrap an FFI function body that returns a pointer.
///
/// On panic the macro returns a null pointer.
macro_rules! ffi_guard_ptr {
    ($($body:tt)*) => {
        $crate::panic_guard::ffi_guard_or!(::std::ptr::null_mut(); $($body)*)
    };
}

/// Wrap an FFI function body, returning `$fallback` on panic.
///
/// Used by queries that have a neutral answer instead of an error code.
macro_rules! ffi_guard_or {
    ($fallback:expr; $($body:tt)*) => {{
        use std::panic;
        use std::panic::AssertUnwindSafe;

        match panic::catch_unwind(AssertUnwindSafe(move || { $($body)* })) {
            Ok(result) => result,
            Err(_) => {
                tracing::error!("panic caught at the C API boundary");
                $fallback
            }
        }
    }};
}

pub(crate) use ffi_guard;
pub(crate) use ffi_guard_or;
pub(crate) use ffi_guard_ptr;

#[cfg(test)]
mod tests {
    use crate::types::SdnError;

    #[test]
    fn ffi_guard_returns_value_on_success() {
        let result: SdnError = ffi_guard! { SdnError::BadBufferLayout };
        assert_eq!(result, SdnError::BadBufferLayout);
    }

    #[test]
    fn ffi_guard_returns_internal_on_panic() {
        let result: SdnError = ffi_guard! {
            panic!("test panic");
        };
        assert_eq!(result, SdnError::Internal);
    }

    #[test]
    fn ffi_guard_ptr_returns_null_on_panic() {
        let ptr: *mut i32 = ffi_guard_ptr! {
            panic!("test panic");
        };
        assert!(ptr.is_null());
    }

    #[test]
    fn ffi_guard_or_returns_fallback_on_panic() {
        let count: usize = ffi_guard_or! { 0; panic!("test panic") };
        assert_eq!(count, 0);
        let count: usize = ffi_guard_or! { 0; 5 };
        assert_eq!(count, 5);
    }

    #[test]
    fn ffi_guard_or_swallows_panic_in_unit_body() {
        let ran = ffi_guard_or! { false;
            ffi_guard_or! { (); panic!("test panic") };
            true
        };
        assert!(ran);
    }
}

//! Checked native calls
//!
//! libcrypto signals failure in several ways: 1 for success, a positive or
//! non-negative count, or a non-null pointer. Each call site picks one of the
//! policy types below, and [`call_checked`] turns a failing return value into
//! a [`NativeError`] drained from the error queue right after the call.
//!
//! Policies are types rather than values so that applying a pointer policy
//! to an integer return (or the reverse) does not compile.

use std::ptr::NonNull;

use crate::error::{NativeError, NativeResult};
use crate::native::NativeLib;

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::IsOne {}
    impl Sealed for super::IsPositive {}
    impl Sealed for super::IsNonNegative {}
    impl Sealed for super::IsNonNull {}
}

/// Decides whether a native return value of type `Rv` means success
pub trait ReturnCheck<Rv>: sealed::Sealed {
    fn return_value_is_ok(rv: &Rv) -> bool;
}

/// Success is exactly 1; 0 and everything else is failure
pub enum IsOne {}

/// Success is strictly greater than zero
pub enum IsPositive {}

/// Success is zero or greater
pub enum IsNonNegative {}

/// Success is any non-null pointer
pub enum IsNonNull {}

macro_rules! integer_return_checks {
    ($($ty:ty),+) => {
        $(
            impl ReturnCheck<$ty> for IsOne {
                fn return_value_is_ok(rv: &$ty) -> bool {
                    *rv == 1
                }
            }

            impl ReturnCheck<$ty> for IsPositive {
                fn return_value_is_ok(rv: &$ty) -> bool {
                    *rv > 0
                }
            }

            impl ReturnCheck<$ty> for IsNonNegative {
                fn return_value_is_ok(rv: &$ty) -> bool {
                    *rv >= 0
                }
            }
        )+
    };
}

// `c_long` is `i32` or `i64` depending on the platform
integer_return_checks!(i32, i64);

impl<T> ReturnCheck<*mut T> for IsNonNull {
    fn return_value_is_ok(rv: &*mut T) -> bool {
        !rv.is_null()
    }
}

impl<T> ReturnCheck<*const T> for IsNonNull {
    fn return_value_is_ok(rv: &*const T) -> bool {
        !rv.is_null()
    }
}

/// Invoke a native function and check its return value against policy `P`
///
/// On success the return value is passed through unchanged. On failure the
/// most recent error queue entry becomes a [`NativeError`] and the queue is
/// cleared; the call is
/// never retried and nothing is logged.
///
/// ```ignore
/// call_checked::<IsOne, _>(lib, || unsafe { lib.engine_init(engine) })?;
/// ```
pub fn call_checked<P, Rv>(lib: &dyn NativeLib, call: impl FnOnce() -> Rv) -> NativeResult<Rv>
where
    P: ReturnCheck<Rv>,
{
    let rv = call();
    if P::return_value_is_ok(&rv) {
        Ok(rv)
    } else {
        Err(NativeError::from_error_queue(lib))
    }
}

/// [`call_checked`] with [`IsNonNull`], returning the pointer as `NonNull`
pub fn call_checked_ptr<T>(
    lib: &dyn NativeLib,
    call: impl FnOnce() -> *mut T,
) -> NativeResult<NonNull<T>> {
    match NonNull::new(call()) {
        Some(ptr) => Ok(ptr),
        None => Err(NativeError::from_error_queue(lib)),
    }
}

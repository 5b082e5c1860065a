// SPDX-License-Identifier: Apache-2.0

//! C interface
//!
//! Exposes [`rdrand16`] for C callers:
//!
//! ```c
//! int rdrand16(uint16_t *x, int retry);
//! ```

use crate::{get_random_u16, Error, Result};

use libc::c_int;

/// Numeric status codes returned across the C interface.
#[repr(i32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    /// A value was written to the output pointer.
    Success = DRNG_SUCCESS,
    /// No value was produced; the output pointer was not written.
    NotReady = DRNG_NOT_READY,
}

/// Status code for [`Status::Success`].
pub const DRNG_SUCCESS: c_int = 1;

/// Status code for [`Status::NotReady`].
pub const DRNG_NOT_READY: c_int = -1;

impl<T> From<&Result<T>> for Status {
    #[inline]
    fn from(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Status::Success,
            Err(Error::NotReady) => Status::NotReady,
        }
    }
}

impl From<Status> for c_int {
    #[inline]
    fn from(status: Status) -> Self {
        status as c_int
    }
}

/// Reads one 16-bit value from the CPU generator into `*x`.
///
/// A non-zero `retry` allows up to [`RETRY_LIMIT`](crate::RETRY_LIMIT)
/// attempts. Returns [`DRNG_SUCCESS`] after writing `*x`, or
/// [`DRNG_NOT_READY`] without touching `*x`. A null `x` is reported as
/// [`DRNG_NOT_READY`] and the generator is not consulted.
///
/// # Safety
///
/// `x` must be null or valid for a write of one aligned `u16`.
#[no_mangle]
pub unsafe extern "C" fn rdrand16(x: *mut u16, retry: c_int) -> c_int {
    if x.is_null() {
        return Status::NotReady.into();
    }

    let result = get_random_u16(retry != 0);
    if let Ok(value) = result {
        x.write(value);
    }

    Status::from(&result).into()
}

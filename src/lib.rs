// SPDX-License-Identifier: Apache-2.0

//! Bounded-retry access to the `RDRAND` hardware random number generator
//!
//! `drng` reads 16-bit random values straight from the CPU. A single `RDRAND`
//! may decline to produce a value when the on-chip generator is momentarily
//! drained; the caller chooses whether that is reported at once or retried up
//! to [`RETRY_LIMIT`] times.
//!
//! ```rust
//! match drng::get_random_u16(true) {
//!     Ok(value) => println!("rdrand: {value:#06x}"),
//!     Err(drng::Error::NotReady) => println!("fall back to another source"),
//! }
//! ```
//!
//! # Platforms
//!
//! On `x86` and `x86_64` the instruction is used when the CPU advertises it.
//! Everywhere else, including all Apple targets, every call reports
//! [`Error::NotReady`]. The choice is made at compile time.
//!
//! # Fallback
//!
//! [`Error::NotReady`] is advisory. Nothing in this crate pools entropy or
//! backs off; callers that need a value regardless must supply their own
//! fallback.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(clippy::all)]
#![deny(missing_docs)]

#[cfg(feature = "ffi")]
pub mod ffi;
mod rdrand;

pub use rdrand::{is_supported, Absent, Rdrand};

use core::fmt;
use core::mem::size_of;

use log::debug;

/// Maximum number of attempts made when retrying is requested.
pub const RETRY_LIMIT: usize = 10;

/// Error type used within this crate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Error {
    /// The generator did not produce a value within the permitted attempts,
    /// or the instruction is not available on this platform.
    NotReady,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotReady => f.write_str("hardware random number generator not ready"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type returned by functionality exposed by this crate.
pub type Result<T> = core::result::Result<T, Error>;

/// A source of single hardware random attempts.
///
/// One call to [`Drng::step`] is one attempt: `Some(value)` when the
/// generator signalled success, `None` when it was not ready. Retry policy is
/// never implemented here; see [`get_random_u16_from`].
pub trait Drng {
    /// Performs exactly one attempt.
    fn step(&mut self) -> Option<u16>;
}

/// Reads one 16-bit value from the CPU generator.
///
/// With `retry` unset exactly one attempt is made. With `retry` set up to
/// [`RETRY_LIMIT`] attempts are made back to back and the first value produced
/// is returned. The value is returned exactly as the instruction produced it.
#[inline]
pub fn get_random_u16(retry: bool) -> Result<u16> {
    get_random_u16_from(&mut Rdrand, retry)
}

/// Applies the [`get_random_u16`] retry policy to an arbitrary generator.
pub fn get_random_u16_from<D: Drng + ?Sized>(drng: &mut D, retry: bool) -> Result<u16> {
    let attempts = if retry { RETRY_LIMIT } else { 1 };

    match (0..attempts).find_map(|_| drng.step()) {
        Some(value) => Ok(value),
        None => {
            debug!("rdrand not ready after {} attempt(s)", attempts);
            Err(Error::NotReady)
        }
    }
}

/// Fills `dest` with bytes from the CPU generator.
///
/// See [`fill_bytes_from`].
#[inline]
pub fn fill_bytes(dest: &mut [u8], retry: bool) -> Result<()> {
    fill_bytes_from(&mut Rdrand, dest, retry)
}

/// Fills `dest` with bytes drawn from `drng`, two at a time.
///
/// Each two-byte chunk receives the native-endian bytes of one value obtained
/// with the [`get_random_u16`] policy; an odd trailing byte takes the first of
/// them. On error the chunks already written keep their contents and the rest
/// of `dest` is left untouched.
pub fn fill_bytes_from<D: Drng + ?Sized>(
    drng: &mut D,
    dest: &mut [u8],
    retry: bool,
) -> Result<()> {
    for chunk in dest.chunks_mut(size_of::<u16>()) {
        let value = get_random_u16_from(drng, retry)?;
        chunk.copy_from_slice(&value.to_ne_bytes()[..chunk.len()]);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays a fixed sequence of attempts, then keeps failing.
    struct Script<'a> {
        attempts: &'a [Option<u16>],
        calls: usize,
    }

    impl<'a> Script<'a> {
        fn new(attempts: &'a [Option<u16>]) -> Self {
            Self { attempts, calls: 0 }
        }
    }

    impl Drng for Script<'_> {
        fn step(&mut self) -> Option<u16> {
            let attempt = self.attempts.get(self.calls).copied().flatten();
            self.calls += 1;
            attempt
        }
    }

    #[test]
    fn single_attempt_without_retry() {
        let mut drng = Script::new(&[None, Some(7)]);
        assert_eq!(get_random_u16_from(&mut drng, false), Err(Error::NotReady));
        assert_eq!(drng.calls, 1);
    }

    #[test]
    fn retry_stops_at_limit() {
        let mut drng = Script::new(&[]);
        assert_eq!(get_random_u16_from(&mut drng, true), Err(Error::NotReady));
        assert_eq!(drng.calls, RETRY_LIMIT);
    }

    #[test]
    fn success_on_last_attempt() {
        let mut attempts = [None; RETRY_LIMIT];
        attempts[RETRY_LIMIT - 1] = Some(0xbeef);

        let mut drng = Script::new(&attempts);
        assert_eq!(get_random_u16_from(&mut drng, true), Ok(0xbeef));
        assert_eq!(drng.calls, RETRY_LIMIT);
    }

    #[test]
    fn value_is_not_transformed() {
        for value in [0x0000, 0x0001, 0x8000, 0xffff, 0xa55a] {
            let attempts = [Some(value)];
            let mut drng = Script::new(&attempts);
            assert_eq!(get_random_u16_from(&mut drng, false), Ok(value));
            assert_eq!(drng.calls, 1);
        }
    }

    #[test]
    fn fill_odd_length() {
        let a = 0x1234u16.to_ne_bytes();
        let b = 0xabcdu16.to_ne_bytes();

        let mut drng = Script::new(&[Some(0x1234), Some(0xabcd)]);
        let mut buf = [0u8; 3];
        assert_eq!(fill_bytes_from(&mut drng, &mut buf, false), Ok(()));
        assert_eq!(buf, [a[0], a[1], b[0]]);
        assert_eq!(drng.calls, 2);
    }

    #[test]
    fn fill_empty() {
        let mut drng = Script::new(&[]);
        assert_eq!(fill_bytes_from(&mut drng, &mut [], true), Ok(()));
        assert_eq!(drng.calls, 0);
    }

    #[test]
    fn fill_stops_on_error() {
        let a = 0x0102u16.to_ne_bytes();

        let mut drng = Script::new(&[Some(0x0102), None, Some(0x0304)]);
        let mut buf = [0xffu8; 6];
        assert_eq!(fill_bytes_from(&mut drng, &mut buf, false), Err(Error::NotReady));
        assert_eq!(buf, [a[0], a[1], 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(drng.calls, 2);
    }

    #[test]
    fn display() {
        assert_eq!(
            Error::NotReady.to_string(),
            "hardware random number generator not ready"
        );
    }
}

// SPDX-License-Identifier: Apache-2.0

//! The `RDRAND` step primitive

use crate::Drng;

/// The CPU `RDRAND` generator.
///
/// Each [`Drng::step`] executes the instruction once. On platforms without the
/// instruction every step fails.
#[derive(Copy, Clone, Debug, Default)]
pub struct Rdrand;

impl Drng for Rdrand {
    #[inline]
    fn step(&mut self) -> Option<u16> {
        step()
    }
}

/// A generator that never produces a value, as on a platform without `RDRAND`.
#[derive(Copy, Clone, Debug, Default)]
pub struct Absent;

impl Drng for Absent {
    #[inline]
    fn step(&mut self) -> Option<u16> {
        None
    }
}

cfg_if::cfg_if! {
    if #[cfg(all(
        any(target_arch = "x86", target_arch = "x86_64"),
        not(target_vendor = "apple"),
    ))] {
        #[cfg(target_arch = "x86")]
        use core::arch::x86::{__cpuid, _rdrand16_step, CpuidResult};
        #[cfg(target_arch = "x86_64")]
        use core::arch::x86_64::{__cpuid, _rdrand16_step, CpuidResult};

        use log::trace;
        use spin::Lazy;

        /// Returns the result of the `cpuid` instruction for a given `leaf` (`EAX`).
        // `__cpuid` is an unsafe fn on older toolchains.
        #[inline]
        #[allow(unused_unsafe)]
        fn cpuid(leaf: u32) -> CpuidResult {
            unsafe { __cpuid(leaf) }
        }

        /// Flag, if the CPU supports RDRAND
        static CPU_HAS_RDRAND: Lazy<bool> = Lazy::new(|| {
            let has = cpuid(1).ecx & (1 << 30) != 0;
            trace!("cpuid: rdrand {}", if has { "present" } else { "absent" });
            has
        });

        /// Whether [`Rdrand`] can produce values on this machine.
        #[inline]
        pub fn is_supported() -> bool {
            cfg!(target_feature = "rdrand") || *CPU_HAS_RDRAND
        }

        #[inline]
        fn step() -> Option<u16> {
            if !is_supported() {
                return None;
            }

            let mut val = 0;
            // SAFETY: the CPU advertises RDRAND; the intrinsic only writes `val`.
            (unsafe { _rdrand16_step(&mut val) } == 1).then_some(val)
        }
    } else {
        /// Whether [`Rdrand`] can produce values on this machine.
        #[inline]
        pub fn is_supported() -> bool {
            false
        }

        #[inline]
        fn step() -> Option<u16> {
            Absent.step()
        }
    }
}

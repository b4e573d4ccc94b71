//! Compile-time unit safety for telemetry quantities.
//!
//! The curtailment formulas mix average power over an interval (MW), interval
//! durations (hours) and accumulated energy (MWh). Using raw `f64` values
//! throughout makes it easy to sum a power into an energy column or to forget
//! the duration factor entirely. These newtypes catch that at compile time.
//!
//! All types use `#[repr(transparent)]` so they have the same memory layout
//! as `f64`; the wrapper cost is optimized away.
//!
//! ```
//! use curtail_core::units::{Hours, Megawatts};
//!
//! let curtailed = Megawatts(12.0);
//! let energy = curtailed * Hours(0.5);
//! assert_eq!(energy.value(), 6.0);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Macro to implement common arithmetic operations for unit types
macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Neg for $type {
            type Output = Self;
            fn neg(self) -> Self::Output {
                Self(-self.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<$type> for $type {
            type Output = f64;
            fn div(self, rhs: $type) -> Self::Output {
                self.0 / rhs.0
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.4} {}", self.0, $unit_name)
            }
        }

        impl $type {
            /// Create a new value
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            /// Get the raw numeric value
            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            /// Check if value is finite
            #[inline]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }

            /// Minimum of two values
            #[inline]
            pub fn min(self, other: Self) -> Self {
                Self(self.0.min(other.0))
            }

            /// Maximum of two values
            #[inline]
            pub fn max(self, other: Self) -> Self {
                Self(self.0.max(other.0))
            }
        }

        impl std::iter::Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }

        impl<'a> std::iter::Sum<&'a $type> for $type {
            fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }
    };
}

/// Average active power over an interval, in megawatts (MW).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Megawatts(pub f64);

impl_unit_ops!(Megawatts, "MW");

/// Accumulated energy, in megawatt-hours (MWh).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct MegawattHours(pub f64);

impl_unit_ops!(MegawattHours, "MWh");

/// Interval duration, in hours.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Hours(pub f64);

impl_unit_ops!(Hours, "h");

// Power over a duration yields energy.
impl Mul<Hours> for Megawatts {
    type Output = MegawattHours;
    #[inline]
    fn mul(self, rhs: Hours) -> MegawattHours {
        MegawattHours(self.0 * rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_times_duration_is_energy() {
        let energy = Megawatts(10.0) * Hours(0.5);
        assert_eq!(energy, MegawattHours(5.0));
    }

    #[test]
    fn clamping_via_max() {
        let deficit = Megawatts(-3.0).max(Megawatts(0.0));
        assert_eq!(deficit.value(), 0.0);
    }

    #[test]
    fn energies_sum() {
        let total: MegawattHours = [MegawattHours(1.0), MegawattHours(2.5)].iter().sum();
        assert_eq!(total.value(), 3.5);
    }

    #[test]
    fn ratio_of_like_units_is_dimensionless() {
        let ratio = MegawattHours(2.0) / MegawattHours(8.0);
        assert_eq!(ratio, 0.25);
    }
}

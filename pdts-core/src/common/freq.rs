use std::{
    ops::{Div, Mul},
    time::Duration,
};

/// \[Hz\]
pub struct Hz;

/// \[kHz\]
#[allow(non_camel_case_types)]
pub struct kHz;

/// \[MHz\]
pub struct MHz;

/// A frequency, constructed by multiplying a number with a unit, e.g. `62.5 * MHz`.
#[derive(Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Freq<T: Copy> {
    pub(crate) freq: T,
}

impl<T: Copy + std::fmt::Display> std::fmt::Debug for Freq<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} Hz", self.freq)
    }
}

impl<T: Copy> Freq<T> {
    /// Returns the frequency in Hz.
    #[inline]
    pub const fn hz(&self) -> T {
        self.freq
    }
}

impl Freq<f64> {
    /// The interval between two consecutive events at this rate.
    ///
    /// `None` if the frequency is not positive and finite.
    #[must_use]
    pub fn period(&self) -> Option<Duration> {
        if !self.freq.is_finite() || self.freq <= 0. {
            return None;
        }
        Duration::try_from_secs_f64(self.freq.recip()).ok()
    }
}

macro_rules! impl_unit {
    ($unit:ident, $scale:expr) => {
        impl Mul<$unit> for f64 {
            type Output = Freq<f64>;

            fn mul(self, _rhs: $unit) -> Self::Output {
                Freq {
                    freq: self * $scale,
                }
            }
        }
    };
}

impl_unit!(Hz, 1.);
impl_unit!(kHz, 1e3);
impl_unit!(MHz, 1e6);

impl Mul<f64> for Freq<f64> {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            freq: self.freq * rhs,
        }
    }
}

impl Div<f64> for Freq<f64> {
    type Output = Self;

    fn div(self, rhs: f64) -> Self::Output {
        Self {
            freq: self.freq / rhs,
        }
    }
}

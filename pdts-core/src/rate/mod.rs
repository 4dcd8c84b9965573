mod error;

use crate::common::{Freq, Hz, RATE_BASE_DIVIDE, RATE_DIVISOR_MAX, RATE_PRESCALE_MAX};

pub use error::RateError;

/// Integer divider parameters that synthesize a periodic command rate from the master clock.
///
/// The synthesized rate is `clock / (256 * prescale * 2^divisor)`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RateSpec {
    requested: Freq<f64>,
    divisor: u8,
    prescale: u16,
    actual: Freq<f64>,
}

impl RateSpec {
    /// Computes the divisor and prescale that best approximate `requested` from `clock`.
    ///
    /// The divisor is chosen as the smallest power of two that keeps the prescale within
    /// `[1, 256]`, saturating at 15.
    pub fn compute(requested: Freq<f64>, clock: Freq<f64>) -> Result<Self, RateError> {
        let req = requested.hz();
        let clk = clock.hz();
        if !req.is_finite() || req <= 0. || !clk.is_finite() || clk <= 0. {
            return Err(RateError::RateOutOfRange(requested, 0));
        }

        let base = RATE_BASE_DIVIDE as f64;
        let divisor = (clk / (req * base * base))
            .log2()
            .ceil()
            .clamp(0., RATE_DIVISOR_MAX as f64) as u8;
        let prescale = (clk / (req * base * (1u32 << divisor) as f64)).round();
        if prescale < 1. || prescale > RATE_PRESCALE_MAX as f64 {
            tracing::debug!(
                "rate {:?} from {:?}: divisor = {}, prescale = {}",
                requested,
                clock,
                divisor,
                prescale
            );
            return Err(RateError::RateOutOfRange(requested, prescale as u64));
        }
        let prescale = prescale as u16;
        let actual = clk / (base * prescale as f64 * (1u32 << divisor) as f64) * Hz;

        Ok(Self {
            requested,
            divisor,
            prescale,
            actual,
        })
    }

    /// The rate that was asked for.
    #[must_use]
    pub const fn requested(&self) -> Freq<f64> {
        self.requested
    }

    /// The power-of-two divisor in `[0, 15]`.
    #[must_use]
    pub const fn divisor(&self) -> u8 {
        self.divisor
    }

    /// The prescale in `[1, 256]`.
    #[must_use]
    pub const fn prescale(&self) -> u16 {
        self.prescale
    }

    /// The rate the hardware will actually produce.
    #[must_use]
    pub const fn actual(&self) -> Freq<f64> {
        self.actual
    }
}

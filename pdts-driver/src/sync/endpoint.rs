use derive_more::{Display, From, Into};

use crate::error::TimingError;

/// Identifier of a remote endpoint on the shared command bus.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[display("endpoint {_0}")]
pub struct EndpointAddress(u16);

impl EndpointAddress {
    /// Creates a new [`EndpointAddress`].
    #[must_use]
    pub const fn new(addr: u16) -> Self {
        Self(addr)
    }

    /// Returns the raw address.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Transmit-path delay correction of one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DelayTriplet {
    coarse: u8,
    fine: u8,
    phase: u8,
}

impl DelayTriplet {
    /// The maximum coarse delay (4-bit field).
    pub const COARSE_MAX: u8 = 0xF;
    /// The maximum fine delay (5-bit field).
    pub const FINE_MAX: u8 = 0x1F;
    /// The maximum phase delay (4-bit field).
    pub const PHASE_MAX: u8 = 0xF;

    /// Creates a new [`DelayTriplet`].
    ///
    /// # Errors
    ///
    /// Returns [`TimingError::DelayOutOfRange`] if any value does not fit its field.
    pub fn new(coarse: u8, fine: u8, phase: u8) -> Result<Self, TimingError> {
        let delays = Self {
            coarse,
            fine,
            phase,
        };
        delays.validate()?;
        Ok(delays)
    }

    /// Checks that every value fits its field.
    pub fn validate(&self) -> Result<(), TimingError> {
        [
            ("coarse", self.coarse, Self::COARSE_MAX),
            ("fine", self.fine, Self::FINE_MAX),
            ("phase", self.phase, Self::PHASE_MAX),
        ]
        .into_iter()
        .try_for_each(|(field, value, max)| {
            if value > max {
                Err(TimingError::DelayOutOfRange {
                    field,
                    value: value as u32,
                    max: max as u32,
                })
            } else {
                Ok(())
            }
        })
    }

    /// Coarse delay.
    #[must_use]
    pub const fn coarse(&self) -> u8 {
        self.coarse
    }

    /// Fine delay.
    #[must_use]
    pub const fn fine(&self) -> u8 {
        self.fine
    }

    /// Phase delay.
    #[must_use]
    pub const fn phase(&self) -> u8 {
        self.phase
    }
}

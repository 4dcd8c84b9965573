use std::{num::NonZeroUsize, time::Duration};

use pdts_core::common::{Freq, CLOCK_FREQ, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT};

use crate::sync::BoardVariant;

/// Options of a master session.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionOption {
    /// Interval between two polls of a status register. The default is 100ms.
    pub poll_interval: Duration,
    /// Timeout of the lock and echo waits during calibration. The default is 5s.
    pub default_timeout: Duration,
    /// Timeout of the lock wait while scanning routes. The default is 1s.
    pub route_lock_timeout: Duration,
    /// The board in use. The default is [`BoardVariant::FANOUT`].
    pub board: BoardVariant,
    /// The number of partitions. The default is 4.
    pub num_partitions: u8,
    /// The master reference clock. The default is 62.5 MHz.
    pub clock_frequency: Freq<f64>,
    /// The number of attempts to read the firmware version on open. The default is 3.
    pub open_retries: NonZeroUsize,
}

impl Default for SessionOption {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            default_timeout: DEFAULT_TIMEOUT,
            route_lock_timeout: Duration::from_secs(1),
            board: BoardVariant::FANOUT,
            num_partitions: 4,
            clock_frequency: CLOCK_FREQ,
            open_retries: NonZeroUsize::MIN.saturating_add(2),
        }
    }
}

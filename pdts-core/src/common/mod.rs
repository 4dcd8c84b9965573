mod freq;

use std::time::Duration;

pub use freq::*;

/// The default timeout of lock, echo and run-request polling.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// The default interval between two polls of a status register.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The frequency of the master reference clock.
pub const CLOCK_FREQ: Freq<f64> = Freq { freq: 62.5e6 };

/// The number of clock ticks per command-stream symbol group.
pub const RATE_BASE_DIVIDE: u32 = 256;
/// The maximum value of the rate prescaler.
pub const RATE_PRESCALE_MAX: u32 = 256;
/// The maximum value of the rate divisor (power-of-two exponent).
pub const RATE_DIVISOR_MAX: u8 = 15;

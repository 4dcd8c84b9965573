use std::{
    ops::ControlFlow,
    time::{Duration, Instant},
};

use pdts_core::sleep::Sleep;

use crate::error::TimingError;

/// Calls `probe` every `interval` until it breaks or more than `timeout` has elapsed.
///
/// The first probe runs before any sleep. On expiry, the last continue value is returned.
pub(crate) fn poll_until<S: Sleep + ?Sized, B, C>(
    sleeper: &S,
    interval: Duration,
    timeout: Duration,
    mut probe: impl FnMut() -> Result<ControlFlow<B, C>, TimingError>,
) -> Result<ControlFlow<B, C>, TimingError> {
    let start = Instant::now();
    loop {
        let last = match probe()? {
            ControlFlow::Break(b) => return Ok(ControlFlow::Break(b)),
            ControlFlow::Continue(c) => c,
        };
        if start.elapsed() > timeout {
            return Ok(ControlFlow::Continue(last));
        }
        sleeper.sleep(interval);
    }
}

use std::time::Duration;

pub use spin_sleep::{SpinSleeper, SpinStrategy};

/// A trait for sleep operations between two polls.
pub trait Sleep: std::fmt::Debug {
    /// Sleep for the specified duration.
    fn sleep(&self, duration: Duration);
}

// GRCOV_EXCL_START
impl Sleep for Box<dyn Sleep> {
    fn sleep(&self, duration: Duration) {
        self.as_ref().sleep(duration);
    }
}

impl<S: Sleep> Sleep for &S {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}
// GRCOV_EXCL_STOP

/// A sleeper that uses [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StdSleeper;

impl Sleep for StdSleeper {
    fn sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        std::thread::sleep(duration);
    }
}

impl Sleep for SpinSleeper {
    fn sleep(&self, duration: Duration) {
        SpinSleeper::sleep(*self, duration);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[rstest::rstest]
    #[case(StdSleeper)]
    #[case(SpinSleeper::default())]
    #[test]
    fn sleep(#[case] sleeper: impl Sleep) {
        {
            let start = Instant::now();
            sleeper.sleep(Duration::from_millis(10));
            assert!(Duration::from_millis(10) <= start.elapsed());
        }
        {
            let start = Instant::now();
            sleeper.sleep(Duration::ZERO);
            assert!(Duration::ZERO <= start.elapsed());
        }
    }

    #[test]
    fn box_sleeper() {
        let sleeper: Box<dyn Sleep> = Box::new(StdSleeper);
        let start = Instant::now();
        sleeper.sleep(Duration::from_millis(10));
        assert!(Duration::from_millis(10) <= start.elapsed());
    }
}

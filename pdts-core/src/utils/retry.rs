use std::{fmt::Display, num::NonZeroUsize};

/// Calls `f` until it succeeds or `max_attempts` calls have failed.
///
/// The closure receives the zero-based attempt number. Each failed attempt that will be
/// retried is logged as a warning; the final failure is logged as an error and returned.
pub fn retry<T, E: Display>(
    max_attempts: NonZeroUsize,
    mut f: impl FnMut(usize) -> Result<T, E>,
) -> Result<T, E> {
    let mut attempt = 0;
    loop {
        match f(attempt) {
            Ok(v) => return Ok(v),
            Err(e) if attempt + 1 < max_attempts.get() => {
                tracing::warn!(
                    "Attempt {}/{} failed: {}",
                    attempt + 1,
                    max_attempts.get(),
                    e
                );
                attempt += 1;
            }
            Err(e) => {
                tracing::error!("Giving up after {} attempts: {}", max_attempts.get(), e);
                return Err(e);
            }
        }
    }
}

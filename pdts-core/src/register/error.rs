use derive_more::Display;
use derive_new::new;
use thiserror::Error;

#[derive(new, Error, Debug, Display, PartialEq, Clone)]
#[display("{}", msg)]
/// An error produced by the register interface.
pub struct RegisterError {
    #[new(into)]
    msg: String,
}

impl RegisterError {
    /// An error returned when the interface is used after it has been closed.
    #[must_use]
    pub fn closed() -> Self {
        Self::new("Register interface is closed")
    }

    /// An error returned when a path does not name a known register.
    #[must_use]
    pub fn unknown_path(path: &str) -> Self {
        Self::new(format!("Unknown register path: {path}"))
    }
}

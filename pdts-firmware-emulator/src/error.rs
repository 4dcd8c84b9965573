use thiserror::Error;

/// An error produced by the emulated register map.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum EmulatorError {
    /// The path does not name a register of the running firmware.
    #[error("Unknown register: {0}")]
    UnknownRegister(String),
    /// The register cannot be written.
    #[error("Register {0} is read-only")]
    ReadOnly(String),
    /// The master does not respond.
    #[error("Master does not respond")]
    NoResponse,
}

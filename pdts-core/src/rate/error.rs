use thiserror::Error;

use crate::common::Freq;

#[derive(Error, Debug, PartialEq, Copy, Clone)]
/// An error produced by the command rate synthesizer.
pub enum RateError {
    /// The requested rate is not representable with the available divider resolution.
    #[error("Command rate ({0:?}) is out of range (prescale = {1})")]
    RateOutOfRange(Freq<f64>, u64),
}

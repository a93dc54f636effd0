use embedded_hal::digital::{Error as DigitalError, ErrorKind, OutputPin};
use thiserror::Error;

use crate::types::Level;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("failed to drive {target}: {kind:?}")]
pub struct GpioError {
    pub target: &'static str,
    pub kind: ErrorKind,
}

impl GpioError {
    pub fn from_pin<E: DigitalError>(target: &'static str, err: E) -> Self {
        Self {
            target,
            kind: err.kind(),
        }
    }
}

pub(crate) fn drive<P: OutputPin>(
    pin: &mut P,
    level: Level,
    target: &'static str,
) -> Result<(), GpioError> {
    let result = match level {
        Level::High => pin.set_high(),
        Level::Low => pin.set_low(),
    };
    result.map_err(|err| GpioError::from_pin(target, err))
}

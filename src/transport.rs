//! Interface to the GPIB/VISA link, which is owned and opened by the caller.

use crate::{Error, Result};

/// One blocking request/response channel to an instrument.
///
/// Implementations wrap whatever bus library the application uses; every
/// method is a single round trip and errors are passed through opaquely as
/// [`Error::Transport`].
pub trait Transport {
    /// Send one SCPI command. No response is expected.
    fn write(&mut self, command: &str) -> Result<()>;

    /// Send one SCPI query and return the response with the terminator
    /// stripped.
    fn query(&mut self, command: &str) -> Result<String>;

    /// Send a query answered by an IEEE 488.2 definite-length block and
    /// return the payload with the `#<n><length>` header stripped.
    fn query_binary(&mut self, command: &str) -> Result<Vec<u8>>;

    /// Send a query answered by comma-separated ASCII numbers.
    fn query_ascii(&mut self, command: &str) -> Result<Vec<f64>>;
}

bitflags::bitflags! {
    /// SCPI standard event status register, read with `*ESR?`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EventStatus: u8 {
        const OPERATION_COMPLETE = 1 << 0;
        const QUERY_ERROR        = 1 << 2;
        const DEVICE_ERROR       = 1 << 3;
        const EXECUTION_ERROR    = 1 << 4;
        const COMMAND_ERROR      = 1 << 5;
        const POWER_ON           = 1 << 7;

        const ANY_ERROR = Self::QUERY_ERROR.bits()
                        | Self::DEVICE_ERROR.bits()
                        | Self::EXECUTION_ERROR.bits()
                        | Self::COMMAND_ERROR.bits();
    }
}

impl EventStatus {
    /// Read and clear the event status register. Reading `*ESR?` clears it
    /// on the instrument, so each call reports events since the previous one.
    pub fn read<T: Transport + ?Sized>(link: &mut T) -> Result<EventStatus> {
        let response = link.query("*ESR?")?;
        let bits = response.trim().parse::<u8>()
            .map_err(|_| response_parse_error("*ESR?", &response))?;
        let value = EventStatus::from_bits_retain(bits);
        log::debug!("event status = {:?}", value);
        Ok(value)
    }
}

pub(crate) fn response_parse_error(command: &str, response: &str) -> Error {
    Error::Transport(
        format!("unexpected response to {:?}: {:?}", command, response).into())
}

use hwkey_proto::FramingError;
use std::io;
use thiserror::Error;

/// Errors raised while opening a serial connection or exchanging frames
/// over one.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("i/o error talking to device: {0}")]
    Io(#[from] io::Error),

    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error(transparent)]
    Framing(#[from] FramingError),

    #[error("response header did not match request: expected id {expected_id} endpoint, got id {got_id}")]
    UnexpectedHeader { expected_id: u8, got_id: u8 },

    #[error("response code {got:#04x} did not match expected code {expected:#04x}")]
    UnexpectedCode { expected: u8, got: u8 },

    #[error("device reported an error status for this response")]
    DeviceError,

    #[error("no serial port configured and none could be found")]
    PortNotFound,

    #[error("no serial port configured and more than one candidate is available")]
    PortAmbiguous,
}

//! How a session gets hold of a byte stream to the device. Abstracted
//! so tests can hand a session an in-memory stand-in instead of opening
//! a real serial port.

use hwkey_transport::{FrameIo, TransportError};

pub trait DeviceFactory {
    type Io: FrameIo + Send + 'static;
    fn open(&self, port: &str, baud: u32) -> Result<Self::Io, TransportError>;
}

/// Opens a real serial port.
pub struct SerialDeviceFactory;

impl DeviceFactory for SerialDeviceFactory {
    type Io = Box<dyn serialport::SerialPort>;

    fn open(&self, port: &str, baud: u32) -> Result<Self::Io, TransportError> {
        hwkey_transport::open(port, baud)
    }
}

//! Serial transport and frame-level request/response plumbing for the
//! device protocol.

pub mod connection;
pub mod error;
pub mod io;
pub mod port;
pub mod testing;

pub use connection::{FrameConnection, FRAME_ID};
pub use error::TransportError;
pub use io::FrameIo;
pub use port::{list_ports, resolve_single_port};

use std::time::Duration;

/// Open a serial port by name at the protocol's fixed baud rate.
pub fn open(port_name: &str, baud_rate: u32) -> Result<Box<dyn serialport::SerialPort>, TransportError> {
    serialport::new(port_name, baud_rate)
        .timeout(Duration::from_millis(500))
        .flow_control(serialport::FlowControl::None)
        .open()
        .map_err(TransportError::from)
}

/// The baud rate every known device revision uses.
pub const DEVICE_BAUD_RATE: u32 = 62_500;

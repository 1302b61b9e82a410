//! The minimal capability a [`crate::connection::FrameConnection`] needs
//! from whatever it is talking over: read, write, and the ability to
//! change the read timeout between a short header probe and a long
//! payload read.

use std::io::{Read, Write};
use std::time::Duration;

pub trait FrameIo: Read + Write {
    fn set_timeout(&mut self, timeout: Duration) -> std::io::Result<()>;
}

impl FrameIo for Box<dyn serialport::SerialPort> {
    fn set_timeout(&mut self, timeout: Duration) -> std::io::Result<()> {
        self.as_mut()
            .set_timeout(timeout)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

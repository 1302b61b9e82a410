//! An in-memory stand-in for a serial port, so a test can play the part
//! of a physically attached device without opening one.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::io::FrameIo;

#[derive(Default)]
struct Shared {
    /// Bytes written by the code under test, waiting to be read by the
    /// test as "what the device received".
    to_device: VecDeque<u8>,
    /// Bytes queued by the test as "what the device sent back", waiting
    /// to be read by the code under test.
    from_device: VecDeque<u8>,
}

/// One end of a fake serial link. Cloning shares the same underlying
/// queues, so a test can hold one end while handing the other to the
/// code under test.
#[derive(Clone, Default)]
pub struct FakeSerialPort {
    shared: Arc<Mutex<Shared>>,
}

impl FakeSerialPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes as if the device had sent them.
    pub fn push_device_bytes(&self, bytes: &[u8]) {
        self.shared.lock().unwrap().from_device.extend(bytes);
    }

    /// Drain the bytes the code under test has written so far.
    pub fn take_sent_bytes(&self) -> Vec<u8> {
        self.shared.lock().unwrap().to_device.drain(..).collect()
    }
}

impl Read for FakeSerialPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut shared = self.shared.lock().unwrap();
        if shared.from_device.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "no queued device bytes",
            ));
        }
        let n = buf.len().min(shared.from_device.len());
        for slot in buf.iter_mut().take(n) {
            *slot = shared.from_device.pop_front().unwrap();
        }
        Ok(n)
    }
}

impl Write for FakeSerialPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.shared.lock().unwrap().to_device.extend(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl FrameIo for FakeSerialPort {
    fn set_timeout(&mut self, _timeout: Duration) -> io::Result<()> {
        Ok(())
    }
}

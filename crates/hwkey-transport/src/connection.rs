//! Ties the framing codec to a byte stream: builds and sends command
//! frames, and reads and validates response frames.

use std::time::Duration;

use hwkey_proto::{build_command, parse_header, Descriptor, Status};

use crate::error::TransportError;
use crate::io::FrameIo;

/// The frame id used for every exchange. The protocol carries an id so a
/// response can be matched to its request, but this implementation only
/// ever has one request in flight at a time, so a fixed id is enough.
pub const FRAME_ID: u8 = 2;

/// How long to wait for a full response payload once the header byte has
/// arrived. Effectively "no timeout" for any response size this protocol
/// uses.
const PAYLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// A framing-protocol connection over any [`FrameIo`] (a real serial
/// port, or an in-memory duplex pair in tests).
pub struct FrameConnection<T: FrameIo> {
    io: T,
}

impl<T: FrameIo> FrameConnection<T> {
    pub fn new(io: T) -> Self {
        FrameConnection { io }
    }

    pub fn into_inner(self) -> T {
        self.io
    }

    /// Build and write a command frame for `descriptor`. `fill` is given
    /// the payload bytes after the command code byte to populate; for a
    /// command with no arguments this is a no-op.
    pub fn send(
        &mut self,
        descriptor: &dyn Descriptor,
        fill: impl FnOnce(&mut [u8]),
    ) -> Result<(), TransportError> {
        let mut buf = build_command(descriptor, FRAME_ID)?;
        fill(&mut buf[2..]);
        log::trace!("-> {} ({} bytes)", descriptor.name(), buf.len());
        self.io.write_all(&buf)?;
        self.io.flush()?;
        Ok(())
    }

    /// Read and validate a response frame for `descriptor`.
    ///
    /// `header_timeout`, when set, bounds only the wait for the header
    /// byte; reading the rest of the payload once a header has arrived
    /// uses a long fixed timeout, mirroring how a real response is never
    /// sent in pieces.
    pub fn recv(
        &mut self,
        descriptor: &dyn Descriptor,
        header_timeout: Option<Duration>,
    ) -> Result<Vec<u8>, TransportError> {
        if let Some(timeout) = header_timeout {
            self.io.set_timeout(timeout)?;
        }

        let mut header_byte = [0u8; 1];
        self.io.read_exact(&mut header_byte)?;
        let header = parse_header(header_byte[0])?;

        if header.id != FRAME_ID {
            return Err(TransportError::UnexpectedHeader {
                expected_id: FRAME_ID,
                got_id: header.id,
            });
        }

        self.io.set_timeout(PAYLOAD_TIMEOUT)?;
        let mut payload = vec![0u8; header.class.byte_len()];
        self.io.read_exact(&mut payload)?;
        log::trace!("<- {} ({} bytes)", descriptor.name(), payload.len());

        if payload[0] != descriptor.code() {
            return Err(TransportError::UnexpectedCode {
                expected: descriptor.code(),
                got: payload[0],
            });
        }

        if header.status == Status::NotOk {
            return Err(TransportError::DeviceError);
        }

        Ok(payload)
    }
}

//! Firmware-endpoint protocol client: identity queries and the app-load
//! state machine.

pub mod commands;
pub mod error;
pub mod progress;

pub use error::FirmwareError;
pub use progress::{NoProgress, ProgressReporter};

use std::time::Duration;

use blake2::{Blake2s256, Digest};
use hwkey_proto::{NameVersion, Udi};
use hwkey_transport::{FrameConnection, FrameIo};

use commands::{
    GetNameVersion, GetUdi, LoadAppData, LoadAppStart, RspGetUdi, RspLoadAppDataOk,
    RspLoadAppDataReady, RspLoadAppStart, RspNameVersion, CHUNK_CAPACITY,
};

/// The largest app image the firmware will accept.
pub const MAX_APP_SIZE: usize = 100 * 1024;

/// Query timeout used for the two identity queries: long enough for a
/// freshly plugged-in device to answer, short enough to fail fast if
/// nothing is listening.
const QUERY_TIMEOUT: Duration = Duration::from_secs(2);

/// A client for the firmware endpoint, built over any [`FrameIo`].
pub struct FirmwareClient<T: FrameIo> {
    conn: FrameConnection<T>,
}

impl<T: FrameIo> FirmwareClient<T> {
    pub fn new(io: T) -> Self {
        FirmwareClient {
            conn: FrameConnection::new(io),
        }
    }

    pub fn into_inner(self) -> T {
        self.conn.into_inner()
    }

    /// Ask the firmware what it is and which version it runs.
    pub fn get_name_version(&mut self) -> Result<NameVersion, FirmwareError> {
        self.conn.send(&GetNameVersion, |_| {})?;
        let rsp = self.conn.recv(&RspNameVersion, Some(QUERY_TIMEOUT))?;
        NameVersion::parse(&rsp[1..]).ok_or(FirmwareError::DeviceRejected("malformed name/version"))
    }

    /// Ask the firmware for this unit's identifier.
    pub fn get_udi(&mut self) -> Result<Udi, FirmwareError> {
        self.conn.send(&GetUdi, |_| {})?;
        let rsp = self.conn.recv(&RspGetUdi, Some(QUERY_TIMEOUT))?;
        if rsp[1] != 0 {
            return Err(FirmwareError::DeviceRejected("get_udi"));
        }
        Udi::parse(&rsp[2..]).ok_or(FirmwareError::DeviceRejected("malformed udi"))
    }

    /// Load `image` into the device and run it, deriving the device's
    /// key material from `uss_digest` (a BLAKE2s-256 digest of the
    /// user-supplied secret, or `None` for no secret).
    ///
    /// Implements the three-stage load sequence: set size and USS,
    /// stream the image in fixed-size chunks, then compare the
    /// device-reported digest against one computed locally.
    pub fn load_app(
        &mut self,
        image: &[u8],
        uss_digest: Option<[u8; 32]>,
        progress: &mut dyn ProgressReporter,
    ) -> Result<(), FirmwareError> {
        if image.len() > MAX_APP_SIZE {
            return Err(FirmwareError::ImageTooLarge(image.len()));
        }

        self.start_load(image.len(), uss_digest)?;

        progress.start(image.len());
        let mut offset = 0;
        let mut device_digest = [0u8; 32];
        while offset < image.len() {
            let remaining = image.len() - offset;
            let last = remaining <= CHUNK_CAPACITY;
            let take = remaining.min(CHUNK_CAPACITY);
            let chunk = &image[offset..offset + take];

            if last {
                device_digest = self.send_final_chunk(chunk)?;
            } else {
                self.send_chunk(chunk)?;
            }

            offset += take;
            progress.advance(take);
        }
        progress.finish();

        let host_digest: [u8; 32] = Blake2s256::digest(image).into();
        if host_digest != device_digest {
            return Err(FirmwareError::LoadMismatch);
        }

        Ok(())
    }

    fn start_load(&mut self, size: usize, uss_digest: Option<[u8; 32]>) -> Result<(), FirmwareError> {
        self.conn.send(&LoadAppStart, |payload| {
            payload[0..4].copy_from_slice(&(size as u32).to_le_bytes());
            match uss_digest {
                Some(digest) => {
                    payload[4] = 1;
                    payload[5..37].copy_from_slice(&digest);
                }
                None => {
                    payload[4] = 0;
                }
            }
        })?;

        let rsp = self.conn.recv(&RspLoadAppStart, None)?;
        if rsp[1] != 0 {
            return Err(FirmwareError::DeviceRejected("load_app_start"));
        }
        Ok(())
    }

    fn send_chunk(&mut self, chunk: &[u8]) -> Result<(), FirmwareError> {
        self.conn.send(&LoadAppData, |payload| {
            payload[..chunk.len()].copy_from_slice(chunk);
        })?;
        let rsp = self.conn.recv(&RspLoadAppDataOk, None)?;
        if rsp[1] != 0 {
            return Err(FirmwareError::DeviceRejected("load_app_data"));
        }
        Ok(())
    }

    fn send_final_chunk(&mut self, chunk: &[u8]) -> Result<[u8; 32], FirmwareError> {
        self.conn.send(&LoadAppData, |payload| {
            payload[..chunk.len()].copy_from_slice(chunk);
        })?;
        let rsp = self.conn.recv(&RspLoadAppDataReady, None)?;
        if rsp[1] != 0 {
            return Err(FirmwareError::DeviceRejected("load_app_data"));
        }
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&rsp[2..34]);
        Ok(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwkey_proto::Descriptor;
    use hwkey_transport::testing::FakeSerialPort;

    fn queue_ok_response(port: &FakeSerialPort, descriptor: &dyn Descriptor, extra: &[u8]) {
        let mut rsp = vec![0u8; 1 + descriptor.class().byte_len()];
        let header = (hwkey_transport::FRAME_ID << 5) | (2 << 3) | descriptor_class_bits(descriptor);
        rsp[0] = header;
        rsp[1] = descriptor.code();
        rsp[2] = 0;
        rsp[3..3 + extra.len()].copy_from_slice(extra);
        port.push_device_bytes(&rsp);
    }

    fn descriptor_class_bits(descriptor: &dyn Descriptor) -> u8 {
        match descriptor.class() {
            hwkey_proto::LengthClass::One => 0,
            hwkey_proto::LengthClass::Four => 1,
            hwkey_proto::LengthClass::ThirtyTwo => 2,
            hwkey_proto::LengthClass::OneTwentyEight => 3,
        }
    }

    #[test]
    fn get_udi_parses_successful_response() {
        let port = FakeSerialPort::new();
        let mut extra = [0u8; 8];
        let vpr: u32 = (0x1234 << 12) | (0x56 << 4) | 0x7;
        extra[0..4].copy_from_slice(&vpr.to_le_bytes());
        extra[4..8].copy_from_slice(&0xdeadbeefu32.to_le_bytes());
        queue_ok_response(&port, &RspGetUdi, &extra);

        let mut client = FirmwareClient::new(port);
        let udi = client.get_udi().unwrap();
        assert_eq!(udi.vendor_id, 0x1234);
        assert_eq!(udi.product_id, 0x56);
        assert_eq!(udi.serial, 0xdeadbeef);
    }

    #[test]
    fn load_app_rejects_oversized_image() {
        let port = FakeSerialPort::new();
        let mut client = FirmwareClient::new(port);
        let image = vec![0u8; MAX_APP_SIZE + 1];
        let err = client
            .load_app(&image, None, &mut NoProgress)
            .unwrap_err();
        assert!(matches!(err, FirmwareError::ImageTooLarge(_)));
    }

    #[test]
    fn load_app_streams_chunks_and_verifies_digest() {
        let port = FakeSerialPort::new();
        let image = vec![0x42u8; 200]; // two chunks: 127 + 73 bytes

        queue_ok_response(&port, &RspLoadAppStart, &[]);
        queue_ok_response(&port, &RspLoadAppDataOk, &[]);
        let digest: [u8; 32] = Blake2s256::digest(&image).into();
        queue_ok_response(&port, &RspLoadAppDataReady, &digest);

        let mut client = FirmwareClient::new(port);
        client.load_app(&image, None, &mut NoProgress).unwrap();
    }

    #[test]
    fn load_app_start_encodes_the_uss_digest_when_present() {
        let port = FakeSerialPort::new();
        let image = vec![0x11u8; 4];
        let digest = [0x5au8; 32];

        queue_ok_response(&port, &RspLoadAppStart, &[]);
        let expected_digest: [u8; 32] = Blake2s256::digest(&image).into();
        queue_ok_response(&port, &RspLoadAppDataReady, &expected_digest);

        let mut client = FirmwareClient::new(port.clone());
        client.load_app(&image, Some(digest), &mut NoProgress).unwrap();

        let sent = port.take_sent_bytes();
        // load_app_start is the first frame: header byte + code byte +
        // 127 data bytes. Data layout: u32 size LE, u8 uss_flag, 32-byte digest.
        let start_frame = &sent[..1 + 128];
        assert_eq!(start_frame[2 + 4], 1, "uss_flag must be set");
        assert_eq!(&start_frame[2 + 5..2 + 37], &digest, "uss digest must be copied verbatim");
    }

    #[test]
    fn load_app_start_clears_the_uss_flag_when_absent() {
        let port = FakeSerialPort::new();
        let image = vec![0x22u8; 4];

        queue_ok_response(&port, &RspLoadAppStart, &[]);
        let expected_digest: [u8; 32] = Blake2s256::digest(&image).into();
        queue_ok_response(&port, &RspLoadAppDataReady, &expected_digest);

        let mut client = FirmwareClient::new(port.clone());
        client.load_app(&image, None, &mut NoProgress).unwrap();

        let sent = port.take_sent_bytes();
        let start_frame = &sent[..1 + 128];
        assert_eq!(start_frame[2 + 4], 0, "uss_flag must be clear");
    }

    #[test]
    fn load_app_fails_on_digest_mismatch() {
        let port = FakeSerialPort::new();
        let image = vec![0x11u8; 10];

        queue_ok_response(&port, &RspLoadAppStart, &[]);
        queue_ok_response(&port, &RspLoadAppDataReady, &[0xff; 32]);

        let mut client = FirmwareClient::new(port);
        let err = client.load_app(&image, None, &mut NoProgress).unwrap_err();
        assert!(matches!(err, FirmwareError::LoadMismatch));
    }
}

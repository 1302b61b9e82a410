//! App-endpoint protocol client: public key retrieval and the
//! set-size/stream/get-signature sign sequence.

pub mod commands;
pub mod error;

pub use error::SignerError;

use std::time::Duration;

use hwkey_proto::NameVersion;
use hwkey_transport::{FrameConnection, FrameIo};

use commands::{
    GetAppNameVersion, GetPubkey, GetSignature, RspAppNameVersion, RspGetPubkey,
    RspGetSignature, RspSetSize, RspSignData, SetSize, SignData, CHUNK_CAPACITY,
};

/// The largest message the device will sign in one call.
pub const MAX_SIGN_SIZE: usize = 4096;

const QUERY_TIMEOUT: Duration = Duration::from_secs(2);

/// A client for the app endpoint's signer protocol, built over any
/// [`FrameIo`].
pub struct SignerClient<T: FrameIo> {
    conn: FrameConnection<T>,
}

impl<T: FrameIo> SignerClient<T> {
    pub fn new(io: T) -> Self {
        SignerClient {
            conn: FrameConnection::new(io),
        }
    }

    pub fn into_inner(self) -> T {
        self.conn.into_inner()
    }

    /// Ask the running app what it is and which version it runs.
    pub fn get_app_name_version(&mut self) -> Result<NameVersion, SignerError> {
        self.conn.send(&GetAppNameVersion, |_| {})?;
        let rsp = self.conn.recv(&RspAppNameVersion, Some(QUERY_TIMEOUT))?;
        NameVersion::parse(&rsp[1..]).ok_or(SignerError::DeviceRejected("malformed name/version"))
    }

    /// Fetch the device's Ed25519 public key.
    pub fn get_pubkey(&mut self) -> Result<[u8; 32], SignerError> {
        self.conn.send(&GetPubkey, |_| {})?;
        let rsp = self.conn.recv(&RspGetPubkey, None)?;
        let mut key = [0u8; 32];
        key.copy_from_slice(&rsp[1..33]);
        Ok(key)
    }

    /// Sign `message`, an unhashed message. Rejects `prehashed` callers
    /// up front, since this device only implements the pure-Ed25519
    /// (Ed25519ph-less) variant.
    pub fn sign(&mut self, message: &[u8], prehashed: bool) -> Result<[u8; 64], SignerError> {
        if prehashed {
            return Err(SignerError::PreHashedDigestRejected);
        }
        if message.len() > MAX_SIGN_SIZE {
            return Err(SignerError::MessageTooLarge(message.len(), MAX_SIGN_SIZE));
        }

        self.set_size(message.len())?;

        let mut offset = 0;
        while offset < message.len() {
            let take = (message.len() - offset).min(CHUNK_CAPACITY);
            self.send_chunk(&message[offset..offset + take])?;
            offset += take;
        }

        self.get_signature()
    }

    fn set_size(&mut self, size: usize) -> Result<(), SignerError> {
        self.conn.send(&SetSize, |payload| {
            payload[0..4].copy_from_slice(&(size as u32).to_le_bytes());
        })?;
        let rsp = self.conn.recv(&RspSetSize, None)?;
        if rsp[1] != 0 {
            return Err(SignerError::DeviceRejected("set_size"));
        }
        Ok(())
    }

    fn send_chunk(&mut self, chunk: &[u8]) -> Result<(), SignerError> {
        self.conn.send(&SignData, |payload| {
            payload[..chunk.len()].copy_from_slice(chunk);
        })?;
        let rsp = self.conn.recv(&RspSignData, None)?;
        if rsp[1] != 0 {
            return Err(SignerError::DeviceRejected("sign_data"));
        }
        Ok(())
    }

    /// Waits for the signature with no client-side timeout: producing
    /// one may require a physical touch on the device, which can take
    /// an arbitrary amount of time.
    fn get_signature(&mut self) -> Result<[u8; 64], SignerError> {
        self.conn.send(&GetSignature, |_| {})?;
        let rsp = self.conn.recv(&RspGetSignature, None)?;
        if rsp[1] != 0 {
            return Err(SignerError::DeviceRejected("get_signature"));
        }
        let mut sig = [0u8; 64];
        sig.copy_from_slice(&rsp[2..66]);
        Ok(sig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwkey_proto::Descriptor;
    use hwkey_transport::testing::FakeSerialPort;

    fn queue_response(port: &FakeSerialPort, descriptor: &dyn Descriptor, tail: &[u8]) {
        let mut rsp = vec![0u8; 1 + descriptor.class().byte_len()];
        let class_bits = match descriptor.class() {
            hwkey_proto::LengthClass::One => 0,
            hwkey_proto::LengthClass::Four => 1,
            hwkey_proto::LengthClass::ThirtyTwo => 2,
            hwkey_proto::LengthClass::OneTwentyEight => 3,
        };
        rsp[0] = (hwkey_transport::FRAME_ID << 5) | (3 << 3) | class_bits;
        rsp[1] = descriptor.code();
        rsp[2..2 + tail.len()].copy_from_slice(tail);
        port.push_device_bytes(&rsp);
    }

    #[test]
    fn get_pubkey_skips_header_and_code_only() {
        let port = FakeSerialPort::new();
        let key = [7u8; 32];
        let mut rsp = vec![0u8; 1 + 128];
        rsp[0] = (hwkey_transport::FRAME_ID << 5) | (3 << 3) | 3;
        rsp[1] = RspGetPubkey.code();
        rsp[2..34].copy_from_slice(&key);
        port.push_device_bytes(&rsp);

        let mut client = SignerClient::new(port);
        let got = client.get_pubkey().unwrap();
        assert_eq!(got, key);
    }

    #[test]
    fn sign_rejects_prehashed() {
        let port = FakeSerialPort::new();
        let mut client = SignerClient::new(port);
        let err = client.sign(b"digest", true).unwrap_err();
        assert!(matches!(err, SignerError::PreHashedDigestRejected));
    }

    #[test]
    fn sign_rejects_oversized_message() {
        let port = FakeSerialPort::new();
        let mut client = SignerClient::new(port);
        let message = vec![0u8; MAX_SIGN_SIZE + 1];
        let err = client.sign(&message, false).unwrap_err();
        assert!(matches!(err, SignerError::MessageTooLarge(_, _)));
    }

    #[test]
    fn sign_streams_chunks_and_returns_signature() {
        let port = FakeSerialPort::new();
        queue_response(&port, &RspSetSize, &[0]);
        queue_response(&port, &RspSignData, &[0]);
        queue_response(&port, &RspSignData, &[0]);
        let sig = [9u8; 64];
        let mut sig_rsp = vec![0u8; 1 + 128];
        sig_rsp[0] = (hwkey_transport::FRAME_ID << 5) | (3 << 3) | 3;
        sig_rsp[1] = RspGetSignature.code();
        sig_rsp[2] = 0;
        sig_rsp[3..67].copy_from_slice(&sig);
        port.push_device_bytes(&sig_rsp);

        let mut client = SignerClient::new(port);
        let message = vec![0x01u8; 200];
        let got = client.sign(&message, false).unwrap();
        assert_eq!(got, sig);
    }
}

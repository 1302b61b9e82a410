use hwkey_transport::TransportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignerError {
    #[error("message is {0} bytes, exceeds the {1} byte limit")]
    MessageTooLarge(usize, usize),

    #[error("caller requested signing of a pre-hashed digest, which this device does not support")]
    PreHashedDigestRejected,

    #[error("device rejected {0}")]
    DeviceRejected(&'static str),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

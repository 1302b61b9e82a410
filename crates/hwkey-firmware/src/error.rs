use hwkey_transport::TransportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FirmwareError {
    #[error("app image is {0} bytes, exceeds the 100 KiB limit")]
    ImageTooLarge(usize),

    #[error("device rejected {0}")]
    DeviceRejected(&'static str),

    #[error("host digest disagrees with device-reported digest after load")]
    LoadMismatch,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

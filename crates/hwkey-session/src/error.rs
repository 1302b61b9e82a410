use hwkey_firmware::FirmwareError;
use hwkey_signer::SignerError;
use hwkey_transport::TransportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("device reports an unrecognized product id {0:#04x}")]
    UnknownDevice(u8),

    #[error("device is running neither firmware mode nor the expected signer app")]
    WrongAppLoaded,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Firmware(#[from] FirmwareError),

    #[error(transparent)]
    Signer(#[from] SignerError),
}

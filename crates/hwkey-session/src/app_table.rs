//! The table mapping a device's reported product id to the signer
//! image the session manager should load onto it.

use sha2::{Digest, Sha512};

/// Product id classes recognized on the firmware UDI. The engineering
/// sample id and the first two shipped hardware revisions all run the
/// same signer image; only the newest revision gets its own build.
pub mod product_id {
    pub const ENGINEERING_SAMPLE: u8 = 0x00;
    pub const ACRAB: u8 = 0x01;
    pub const BELLATRIX: u8 = 0x02;
    pub const CASTOR: u8 = 0x03;
}

const PRE_CASTOR_IMAGE: &[u8] = include_bytes!("../device-app/signer-pre-castor.bin");
const CASTOR_IMAGE: &[u8] = include_bytes!("../device-app/signer-castor.bin");

/// A signer image this crate knows how to load, plus the metadata
/// printed alongside it.
pub struct EmbeddedApp {
    pub name: &'static str,
    pub image: &'static [u8],
}

impl EmbeddedApp {
    /// SHA-512 hex digest of the image, for display only — load
    /// verification uses the device's own BLAKE2s-256 digest, not this.
    pub fn digest_hex(&self) -> String {
        Sha512::digest(self.image)
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}

/// Resolve the image to load for a given UDI product id. `None` means
/// the device is not one this crate knows how to drive.
pub fn lookup(id: u8) -> Option<EmbeddedApp> {
    match id {
        product_id::ENGINEERING_SAMPLE | product_id::ACRAB | product_id::BELLATRIX => {
            Some(EmbeddedApp {
                name: "tkey-device-signer 1.0.2",
                image: PRE_CASTOR_IMAGE,
            })
        }
        product_id::CASTOR => Some(EmbeddedApp {
            name: "tkey-device-signer castor-alpha-1",
            image: CASTOR_IMAGE,
        }),
        _ => None,
    }
}

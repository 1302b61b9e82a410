//! Command and response descriptors for the app (signer) endpoint.

use hwkey_proto::{Descriptor, Endpoint, LengthClass};

macro_rules! descriptor {
    ($name:ident, $code:expr, $class:expr, $label:expr) => {
        pub struct $name;
        impl Descriptor for $name {
            fn code(&self) -> u8 {
                $code
            }
            fn endpoint(&self) -> Endpoint {
                Endpoint::App
            }
            fn class(&self) -> LengthClass {
                $class
            }
            fn name(&self) -> &'static str {
                $label
            }
        }
    };
}

descriptor!(GetPubkey, 0x01, LengthClass::One, "get_pubkey");
descriptor!(RspGetPubkey, 0x02, LengthClass::OneTwentyEight, "rsp_get_pubkey");
descriptor!(SetSize, 0x03, LengthClass::ThirtyTwo, "set_size");
descriptor!(RspSetSize, 0x04, LengthClass::Four, "rsp_set_size");
descriptor!(SignData, 0x05, LengthClass::OneTwentyEight, "sign_data");
descriptor!(RspSignData, 0x06, LengthClass::Four, "rsp_sign_data");
descriptor!(GetSignature, 0x07, LengthClass::One, "get_signature");
descriptor!(RspGetSignature, 0x08, LengthClass::OneTwentyEight, "rsp_get_signature");
descriptor!(GetAppNameVersion, 0x09, LengthClass::One, "get_app_name_version");
descriptor!(RspAppNameVersion, 0x0a, LengthClass::ThirtyTwo, "rsp_app_name_version");

/// Payload bytes available per `sign_data` chunk.
pub const CHUNK_CAPACITY: usize = LengthClass::OneTwentyEight.byte_len() - 1;

//! Command and response descriptors for the firmware endpoint.

use hwkey_proto::{Descriptor, Endpoint, LengthClass};

macro_rules! descriptor {
    ($name:ident, $code:expr, $class:expr, $label:expr) => {
        pub struct $name;
        impl Descriptor for $name {
            fn code(&self) -> u8 {
                $code
            }
            fn endpoint(&self) -> Endpoint {
                Endpoint::Firmware
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

descriptor!(GetNameVersion, 0x01, LengthClass::One, "get_name_version");
descriptor!(RspNameVersion, 0x02, LengthClass::ThirtyTwo, "rsp_name_version");
descriptor!(LoadAppStart, 0x03, LengthClass::OneTwentyEight, "load_app_start");
descriptor!(RspLoadAppStart, 0x04, LengthClass::Four, "rsp_load_app_start");
descriptor!(LoadAppData, 0x05, LengthClass::OneTwentyEight, "load_app_data");
descriptor!(RspLoadAppDataOk, 0x06, LengthClass::Four, "rsp_load_app_data_ok");
descriptor!(RspLoadAppDataReady, 0x07, LengthClass::OneTwentyEight, "rsp_load_app_data_ready");
descriptor!(GetUdi, 0x08, LengthClass::One, "get_udi");
descriptor!(RspGetUdi, 0x09, LengthClass::ThirtyTwo, "rsp_get_udi");

/// Payload bytes available per `load_app_data` chunk: one byte less than
/// the class size, since byte 0 of the payload is the command code.
pub const CHUNK_CAPACITY: usize = LengthClass::OneTwentyEight.byte_len() - 1;

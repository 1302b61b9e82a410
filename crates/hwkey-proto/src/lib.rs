//! Wire framing codec and identity types shared by every crate that
//! talks to the device over a serial link.

pub mod error;
pub mod framing;
pub mod identity;

pub use error::FramingError;
pub use framing::{build_command, parse_header, Descriptor, Endpoint, FrameHeader, LengthClass, Status};
pub use identity::{NameVersion, Udi};

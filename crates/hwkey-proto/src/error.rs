use thiserror::Error;

/// Errors raised while building or parsing a single frame header/payload.
///
/// These never touch the wire themselves; the transport crate wraps them
/// once bytes are actually exchanged with a device.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingError {
    /// A caller passed an out-of-range frame id, endpoint, or length class
    /// to [`crate::build_command`].
    #[error("bad argument building frame: {0}")]
    BadArgument(&'static str),
    /// A header byte failed to parse: the reserved bit was set, or (for a
    /// revision that does not define the status bit) a bit that must be
    /// zero was not.
    #[error("malformed frame header byte {0:#04x}")]
    MalformedHeader(u8),
}

//! The USS-acquisition seam: the session manager never knows how a
//! secret was obtained, only that it can ask for one.

use hwkey_proto::Udi;

/// Supplies a user-supplied secret for a given device, or none.
///
/// Called at most once per app load. Implementations that prompt a
/// user (terminal, pinentry, platform dialog) live outside this crate;
/// this is only the seam they plug into.
pub trait UssProvider: Send {
    fn acquire(&mut self, udi: &Udi) -> Option<Vec<u8>>;
}

/// The default provider: no secret, ever. Used for headless
/// configurations that don't set up USS.
pub struct NoUss;

impl UssProvider for NoUss {
    fn acquire(&mut self, _udi: &Udi) -> Option<Vec<u8>> {
        None
    }
}

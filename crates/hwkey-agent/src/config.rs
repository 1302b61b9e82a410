//! Plain configuration types consumed by the agent core. `clap` lives
//! only in the binary; this module and everything downstream of it
//! never sees a `clap` type.

use hwkey_session::PortConfig;

/// What the binary was asked to do.
#[derive(Clone)]
pub enum Mode {
    /// Serve on the given local endpoint path.
    Serve(String),
    /// Print the authorized-key line and exit.
    ShowPubkey,
    /// List candidate serial ports and exit.
    ListPorts,
}

/// How to acquire the user-supplied secret, if at all. Interactive and
/// file-based acquisition are mutually exclusive by construction: there
/// is no state here representing both at once.
pub enum UssMode {
    None,
    Interactive,
    File(String),
}

pub struct AgentConfig {
    pub mode: Mode,
    pub port: PortConfig,
    pub uss: UssMode,
    pub pinentry: Option<String>,
}

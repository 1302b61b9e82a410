//! The OpenSSH agent frontend: wire codec, SSH key/signature
//! marshalling, the per-connection request handler, and the local
//! endpoint it listens on. CLI parsing lives only in the `ssh-agent`
//! binary; everything here takes plain [`config::AgentConfig`] values.

pub mod config;
pub mod error;
pub mod frontend;
pub mod listener;
pub mod pubkey;
pub mod uss_provider;
pub mod wire;

use std::sync::Arc;
use std::thread;

use hwkey_session::{DeviceFactory, Notifier, Session};

pub use config::{AgentConfig, Mode, UssMode};
pub use error::AgentError;
pub use frontend::AgentServer;

/// Format a device's Ed25519 public key as an `authorized_keys` line.
pub fn authorized_key_line(pubkey: &[u8; 32]) -> String {
    use base64::Engine;
    let blob = pubkey::public_key_blob(pubkey);
    format!(
        "ssh-ed25519 {}",
        base64::engine::general_purpose::STANDARD.encode(blob)
    )
}

/// Accept connections on `endpoint_path` forever, dispatching each to
/// `server` on its own thread.
pub fn serve<F: DeviceFactory + Send + Sync + 'static>(
    endpoint_path: &str,
    server: Arc<AgentServer<F>>,
) -> Result<(), AgentError> {
    let endpoint = listener::Endpoint::bind(endpoint_path)
        .map_err(|_| AgentError::EndpointInUse(endpoint_path.to_string()))?;
    log::info!("listening on {endpoint_path}");
    loop {
        match endpoint.accept() {
            Ok(stream) => {
                let server = Arc::clone(&server);
                thread::spawn(move || server.handle_connection(stream));
            }
            Err(e) => log::error!("accept failed: {e}"),
        }
    }
}

/// Build a session's `Notifier` implementation for the CLI frontend.
/// Kept as a free function so both the session and the frontend can
/// hold their own instance of the same stderr-backed notifier.
pub fn default_notifier() -> Arc<dyn Notifier> {
    Arc::new(hwkey_session::StderrNotifier)
}

/// Build the `UssProvider` a given [`UssMode`] calls for.
pub fn uss_provider_for(mode: &UssMode) -> Box<dyn hwkey_session::UssProvider> {
    match mode {
        UssMode::None => Box::new(hwkey_session::NoUss),
        UssMode::Interactive => Box::new(uss_provider::InteractiveUssProvider),
        UssMode::File(path) => Box::new(uss_provider::FileUssProvider::new(path.clone())),
    }
}

/// Build a ready-to-serve session from a resolved config.
pub fn build_session(config: &AgentConfig) -> Session<hwkey_session::SerialDeviceFactory> {
    Session::new(
        hwkey_session::SerialDeviceFactory,
        hwkey_session::PortConfig {
            path: config.port.path.clone(),
            baud: config.port.baud,
        },
        uss_provider_for(&config.uss),
        default_notifier_box(),
    )
}

fn default_notifier_box() -> Box<dyn Notifier> {
    Box::new(hwkey_session::StderrNotifier)
}

//! Serial port discovery.
//!
//! This lists every OS-visible serial port with no vendor/product
//! filtering. Callers that need to recognize one specific device provide
//! their own resolver; this is the fallback used when none is
//! configured.

use crate::error::TransportError;

/// List the names of every serial port the OS currently exposes.
pub fn list_ports() -> Result<Vec<String>, TransportError> {
    Ok(serialport::available_ports()?
        .into_iter()
        .map(|p| p.port_name)
        .collect())
}

/// Resolve a single port automatically: succeeds only if exactly one
/// port is visible.
pub fn resolve_single_port() -> Result<String, TransportError> {
    let mut ports = list_ports()?;
    match ports.len() {
        0 => Err(TransportError::PortNotFound),
        1 => Ok(ports.remove(0)),
        _ => Err(TransportError::PortAmbiguous),
    }
}

//! Device session management: lazy connection, firmware/app mode
//! detection, signer app loading, and idle auto-disconnect.
//!
//! This crate sits above [`hwkey_firmware`] and [`hwkey_signer`] and
//! hides the distinction between "device is in firmware mode and needs
//! the signer app loaded" and "device already has the signer app
//! running" behind a single [`session::Session`].

pub mod app_table;
pub mod device_factory;
pub mod error;
pub mod notify;
pub mod session;
pub mod uss;

pub use device_factory::{DeviceFactory, SerialDeviceFactory};
pub use error::SessionError;
pub use notify::{Notifier, StderrNotifier};
pub use session::{PortConfig, Session, IDLE_DISCONNECT};
pub use uss::{NoUss, UssProvider};

//! The device session: lazy connect, mode detection, app loading, and
//! idle auto-disconnect, all behind a `connect()`/`disconnect()` pair
//! that every operation wraps itself in.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use blake2::{Blake2s256, Digest};

use hwkey_firmware::{FirmwareClient, NoProgress};
use hwkey_signer::SignerClient;
use hwkey_transport::TransportError;

use crate::app_table;
use crate::device_factory::DeviceFactory;
use crate::error::SessionError;
use crate::notify::Notifier;
use crate::uss::UssProvider;

/// How long a session waits after the last operation before closing
/// the port on its own.
pub const IDLE_DISCONNECT: Duration = Duration::from_secs(3);

const WANT_FW_NAME0: &[u8; 4] = b"tk1 ";
const WANT_FW_NAME1: &[u8; 4] = b"mkdf";
const WANT_APP_NAME0: &[u8; 4] = b"tk1 ";
const WANT_APP_NAME1: &[u8; 4] = b"sign";

/// Where to find the device and at what speed to talk to it.
pub struct PortConfig {
    /// `None` means auto-detect via the configured resolver.
    pub path: Option<String>,
    pub baud: u32,
}

impl Default for PortConfig {
    fn default() -> Self {
        PortConfig {
            path: None,
            baud: hwkey_transport::DEVICE_BAUD_RATE,
        }
    }
}

struct Inner<Io: hwkey_transport::FrameIo> {
    signer: Option<SignerClient<Io>>,
    cached_pubkey: Option<[u8; 32]>,
}

/// A device session. Cheap to clone-share: the actual connection state
/// lives behind an `Arc`, so handing out a session to multiple request
/// handlers is safe.
pub struct Session<F: DeviceFactory> {
    factory: F,
    port: PortConfig,
    port_resolver: Box<dyn Fn() -> Result<String, TransportError> + Send + Sync>,
    uss_provider: Mutex<Box<dyn UssProvider>>,
    notifier: Box<dyn Notifier>,
    inner: Arc<Mutex<Inner<F::Io>>>,
    generation: Arc<AtomicU64>,
}

impl<F: DeviceFactory + Send + Sync + 'static> Session<F> {
    pub fn new(
        factory: F,
        port: PortConfig,
        uss_provider: Box<dyn UssProvider>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Session {
            factory,
            port,
            port_resolver: Box::new(hwkey_transport::resolve_single_port),
            uss_provider: Mutex::new(uss_provider),
            notifier,
            inner: Arc::new(Mutex::new(Inner {
                signer: None,
                cached_pubkey: None,
            })),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Override how an unconfigured port gets resolved. The default
    /// resolver requires exactly one serial port to be visible.
    pub fn with_port_resolver(
        mut self,
        resolver: impl Fn() -> Result<String, TransportError> + Send + Sync + 'static,
    ) -> Self {
        self.port_resolver = Box::new(resolver);
        self
    }

    /// Ensure a session is established, connecting and loading the
    /// signer app if needed. Idempotent while already connected.
    pub fn connect(&self) -> Result<(), SessionError> {
        self.generation.fetch_add(1, Ordering::SeqCst);

        let mut guard = self.inner.lock().unwrap();
        if guard.signer.is_some() {
            return Ok(());
        }

        let path = match &self.port.path {
            Some(p) => p.clone(),
            None => (self.port_resolver)().inspect_err(|e| {
                self.notifier.notify(&format!("Could not find a device: {e}"));
            })?,
        };

        log::info!("connecting to device on {path}");
        let io = self.factory.open(&path, self.port.baud).inspect_err(|_| {
            self.notifier
                .notify(&format!("Could not connect to a device on {path}."));
        })?;

        let mut firmware = FirmwareClient::new(io);
        let is_firmware_mode = firmware
            .get_name_version()
            .map(|nv| &nv.name0 == WANT_FW_NAME0 && &nv.name1 == WANT_FW_NAME1)
            .unwrap_or(false);

        let io = if is_firmware_mode {
            log::info!("device is in firmware mode, loading signer app");
            let udi = firmware.get_udi()?;
            let app = app_table::lookup(udi.product_id)
                .ok_or(SessionError::UnknownDevice(udi.product_id))?;

            let secret = self.uss_provider.lock().unwrap().acquire(&udi);
            let uss_digest = secret.filter(|s| !s.is_empty()).map(|s| {
                let digest: [u8; 32] = Blake2s256::digest(&s).into();
                digest
            });

            firmware.load_app(app.image, uss_digest, &mut NoProgress)?;
            log::info!("loaded {} (sha512 {})", app.name, app.digest_hex());
            firmware.into_inner()
        } else {
            firmware.into_inner()
        };

        let mut signer = SignerClient::new(io);
        let is_wanted_app = signer
            .get_app_name_version()
            .map(|nv| &nv.name0 == WANT_APP_NAME0 && &nv.name1 == WANT_APP_NAME1)
            .unwrap_or(false);

        if !is_wanted_app {
            self.notifier.notify(
                "Please remove and plug in your device again — it might be running the wrong app.",
            );
            return Err(SessionError::WrongAppLoaded);
        }

        let pubkey = signer.get_pubkey()?;
        guard.signer = Some(signer);
        guard.cached_pubkey = Some(pubkey);
        Ok(())
    }

    /// Arm the idle-disconnect timer. Any subsequent `connect()` call
    /// cancels it by bumping the generation counter before it fires.
    pub fn disconnect(&self) {
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let inner = Arc::clone(&self.inner);
        let generation = Arc::clone(&self.generation);

        thread::spawn(move || {
            thread::sleep(IDLE_DISCONNECT);
            if generation.load(Ordering::SeqCst) == my_generation {
                let mut guard = inner.lock().unwrap();
                guard.signer = None;
                guard.cached_pubkey = None;
                log::info!("idle timeout, disconnected from device");
            }
        });
    }

    /// The device's cached Ed25519 public key, connecting first if
    /// necessary.
    pub fn public_key(&self) -> Result<[u8; 32], SessionError> {
        self.connect()?;
        let pubkey = self
            .inner
            .lock()
            .unwrap()
            .cached_pubkey
            .expect("connect() always populates cached_pubkey on success");
        self.disconnect();
        Ok(pubkey)
    }

    /// Sign `message`, connecting first if necessary. `prehashed`
    /// rejects the request without touching the wire.
    pub fn sign(&self, message: &[u8], prehashed: bool) -> Result<[u8; 64], SessionError> {
        self.connect()?;
        let result = {
            let mut guard = self.inner.lock().unwrap();
            let signer = guard
                .signer
                .as_mut()
                .expect("connect() always populates signer on success");
            signer.sign(message, prehashed)
        };
        self.disconnect();
        Ok(result?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwkey_transport::testing::FakeSerialPort;

    struct FakeFactory(FakeSerialPort);

    impl DeviceFactory for FakeFactory {
        type Io = FakeSerialPort;
        fn open(&self, _port: &str, _baud: u32) -> Result<Self::Io, TransportError> {
            Ok(self.0.clone())
        }
    }

    fn push_response(port: &FakeSerialPort, endpoint_bits: u8, class_bits: u8, code: u8, tail: &[u8]) {
        let len = match class_bits {
            0 => 1,
            1 => 4,
            2 => 32,
            _ => 128,
        };
        let mut rsp = vec![0u8; 1 + len];
        rsp[0] = (2 << 5) | (endpoint_bits << 3) | class_bits;
        rsp[1] = code;
        rsp[2..2 + tail.len()].copy_from_slice(tail);
        port.push_device_bytes(&rsp);
    }

    fn app_name_version_tail() -> Vec<u8> {
        let mut tail = vec![0u8; 12];
        tail[0..4].copy_from_slice(b"tk1 ");
        tail[4..8].copy_from_slice(b"sign");
        tail
    }

    #[test]
    fn sign_fast_path_when_app_already_loaded() {
        let port = FakeSerialPort::new();

        // get_name_version (firmware endpoint) answers as the app, not
        // firmware, so the firmware-mode branch is skipped.
        push_response(&port, 2, 2, 0x02, b"xxxxxxxxxxxx");
        // get_app_name_version (app endpoint)
        push_response(&port, 3, 2, 0x0a, &app_name_version_tail());
        // get_pubkey (no status byte ahead of the key)
        push_response(&port, 3, 3, 0x02, &[7u8; 32]);
        // set_size
        push_response(&port, 3, 1, 0x04, &[0]);
        // sign_data (message is short, one chunk)
        push_response(&port, 3, 1, 0x06, &[0]);
        // get_signature
        push_response(&port, 3, 3, 0x08, &{
            let mut v = vec![0u8];
            v.extend_from_slice(&[9u8; 64]);
            v
        });

        let session = Session::new(
            FakeFactory(port),
            PortConfig {
                path: Some("fake".into()),
                baud: 62_500,
            },
            Box::new(crate::uss::NoUss),
            Box::new(crate::notify::StderrNotifier),
        );

        let sig = session.sign(b"hello", false).unwrap();
        assert_eq!(sig, [9u8; 64]);
    }

    #[test]
    fn wrong_app_is_rejected() {
        let port = FakeSerialPort::new();
        push_response(&port, 2, 2, 0x02, b"xxxxxxxxxxxx");
        let mut wrong_tail = vec![0u8; 12];
        wrong_tail[0..4].copy_from_slice(b"tk1 ");
        wrong_tail[4..8].copy_from_slice(b"nope");
        push_response(&port, 3, 2, 0x0a, &wrong_tail);

        let session = Session::new(
            FakeFactory(port),
            PortConfig {
                path: Some("fake".into()),
                baud: 62_500,
            },
            Box::new(crate::uss::NoUss),
            Box::new(crate::notify::StderrNotifier),
        );

        let err = session.public_key().unwrap_err();
        assert!(matches!(err, SessionError::WrongAppLoaded));
    }
}

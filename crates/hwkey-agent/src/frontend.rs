//! The SSH agent connection handler: reads length-prefixed requests
//! off an accepted connection and drives the shared session to answer
//! them. All requests are serialized by one operation mutex so they
//! form a linear queue onto the single device session.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use hwkey_session::{DeviceFactory, Notifier, Session};

use crate::pubkey;
use crate::wire::{self, Request};

const TOUCH_NOTIFY_DELAY: Duration = Duration::from_secs(4);
const IDENTITY_COMMENT: &str = "TKey";

pub struct AgentServer<F: DeviceFactory> {
    session: Arc<Session<F>>,
    notifier: Arc<dyn Notifier>,
    operation: Mutex<()>,
}

impl<F: DeviceFactory + Send + Sync + 'static> AgentServer<F> {
    pub fn new(session: Arc<Session<F>>, notifier: Arc<dyn Notifier>) -> Self {
        AgentServer {
            session,
            notifier,
            operation: Mutex::new(()),
        }
    }

    /// Serve requests off one accepted connection until it closes.
    pub fn handle_connection<S: Read + Write>(&self, mut stream: S) {
        loop {
            let body = match wire::read_message(&mut stream) {
                Ok(body) => body,
                Err(_) => return,
            };
            let response = self.dispatch(&body);
            if wire::write_message(&mut stream, &response).is_err() {
                return;
            }
        }
    }

    fn dispatch(&self, body: &[u8]) -> Vec<u8> {
        let _op = self.operation.lock().unwrap();
        match wire::parse_request(body) {
            Request::RequestIdentities => self.request_identities(),
            Request::SignRequest { key_blob, data, .. } => self.sign_request(&key_blob, &data),
            Request::Unsupported => wire::failure(),
        }
    }

    fn request_identities(&self) -> Vec<u8> {
        match self.session.public_key() {
            Ok(pubkey) => {
                wire::identities_answer(&pubkey::public_key_blob(&pubkey), IDENTITY_COMMENT)
            }
            Err(e) => {
                log::warn!("device unreachable, reporting no identities: {e}");
                wire::empty_identities_answer()
            }
        }
    }

    fn sign_request(&self, key_blob: &[u8], data: &[u8]) -> Vec<u8> {
        let pubkey = match self.session.public_key() {
            Ok(pubkey) => pubkey,
            Err(e) => {
                log::warn!("sign request failed, device unreachable: {e}");
                return wire::failure();
            }
        };
        if pubkey::public_key_blob(&pubkey) != key_blob {
            log::warn!("sign request key blob does not match the device's public key");
            return wire::failure();
        }

        let done = Arc::new(AtomicBool::new(false));
        {
            let done = Arc::clone(&done);
            let notifier = Arc::clone(&self.notifier);
            thread::spawn(move || {
                thread::sleep(TOUCH_NOTIFY_DELAY);
                if !done.load(Ordering::SeqCst) {
                    notifier.notify("Touch your device to confirm signing.");
                }
            });
        }
        let result = self.session.sign(data, false);
        done.store(true, Ordering::SeqCst);

        match result {
            Ok(signature) => wire::sign_response(&pubkey::signature_blob(&signature)),
            Err(e) => {
                log::warn!("sign failed: {e}");
                wire::failure()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwkey_session::{PortConfig, Session, StderrNotifier};
    use hwkey_transport::testing::FakeSerialPort;
    use hwkey_transport::TransportError;

    struct UnreachableFactory;

    impl DeviceFactory for UnreachableFactory {
        type Io = FakeSerialPort;
        fn open(&self, _port: &str, _baud: u32) -> Result<Self::Io, TransportError> {
            Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no such device",
            )))
        }
    }

    fn unreachable_server() -> AgentServer<UnreachableFactory> {
        let session = Arc::new(Session::new(
            UnreachableFactory,
            PortConfig {
                path: Some("fake".into()),
                baud: 62_500,
            },
            Box::new(hwkey_session::NoUss),
            Box::new(StderrNotifier),
        ));
        AgentServer::new(session, Arc::new(StderrNotifier))
    }

    #[test]
    fn request_identities_is_empty_not_an_error_when_device_is_unreachable() {
        let server = unreachable_server();
        let response = server.dispatch(&[wire::msg::REQUEST_IDENTITIES]);
        assert_eq!(response, wire::empty_identities_answer());
    }

    #[test]
    fn sign_request_fails_closed_when_device_is_unreachable() {
        let server = unreachable_server();
        let mut req = vec![wire::msg::SIGN_REQUEST];
        wire::write_string(&mut req, &[0u8; 51]);
        wire::write_string(&mut req, b"hello");
        req.extend_from_slice(&0u32.to_be_bytes());

        let response = server.dispatch(&req);
        assert_eq!(response, wire::failure());
    }

    #[test]
    fn unsupported_request_returns_failure() {
        let server = unreachable_server();
        let response = server.dispatch(&[wire::msg::ADD_IDENTITY]);
        assert_eq!(response, wire::failure());
    }
}

//! SSH wire-format marshalling of the device's Ed25519 identity,
//! built on `ssh-key`'s own key and signature encoding rather than
//! hand-rolling RFC 4251 string framing a second time.

use ssh_encoding::Encode;
use ssh_key::public::{Ed25519PublicKey, KeyData};
use ssh_key::{Algorithm, Signature};

/// The SSH public-key blob (as used in `IDENTITIES_ANSWER` and to
/// match against an incoming `SIGN_REQUEST`'s key blob).
pub fn public_key_blob(pubkey: &[u8; 32]) -> Vec<u8> {
    let key_data = KeyData::Ed25519(Ed25519PublicKey(*pubkey));
    let mut blob = Vec::new();
    key_data
        .encode(&mut blob)
        .expect("encoding to a Vec never fails");
    blob
}

/// The SSH signature blob (algorithm name plus raw signature) embedded
/// in a `SIGN_RESPONSE`.
pub fn signature_blob(signature: &[u8; 64]) -> Vec<u8> {
    let sig = Signature::new(Algorithm::Ed25519, signature.to_vec())
        .expect("ed25519 signatures are always 64 bytes");
    let mut blob = Vec::new();
    sig.encode(&mut blob).expect("encoding to a Vec never fails");
    blob
}

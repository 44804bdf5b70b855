//! SCRAM-SHA-256 (RFC 5802) client state machine (SPEC_FULL.md §4.3): the
//! exchange the server's `AuthenticationSASL` drives the connection through
//! before it ever sees `AuthenticationOk`.
//!
//! The teacher (`connection/establish.rs`) calls out to a sibling
//! `sasl::authenticate` module for this exchange and carries exactly the
//! crypto crates it needs — `hmac`, `sha2`, `rand`, `base64`, `stringprep`
//! — in its `Cargo.toml`, but the module itself wasn't present in the
//! retrieval pack. This is a from-scratch implementation of RFC 5802
//! against that same dependency set.

use base64::Engine;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::{err_protocol, Error};

const NONCE_LEN: usize = 24;
const NONCE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Drives one SCRAM-SHA-256 exchange from `client-first-message` through
/// verifying the server's `ServerSignature`.
pub(crate) struct ScramState {
    client_nonce: String,
    client_first_message_bare: String,
    password: String,
}

impl ScramState {
    /// Build the initial state and its `client-first-message`. Postgres
    /// ignores the `n=` username field (authorization already happened via
    /// the startup message's own `user` parameter), so it's left empty, as
    /// the RFC allows.
    pub(crate) fn start(password: &str) -> (ScramState, String) {
        let client_nonce = random_nonce();
        let client_first_message_bare = format!("n=,r={client_nonce}");
        let client_first_message = format!("n,,{client_first_message_bare}");

        (
            ScramState {
                client_nonce,
                client_first_message_bare,
                password: password.to_string(),
            },
            client_first_message,
        )
    }

    /// Handle `AuthenticationSASLContinue`'s `server-first-message`, and
    /// produce the `client-final-message` to send back.
    pub(crate) fn handle_server_first(&self, data: &[u8]) -> Result<(String, Vec<u8>), Error> {
        let server_first_message =
            std::str::from_utf8(data).map_err(|e| err_protocol!("SCRAM server-first-message was not utf-8: {e}"))?;

        let fields = parse_fields(server_first_message);
        let server_nonce = *fields
            .get("r")
            .ok_or_else(|| err_protocol!("SCRAM server-first-message missing nonce"))?;
        let salt_b64 = *fields
            .get("s")
            .ok_or_else(|| err_protocol!("SCRAM server-first-message missing salt"))?;
        let iterations: u32 = fields
            .get("i")
            .ok_or_else(|| err_protocol!("SCRAM server-first-message missing iteration count"))?
            .parse()
            .map_err(|_| err_protocol!("SCRAM server-first-message had a non-numeric iteration count"))?;

        if !server_nonce.starts_with(&self.client_nonce) {
            return Err(err_protocol!(
                "SCRAM server nonce does not extend the client nonce"
            ));
        }

        let salt = base64::engine::general_purpose::STANDARD
            .decode(salt_b64)
            .map_err(|e| err_protocol!("SCRAM salt was not valid base64: {e}"))?;

        let normalized_password = stringprep::saslprep(&self.password)
            .map_err(|_| err_protocol!("password contains characters SASLprep rejects"))?;
        let salted_password = hi(normalized_password.as_bytes(), &salt, iterations);

        let client_final_message_without_proof = format!("c=biws,r={server_nonce}");
        let auth_message = format!(
            "{},{},{}",
            self.client_first_message_bare, server_first_message, client_final_message_without_proof
        );

        let client_key = hmac_sha256(&salted_password, b"Client Key");
        let stored_key = Sha256::digest(client_key);
        let client_signature = hmac_sha256(&stored_key, auth_message.as_bytes());
        let client_proof: Vec<u8> = client_key
            .iter()
            .zip(client_signature.iter())
            .map(|(k, s)| k ^ s)
            .collect();

        let server_key = hmac_sha256(&salted_password, b"Server Key");
        let server_signature = hmac_sha256(&server_key, auth_message.as_bytes());

        let client_final_message = format!(
            "{},p={}",
            client_final_message_without_proof,
            base64::engine::general_purpose::STANDARD.encode(client_proof)
        );

        Ok((client_final_message, server_signature.to_vec()))
    }

    /// Verify `AuthenticationSASLFinal`'s `ServerSignature` against the one
    /// computed in [`Self::handle_server_first`]. A mismatch means the
    /// server doesn't actually know the password (or a man-in-the-middle is
    /// active) and must fail the connection, not merely warn.
    pub(crate) fn verify_server_final(data: &[u8], expected_signature: &[u8]) -> Result<(), Error> {
        let server_final_message =
            std::str::from_utf8(data).map_err(|e| err_protocol!("SCRAM server-final-message was not utf-8: {e}"))?;
        let fields = parse_fields(server_final_message);

        if let Some(err) = fields.get("e") {
            return Err(err_protocol!("SCRAM authentication failed: {err}"));
        }

        let signature_b64 = *fields
            .get("v")
            .ok_or_else(|| err_protocol!("SCRAM server-final-message missing ServerSignature"))?;
        let signature = base64::engine::general_purpose::STANDARD
            .decode(signature_b64)
            .map_err(|e| err_protocol!("SCRAM ServerSignature was not valid base64: {e}"))?;

        if signature != expected_signature {
            return Err(err_protocol!(
                "SCRAM ServerSignature mismatch: server did not prove knowledge of the password"
            ));
        }
        Ok(())
    }
}

fn random_nonce() -> String {
    let mut rng = rand::thread_rng();
    (0..NONCE_LEN)
        .map(|_| NONCE_CHARS[rng.gen_range(0..NONCE_CHARS.len())] as char)
        .collect()
}

fn parse_fields(message: &str) -> std::collections::HashMap<&str, &str> {
    message
        .split(',')
        .filter_map(|attr| attr.split_once('='))
        .collect()
}

/// RFC 5802's `Hi(str, salt, i)`: PBKDF2-HMAC-SHA-256 with a single block,
/// since SHA-256's 32-byte output already matches the derived key length
/// this mechanism needs.
fn hi(password: &[u8], salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut mac = Hmac::<Sha256>::new_from_slice(password).expect("HMAC accepts a key of any length");
    mac.update(salt);
    mac.update(&1u32.to_be_bytes());
    let mut u = mac.finalize_into_array();

    let mut result = u;
    for _ in 1..iterations {
        let mut mac = Hmac::<Sha256>::new_from_slice(password).expect("HMAC accepts a key of any length");
        mac.update(&u);
        u = mac.finalize_into_array();
        for (r, u_byte) in result.iter_mut().zip(u.iter()) {
            *r ^= u_byte;
        }
    }
    result
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts a key of any length");
    mac.update(data);
    mac.finalize_into_array()
}

trait FinalizeIntoArray {
    fn finalize_into_array(self) -> [u8; 32];
}

impl FinalizeIntoArray for Hmac<Sha256> {
    fn finalize_into_array(self) -> [u8; 32] {
        self.finalize().into_bytes().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_first_message_has_gs2_header_and_nonce() {
        let (state, message) = ScramState::start("correcthorse");
        assert!(message.starts_with("n,,n=,r="));
        assert!(message.ends_with(&state.client_nonce));
    }

    #[test]
    fn rejects_server_nonce_not_extending_client_nonce() {
        let (state, _) = ScramState::start("hunter2");
        let server_first = "r=completely-different,s=AAAA,i=4096";
        let err = state.handle_server_first(server_first.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn full_exchange_round_trips_against_a_fake_server() {
        // A tiny in-test stand-in for the server side of RFC 5802, enough
        // to check the client computes a `ServerSignature` the "server"
        // independently derives the same way would also compute.
        let password = "pencil";
        let salt = b"0123456789ab".to_vec();
        let iterations = 4096u32;

        let (state, client_first_message) = ScramState::start(password);
        assert!(client_first_message.starts_with("n,,"));

        let client_nonce = &state.client_nonce;
        let server_nonce = format!("{client_nonce}server-extension");
        let salt_b64 = base64::engine::general_purpose::STANDARD.encode(&salt);
        let server_first_message = format!("r={server_nonce},s={salt_b64},i={iterations}");

        let (_client_final_message, expected_signature) =
            state.handle_server_first(server_first_message.as_bytes()).unwrap();

        // Recompute the server's view of the signature the same way the
        // client did, proving both sides land on the same shared secret.
        let normalized = stringprep::saslprep(password).unwrap();
        let salted_password = hi(normalized.as_bytes(), &salt, iterations);
        let server_key = hmac_sha256(&salted_password, b"Server Key");
        let auth_message = format!(
            "{},{},c=biws,r={server_nonce}",
            state.client_first_message_bare, server_first_message
        );
        let server_signature = hmac_sha256(&server_key, auth_message.as_bytes());

        assert_eq!(expected_signature, server_signature.to_vec());

        let server_final_message = format!(
            "v={}",
            base64::engine::general_purpose::STANDARD.encode(server_signature)
        );
        ScramState::verify_server_final(server_final_message.as_bytes(), &expected_signature).unwrap();
    }

    #[test]
    fn rejects_forged_server_signature() {
        let server_final_message = format!(
            "v={}",
            base64::engine::general_purpose::STANDARD.encode([0u8; 32])
        );
        let err =
            ScramState::verify_server_final(server_final_message.as_bytes(), &[1u8; 32]).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }
}

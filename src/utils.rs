//! Utility functions for Common Access Token

use crate::error::Error;
use ct_codecs::{Base64UrlSafeNoPadding, Decoder as _, Encoder as _, Hex};
use hmac_sha256::HMAC;
use rand::rngs::OsRng;
use rand::RngCore;

/// Compute an HMAC-SHA256 tag
pub fn compute_hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    HMAC::mac(data, key).to_vec()
}

/// Verify an HMAC-SHA256 tag in constant time
pub fn verify_hmac_sha256(key: &[u8], data: &[u8], tag: &[u8]) -> Result<(), Error> {
    let computed = HMAC::mac(data, key);

    if ct_codecs::verify(&computed, tag) {
        Ok(())
    } else {
        Err(Error::TagMismatch)
    }
}

/// Encode bytes as URL-safe base64 without padding
pub fn encode_base64url(data: &[u8]) -> Result<String, Error> {
    Base64UrlSafeNoPadding::encode_to_string(data).map_err(|_| Error::InvalidBase64)
}

/// Decode URL-safe base64 without padding
pub fn decode_base64url(input: &str) -> Result<Vec<u8>, Error> {
    Base64UrlSafeNoPadding::decode_to_vec(input, None).map_err(|_| Error::InvalidBase64)
}

/// Encode bytes as lowercase hex
pub fn encode_hex(data: &[u8]) -> Result<String, Error> {
    Hex::encode_to_string(data).map_err(|_| Error::InvalidHex)
}

/// Decode hex, accepting either case
pub fn decode_hex(input: &str) -> Result<Vec<u8>, Error> {
    Hex::decode_to_vec(input, None).map_err(|_| Error::InvalidHex)
}

/// Hex-encode `len` bytes from the process-wide CSPRNG
pub fn random_hex(len: usize) -> Result<String, Error> {
    let mut buf = vec![0u8; len];
    OsRng.fill_bytes(&mut buf);
    encode_hex(&buf)
}

/// Get current timestamp in seconds since Unix epoch
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs()
}

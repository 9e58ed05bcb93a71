//! # COSE_Mac0 envelope
//!
//! RFC 8152 §6.2: a MAC-protected message for a single recipient, encoded
//! as the four-element array `[protected: bstr, unprotected: map,
//! payload: bstr, tag: bstr]`. The MAC input is the CBOR encoding of
//! `["MAC0", protected, external_aad, payload]`; the unprotected header is
//! never part of it, and `external_aad` is empty in this profile.

use crate::cbor::{CborDecoder, CborEncoder, MajorType};
use crate::claims::ClaimValue;
use crate::error::Error;
use crate::header::{Header, HeaderMap, KeyId};
use crate::utils::{compute_hmac_sha256, verify_hmac_sha256};

/// A COSE_Mac0 structure.
///
/// Decoding preserves the protected-header and payload bytes exactly as
/// received, so verification recomputes the MAC over the peer's encoding
/// rather than a re-serialization.
#[derive(Debug, Clone)]
pub struct CoseMac0 {
    /// Parsed protected and unprotected header maps
    pub header: Header,
    /// Raw protected-header bytes as they appear in the MAC input
    protected_raw: Vec<u8>,
    /// Payload bytes (the CBOR-encoded claims map)
    pub payload: Vec<u8>,
    /// Authentication tag, 32 bytes for HMAC-SHA256
    pub tag: Vec<u8>,
}

impl CoseMac0 {
    /// Build a MAC-protected structure over `payload` with `key`.
    pub fn create(header: Header, payload: Vec<u8>, key: &[u8]) -> Result<Self, Error> {
        let protected_raw = encode_protected(&header.protected)?;
        let mac_input = mac_structure(&protected_raw, &payload)?;
        let tag = compute_hmac_sha256(key, &mac_input);

        Ok(Self {
            header,
            protected_raw,
            payload,
            tag,
        })
    }

    /// Recompute the MAC and compare it to the stored tag in constant
    /// time. Any mismatch is [`Error::TagMismatch`].
    pub fn verify_tag(&self, key: &[u8]) -> Result<(), Error> {
        let mac_input = mac_structure(&self.protected_raw, &self.payload)?;
        verify_hmac_sha256(key, &mac_input, &self.tag)
    }

    /// The key identifier from the headers, if any
    pub fn key_id(&self) -> Option<KeyId> {
        self.header.key_id()
    }

    /// Append the four-element array to an encoder
    pub fn encode(&self, enc: &mut CborEncoder) -> Result<(), Error> {
        enc.begin_array(4)?;
        enc.push_bytes(&self.protected_raw)?;
        encode_header_map(&self.header.unprotected, enc)?;
        enc.push_bytes(&self.payload)?;
        enc.push_bytes(&self.tag)?;
        enc.end_array()?;
        Ok(())
    }

    /// Read a four-element array from a decoder.
    ///
    /// The protected-header bytes are parsed eagerly so a malformed header
    /// fails here rather than after the tag check.
    pub fn decode(dec: &mut CborDecoder<'_>) -> Result<Self, Error> {
        match dec.read_array_header()? {
            Some(4) => {}
            Some(n) => {
                return Err(Error::InvalidFormat(format!(
                    "expected COSE_Mac0 array of 4 elements, got {n}"
                )))
            }
            None => {
                return Err(Error::InvalidFormat(
                    "COSE_Mac0 array must be definite-length".to_string(),
                ))
            }
        }

        let protected_raw = dec.read_bytes()?;
        let protected = decode_protected(&protected_raw)?;
        let unprotected = decode_header_map(dec)?;
        let payload = dec.read_bytes()?;
        let tag = dec.read_bytes()?;

        Ok(Self {
            header: Header {
                protected,
                unprotected,
            },
            protected_raw,
            payload,
            tag,
        })
    }

    /// Encode the structure to owned bytes, untagged
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut enc = CborEncoder::new();
        self.encode(&mut enc)?;
        enc.finish()
    }

    /// Parse an untagged structure from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let mut dec = CborDecoder::new(bytes);
        Self::decode(&mut dec)
    }
}

/// Encode a protected-header map as the bytes wrapped in the envelope's
/// protected bstr. An empty map encodes as a zero-length string.
fn encode_protected(map: &HeaderMap) -> Result<Vec<u8>, Error> {
    if map.is_empty() {
        return Ok(Vec::new());
    }
    let mut enc = CborEncoder::new();
    encode_header_map(map, &mut enc)?;
    enc.finish()
}

/// Parse protected-header bytes; a zero-length string is an empty map.
fn decode_protected(bytes: &[u8]) -> Result<HeaderMap, Error> {
    if bytes.is_empty() {
        return Ok(HeaderMap::new());
    }
    let mut dec = CborDecoder::new(bytes);
    decode_header_map(&mut dec)
}

/// The MAC input: CBOR array ["MAC0", protected, external_aad, payload].
fn mac_structure(protected_raw: &[u8], payload: &[u8]) -> Result<Vec<u8>, Error> {
    let mut enc = CborEncoder::new();
    enc.begin_array(4)?;
    enc.push_text("MAC0")?;
    enc.push_bytes(protected_raw)?;
    enc.push_bytes(&[])?;
    enc.push_bytes(payload)?;
    enc.end_array()?;
    enc.finish()
}

fn encode_header_map(map: &HeaderMap, enc: &mut CborEncoder) -> Result<(), Error> {
    enc.begin_map(map.len() as u64)?;
    for (label, value) in map {
        enc.push_int(*label)?;
        value.encode(enc)?;
    }
    enc.end_map()?;
    Ok(())
}

/// Read a header map, definite or indefinite. Header parameters whose
/// values fall outside the claim-value shapes are skipped rather than
/// rejected, so unknown extensions do not break decoding.
fn decode_header_map(dec: &mut CborDecoder<'_>) -> Result<HeaderMap, Error> {
    let mut map = HeaderMap::new();
    match dec.read_map_header()? {
        Some(len) => {
            for _ in 0..len {
                decode_header_entry(dec, &mut map)?;
            }
        }
        None => {
            while !dec.is_break_code()? {
                decode_header_entry(dec, &mut map)?;
            }
            dec.read_break()?;
        }
    }
    Ok(map)
}

fn decode_header_entry(dec: &mut CborDecoder<'_>, map: &mut HeaderMap) -> Result<(), Error> {
    let label = dec.read_i64()?;
    if dec.peek_major_type()? == MajorType::Simple {
        dec.skip()?;
        return Ok(());
    }
    map.insert(label, ClaimValue::decode(dec)?);
    Ok(())
}

//! # COSE headers for Common Access Token
//!
//! The header splits into a **protected** map, whose bytes are part of the
//! MAC input, and an **unprotected** map, which is not integrity-protected.
//! In this profile the algorithm lives in the protected header and the key
//! identifier in the unprotected header, though the accessors look in both
//! places, as RFC 8152 allows.

use crate::claims::{ClaimValue, ClaimsMap};
use crate::constants::{cose_algs, cose_labels};
use crate::error::Error;

/// Algorithms supported for token authentication.
///
/// Only HMAC-SHA256 is supported; COSE_Sign1 signature algorithms and the
/// unauthenticated profile are rejected with
/// [`Error::UnsupportedAlgorithm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// HMAC with SHA-256 (COSE algorithm identifier 5)
    HmacSha256,
}

impl Algorithm {
    /// COSE algorithm identifier
    pub fn identifier(&self) -> i64 {
        match self {
            Algorithm::HmacSha256 => cose_algs::HMAC_SHA_256,
        }
    }

    /// Resolve a COSE algorithm identifier
    pub fn from_identifier(id: i64) -> Result<Self, Error> {
        match id {
            cose_algs::HMAC_SHA_256 => Ok(Algorithm::HmacSha256),
            other => Err(Error::UnsupportedAlgorithm(other)),
        }
    }
}

/// Key identifier, either binary or text.
///
/// # Examples
///
/// ```
/// use cat_token::KeyId;
///
/// let text_kid = KeyId::string("Symmetric256");
/// let binary_kid = KeyId::binary(vec![0x01, 0x02, 0x03, 0x04]);
/// assert_eq!(text_kid.as_bytes(), b"Symmetric256");
/// assert_eq!(binary_kid.as_bytes(), &[1, 2, 3, 4]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyId {
    /// Binary key identifier
    Binary(Vec<u8>),
    /// Text key identifier
    String(String),
}

impl KeyId {
    /// Create a binary key identifier
    pub fn binary<T: Into<Vec<u8>>>(data: T) -> Self {
        KeyId::Binary(data.into())
    }

    /// Create a text key identifier
    pub fn string<T: Into<String>>(data: T) -> Self {
        KeyId::String(data.into())
    }

    /// The key identifier as bytes
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            KeyId::Binary(data) => data,
            KeyId::String(data) => data.as_bytes(),
        }
    }
}

/// Type alias for header maps
pub type HeaderMap = ClaimsMap;

/// Protected and unprotected header maps of a token.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    /// Protected header parameters, part of the MAC input
    pub protected: HeaderMap,
    /// Unprotected header parameters
    pub unprotected: HeaderMap,
}

impl Header {
    /// Create an empty header
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the algorithm in the protected header
    pub fn with_algorithm(mut self, alg: Algorithm) -> Self {
        self.protected
            .insert(cose_labels::ALG, ClaimValue::Integer(alg.identifier()));
        self
    }

    /// Set the key identifier in the protected header
    pub fn with_protected_key_id(mut self, kid: KeyId) -> Self {
        self.protected.insert(cose_labels::KID, kid_value(kid));
        self
    }

    /// Set the key identifier in the unprotected header
    pub fn with_unprotected_key_id(mut self, kid: KeyId) -> Self {
        self.unprotected.insert(cose_labels::KID, kid_value(kid));
        self
    }

    /// The algorithm, from the protected header first, then unprotected.
    ///
    /// `None` when neither header names one; an unknown identifier is an
    /// error.
    pub fn algorithm(&self) -> Result<Option<Algorithm>, Error> {
        let stored = self
            .protected
            .get(&cose_labels::ALG)
            .or_else(|| self.unprotected.get(&cose_labels::ALG));

        match stored {
            Some(ClaimValue::Integer(id)) => Algorithm::from_identifier(*id).map(Some),
            Some(_) => Err(Error::InvalidFormat(
                "algorithm header must be an integer".to_string(),
            )),
            None => Ok(None),
        }
    }

    /// The key identifier, from the protected header first, then
    /// unprotected
    pub fn key_id(&self) -> Option<KeyId> {
        let stored = self
            .protected
            .get(&cose_labels::KID)
            .or_else(|| self.unprotected.get(&cose_labels::KID));

        match stored {
            Some(ClaimValue::Bytes(data)) => Some(KeyId::Binary(data.clone())),
            Some(ClaimValue::Text(data)) => Some(KeyId::String(data.clone())),
            _ => None,
        }
    }
}

fn kid_value(kid: KeyId) -> ClaimValue {
    match kid {
        KeyId::Binary(data) => ClaimValue::Bytes(data),
        KeyId::String(data) => ClaimValue::Text(data),
    }
}

//! Error types for the Common Access Token library

use std::convert::Infallible;
use thiserror::Error;

/// Errors that can occur when issuing or verifying Common Access Tokens.
///
/// Variants group into the kinds a caller cares about: CBOR codec faults,
/// envelope faults, claim-schema violations, authorization failures, key
/// management failures, and bad input. Messages never contain key material
/// or full token bytes.
#[derive(Error, Debug)]
pub enum Error {
    /// Error during CBOR encoding
    #[error("CBOR encoding error: {0}")]
    CborEncode(#[from] minicbor::encode::Error<Infallible>),

    /// Error during CBOR decoding
    #[error("CBOR decode error: {0}")]
    CborDecode(minicbor::decode::Error),

    /// Read past the end of the input buffer
    #[error("unexpected end of CBOR input")]
    EndOfBuffer,

    /// The next CBOR item is not of the requested shape
    #[error("unexpected CBOR item: expected {expected}, found {found}")]
    UnexpectedCborType {
        /// Shape the caller asked for
        expected: &'static str,
        /// Shape actually present in the input
        found: &'static str,
    },

    /// A negative integer was read into an unsigned type
    #[error("negative CBOR integer read into an unsigned type")]
    NegativeValueInUnsignedType,

    /// The stored integer does not fit the requested width
    #[error("CBOR integer does not fit the requested type")]
    CborValueOutOfRange,

    /// The item head carries reserved additional-info bits
    #[error("unsupported CBOR additional info: {0}")]
    UnsupportedAdditionalInfo(u8),

    /// Containers were opened and closed unevenly
    #[error("CBOR containers were opened and closed unevenly")]
    UnbalancedContainers,

    /// A break code appeared outside an indefinite-length container
    #[error("break code outside an indefinite-length container")]
    InvalidBreak,

    /// The CWT tag (61) was expected but absent or wrong
    #[error("expected CWT tag (61)")]
    ExpectedCwtTag,

    /// The COSE_Mac0 tag (17) was expected but absent or wrong
    #[error("expected COSE_Mac0 tag (17)")]
    ExpectedCoseMac0Tag,

    /// Invalid token format
    #[error("invalid token format: {0}")]
    InvalidFormat(String),

    /// The authentication tag does not match the recomputed value
    #[error("authentication tag mismatch")]
    TagMismatch,

    /// Missing required claim
    #[error("missing required claim: {0}")]
    MissingClaim(&'static str),

    /// A claim carries the wrong kind of value for its label
    #[error("invalid claim value: {0}")]
    InvalidClaimValue(String),

    /// CATREPLAY holds a value outside {0, 1, 2}
    #[error("CATREPLAY value out of range: {0}")]
    CatReplayOutOfRange(i64),

    /// Token expired: the expiration time (exp) is not after the current time
    #[error("token expired")]
    TokenExpired,

    /// Token not yet valid: the not-before time (nbf) is in the future
    #[error("token not yet valid")]
    TokenNotYetValid,

    /// The issuer (iss) does not match the expected issuer
    #[error("issuer does not match the expected issuer")]
    InvalidIssuer,

    /// The audience (aud) does not match the expected audience
    #[error("audience does not match the expected audience")]
    InvalidAudience,

    /// A CATU component failed every one of its match rules
    #[error("URI claim rejected the request: {0}")]
    InvalidUriClaim(String),

    /// The HTTP method is not in the CATM allow-list
    #[error("method claim rejected the request: {0}")]
    InvalidMethodClaim(String),

    /// CATREPLAY prohibits replay and the token was seen before
    #[error("token replay is prohibited")]
    TokenReplayProhibited,

    /// The TLS fingerprint does not match the CATTPRINT claim
    #[error("TLS fingerprint claim rejected the request: {0}")]
    InvalidTlsFingerprintClaim(String),

    /// The token carries a restriction claim but the caller supplied no
    /// request context to check it against
    #[error("token restricts {0} but none was supplied for verification")]
    MissingVerificationContext(&'static str),

    /// No key is configured for the token's key id
    #[error("no key configured for key id {0:?}")]
    KeyNotFound(String),

    /// Invalid base64url input
    #[error("invalid base64url input")]
    InvalidBase64,

    /// Invalid hex input
    #[error("invalid hex input")]
    InvalidHex,

    /// The URI could not be parsed as an absolute URI
    #[error("invalid URI: {0}")]
    InvalidUri(String),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The token names an algorithm this profile does not support
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(i64),
}

impl From<minicbor::decode::Error> for Error {
    fn from(e: minicbor::decode::Error) -> Self {
        if e.is_end_of_input() {
            Error::EndOfBuffer
        } else {
            Error::CborDecode(e)
        }
    }
}

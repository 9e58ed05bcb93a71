//! # Common Access Token (CAT)
//!
//! Issue and verify Common Access Tokens (CTA-5007): compact binary
//! authorization tokens for the edge of content-delivery and media-serving
//! infrastructure. A CAT is a CWT (RFC 8392) whose payload is a map of
//! integer-labeled claims, wrapped in a COSE_Mac0 structure (RFC 8152)
//! authenticated with HMAC-SHA256, and serialized as URL-safe base64
//! without padding.
//!
//! ## Features
//!
//! - CBOR-encoded tokens, definite and indefinite length forms
//! - COSE_Mac0 with constant-time tag verification
//! - Registered CWT claims (issuer, subject, audience, expiration, ...)
//! - CAT restriction claims: URI components (CATU), HTTP methods (CATM),
//!   replay protection (CATREPLAY), TLS fingerprint pinning (CATTPRINT),
//!   plus constructors for the remaining CAT claim set
//! - Key-store based verification addressed by the token's key id
//!
//! ## Basic example
//!
//! ```
//! use cat_token::{
//!     verify_token, Algorithm, KeyId, KeyStore, RegisteredClaims, TokenBuilder,
//!     VerificationOptions,
//! };
//!
//! let key = b"my-secret-key-for-hmac-sha256";
//!
//! let token = TokenBuilder::new()
//!     .algorithm(Algorithm::HmacSha256)
//!     .key_id(KeyId::string("example-key"))
//!     .registered_claims(
//!         RegisteredClaims::new()
//!             .with_issuer("example-issuer")
//!             .with_audience("example-audience")
//!             .with_issued_at(1_700_000_000)
//!             .with_expiration(1_700_000_120),
//!     )
//!     .issue(key)
//!     .expect("failed to issue token");
//!
//! let keys = KeyStore::new().with_key("example-key", key.to_vec());
//! let options = VerificationOptions::new()
//!     .issuer("example-issuer")
//!     .audience("example-audience")
//!     .now(1_700_000_050);
//!
//! let claims = verify_token(&token, &keys, &options).expect("failed to verify token");
//! assert_eq!(claims.registered.iss.as_deref(), Some("example-issuer"));
//! ```
//!
//! ## Restriction claims
//!
//! ```
//! use cat_token::{
//!     cat_claims::catu, constants::uri_components, verify_token, Algorithm,
//!     FingerprintType, KeyId, KeyStore, RegisteredClaims, ReplayMode, TokenBuilder,
//!     VerificationOptions,
//! };
//! use std::collections::BTreeMap;
//!
//! let key = b"my-secret-key-for-hmac-sha256";
//!
//! let mut components = BTreeMap::new();
//! components.insert(uri_components::SCHEME, catu::exact_match("https"));
//! components.insert(uri_components::HOST, catu::suffix_match(".example.com"));
//!
//! let token = TokenBuilder::new()
//!     .algorithm(Algorithm::HmacSha256)
//!     .key_id(KeyId::string("example-key"))
//!     .registered_claims(
//!         RegisteredClaims::new()
//!             .with_issuer("example-issuer")
//!             .with_expiration(1_700_000_120),
//!     )
//!     .catu(components)
//!     .catm(vec!["GET", "HEAD"])
//!     .catreplay(ReplayMode::Prohibited)
//!     .cattprint(FingerprintType::Ja4, "t13d1516h2_8daaf6152771_b186095e22b6")
//!     .issue(key)
//!     .expect("failed to issue token");
//!
//! let keys = KeyStore::new().with_key("example-key", key.to_vec());
//! let options = VerificationOptions::new()
//!     .issuer("example-issuer")
//!     .now(1_700_000_050)
//!     .uri("https://api.example.com/api/users")
//!     .http_method("GET")
//!     .token_seen_before(false)
//!     .fingerprint(FingerprintType::Ja4, "t13d1516h2_8daaf6152771_b186095e22b6");
//!
//! verify_token(&token, &keys, &options).expect("failed to verify token");
//! ```

pub mod cat_claims;
pub mod cbor;
pub mod claims;
pub mod constants;
pub mod error;
pub mod header;
pub mod mac0;
pub mod token;
pub mod uri;
pub mod utils;

pub use cbor::{CborDecoder, CborEncoder, MajorType};
pub use claims::{ClaimValue, Claims, ClaimsMap, RegisteredClaims};
pub use constants::{
    cat_keys, cbor_tags, cose_algs, cose_labels, cwt_keys, match_types, replay_values,
    tprint_params, uri_components, FingerprintType, ReplayMode,
};
pub use error::Error;
pub use header::{Algorithm, Header, HeaderMap, KeyId};
pub use mac0::CoseMac0;
pub use token::{verify_token, KeyStore, Token, TokenBuilder, VerificationOptions};
pub use uri::UriComponents;
pub use utils::current_timestamp;

#[cfg(test)]
mod tests;

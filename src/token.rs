//! # Token pipeline for Common Access Token
//!
//! Issuing runs `Claims → CBOR payload → COSE_Mac0 → (optional CWT tag) →
//! base64url`. Verification runs the reverse, checking the authentication
//! tag before the payload is trusted, then evaluates the restriction claims
//! against the caller's request context.

use crate::cbor::{CborDecoder, CborEncoder, MajorType};
use crate::claims::{Claims, ClaimValue, RegisteredClaims};
use crate::constants::{cat_keys, cbor_tags, tprint_params, FingerprintType, ReplayMode};
use crate::error::Error;
use crate::header::{Algorithm, Header, KeyId};
use crate::mac0::CoseMac0;
use crate::uri::{component_matches, UriComponents};
use crate::utils::{current_timestamp, decode_base64url, encode_base64url, random_hex};
use std::collections::BTreeMap;

/// A signed Common Access Token.
#[derive(Debug, Clone)]
pub struct Token {
    /// The claims carried by the token
    pub claims: Claims,
    mac0: CoseMac0,
    tagged: bool,
}

impl Token {
    /// The protected and unprotected headers
    pub fn header(&self) -> &Header {
        &self.mac0.header
    }

    /// The issuer claim, if present
    pub fn issuer(&self) -> Option<&str> {
        self.claims.registered.iss.as_deref()
    }

    /// The audience claim, if present
    pub fn audience(&self) -> Option<&str> {
        self.claims.registered.aud.as_deref()
    }

    /// The expiration timestamp, if present
    pub fn expiration(&self) -> Option<u64> {
        self.claims.registered.exp
    }

    /// Whether the token has an expiration claim in the past
    pub fn is_expired(&self) -> bool {
        match self.claims.registered.exp {
            Some(exp) => current_timestamp() >= exp,
            None => false,
        }
    }

    /// Encode the token to CBOR bytes, with the CWT and COSE_Mac0 tags
    /// when the token was built with them.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut enc = CborEncoder::new();
        if self.tagged {
            enc.push_tag(cbor_tags::CWT)?;
            enc.push_tag(cbor_tags::COSE_MAC0)?;
        }
        self.mac0.encode(&mut enc)?;
        enc.finish()
    }

    /// Encode the token and wrap it in the base64url envelope.
    pub fn to_base64(&self) -> Result<String, Error> {
        encode_base64url(&self.to_bytes()?)
    }

    /// Decode a token from CBOR bytes without verifying it.
    ///
    /// Leading tags are tolerated and skipped; use [`verify_token`] for the
    /// strict, verifying path.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let mut dec = CborDecoder::new(bytes);
        let mut tagged = false;
        while dec.peek_major_type()? == MajorType::Tag {
            dec.read_tag()?;
            tagged = true;
        }
        let mac0 = CoseMac0::decode(&mut dec)?;
        let claims = Claims::from_cbor(&mac0.payload)?;
        Ok(Self {
            claims,
            mac0,
            tagged,
        })
    }

    /// Recompute and compare the authentication tag in constant time.
    pub fn verify(&self, key: &[u8]) -> Result<(), Error> {
        self.mac0.verify_tag(key)
    }
}

/// Builder for creating and signing tokens.
///
/// # Example
///
/// ```
/// use cat_token::{Algorithm, KeyId, RegisteredClaims, TokenBuilder};
///
/// let key = b"my-secret-key-for-hmac-sha256";
/// let token = TokenBuilder::new()
///     .algorithm(Algorithm::HmacSha256)
///     .key_id(KeyId::string("example-key"))
///     .registered_claims(
///         RegisteredClaims::new()
///             .with_issuer("example-issuer")
///             .with_expiration(1_700_000_120),
///     )
///     .sign(key)
///     .unwrap();
///
/// assert_eq!(token.issuer(), Some("example-issuer"));
/// ```
#[derive(Debug, Clone)]
pub struct TokenBuilder {
    header: Header,
    claims: Claims,
    use_cwt_tag: bool,
    generate_cwt_id: bool,
}

impl Default for TokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenBuilder {
    /// Create a builder producing CWT-tagged tokens without generated IDs
    pub fn new() -> Self {
        Self {
            header: Header::new(),
            claims: Claims::new(),
            use_cwt_tag: true,
            generate_cwt_id: false,
        }
    }

    /// Set the algorithm in the protected header
    pub fn algorithm(mut self, alg: Algorithm) -> Self {
        self.header = self.header.with_algorithm(alg);
        self
    }

    /// Set the key identifier in the unprotected header
    pub fn key_id(mut self, kid: KeyId) -> Self {
        self.header = self.header.with_unprotected_key_id(kid);
        self
    }

    /// Set the key identifier in the protected header
    pub fn protected_key_id(mut self, kid: KeyId) -> Self {
        self.header = self.header.with_protected_key_id(kid);
        self
    }

    /// Wrap the envelope in `tag(61, tag(17, ...))`; on by default
    pub fn cwt_tag(mut self, tagged: bool) -> Self {
        self.use_cwt_tag = tagged;
        self
    }

    /// Mint a CTI of 16 random bytes, hex-encoded, when the claims carry
    /// none
    pub fn generate_cwt_id(mut self, generate: bool) -> Self {
        self.generate_cwt_id = generate;
        self
    }

    /// Set the registered claims
    pub fn registered_claims(mut self, registered: RegisteredClaims) -> Self {
        self.claims = self.claims.with_registered_claims(registered);
        self
    }

    /// Replace the whole claims set
    pub fn claims(mut self, claims: Claims) -> Self {
        self.claims = claims;
        self
    }

    /// Add a custom claim with a string value
    pub fn custom_string<S: Into<String>>(mut self, key: i64, value: S) -> Self {
        self.claims = self.claims.with_custom_string(key, value);
        self
    }

    /// Add a custom claim with a binary value
    pub fn custom_binary<B: Into<Vec<u8>>>(mut self, key: i64, value: B) -> Self {
        self.claims = self.claims.with_custom_binary(key, value);
        self
    }

    /// Add a custom claim with an integer value
    pub fn custom_int(mut self, key: i64, value: i64) -> Self {
        self.claims = self.claims.with_custom_int(key, value);
        self
    }

    /// Add a custom claim with any claim value
    pub fn custom_claim(mut self, key: i64, value: ClaimValue) -> Self {
        self.claims = self.claims.with_custom_claim(key, value);
        self
    }

    /// Set the CATU claim
    pub fn catu(mut self, components: BTreeMap<i64, BTreeMap<i64, ClaimValue>>) -> Self {
        self.claims = self.claims.with_catu(components);
        self
    }

    /// Set the CATM claim
    pub fn catm(mut self, methods: Vec<&str>) -> Self {
        self.claims = self.claims.with_catm(methods);
        self
    }

    /// Set the CATREPLAY claim
    pub fn catreplay(mut self, mode: ReplayMode) -> Self {
        self.claims = self.claims.with_catreplay(mode);
        self
    }

    /// Set the CATTPRINT claim
    pub fn cattprint(mut self, fingerprint_type: FingerprintType, value: &str) -> Self {
        self.claims = self.claims.with_cattprint(fingerprint_type, value);
        self
    }

    /// Build and sign the token with `key`.
    pub fn sign(self, key: &[u8]) -> Result<Token, Error> {
        match self.header.algorithm()? {
            Some(Algorithm::HmacSha256) => {}
            None => {
                return Err(Error::InvalidFormat(
                    "no algorithm set in the header".to_string(),
                ))
            }
        }

        let mut claims = self.claims;
        if self.generate_cwt_id && claims.registered.cti.is_none() {
            claims.registered.cti = Some(random_hex(16)?.into_bytes());
        }

        let payload = claims.to_cbor()?;
        let mac0 = CoseMac0::create(self.header, payload, key)?;

        Ok(Token {
            claims,
            mac0,
            tagged: self.use_cwt_tag,
        })
    }

    /// Sign the token and wrap it in the base64url envelope.
    pub fn issue(self, key: &[u8]) -> Result<String, Error> {
        self.sign(key)?.to_base64()
    }
}

/// Verification keys, addressed by the text form of the token's key id.
#[derive(Debug, Clone, Default)]
pub struct KeyStore {
    keys: BTreeMap<String, Vec<u8>>,
}

impl KeyStore {
    /// Create an empty key store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key under a key id
    pub fn with_key<S: Into<String>, K: Into<Vec<u8>>>(mut self, kid: S, key: K) -> Self {
        self.keys.insert(kid.into(), key.into());
        self
    }

    /// Resolve a token's key id to key bytes
    fn lookup(&self, kid: &KeyId) -> Result<&[u8], Error> {
        let name = match kid {
            KeyId::String(s) => s.clone(),
            KeyId::Binary(b) => String::from_utf8_lossy(b).into_owned(),
        };
        self.keys
            .get(&name)
            .map(Vec::as_slice)
            .ok_or(Error::KeyNotFound(name))
    }
}

/// Options controlling claim verification and supplying request context.
///
/// The expected issuer is mandatory. Everything else is optional, but a
/// token carrying CATU, CATM, CATTPRINT, or a prohibiting CATREPLAY fails
/// closed when the matching context (URI, method, fingerprint, replay
/// signal) was not supplied.
#[derive(Debug, Clone)]
pub struct VerificationOptions {
    /// Require the `tag(61) tag(17)` wrapping; on by default
    pub expect_cwt_tag: bool,
    /// The current time in seconds; defaults to the system clock
    pub now: Option<u64>,
    /// Issuer the token must name (required)
    pub expected_issuer: Option<String>,
    /// Audience the token must name, when set
    pub expected_audience: Option<String>,
    /// Request URI checked against CATU
    pub uri: Option<String>,
    /// Request HTTP method checked against CATM
    pub http_method: Option<String>,
    /// Whether the replay oracle has seen this token before; `None` when
    /// no oracle signal is available
    pub token_seen_before: Option<bool>,
    /// TLS fingerprint of the requesting client, checked against CATTPRINT
    pub fingerprint: Option<(FingerprintType, String)>,
}

impl Default for VerificationOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl VerificationOptions {
    /// Create default options: CWT tag expected, no request context
    pub fn new() -> Self {
        Self {
            expect_cwt_tag: true,
            now: None,
            expected_issuer: None,
            expected_audience: None,
            uri: None,
            http_method: None,
            token_seen_before: None,
            fingerprint: None,
        }
    }

    /// Require or waive the CWT tag wrapping
    pub fn expect_cwt_tag(mut self, expect: bool) -> Self {
        self.expect_cwt_tag = expect;
        self
    }

    /// Fix the current time instead of reading the system clock
    pub fn now(mut self, now: u64) -> Self {
        self.now = Some(now);
        self
    }

    /// Set the expected issuer
    pub fn issuer<S: Into<String>>(mut self, issuer: S) -> Self {
        self.expected_issuer = Some(issuer.into());
        self
    }

    /// Set the expected audience
    pub fn audience<S: Into<String>>(mut self, audience: S) -> Self {
        self.expected_audience = Some(audience.into());
        self
    }

    /// Supply the request URI for CATU validation
    pub fn uri<S: Into<String>>(mut self, uri: S) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Supply the request HTTP method for CATM validation
    pub fn http_method<S: Into<String>>(mut self, method: S) -> Self {
        self.http_method = Some(method.into());
        self
    }

    /// Record whether the replay oracle has seen this token before
    pub fn token_seen_before(mut self, seen: bool) -> Self {
        self.token_seen_before = Some(seen);
        self
    }

    /// Supply the client TLS fingerprint for CATTPRINT validation
    pub fn fingerprint<S: Into<String>>(
        mut self,
        fingerprint_type: FingerprintType,
        value: S,
    ) -> Self {
        self.fingerprint = Some((fingerprint_type, value.into()));
        self
    }
}

/// Verify a base64url token end to end and return its claims.
///
/// The authentication tag is checked before the payload is parsed; no
/// claims are returned on any error path.
pub fn verify_token(
    token: &str,
    keys: &KeyStore,
    options: &VerificationOptions,
) -> Result<Claims, Error> {
    let bytes = decode_base64url(token)?;
    let mut dec = CborDecoder::new(&bytes);

    if options.expect_cwt_tag {
        if dec.peek_major_type()? != MajorType::Tag || dec.read_tag()? != cbor_tags::CWT {
            return Err(Error::ExpectedCwtTag);
        }
        if dec.peek_major_type()? != MajorType::Tag || dec.read_tag()? != cbor_tags::COSE_MAC0 {
            return Err(Error::ExpectedCoseMac0Tag);
        }
    } else {
        while dec.peek_major_type()? == MajorType::Tag {
            dec.read_tag()?;
        }
    }

    let mac0 = CoseMac0::decode(&mut dec)?;

    // An absent algorithm header is accepted as HS256, the only algorithm
    // of this profile; any other identifier is rejected.
    mac0.header.algorithm()?;

    let kid = mac0
        .key_id()
        .ok_or_else(|| Error::InvalidFormat("no key id in the token headers".to_string()))?;
    let key = keys.lookup(&kid)?;

    mac0.verify_tag(key)?;

    let claims = Claims::from_cbor(&mac0.payload)?;
    validate_restrictions(&claims, options)?;

    Ok(claims)
}

/// Run the claim checks in their fixed order: issuer, expiration,
/// audience, not-before, then CATU, CATM, CATREPLAY, CATTPRINT.
fn validate_restrictions(claims: &Claims, options: &VerificationOptions) -> Result<(), Error> {
    let now = options.now.unwrap_or_else(current_timestamp);

    let expected_iss = options.expected_issuer.as_ref().ok_or_else(|| {
        Error::InvalidArgument("an expected issuer must be configured".to_string())
    })?;
    match &claims.registered.iss {
        Some(iss) if iss == expected_iss => {}
        Some(_) => return Err(Error::InvalidIssuer),
        None => return Err(Error::MissingClaim("iss")),
    }

    if let Some(exp) = claims.registered.exp {
        if now >= exp {
            return Err(Error::TokenExpired);
        }
    }

    if let Some(expected_aud) = &options.expected_audience {
        match &claims.registered.aud {
            Some(aud) if aud == expected_aud => {}
            Some(_) => return Err(Error::InvalidAudience),
            None => return Err(Error::MissingClaim("aud")),
        }
    }

    if let Some(nbf) = claims.registered.nbf {
        if now < nbf {
            return Err(Error::TokenNotYetValid);
        }
    }

    if let Some(catu) = claims.custom.get(&cat_keys::CATU) {
        verify_catu_claim(catu, options)?;
    }

    if let Some(catm) = claims.custom.get(&cat_keys::CATM) {
        verify_catm_claim(catm, options)?;
    }

    if let Some(catreplay) = claims.custom.get(&cat_keys::CATREPLAY) {
        verify_catreplay_claim(catreplay, options)?;
    }

    if let Some(cattprint) = claims.custom.get(&cat_keys::CATTPRINT) {
        verify_cattprint_claim(cattprint, options)?;
    }

    Ok(())
}

/// Check every component the CATU claim declares against the request URI.
/// A component passes when at least one of its rules matches.
fn verify_catu_claim(claim: &ClaimValue, options: &VerificationOptions) -> Result<(), Error> {
    let uri = options
        .uri
        .as_deref()
        .ok_or(Error::MissingVerificationContext("a request URI"))?;
    let parts = UriComponents::parse(uri)?;

    let components = claim
        .as_map()
        .ok_or_else(|| Error::InvalidUriClaim("CATU claim is not a map".to_string()))?;

    for (component_id, rules) in components {
        let rules = rules.as_map().ok_or_else(|| {
            Error::InvalidUriClaim(format!(
                "match conditions for URI component {component_id} are not a map"
            ))
        })?;

        let value = parts.component(*component_id).ok_or_else(|| {
            Error::InvalidUriClaim(format!("unknown URI component {component_id}"))
        })?;

        if !component_matches(&value, rules) {
            return Err(Error::InvalidUriClaim(format!(
                "URI component {component_id} value {value:?} did not satisfy any match rule"
            )));
        }
    }

    Ok(())
}

/// Check the request method against the CATM allow-list,
/// ASCII-case-insensitively.
fn verify_catm_claim(claim: &ClaimValue, options: &VerificationOptions) -> Result<(), Error> {
    let method = options
        .http_method
        .as_deref()
        .ok_or(Error::MissingVerificationContext("an HTTP method"))?;

    let allowed = claim
        .as_array()
        .ok_or_else(|| Error::InvalidMethodClaim("CATM claim is not an array".to_string()))?;

    let permitted = allowed
        .iter()
        .filter_map(ClaimValue::as_text)
        .any(|m| m.eq_ignore_ascii_case(method));

    if !permitted {
        return Err(Error::InvalidMethodClaim(format!(
            "HTTP method {method:?} is not in the allow-list"
        )));
    }

    Ok(())
}

/// Apply the replay-protection mode with the caller's seen-before signal.
fn verify_catreplay_claim(claim: &ClaimValue, options: &VerificationOptions) -> Result<(), Error> {
    let value = claim.as_integer().ok_or_else(|| {
        Error::InvalidClaimValue("CATREPLAY claim is not an integer".to_string())
    })?;

    match ReplayMode::from_value(value) {
        Some(ReplayMode::Permitted) => Ok(()),
        Some(ReplayMode::Prohibited) => match options.token_seen_before {
            Some(true) => Err(Error::TokenReplayProhibited),
            Some(false) => Ok(()),
            None => Err(Error::MissingVerificationContext("a replay-oracle signal")),
        },
        // Reuse passes; the caller records the CTI and acts on later
        // sightings.
        Some(ReplayMode::ReuseDetection) => Ok(()),
        None => Err(Error::CatReplayOutOfRange(value)),
    }
}

/// Compare the client fingerprint against the pinned CATTPRINT claim: the
/// type as an integer, the value ASCII-case-insensitively.
fn verify_cattprint_claim(claim: &ClaimValue, options: &VerificationOptions) -> Result<(), Error> {
    let (expected_type, expected_value) = options
        .fingerprint
        .as_ref()
        .ok_or(Error::MissingVerificationContext("a TLS fingerprint"))?;

    let entries = claim.as_map().ok_or_else(|| {
        Error::InvalidTlsFingerprintClaim("CATTPRINT claim is not a map".to_string())
    })?;

    let stored_type = entries
        .get(&tprint_params::FINGERPRINT_TYPE)
        .and_then(ClaimValue::as_integer)
        .ok_or_else(|| {
            Error::InvalidTlsFingerprintClaim(
                "CATTPRINT claim is missing the fingerprint type".to_string(),
            )
        })?;

    let stored_value = entries
        .get(&tprint_params::FINGERPRINT_VALUE)
        .and_then(ClaimValue::as_text)
        .ok_or_else(|| {
            Error::InvalidTlsFingerprintClaim(
                "CATTPRINT claim is missing the fingerprint value".to_string(),
            )
        })?;

    if stored_type != expected_type.identifier() {
        return Err(Error::InvalidTlsFingerprintClaim(
            "fingerprint type does not match the pinned type".to_string(),
        ));
    }

    if !stored_value.eq_ignore_ascii_case(expected_value) {
        return Err(Error::InvalidTlsFingerprintClaim(
            "fingerprint value does not match the pinned value".to_string(),
        ));
    }

    Ok(())
}

//! # Claims for Common Access Token
//!
//! Claims divide into two groups:
//!
//! - **Registered claims**: the RFC 8392 set — issuer, subject, audience,
//!   expiration, not-before, issued-at, CWT ID, and confirmation.
//! - **Custom claims**: everything else, keyed by integer label. The CAT
//!   restriction claims (CATU, CATM, CATREPLAY, CATTPRINT and friends) live
//!   here; [`crate::cat_claims`] builds their values.
//!
//! A claims set is created empty, populated through the typed setters,
//! serialized atomically with [`Claims::to_cbor`], and reconstituted with
//! [`Claims::from_cbor`]. Parsing validates the claim schema: time claims
//! are non-negative, CATREPLAY is in range, CATM is a non-empty array of
//! text, CATU match maps are non-empty, CATTPRINT carries both subfields.

use crate::cbor::{CborDecoder, CborEncoder, MajorType};
use crate::constants::{cat_keys, cwt_keys, tprint_params, FingerprintType, ReplayMode};
use crate::error::Error;
use std::collections::BTreeMap;

/// A CBOR-encodable claim value.
///
/// Claim values own their buffers and their container items; cloning is
/// deep. Map equality is key-based and independent of insertion order,
/// and map entries always serialize in ascending key order.
///
/// # Examples
///
/// ```
/// use cat_token::ClaimValue;
/// use std::collections::BTreeMap;
///
/// let mut map = BTreeMap::new();
/// map.insert(1, ClaimValue::Text("nested".to_string()));
/// let value = ClaimValue::Map(map);
/// assert!(value.as_map().is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimValue {
    /// Signed 64-bit integer
    Integer(i64),
    /// UTF-8 text string
    Text(String),
    /// Byte string
    Bytes(Vec<u8>),
    /// Array of claim values, in insertion order
    Array(Vec<ClaimValue>),
    /// Map from integer label to claim value
    Map(BTreeMap<i64, ClaimValue>),
}

impl ClaimValue {
    /// The integer value, if this is an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ClaimValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// The text value, if this is a text string
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ClaimValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The bytes, if this is a byte string
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ClaimValue::Bytes(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    /// The items, if this is an array
    pub fn as_array(&self) -> Option<&[ClaimValue]> {
        match self {
            ClaimValue::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// The entries, if this is a map
    pub fn as_map(&self) -> Option<&BTreeMap<i64, ClaimValue>> {
        match self {
            ClaimValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Append this value to an encoder, recursing through containers.
    pub(crate) fn encode(&self, enc: &mut CborEncoder) -> Result<(), Error> {
        match self {
            ClaimValue::Integer(i) => {
                enc.push_int(*i)?;
            }
            ClaimValue::Text(s) => {
                enc.push_text(s)?;
            }
            ClaimValue::Bytes(b) => {
                enc.push_bytes(b)?;
            }
            ClaimValue::Array(items) => {
                enc.begin_array(items.len() as u64)?;
                for item in items {
                    item.encode(enc)?;
                }
                enc.end_array()?;
            }
            ClaimValue::Map(entries) => {
                enc.begin_map(entries.len() as u64)?;
                for (key, value) in entries {
                    enc.push_int(*key)?;
                    value.encode(enc)?;
                }
                enc.end_map()?;
            }
        }
        Ok(())
    }

    /// Read one value from a decoder, recursing through nested arrays and
    /// maps of any depth. Tag heads are read through transparently.
    pub(crate) fn decode(dec: &mut CborDecoder<'_>) -> Result<Self, Error> {
        match dec.peek_major_type()? {
            MajorType::UnsignedInteger | MajorType::NegativeInteger => {
                Ok(ClaimValue::Integer(dec.read_i64()?))
            }
            MajorType::ByteString => Ok(ClaimValue::Bytes(dec.read_bytes()?)),
            MajorType::TextString => Ok(ClaimValue::Text(dec.read_text()?)),
            MajorType::Array => {
                let mut items = Vec::new();
                match dec.read_array_header()? {
                    Some(len) => {
                        for _ in 0..len {
                            items.push(ClaimValue::decode(dec)?);
                        }
                    }
                    None => {
                        while !dec.is_break_code()? {
                            items.push(ClaimValue::decode(dec)?);
                        }
                        dec.read_break()?;
                    }
                }
                Ok(ClaimValue::Array(items))
            }
            MajorType::Map => Ok(ClaimValue::Map(decode_claims_map(dec)?)),
            MajorType::Tag => {
                dec.read_tag()?;
                ClaimValue::decode(dec)
            }
            MajorType::Simple => Err(Error::UnexpectedCborType {
                expected: "claim value",
                found: "simple or float",
            }),
        }
    }
}

/// Read a map of integer-labeled claim values, definite or indefinite.
pub(crate) fn decode_claims_map(dec: &mut CborDecoder<'_>) -> Result<ClaimsMap, Error> {
    let mut map = ClaimsMap::new();
    match dec.read_map_header()? {
        Some(len) => {
            for _ in 0..len {
                let key = dec.read_i64()?;
                map.insert(key, ClaimValue::decode(dec)?);
            }
        }
        None => {
            while !dec.is_break_code()? {
                let key = dec.read_i64()?;
                map.insert(key, ClaimValue::decode(dec)?);
            }
            dec.read_break()?;
        }
    }
    Ok(map)
}

/// Type alias for claims maps
pub type ClaimsMap = BTreeMap<i64, ClaimValue>;

/// Standard registered claims as defined in RFC 8392.
///
/// # Example
///
/// ```
/// use cat_token::RegisteredClaims;
///
/// let claims = RegisteredClaims::new()
///     .with_issuer("example-issuer")
///     .with_subject("user-123")
///     .with_expiration(1_700_000_120);
///
/// assert_eq!(claims.iss, Some("example-issuer".to_string()));
/// assert_eq!(claims.exp, Some(1_700_000_120));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisteredClaims {
    /// Issuer: the principal that issued the token
    pub iss: Option<String>,
    /// Subject: the principal the token is about
    pub sub: Option<String>,
    /// Audience: the recipients the token is intended for
    pub aud: Option<String>,
    /// Expiration time in seconds since the Unix epoch
    pub exp: Option<u64>,
    /// Not-before time in seconds since the Unix epoch
    pub nbf: Option<u64>,
    /// Issued-at time in seconds since the Unix epoch
    pub iat: Option<u64>,
    /// CWT ID: unique identifier for the token
    pub cti: Option<Vec<u8>>,
    /// Confirmation claim: proof-of-possession key material
    pub cnf: Option<ClaimsMap>,
}

impl RegisteredClaims {
    /// Create an empty set of registered claims
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the issuer claim
    pub fn with_issuer<S: Into<String>>(mut self, iss: S) -> Self {
        self.iss = Some(iss.into());
        self
    }

    /// Set the subject claim
    pub fn with_subject<S: Into<String>>(mut self, sub: S) -> Self {
        self.sub = Some(sub.into());
        self
    }

    /// Set the audience claim
    pub fn with_audience<S: Into<String>>(mut self, aud: S) -> Self {
        self.aud = Some(aud.into());
        self
    }

    /// Set the expiration time claim (seconds since the Unix epoch)
    pub fn with_expiration(mut self, exp: u64) -> Self {
        self.exp = Some(exp);
        self
    }

    /// Set the not-before claim (seconds since the Unix epoch)
    pub fn with_not_before(mut self, nbf: u64) -> Self {
        self.nbf = Some(nbf);
        self
    }

    /// Set the issued-at claim (seconds since the Unix epoch)
    pub fn with_issued_at(mut self, iat: u64) -> Self {
        self.iat = Some(iat);
        self
    }

    /// Set the CWT ID claim
    pub fn with_cti<T: Into<Vec<u8>>>(mut self, cti: T) -> Self {
        self.cti = Some(cti.into());
        self
    }

    /// Set the confirmation claim
    pub fn with_cnf(mut self, cnf: ClaimsMap) -> Self {
        self.cnf = Some(cnf);
        self
    }

    /// Convert the registered claims into a claims map
    pub fn to_map(&self) -> ClaimsMap {
        let mut map = ClaimsMap::new();

        if let Some(iss) = &self.iss {
            map.insert(cwt_keys::ISS, ClaimValue::Text(iss.clone()));
        }

        if let Some(sub) = &self.sub {
            map.insert(cwt_keys::SUB, ClaimValue::Text(sub.clone()));
        }

        if let Some(aud) = &self.aud {
            map.insert(cwt_keys::AUD, ClaimValue::Text(aud.clone()));
        }

        if let Some(exp) = self.exp {
            map.insert(cwt_keys::EXP, ClaimValue::Integer(exp as i64));
        }

        if let Some(nbf) = self.nbf {
            map.insert(cwt_keys::NBF, ClaimValue::Integer(nbf as i64));
        }

        if let Some(iat) = self.iat {
            map.insert(cwt_keys::IAT, ClaimValue::Integer(iat as i64));
        }

        if let Some(cti) = &self.cti {
            map.insert(cwt_keys::CTI, ClaimValue::Bytes(cti.clone()));
        }

        if let Some(cnf) = &self.cnf {
            map.insert(cwt_keys::CNF, ClaimValue::Map(cnf.clone()));
        }

        map
    }

    /// Extract the registered claims from a claims map, checking that each
    /// present label carries the right kind of value.
    pub fn from_map(map: &ClaimsMap) -> Result<Self, Error> {
        let mut claims = Self::new();

        claims.iss = text_claim(map, cwt_keys::ISS, "iss")?;
        claims.sub = text_claim(map, cwt_keys::SUB, "sub")?;
        claims.aud = text_claim(map, cwt_keys::AUD, "aud")?;
        claims.exp = time_claim(map, cwt_keys::EXP, "exp")?;
        claims.nbf = time_claim(map, cwt_keys::NBF, "nbf")?;
        claims.iat = time_claim(map, cwt_keys::IAT, "iat")?;

        claims.cti = match map.get(&cwt_keys::CTI) {
            Some(ClaimValue::Bytes(b)) => Some(b.clone()),
            Some(_) => {
                return Err(Error::InvalidClaimValue(
                    "cti must be a byte string".to_string(),
                ))
            }
            None => None,
        };

        claims.cnf = match map.get(&cwt_keys::CNF) {
            Some(ClaimValue::Map(m)) => Some(m.clone()),
            Some(_) => return Err(Error::InvalidClaimValue("cnf must be a map".to_string())),
            None => None,
        };

        Ok(claims)
    }
}

fn text_claim(map: &ClaimsMap, key: i64, name: &str) -> Result<Option<String>, Error> {
    match map.get(&key) {
        Some(ClaimValue::Text(s)) => Ok(Some(s.clone())),
        Some(_) => Err(Error::InvalidClaimValue(format!(
            "{name} must be a text string"
        ))),
        None => Ok(None),
    }
}

fn time_claim(map: &ClaimsMap, key: i64, name: &str) -> Result<Option<u64>, Error> {
    match map.get(&key) {
        Some(ClaimValue::Integer(i)) if *i >= 0 => Ok(Some(*i as u64)),
        Some(_) => Err(Error::InvalidClaimValue(format!(
            "{name} must be a non-negative integer"
        ))),
        None => Ok(None),
    }
}

/// Claims for a Common Access Token.
///
/// Combines the registered claims with custom integer-labeled claims. A
/// claims set is immutable once handed to the token pipeline: signing takes
/// it by value.
///
/// # Example
///
/// ```
/// use cat_token::{Claims, RegisteredClaims, ReplayMode};
///
/// let claims = Claims::new()
///     .with_registered_claims(
///         RegisteredClaims::new()
///             .with_issuer("example-issuer")
///             .with_expiration(1_700_000_120),
///     )
///     .with_catm(vec!["GET", "HEAD"])
///     .with_catreplay(ReplayMode::Prohibited);
///
/// assert_eq!(claims.registered.iss, Some("example-issuer".to_string()));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Claims {
    /// Standard registered claims as defined in RFC 8392
    pub registered: RegisteredClaims,
    /// Custom claims with integer labels, including the CAT restriction set
    pub custom: ClaimsMap,
}

impl Claims {
    /// Create an empty claims set
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the registered claims
    pub fn with_registered_claims(mut self, registered: RegisteredClaims) -> Self {
        self.registered = registered;
        self
    }

    /// Add a custom claim with a string value
    pub fn with_custom_string<S: Into<String>>(mut self, key: i64, value: S) -> Self {
        self.custom.insert(key, ClaimValue::Text(value.into()));
        self
    }

    /// Add a custom claim with a binary value
    pub fn with_custom_binary<B: Into<Vec<u8>>>(mut self, key: i64, value: B) -> Self {
        self.custom.insert(key, ClaimValue::Bytes(value.into()));
        self
    }

    /// Add a custom claim with an integer value
    pub fn with_custom_int(mut self, key: i64, value: i64) -> Self {
        self.custom.insert(key, ClaimValue::Integer(value));
        self
    }

    /// Add a custom claim with an array value
    pub fn with_custom_array(mut self, key: i64, value: Vec<ClaimValue>) -> Self {
        self.custom.insert(key, ClaimValue::Array(value));
        self
    }

    /// Add a custom claim with a nested map value
    pub fn with_custom_map(mut self, key: i64, value: ClaimsMap) -> Self {
        self.custom.insert(key, ClaimValue::Map(value));
        self
    }

    /// Add a custom claim with any claim value
    pub fn with_custom_claim(mut self, key: i64, value: ClaimValue) -> Self {
        self.custom.insert(key, value);
        self
    }

    /// Set the CATU claim: URI component restrictions.
    ///
    /// `components` maps a URI component identifier to its match map; see
    /// [`crate::cat_claims::catu`] for match-map constructors.
    pub fn with_catu(mut self, components: BTreeMap<i64, BTreeMap<i64, ClaimValue>>) -> Self {
        self.custom
            .insert(cat_keys::CATU, crate::cat_claims::catu::create(components));
        self
    }

    /// Set the CATM claim: the HTTP method allow-list
    pub fn with_catm(mut self, methods: Vec<&str>) -> Self {
        self.custom.insert(
            cat_keys::CATM,
            ClaimValue::Array(crate::cat_claims::catm::create(methods)),
        );
        self
    }

    /// Set the CATREPLAY claim: the replay-protection mode
    pub fn with_catreplay(mut self, mode: ReplayMode) -> Self {
        self.custom
            .insert(cat_keys::CATREPLAY, ClaimValue::Integer(mode.value()));
        self
    }

    /// Set the CATTPRINT claim: TLS fingerprint pinning
    pub fn with_cattprint(mut self, fingerprint_type: FingerprintType, value: &str) -> Self {
        self.custom.insert(
            cat_keys::CATTPRINT,
            crate::cat_claims::cattprint::create(fingerprint_type, value),
        );
        self
    }

    /// Set the CATNIP claim: allowed network addresses
    pub fn with_catnip(mut self, addresses: Vec<&str>) -> Self {
        self.custom.insert(
            cat_keys::CATNIP,
            ClaimValue::Array(crate::cat_claims::catnip::create(addresses)),
        );
        self
    }

    /// Set the CATV claim: the CAT specification version
    pub fn with_catv(mut self, version: i64) -> Self {
        self.custom
            .insert(cat_keys::CATV, crate::cat_claims::catv::with_version(version));
        self
    }

    /// Get a custom claim as a string
    pub fn get_custom_string(&self, key: i64) -> Option<&str> {
        self.custom.get(&key).and_then(ClaimValue::as_text)
    }

    /// Get a custom claim as an integer
    pub fn get_custom_int(&self, key: i64) -> Option<i64> {
        self.custom.get(&key).and_then(ClaimValue::as_integer)
    }

    /// Get a custom claim as binary data
    pub fn get_custom_binary(&self, key: i64) -> Option<&[u8]> {
        self.custom.get(&key).and_then(ClaimValue::as_bytes)
    }

    /// Get a reference to a custom claim value
    pub fn get_custom_claim(&self, key: i64) -> Option<&ClaimValue> {
        self.custom.get(&key)
    }

    /// Check whether a custom claim exists
    pub fn has_custom_claim(&self, key: i64) -> bool {
        self.custom.contains_key(&key)
    }

    /// Combine registered and custom claims into one map
    pub fn to_map(&self) -> ClaimsMap {
        let mut map = self.registered.to_map();

        for (key, value) in &self.custom {
            map.insert(*key, value.clone());
        }

        map
    }

    /// Build a claims set from a combined map, splitting out the registered
    /// labels and validating the claim schema.
    pub fn from_map(map: &ClaimsMap) -> Result<Self, Error> {
        let registered = RegisteredClaims::from_map(map)?;

        let mut custom = ClaimsMap::new();
        for (key, value) in map {
            if !matches!(
                *key,
                cwt_keys::ISS
                    | cwt_keys::SUB
                    | cwt_keys::AUD
                    | cwt_keys::EXP
                    | cwt_keys::NBF
                    | cwt_keys::IAT
                    | cwt_keys::CTI
                    | cwt_keys::CNF
            ) {
                custom.insert(*key, value.clone());
            }
        }

        let claims = Self { registered, custom };
        claims.validate_schema()?;
        Ok(claims)
    }

    /// Serialize the claims to a CBOR map with one entry per claim.
    pub fn to_cbor(&self) -> Result<Vec<u8>, Error> {
        self.validate_schema()?;

        let map = self.to_map();
        let mut enc = CborEncoder::new();
        enc.begin_map(map.len() as u64)?;
        for (key, value) in &map {
            enc.push_int(*key)?;
            value.encode(&mut enc)?;
        }
        enc.end_map()?;
        enc.finish()
    }

    /// Parse a claims set from its CBOR map encoding.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, Error> {
        let mut dec = CborDecoder::new(bytes);
        let map = decode_claims_map(&mut dec)?;
        Self::from_map(&map)
    }

    /// Check the structural invariants of the CAT restriction claims.
    ///
    /// Runs on every parse and before every signing, so malformed
    /// restriction claims never leave or enter the pipeline.
    pub fn validate_schema(&self) -> Result<(), Error> {
        match self.custom.get(&cat_keys::CATREPLAY) {
            Some(ClaimValue::Integer(v)) => {
                if ReplayMode::from_value(*v).is_none() {
                    return Err(Error::CatReplayOutOfRange(*v));
                }
            }
            Some(_) => {
                return Err(Error::InvalidClaimValue(
                    "CATREPLAY must be an integer".to_string(),
                ))
            }
            None => {}
        }

        match self.custom.get(&cat_keys::CATM) {
            Some(ClaimValue::Array(methods)) => {
                if methods.is_empty() {
                    return Err(Error::InvalidClaimValue(
                        "CATM must list at least one method".to_string(),
                    ));
                }
                if !methods.iter().all(|m| m.as_text().is_some()) {
                    return Err(Error::InvalidClaimValue(
                        "CATM entries must be text strings".to_string(),
                    ));
                }
            }
            Some(_) => {
                return Err(Error::InvalidClaimValue(
                    "CATM must be an array".to_string(),
                ))
            }
            None => {}
        }

        match self.custom.get(&cat_keys::CATU) {
            Some(ClaimValue::Map(components)) => {
                for (component, rules) in components {
                    match rules {
                        ClaimValue::Map(rules) if !rules.is_empty() => {}
                        _ => {
                            return Err(Error::InvalidClaimValue(format!(
                                "CATU component {component} must carry a non-empty match map"
                            )))
                        }
                    }
                }
            }
            Some(_) => {
                return Err(Error::InvalidClaimValue("CATU must be a map".to_string()))
            }
            None => {}
        }

        match self.custom.get(&cat_keys::CATTPRINT) {
            Some(ClaimValue::Map(entries)) => {
                match entries.get(&tprint_params::FINGERPRINT_TYPE) {
                    Some(ClaimValue::Integer(t)) if FingerprintType::from_identifier(*t).is_some() => {}
                    _ => {
                        return Err(Error::InvalidClaimValue(
                            "CATTPRINT must carry a known integer fingerprint type".to_string(),
                        ))
                    }
                }
                match entries.get(&tprint_params::FINGERPRINT_VALUE) {
                    Some(ClaimValue::Text(_)) => {}
                    _ => {
                        return Err(Error::InvalidClaimValue(
                            "CATTPRINT must carry a text fingerprint value".to_string(),
                        ))
                    }
                }
            }
            Some(_) => {
                return Err(Error::InvalidClaimValue(
                    "CATTPRINT must be a map".to_string(),
                ))
            }
            None => {}
        }

        Ok(())
    }
}

//! # Constants for Common Access Token
//!
//! Centralized label registry: CWT claim keys, CAT-specific claim keys, URI
//! component identifiers, match-type codes, replay values, fingerprint
//! parameters, COSE header labels and algorithm identifiers, and the CBOR
//! tag numbers of the token envelope.

/// CAT-specific claim keys
pub mod cat_keys {
    /// Common Access Token Replay (catreplay) claim key
    pub const CATREPLAY: i64 = 308;
    /// Common Access Token Probability of Rejection (catpor) claim key
    pub const CATPOR: i64 = 309;
    /// Common Access Token Version (catv) claim key
    pub const CATV: i64 = 310;
    /// Common Access Token Network IP (catnip) claim key
    pub const CATNIP: i64 = 311;
    /// Common Access Token URI (catu) claim key
    pub const CATU: i64 = 312;
    /// Common Access Token Methods (catm) claim key
    pub const CATM: i64 = 313;
    /// Common Access Token ALPN (catalpn) claim key
    pub const CATALPN: i64 = 314;
    /// Common Access Token Header (cath) claim key
    pub const CATH: i64 = 315;
    /// Common Access Token Geographic ISO3166 (catgeoiso3166) claim key
    pub const CATGEOISO3166: i64 = 316;
    /// Common Access Token Geographic Coordinate (catgeocoord) claim key
    pub const CATGEOCOORD: i64 = 317;
    /// Common Access Token Altitude (catgeoalt) claim key
    pub const CATGEOALT: i64 = 318;
    /// Common Access Token TLS Public Key (cattpk) claim key
    pub const CATTPK: i64 = 319;
    /// Common Access Token If Data (catifdata) claim key
    pub const CATIFDATA: i64 = 320;
    /// Common Access Token DPoP Settings (catdpop) claim key
    pub const CATDPOP: i64 = 321;
    /// Common Access Token If (catif) claim key
    pub const CATIF: i64 = 322;
    /// Common Access Token Renewal (catr) claim key
    pub const CATR: i64 = 323;
    /// Common Access Token TLS Fingerprint (cattprint) claim key
    pub const CATTPRINT: i64 = 324;
}

/// CWT claim keys as defined in RFC 8392
pub mod cwt_keys {
    /// Issuer claim key
    pub const ISS: i64 = 1;
    /// Subject claim key
    pub const SUB: i64 = 2;
    /// Audience claim key
    pub const AUD: i64 = 3;
    /// Expiration time claim key
    pub const EXP: i64 = 4;
    /// Not before claim key
    pub const NBF: i64 = 5;
    /// Issued at claim key
    pub const IAT: i64 = 6;
    /// CWT ID claim key
    pub const CTI: i64 = 7;
    /// Confirmation claim key
    pub const CNF: i64 = 8;
}

/// URI component identifiers for CATU claim
pub mod uri_components {
    /// Scheme (RFC 3986 Section 3.1)
    pub const SCHEME: i64 = 0;
    /// Host (RFC 3986 Section 3.2.2)
    pub const HOST: i64 = 1;
    /// Port (RFC 3986 Section 3.2.3)
    pub const PORT: i64 = 2;
    /// Path (RFC 3986 Section 3.3)
    pub const PATH: i64 = 3;
    /// Query (RFC 3986 Section 3.4)
    pub const QUERY: i64 = 4;
    /// Parent path, up to and including the final slash
    pub const PARENT_PATH: i64 = 5;
    /// Filename, the path segment after the final slash
    pub const FILENAME: i64 = 6;
    /// Filename without its extension
    pub const STEM: i64 = 7;
    /// Filename extension, without the leading dot
    pub const EXTENSION: i64 = 8;
}

/// Match-type codes used inside CATU match maps
pub mod match_types {
    /// Exact text match
    pub const EXACT: i64 = 0;
    /// Prefix match
    pub const PREFIX: i64 = 1;
    /// Suffix match
    pub const SUFFIX: i64 = 2;
    /// Contains match
    pub const CONTAINS: i64 = 3;
    /// Regular expression match (reserved; rules of this kind never match)
    pub const REGEX: i64 = 4;
    /// SHA-256 digest match
    pub const SHA256: i64 = -1;
    /// SHA-512/256 digest match
    pub const SHA512_256: i64 = -2;
}

/// CATREPLAY values
pub mod replay_values {
    /// Replay is permitted
    pub const PERMITTED: i64 = 0;
    /// Replay is prohibited
    pub const PROHIBITED: i64 = 1;
    /// Reuse detection: replay passes, the caller records the CWT ID
    pub const REUSE_DETECTION: i64 = 2;
}

/// Parameter labels inside the CATTPRINT claim map
pub mod tprint_params {
    /// TLS fingerprint type (integer identifier)
    pub const FINGERPRINT_TYPE: i64 = 0;
    /// TLS fingerprint value (text)
    pub const FINGERPRINT_VALUE: i64 = 1;
}

/// Renewal types for CATR claim
pub mod renewal_types {
    /// Automatic renewal
    pub const AUTOMATIC: i64 = 0;
    /// Cookie renewal
    pub const COOKIE: i64 = 1;
    /// Header renewal
    pub const HEADER: i64 = 2;
    /// Redirect renewal
    pub const REDIRECT: i64 = 3;
}

/// Renewal parameter labels for CATR claim
pub mod renewal_params {
    /// Renewal type
    pub const TYPE: i64 = 0;
    /// Expiration extension
    pub const EXPADD: i64 = 1;
    /// Renewal deadline
    pub const DEADLINE: i64 = 2;
    /// Name for cookie
    pub const COOKIE_NAME: i64 = 3;
    /// Name for header
    pub const HEADER_NAME: i64 = 4;
    /// Additional cookie parameters
    pub const COOKIE_PARAMS: i64 = 5;
    /// Additional header parameters
    pub const HEADER_PARAMS: i64 = 6;
    /// Status code for redirects
    pub const STATUS_CODE: i64 = 7;
}

/// COSE header parameter labels
pub mod cose_labels {
    /// Algorithm (protected or unprotected header)
    pub const ALG: i64 = 1;
    /// Key identifier (protected or unprotected header)
    pub const KID: i64 = 4;
}

/// COSE algorithm identifiers
pub mod cose_algs {
    /// HMAC with SHA-256
    pub const HMAC_SHA_256: i64 = 5;
}

/// CBOR tag numbers of the token envelope
pub mod cbor_tags {
    /// CWT tag (RFC 8392)
    pub const CWT: u64 = 61;
    /// COSE_Mac0 tag (RFC 8152)
    pub const COSE_MAC0: u64 = 17;
}

/// TLS fingerprint types usable in a CATTPRINT claim.
///
/// The wire representation is the integer identifier, covering the JA3 and
/// JA4 fingerprint families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintType {
    /// JA3 client fingerprint
    Ja3,
    /// JA3S server fingerprint
    Ja3s,
    /// JA4 TLS client fingerprint
    Ja4,
    /// JA4S TLS server fingerprint
    Ja4s,
    /// JA4H HTTP client fingerprint
    Ja4h,
    /// JA4L light-distance (latency) fingerprint
    Ja4l,
    /// JA4LS light-distance server fingerprint
    Ja4ls,
    /// JA4X X.509 certificate fingerprint
    Ja4x,
    /// JA4SSH SSH traffic fingerprint
    Ja4ssh,
    /// JA4T TCP client fingerprint
    Ja4t,
    /// JA4TS TCP server fingerprint
    Ja4ts,
    /// JA4TScan active TCP scan fingerprint
    Ja4tscan,
    /// JA4D DHCP fingerprint
    Ja4d,
}

impl FingerprintType {
    /// Integer identifier used on the wire
    pub fn identifier(&self) -> i64 {
        match self {
            FingerprintType::Ja3 => 0,
            FingerprintType::Ja3s => 1,
            FingerprintType::Ja4 => 2,
            FingerprintType::Ja4s => 3,
            FingerprintType::Ja4h => 4,
            FingerprintType::Ja4l => 5,
            FingerprintType::Ja4ls => 6,
            FingerprintType::Ja4x => 7,
            FingerprintType::Ja4ssh => 8,
            FingerprintType::Ja4t => 9,
            FingerprintType::Ja4ts => 10,
            FingerprintType::Ja4tscan => 11,
            FingerprintType::Ja4d => 12,
        }
    }

    /// Create a FingerprintType from its wire identifier
    pub fn from_identifier(id: i64) -> Option<Self> {
        match id {
            0 => Some(FingerprintType::Ja3),
            1 => Some(FingerprintType::Ja3s),
            2 => Some(FingerprintType::Ja4),
            3 => Some(FingerprintType::Ja4s),
            4 => Some(FingerprintType::Ja4h),
            5 => Some(FingerprintType::Ja4l),
            6 => Some(FingerprintType::Ja4ls),
            7 => Some(FingerprintType::Ja4x),
            8 => Some(FingerprintType::Ja4ssh),
            9 => Some(FingerprintType::Ja4t),
            10 => Some(FingerprintType::Ja4ts),
            11 => Some(FingerprintType::Ja4tscan),
            12 => Some(FingerprintType::Ja4d),
            _ => None,
        }
    }
}

/// Replay-protection modes carried by the CATREPLAY claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayMode {
    /// Replay is permitted; verification always passes
    Permitted,
    /// Replay is prohibited; a token seen before is rejected
    Prohibited,
    /// Reuse is detected but allowed; the caller records the CWT ID
    ReuseDetection,
}

impl ReplayMode {
    /// Integer value used on the wire
    pub fn value(&self) -> i64 {
        match self {
            ReplayMode::Permitted => replay_values::PERMITTED,
            ReplayMode::Prohibited => replay_values::PROHIBITED,
            ReplayMode::ReuseDetection => replay_values::REUSE_DETECTION,
        }
    }

    /// Create a ReplayMode from its wire value
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            replay_values::PERMITTED => Some(ReplayMode::Permitted),
            replay_values::PROHIBITED => Some(ReplayMode::Prohibited),
            replay_values::REUSE_DETECTION => Some(ReplayMode::ReuseDetection),
            _ => None,
        }
    }
}

//! # CAT-specific claim constructors
//!
//! Helper modules that build well-typed [`ClaimValue`] trees for the claims
//! defined by the CAT specification. Each helper returns a value ready to be
//! attached under its claim key from [`crate::constants::cat_keys`].
//!
//! ```
//! use cat_token::{cat_claims::catu, constants::uri_components, Claims};
//! use std::collections::BTreeMap;
//!
//! let mut components = BTreeMap::new();
//! components.insert(uri_components::SCHEME, catu::exact_match("https"));
//! components.insert(uri_components::HOST, catu::suffix_match(".example.com"));
//!
//! let claims = Claims::new().with_catu(components);
//! assert!(claims.has_custom_claim(cat_token::constants::cat_keys::CATU));
//! ```

use crate::claims::ClaimValue;
use std::collections::BTreeMap;

/// Constructors for CATU (URI restriction) match maps
pub mod catu {
    use super::*;
    use crate::constants::match_types;

    /// Build a CATU claim from component-id → match-map entries
    pub fn create(components: BTreeMap<i64, BTreeMap<i64, ClaimValue>>) -> ClaimValue {
        let mut map = BTreeMap::new();
        for (component, rules) in components {
            map.insert(component, ClaimValue::Map(rules));
        }
        ClaimValue::Map(map)
    }

    /// Match map requiring an exact value
    pub fn exact_match(text: &str) -> BTreeMap<i64, ClaimValue> {
        let mut map = BTreeMap::new();
        map.insert(match_types::EXACT, ClaimValue::Text(text.to_string()));
        map
    }

    /// Match map requiring a prefix
    pub fn prefix_match(prefix: &str) -> BTreeMap<i64, ClaimValue> {
        let mut map = BTreeMap::new();
        map.insert(match_types::PREFIX, ClaimValue::Text(prefix.to_string()));
        map
    }

    /// Match map requiring a suffix
    pub fn suffix_match(suffix: &str) -> BTreeMap<i64, ClaimValue> {
        let mut map = BTreeMap::new();
        map.insert(match_types::SUFFIX, ClaimValue::Text(suffix.to_string()));
        map
    }

    /// Match map requiring a contained substring
    pub fn contains_match(text: &str) -> BTreeMap<i64, ClaimValue> {
        let mut map = BTreeMap::new();
        map.insert(match_types::CONTAINS, ClaimValue::Text(text.to_string()));
        map
    }

    /// Match map requiring a SHA-256 digest of the component value
    pub fn sha256_match(digest: Vec<u8>) -> BTreeMap<i64, ClaimValue> {
        let mut map = BTreeMap::new();
        map.insert(match_types::SHA256, ClaimValue::Bytes(digest));
        map
    }

    /// Match map requiring a SHA-512/256 digest of the component value
    pub fn sha512_256_match(digest: Vec<u8>) -> BTreeMap<i64, ClaimValue> {
        let mut map = BTreeMap::new();
        map.insert(match_types::SHA512_256, ClaimValue::Bytes(digest));
        map
    }
}

/// Constructors for CATM (HTTP method allow-list) claims
pub mod catm {
    use super::*;

    /// Build the method array for a CATM claim
    pub fn create(methods: Vec<&str>) -> Vec<ClaimValue> {
        methods
            .into_iter()
            .map(|m| ClaimValue::Text(m.to_string()))
            .collect()
    }
}

/// Constructors for CATREPLAY claims
pub mod catreplay {
    use super::*;
    use crate::constants::ReplayMode;

    /// CATREPLAY value for a replay mode
    pub fn create(mode: ReplayMode) -> ClaimValue {
        ClaimValue::Integer(mode.value())
    }

    /// Replay permitted
    pub fn permitted() -> ClaimValue {
        create(ReplayMode::Permitted)
    }

    /// Replay prohibited
    pub fn prohibited() -> ClaimValue {
        create(ReplayMode::Prohibited)
    }

    /// Reuse detection
    pub fn reuse_detection() -> ClaimValue {
        create(ReplayMode::ReuseDetection)
    }
}

/// Constructors for CATTPRINT (TLS fingerprint) claims
pub mod cattprint {
    use super::*;
    use crate::constants::{tprint_params, FingerprintType};

    /// Build a CATTPRINT claim pinning a fingerprint type and value
    pub fn create(fingerprint_type: FingerprintType, value: &str) -> ClaimValue {
        let mut params = BTreeMap::new();
        params.insert(
            tprint_params::FINGERPRINT_TYPE,
            ClaimValue::Integer(fingerprint_type.identifier()),
        );
        params.insert(
            tprint_params::FINGERPRINT_VALUE,
            ClaimValue::Text(value.to_string()),
        );
        ClaimValue::Map(params)
    }
}

/// Constructors for CATR (token renewal) claims
pub mod catr {
    use super::*;
    use crate::constants::{renewal_params, renewal_types};

    /// Build a CATR claim from renewal parameters
    pub fn create(params: BTreeMap<i64, ClaimValue>) -> ClaimValue {
        ClaimValue::Map(params)
    }

    /// Automatic renewal: extend expiration by `exp_add` seconds
    pub fn automatic_renewal(exp_add: i64, deadline: Option<i64>) -> BTreeMap<i64, ClaimValue> {
        let mut map = BTreeMap::new();
        map.insert(
            renewal_params::TYPE,
            ClaimValue::Integer(renewal_types::AUTOMATIC),
        );
        map.insert(renewal_params::EXPADD, ClaimValue::Integer(exp_add));

        if let Some(deadline) = deadline {
            map.insert(renewal_params::DEADLINE, ClaimValue::Integer(deadline));
        }

        map
    }

    /// Cookie-based renewal
    pub fn cookie_renewal(
        exp_add: i64,
        deadline: Option<i64>,
        cookie_name: Option<&str>,
        additional_params: Option<Vec<&str>>,
    ) -> BTreeMap<i64, ClaimValue> {
        let mut map = BTreeMap::new();
        map.insert(
            renewal_params::TYPE,
            ClaimValue::Integer(renewal_types::COOKIE),
        );
        map.insert(renewal_params::EXPADD, ClaimValue::Integer(exp_add));

        if let Some(deadline) = deadline {
            map.insert(renewal_params::DEADLINE, ClaimValue::Integer(deadline));
        }

        if let Some(name) = cookie_name {
            map.insert(
                renewal_params::COOKIE_NAME,
                ClaimValue::Text(name.to_string()),
            );
        }

        if let Some(params) = additional_params {
            map.insert(
                renewal_params::COOKIE_PARAMS,
                ClaimValue::Array(
                    params
                        .into_iter()
                        .map(|p| ClaimValue::Text(p.to_string()))
                        .collect(),
                ),
            );
        }

        map
    }

    /// Header-based renewal
    pub fn header_renewal(
        exp_add: i64,
        deadline: Option<i64>,
        header_name: Option<&str>,
        additional_params: Option<Vec<&str>>,
    ) -> BTreeMap<i64, ClaimValue> {
        let mut map = BTreeMap::new();
        map.insert(
            renewal_params::TYPE,
            ClaimValue::Integer(renewal_types::HEADER),
        );
        map.insert(renewal_params::EXPADD, ClaimValue::Integer(exp_add));

        if let Some(deadline) = deadline {
            map.insert(renewal_params::DEADLINE, ClaimValue::Integer(deadline));
        }

        if let Some(name) = header_name {
            map.insert(
                renewal_params::HEADER_NAME,
                ClaimValue::Text(name.to_string()),
            );
        }

        if let Some(params) = additional_params {
            map.insert(
                renewal_params::HEADER_PARAMS,
                ClaimValue::Array(
                    params
                        .into_iter()
                        .map(|p| ClaimValue::Text(p.to_string()))
                        .collect(),
                ),
            );
        }

        map
    }

    /// Redirect-based renewal
    pub fn redirect_renewal(
        exp_add: i64,
        deadline: Option<i64>,
        status_code: Option<i64>,
    ) -> BTreeMap<i64, ClaimValue> {
        let mut map = BTreeMap::new();
        map.insert(
            renewal_params::TYPE,
            ClaimValue::Integer(renewal_types::REDIRECT),
        );
        map.insert(renewal_params::EXPADD, ClaimValue::Integer(exp_add));

        if let Some(deadline) = deadline {
            map.insert(renewal_params::DEADLINE, ClaimValue::Integer(deadline));
        }

        if let Some(code) = status_code {
            map.insert(renewal_params::STATUS_CODE, ClaimValue::Integer(code));
        }

        map
    }
}

/// Constructors for CATV (specification version) claims
pub mod catv {
    use super::*;

    /// CATV claim for version 1
    pub fn create() -> ClaimValue {
        ClaimValue::Integer(1)
    }

    /// CATV claim for a specific version
    pub fn with_version(version: i64) -> ClaimValue {
        ClaimValue::Integer(version)
    }
}

/// Constructors for CATPOR (probability of rejection) claims
pub mod catpor {
    use super::*;

    /// CATPOR claim with a rejection probability in percent (0-100)
    pub fn create(probability_percent: i64) -> ClaimValue {
        ClaimValue::Integer(probability_percent)
    }
}

/// Constructors for CATNIP (network IP restriction) claims
pub mod catnip {
    use super::*;

    /// CATNIP claim listing allowed addresses or ranges
    pub fn create(addresses: Vec<&str>) -> Vec<ClaimValue> {
        addresses
            .into_iter()
            .map(|ip| ClaimValue::Text(ip.to_string()))
            .collect()
    }

    /// CATNIP claim for a single address
    pub fn single(address: &str) -> Vec<ClaimValue> {
        vec![ClaimValue::Text(address.to_string())]
    }
}

/// Constructors for CATALPN (TLS ALPN restriction) claims
pub mod catalpn {
    use super::*;

    /// CATALPN claim listing allowed ALPN protocols
    pub fn create(protocols: Vec<&str>) -> Vec<ClaimValue> {
        protocols
            .into_iter()
            .map(|proto| ClaimValue::Text(proto.to_string()))
            .collect()
    }
}

/// Constructors for CATH (HTTP header requirement) claims
pub mod cath {
    use super::*;

    /// CATH claim from header name-value pairs
    pub fn create(headers: BTreeMap<&str, &str>) -> ClaimValue {
        let mut map = BTreeMap::new();
        for (i, (name, value)) in headers.iter().enumerate() {
            let mut header_map = BTreeMap::new();
            header_map.insert(0, ClaimValue::Text(name.to_string()));
            header_map.insert(1, ClaimValue::Text(value.to_string()));
            map.insert(i as i64, ClaimValue::Map(header_map));
        }
        ClaimValue::Map(map)
    }
}

/// Constructors for CATGEOISO3166 (country restriction) claims
pub mod catgeoiso3166 {
    use super::*;

    /// CATGEOISO3166 claim listing ISO 3166 country codes
    pub fn create(country_codes: Vec<&str>) -> Vec<ClaimValue> {
        country_codes
            .into_iter()
            .map(|code| ClaimValue::Text(code.to_string()))
            .collect()
    }
}

/// Constructors for CATGEOCOORD (coordinate restriction) claims
pub mod catgeocoord {
    use super::*;

    /// CATGEOCOORD claim; coordinates are scaled by 1e7 to integers
    pub fn create(latitude: f64, longitude: f64) -> ClaimValue {
        let mut map = BTreeMap::new();
        map.insert(0, ClaimValue::Integer((latitude * 10_000_000.0) as i64));
        map.insert(1, ClaimValue::Integer((longitude * 10_000_000.0) as i64));
        ClaimValue::Map(map)
    }

    /// CATGEOCOORD claim with a radius in meters
    pub fn with_radius(latitude: f64, longitude: f64, radius_meters: i64) -> ClaimValue {
        let mut map = BTreeMap::new();
        map.insert(0, ClaimValue::Integer((latitude * 10_000_000.0) as i64));
        map.insert(1, ClaimValue::Integer((longitude * 10_000_000.0) as i64));
        map.insert(2, ClaimValue::Integer(radius_meters));
        ClaimValue::Map(map)
    }
}

/// Constructors for CATGEOALT (altitude restriction) claims
pub mod catgeoalt {
    use super::*;

    /// CATGEOALT claim with altitude in meters
    pub fn create(altitude_meters: i64) -> ClaimValue {
        ClaimValue::Integer(altitude_meters)
    }

    /// CATGEOALT claim with an altitude range in meters
    pub fn range(min_meters: i64, max_meters: i64) -> ClaimValue {
        let mut map = BTreeMap::new();
        map.insert(0, ClaimValue::Integer(min_meters));
        map.insert(1, ClaimValue::Integer(max_meters));
        ClaimValue::Map(map)
    }
}

/// Constructors for CATTPK (TLS public key pinning) claims
pub mod cattpk {
    use super::*;

    /// CATTPK claim pinning one public key hash
    pub fn create(public_key_hash: Vec<u8>) -> ClaimValue {
        ClaimValue::Bytes(public_key_hash)
    }

    /// CATTPK claim pinning several public key hashes
    pub fn multiple(public_key_hashes: Vec<Vec<u8>>) -> Vec<ClaimValue> {
        public_key_hashes.into_iter().map(ClaimValue::Bytes).collect()
    }
}

/// Constructors for CATDPOP (proof-of-possession settings) claims
pub mod catdpop {
    use super::*;

    /// CATDPOP claim from a settings map
    pub fn create(config: BTreeMap<i64, ClaimValue>) -> ClaimValue {
        ClaimValue::Map(config)
    }

    /// CATDPOP claim marking DPoP as required
    pub fn required() -> ClaimValue {
        let mut map = BTreeMap::new();
        map.insert(0, ClaimValue::Integer(1));
        ClaimValue::Map(map)
    }
}

/// Constructors for CATIF (conditional handling) claims
pub mod catif {
    use super::*;

    /// CATIF claim from a condition map
    pub fn create(condition: BTreeMap<i64, ClaimValue>) -> ClaimValue {
        ClaimValue::Map(condition)
    }
}

/// Constructors for CATIFDATA (conditional evaluation data) claims
pub mod catifdata {
    use super::*;

    /// CATIFDATA claim from a data map
    pub fn create(data: BTreeMap<i64, ClaimValue>) -> ClaimValue {
        ClaimValue::Map(data)
    }
}

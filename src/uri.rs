//! # URI components for CATU validation
//!
//! Splits an absolute URI into the components addressable by a CATU claim
//! and evaluates match rules against them. A component passes when at least
//! one of its rules matches; the match kinds are exact, prefix, suffix,
//! contains, and the two digest kinds. The regex kind is reserved and never
//! matches.

use crate::claims::ClaimValue;
use crate::constants::{match_types, uri_components};
use crate::error::Error;
use hmac_sha256::Hash as Sha256Hash;
use hmac_sha512::Hash as Sha512Hash;
use std::collections::BTreeMap;
use url::Url;

/// The components of an absolute URI addressable by a CATU claim.
///
/// ```
/// use cat_token::uri::UriComponents;
///
/// let uri = UriComponents::parse("https://api.example.com:8443/v1/segments/a.tar.gz?x=1").unwrap();
/// assert_eq!(uri.scheme, "https");
/// assert_eq!(uri.host, "api.example.com");
/// assert_eq!(uri.port, Some(8443));
/// assert_eq!(uri.parent_path, "/v1/segments/");
/// assert_eq!(uri.filename, "a.tar.gz");
/// assert_eq!(uri.stem, "a.tar");
/// assert_eq!(uri.extension, "gz");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriComponents {
    /// Scheme, without the `://` separator
    pub scheme: String,
    /// Host; empty for URIs without an authority
    pub host: String,
    /// Port; the scheme's well-known default applies when none is written
    pub port: Option<u16>,
    /// Path, beginning at the authority terminator
    pub path: String,
    /// Query, between `?` and `#`; empty when absent
    pub query: String,
    /// Path prefix up to and including the final slash
    pub parent_path: String,
    /// Path suffix after the final slash
    pub filename: String,
    /// Filename up to the last dot, when that dot is neither the first nor
    /// the last character; otherwise the whole filename
    pub stem: String,
    /// Filename suffix after the last dot, under the same guard; no
    /// leading dot
    pub extension: String,
}

impl UriComponents {
    /// Parse an absolute URI into its components.
    pub fn parse(uri: &str) -> Result<Self, Error> {
        let parsed = Url::parse(uri).map_err(|_| Error::InvalidUri(uri.to_string()))?;

        let path = parsed.path().to_string();
        let (parent_path, filename) = match path.rfind('/') {
            Some(i) => (path[..=i].to_string(), path[i + 1..].to_string()),
            None => (String::new(), path.clone()),
        };
        let (stem, extension) = split_filename(&filename);

        Ok(Self {
            scheme: parsed.scheme().to_string(),
            host: parsed.host_str().unwrap_or("").to_string(),
            port: parsed.port_or_known_default(),
            path,
            query: parsed.query().unwrap_or("").to_string(),
            parent_path,
            filename,
            stem,
            extension,
        })
    }

    /// The value of a CATU component identifier, stringified for matching.
    ///
    /// `None` for identifiers this implementation does not know.
    pub fn component(&self, id: i64) -> Option<String> {
        match id {
            uri_components::SCHEME => Some(self.scheme.clone()),
            uri_components::HOST => Some(self.host.clone()),
            uri_components::PORT => {
                Some(self.port.map(|p| p.to_string()).unwrap_or_default())
            }
            uri_components::PATH => Some(self.path.clone()),
            uri_components::QUERY => Some(self.query.clone()),
            uri_components::PARENT_PATH => Some(self.parent_path.clone()),
            uri_components::FILENAME => Some(self.filename.clone()),
            uri_components::STEM => Some(self.stem.clone()),
            uri_components::EXTENSION => Some(self.extension.clone()),
            _ => None,
        }
    }
}

/// Split a filename at its last dot, guarding against leading and trailing
/// dots: `.profile` has no extension, and neither does `archive.`.
fn split_filename(filename: &str) -> (String, String) {
    match filename.rfind('.') {
        Some(i) if i > 0 && i + 1 < filename.len() => {
            (filename[..i].to_string(), filename[i + 1..].to_string())
        }
        _ => (filename.to_string(), String::new()),
    }
}

/// Whether at least one rule in a CATU match map accepts the component
/// value.
pub(crate) fn component_matches(value: &str, rules: &BTreeMap<i64, ClaimValue>) -> bool {
    rules
        .iter()
        .any(|(kind, pattern)| rule_matches(value, *kind, pattern))
}

fn rule_matches(value: &str, kind: i64, pattern: &ClaimValue) -> bool {
    match kind {
        match_types::EXACT => matches!(pattern, ClaimValue::Text(t) if value == t),
        match_types::PREFIX => {
            matches!(pattern, ClaimValue::Text(t) if value.starts_with(t.as_str()))
        }
        match_types::SUFFIX => {
            matches!(pattern, ClaimValue::Text(t) if value.ends_with(t.as_str()))
        }
        match_types::CONTAINS => {
            matches!(pattern, ClaimValue::Text(t) if value.contains(t.as_str()))
        }
        match_types::SHA256 => match pattern {
            ClaimValue::Bytes(digest) => {
                ct_codecs::verify(&Sha256Hash::hash(value.as_bytes()), digest)
            }
            _ => false,
        },
        match_types::SHA512_256 => match pattern {
            ClaimValue::Bytes(digest) => {
                let hash = Sha512Hash::hash(value.as_bytes());
                ct_codecs::verify(&hash[..32], digest)
            }
            _ => false,
        },
        // The regex kind (4) is reserved and inert; unknown kinds never
        // match either.
        _ => false,
    }
}

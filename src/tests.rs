//! Tests for Common Access Token

use crate::cat_claims::{cath, catr, catu};
use crate::cbor::{CborDecoder, CborEncoder};
use crate::claims::{ClaimValue, Claims, RegisteredClaims};
use crate::constants::{cat_keys, match_types, uri_components, FingerprintType, ReplayMode};
use crate::error::Error;
use crate::header::{Algorithm, Header, KeyId};
use crate::mac0::CoseMac0;
use crate::token::{verify_token, KeyStore, Token, TokenBuilder, VerificationOptions};
use crate::uri::UriComponents;
use crate::utils::{decode_base64url, decode_hex, encode_base64url, encode_hex};
use std::collections::BTreeMap;

/// RFC 8392 Appendix A.2.2 256-bit symmetric key
const KEY_HEX: &str = "403697de87af64611c1d32a05dab0fe1fcb715a86ab435f1ec99192d79569388";
const KID: &str = "Symmetric256";
const NOW: u64 = 1_700_000_050;

fn test_key() -> Vec<u8> {
    decode_hex(KEY_HEX).expect("bad key fixture")
}

fn test_keystore(key: &[u8]) -> KeyStore {
    KeyStore::new().with_key(KID, key.to_vec())
}

fn base_registered_claims() -> RegisteredClaims {
    RegisteredClaims::new()
        .with_issuer("eyevinn")
        .with_subject("jane")
        .with_audience("svc")
        .with_issued_at(1_700_000_000)
        .with_expiration(1_700_000_120)
}

fn base_builder() -> TokenBuilder {
    TokenBuilder::new()
        .algorithm(Algorithm::HmacSha256)
        .key_id(KeyId::string(KID))
        .registered_claims(base_registered_claims())
}

fn base_options() -> VerificationOptions {
    VerificationOptions::new()
        .issuer("eyevinn")
        .audience("svc")
        .now(NOW)
}

#[test]
fn test_happy_path_hs256() {
    let key = test_key();
    let token = base_builder().issue(&key).expect("failed to issue token");

    let claims =
        verify_token(&token, &test_keystore(&key), &base_options()).expect("failed to verify");

    assert_eq!(claims.registered, base_registered_claims());
    assert!(claims.custom.is_empty());
}

#[test]
fn test_expired_token() {
    let key = test_key();
    let token = base_builder()
        .registered_claims(
            base_registered_claims().with_expiration(1_700_000_000),
        )
        .issue(&key)
        .expect("failed to issue token");

    let options = base_options().now(1_700_000_100);
    let result = verify_token(&token, &test_keystore(&key), &options);
    assert!(matches!(result, Err(Error::TokenExpired)));
}

#[test]
fn test_wrong_issuer() {
    let key = test_key();
    let token = base_builder().issue(&key).expect("failed to issue token");

    let options = VerificationOptions::new()
        .issuer("attacker")
        .audience("svc")
        .now(NOW);
    let result = verify_token(&token, &test_keystore(&key), &options);
    assert!(matches!(result, Err(Error::InvalidIssuer)));
}

#[test]
fn test_not_yet_valid() {
    let key = test_key();
    let token = base_builder()
        .registered_claims(base_registered_claims().with_not_before(NOW + 60))
        .issue(&key)
        .expect("failed to issue token");

    let result = verify_token(&token, &test_keystore(&key), &base_options());
    assert!(matches!(result, Err(Error::TokenNotYetValid)));
}

#[test]
fn test_audience_mismatch() {
    let key = test_key();
    let token = base_builder().issue(&key).expect("failed to issue token");

    let options = VerificationOptions::new()
        .issuer("eyevinn")
        .audience("other-svc")
        .now(NOW);
    let result = verify_token(&token, &test_keystore(&key), &options);
    assert!(matches!(result, Err(Error::InvalidAudience)));
}

#[test]
fn test_expected_audience_requires_claim() {
    let key = test_key();
    let token = base_builder()
        .registered_claims(
            RegisteredClaims::new()
                .with_issuer("eyevinn")
                .with_expiration(1_700_000_120),
        )
        .issue(&key)
        .expect("failed to issue token");

    let result = verify_token(&token, &test_keystore(&key), &base_options());
    assert!(matches!(result, Err(Error::MissingClaim("aud"))));
}

#[test]
fn test_issuer_must_be_configured() {
    let key = test_key();
    let token = base_builder().issue(&key).expect("failed to issue token");

    let options = VerificationOptions::new().now(NOW);
    let result = verify_token(&token, &test_keystore(&key), &options);
    assert!(matches!(result, Err(Error::InvalidArgument(_))));
}

#[test]
fn test_catu_suffix_host() {
    let key = test_key();
    let mut components = BTreeMap::new();
    components.insert(uri_components::SCHEME, catu::exact_match("https"));
    components.insert(uri_components::HOST, catu::suffix_match(".example.com"));

    let token = base_builder()
        .catu(components)
        .issue(&key)
        .expect("failed to issue token");
    let keys = test_keystore(&key);

    let ok = base_options().uri("https://api.example.com/x");
    verify_token(&token, &keys, &ok).expect("matching URI rejected");

    let wrong_scheme = base_options().uri("http://api.example.com/x");
    assert!(matches!(
        verify_token(&token, &keys, &wrong_scheme),
        Err(Error::InvalidUriClaim(_))
    ));

    let wrong_host = base_options().uri("https://example.org/x");
    assert!(matches!(
        verify_token(&token, &keys, &wrong_host),
        Err(Error::InvalidUriClaim(_))
    ));
}

#[test]
fn test_catu_passes_when_any_rule_matches() {
    let key = test_key();
    // A prefix rule that fails plus a contains rule that succeeds: the
    // component passes because one rule is enough.
    let mut rules = catu::prefix_match("/live/");
    rules.extend(catu::contains_match("segments"));
    let mut components = BTreeMap::new();
    components.insert(uri_components::PATH, rules);

    let token = base_builder()
        .catu(components)
        .issue(&key)
        .expect("failed to issue token");

    let options = base_options().uri("https://cdn.example.com/vod/segments/a.ts");
    verify_token(&token, &test_keystore(&key), &options).expect("OR semantics rejected");
}

#[test]
fn test_catu_digest_matches() {
    use hmac_sha256::Hash as Sha256Hash;
    use hmac_sha512::Hash as Sha512Hash;

    let key = test_key();
    let host_digest = Sha256Hash::hash(b"api.example.com").to_vec();
    let scheme_digest = Sha512Hash::hash(b"https")[..32].to_vec();

    let mut components = BTreeMap::new();
    components.insert(uri_components::HOST, catu::sha256_match(host_digest));
    components.insert(uri_components::SCHEME, catu::sha512_256_match(scheme_digest));

    let token = base_builder()
        .catu(components)
        .issue(&key)
        .expect("failed to issue token");

    let options = base_options().uri("https://api.example.com/x");
    verify_token(&token, &test_keystore(&key), &options).expect("digest match rejected");
}

#[test]
fn test_catu_regex_rules_are_inert() {
    let key = test_key();
    let mut rules = BTreeMap::new();
    rules.insert(match_types::REGEX, ClaimValue::Text(".*".to_string()));
    let mut components = BTreeMap::new();
    components.insert(uri_components::PATH, rules);

    let token = base_builder()
        .catu(components)
        .issue(&key)
        .expect("failed to issue token");

    // The only rule for the path is a regex rule, which never matches, so
    // the component fails.
    let options = base_options().uri("https://api.example.com/anything");
    assert!(matches!(
        verify_token(&token, &test_keystore(&key), &options),
        Err(Error::InvalidUriClaim(_))
    ));
}

#[test]
fn test_catu_unknown_component_fails_closed() {
    let key = test_key();
    let mut components = BTreeMap::new();
    components.insert(9, catu::exact_match("x"));

    let token = base_builder()
        .catu(components)
        .issue(&key)
        .expect("failed to issue token");

    let options = base_options().uri("https://api.example.com/x");
    assert!(matches!(
        verify_token(&token, &test_keystore(&key), &options),
        Err(Error::InvalidUriClaim(_))
    ));
}

#[test]
fn test_catu_requires_uri_context() {
    let key = test_key();
    let mut components = BTreeMap::new();
    components.insert(uri_components::SCHEME, catu::exact_match("https"));

    let token = base_builder()
        .catu(components)
        .issue(&key)
        .expect("failed to issue token");

    let result = verify_token(&token, &test_keystore(&key), &base_options());
    assert!(matches!(result, Err(Error::MissingVerificationContext(_))));
}

#[test]
fn test_catu_port_matching() {
    let key = test_key();
    let mut components = BTreeMap::new();
    components.insert(uri_components::PORT, catu::exact_match("8443"));

    let token = base_builder()
        .catu(components)
        .issue(&key)
        .expect("failed to issue token");
    let keys = test_keystore(&key);

    let explicit = base_options().uri("https://api.example.com:8443/x");
    verify_token(&token, &keys, &explicit).expect("explicit port rejected");

    let default_port = base_options().uri("https://api.example.com/x");
    assert!(matches!(
        verify_token(&token, &keys, &default_port),
        Err(Error::InvalidUriClaim(_))
    ));
}

#[test]
fn test_catm_case_insensitive() {
    let key = test_key();
    let token = base_builder()
        .catm(vec!["GET", "POST"])
        .issue(&key)
        .expect("failed to issue token");
    let keys = test_keystore(&key);

    let lower = base_options().http_method("post");
    verify_token(&token, &keys, &lower).expect("case-insensitive match rejected");

    let forbidden = base_options().http_method("DELETE");
    assert!(matches!(
        verify_token(&token, &keys, &forbidden),
        Err(Error::InvalidMethodClaim(_))
    ));

    let no_context = base_options();
    assert!(matches!(
        verify_token(&token, &keys, &no_context),
        Err(Error::MissingVerificationContext(_))
    ));
}

#[test]
fn test_replay_prohibited() {
    let key = test_key();
    let token = base_builder()
        .catreplay(ReplayMode::Prohibited)
        .issue(&key)
        .expect("failed to issue token");
    let keys = test_keystore(&key);

    let fresh = base_options().token_seen_before(false);
    verify_token(&token, &keys, &fresh).expect("fresh token rejected");

    let replayed = base_options().token_seen_before(true);
    assert!(matches!(
        verify_token(&token, &keys, &replayed),
        Err(Error::TokenReplayProhibited)
    ));
}

#[test]
fn test_replay_prohibited_requires_oracle_signal() {
    let key = test_key();
    let token = base_builder()
        .catreplay(ReplayMode::Prohibited)
        .issue(&key)
        .expect("failed to issue token");

    // The caller never supplied a seen-before signal, so the prohibiting
    // claim fails closed.
    let result = verify_token(&token, &test_keystore(&key), &base_options());
    assert!(matches!(result, Err(Error::MissingVerificationContext(_))));

    // Modes that need no oracle signal still pass without one.
    let permitted = base_builder()
        .catreplay(ReplayMode::Permitted)
        .issue(&key)
        .expect("failed to issue token");
    verify_token(&permitted, &test_keystore(&key), &base_options())
        .expect("permitted mode rejected without oracle signal");
}

#[test]
fn test_replay_reuse_detection_passes() {
    let key = test_key();
    let token = base_builder()
        .catreplay(ReplayMode::ReuseDetection)
        .issue(&key)
        .expect("failed to issue token");

    let replayed = base_options().token_seen_before(true);
    verify_token(&token, &test_keystore(&key), &replayed).expect("reuse detection rejected");
}

#[test]
fn test_catreplay_out_of_range_rejected_at_parse() {
    let mut enc = CborEncoder::new();
    enc.begin_map(1).unwrap();
    enc.push_int(cat_keys::CATREPLAY).unwrap();
    enc.push_int(5).unwrap();
    enc.end_map().unwrap();
    let bytes = enc.finish().unwrap();

    assert!(matches!(
        Claims::from_cbor(&bytes),
        Err(Error::CatReplayOutOfRange(5))
    ));

    // The issuing path rejects it too.
    let claims = Claims::new().with_custom_claim(cat_keys::CATREPLAY, ClaimValue::Integer(7));
    assert!(matches!(
        claims.to_cbor(),
        Err(Error::CatReplayOutOfRange(7))
    ));
}

#[test]
fn test_tag_tamper() {
    let key = test_key();
    let token = base_builder().issue(&key).expect("failed to issue token");

    let mut bytes = decode_base64url(&token).unwrap();
    // The authentication tag is the final element of the envelope.
    *bytes.last_mut().unwrap() ^= 0x01;
    let tampered = encode_base64url(&bytes).unwrap();

    let result = verify_token(&tampered, &test_keystore(&key), &base_options());
    assert!(matches!(result, Err(Error::TagMismatch)));
}

#[test]
fn test_cattprint() {
    let key = test_key();
    let token = base_builder()
        .cattprint(FingerprintType::Ja4, "t13d1516h2_8daaf6152771_b186095e22b6")
        .issue(&key)
        .expect("failed to issue token");
    let keys = test_keystore(&key);

    // Same type, uppercase value: the comparison is case-insensitive.
    let upper = base_options().fingerprint(
        FingerprintType::Ja4,
        "T13D1516H2_8DAAF6152771_B186095E22B6",
    );
    verify_token(&token, &keys, &upper).expect("case-insensitive fingerprint rejected");

    let wrong_type = base_options().fingerprint(
        FingerprintType::Ja3,
        "t13d1516h2_8daaf6152771_b186095e22b6",
    );
    assert!(matches!(
        verify_token(&token, &keys, &wrong_type),
        Err(Error::InvalidTlsFingerprintClaim(_))
    ));

    let no_context = base_options();
    assert!(matches!(
        verify_token(&token, &keys, &no_context),
        Err(Error::MissingVerificationContext(_))
    ));
}

#[test]
fn test_cattprint_schema_requires_subfields() {
    let mut enc = CborEncoder::new();
    enc.begin_map(1).unwrap();
    enc.push_int(cat_keys::CATTPRINT).unwrap();
    enc.begin_map(1).unwrap();
    enc.push_int(0).unwrap();
    enc.push_int(2).unwrap();
    enc.end_map().unwrap();
    enc.end_map().unwrap();
    let bytes = enc.finish().unwrap();

    // Fingerprint value (key 1) is missing.
    assert!(matches!(
        Claims::from_cbor(&bytes),
        Err(Error::InvalidClaimValue(_))
    ));
}

#[test]
fn test_mac_determinism() {
    let key = test_key();
    let a = base_builder().issue(&key).unwrap();
    let b = base_builder().issue(&key).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_mac_freshness_payload_tamper() {
    let key = test_key();
    let mut mac0 = CoseMac0::create(
        Header::new().with_algorithm(Algorithm::HmacSha256),
        b"payload-bytes".to_vec(),
        &key,
    )
    .unwrap();

    assert_eq!(mac0.tag.len(), 32);
    mac0.verify_tag(&key).unwrap();

    mac0.payload[0] ^= 0x01;
    assert!(matches!(mac0.verify_tag(&key), Err(Error::TagMismatch)));
}

#[test]
fn test_empty_protected_header_is_zero_length_bstr() {
    let key = test_key();
    let header = Header::new().with_unprotected_key_id(KeyId::string(KID));
    let mac0 = CoseMac0::create(header, b"payload".to_vec(), &key).unwrap();
    let bytes = mac0.to_bytes().unwrap();

    assert_eq!(bytes[0], 0x84, "definite 4-element array");
    assert_eq!(bytes[1], 0x40, "zero-length protected bstr");

    let parsed = CoseMac0::from_bytes(&bytes).unwrap();
    assert!(parsed.header.protected.is_empty());
    parsed.verify_tag(&key).unwrap();
}

#[test]
fn test_unknown_header_values_are_skipped() {
    let key = test_key();
    let mut enc = CborEncoder::new();
    enc.begin_array(4).unwrap();
    enc.push_bytes(&[]).unwrap();
    enc.begin_map(2).unwrap();
    enc.push_int(4).unwrap();
    enc.push_text(KID).unwrap();
    enc.push_int(99).unwrap();
    enc.push_bool(true).unwrap();
    enc.end_map().unwrap();
    enc.push_bytes(b"payload").unwrap();
    enc.push_bytes(&[0u8; 32]).unwrap();
    enc.end_array().unwrap();
    let bytes = enc.finish().unwrap();

    let mac0 = CoseMac0::from_bytes(&bytes).unwrap();
    assert!(matches!(mac0.key_id(), Some(KeyId::String(s)) if s == KID));
    assert!(!mac0.header.unprotected.contains_key(&99));

    // The forged tag of course does not verify.
    assert!(matches!(mac0.verify_tag(&key), Err(Error::TagMismatch)));
}

#[test]
fn test_envelope_must_have_four_elements() {
    let mut enc = CborEncoder::new();
    enc.begin_array(3).unwrap();
    enc.push_bytes(&[]).unwrap();
    enc.begin_map(0).unwrap();
    enc.end_map().unwrap();
    enc.push_bytes(b"payload").unwrap();
    enc.end_array().unwrap();
    let bytes = enc.finish().unwrap();

    assert!(matches!(
        CoseMac0::from_bytes(&bytes),
        Err(Error::InvalidFormat(_))
    ));
}

#[test]
fn test_cwt_tag_expected() {
    let key = test_key();
    let untagged = base_builder()
        .cwt_tag(false)
        .issue(&key)
        .expect("failed to issue token");
    let keys = test_keystore(&key);

    assert!(matches!(
        verify_token(&untagged, &keys, &base_options()),
        Err(Error::ExpectedCwtTag)
    ));

    let lenient = base_options().expect_cwt_tag(false);
    verify_token(&untagged, &keys, &lenient).expect("untagged token rejected");

    // A tagged token still verifies when tags are not required.
    let tagged = base_builder().issue(&key).unwrap();
    verify_token(&tagged, &keys, &lenient).expect("tagged token rejected");
}

#[test]
fn test_key_not_found() {
    let key = test_key();
    let token = base_builder().issue(&key).expect("failed to issue token");

    let keys = KeyStore::new().with_key("other-key", key.to_vec());
    let result = verify_token(&token, &keys, &base_options());
    assert!(matches!(result, Err(Error::KeyNotFound(_))));
}

#[test]
fn test_missing_key_id() {
    let key = test_key();
    let token = TokenBuilder::new()
        .algorithm(Algorithm::HmacSha256)
        .registered_claims(base_registered_claims())
        .issue(&key)
        .expect("failed to issue token");

    let result = verify_token(&token, &test_keystore(&key), &base_options());
    assert!(matches!(result, Err(Error::InvalidFormat(_))));
}

#[test]
fn test_binary_key_id() {
    let key = test_key();
    let token = base_builder()
        .key_id(KeyId::binary(b"kid-1".to_vec()))
        .issue(&key)
        .expect("failed to issue token");

    let keys = KeyStore::new().with_key("kid-1", key.to_vec());
    verify_token(&token, &keys, &base_options()).expect("binary kid rejected");
}

#[test]
fn test_protected_key_id_roundtrip() {
    let key = test_key();
    let token = TokenBuilder::new()
        .algorithm(Algorithm::HmacSha256)
        .protected_key_id(KeyId::string(KID))
        .registered_claims(base_registered_claims())
        .issue(&key)
        .expect("failed to issue token");

    verify_token(&token, &test_keystore(&key), &base_options())
        .expect("protected kid rejected");
}

#[test]
fn test_generated_cwt_id() {
    let key = test_key();
    let a = base_builder().generate_cwt_id(true).sign(&key).unwrap();
    let b = base_builder().generate_cwt_id(true).sign(&key).unwrap();

    let cti_a = a.claims.registered.cti.clone().expect("no CTI minted");
    let cti_b = b.claims.registered.cti.clone().expect("no CTI minted");

    // 16 random bytes, hex-encoded.
    assert_eq!(cti_a.len(), 32);
    assert!(cti_a.iter().all(u8::is_ascii_hexdigit));
    assert_ne!(cti_a, cti_b);

    // An explicit CTI is never overwritten.
    let explicit = base_builder()
        .registered_claims(base_registered_claims().with_cti(b"fixed-id".to_vec()))
        .generate_cwt_id(true)
        .sign(&key)
        .unwrap();
    assert_eq!(explicit.claims.registered.cti.as_deref(), Some(&b"fixed-id"[..]));
}

#[test]
fn test_unsupported_algorithm_rejected() {
    let key = test_key();
    let mut enc = CborEncoder::new();
    // Protected header {1: -7} names ES256, which this profile rejects.
    let mut protected = CborEncoder::new();
    protected.begin_map(1).unwrap();
    protected.push_int(1).unwrap();
    protected.push_int(-7).unwrap();
    protected.end_map().unwrap();
    let protected = protected.finish().unwrap();

    enc.begin_array(4).unwrap();
    enc.push_bytes(&protected).unwrap();
    enc.begin_map(1).unwrap();
    enc.push_int(4).unwrap();
    enc.push_text(KID).unwrap();
    enc.end_map().unwrap();
    enc.push_bytes(b"payload").unwrap();
    enc.push_bytes(&[0u8; 32]).unwrap();
    enc.end_array().unwrap();
    let bytes = enc.finish().unwrap();
    let token = encode_base64url(&bytes).unwrap();

    let options = base_options().expect_cwt_tag(false);
    let result = verify_token(&token, &test_keystore(&key), &options);
    assert!(matches!(result, Err(Error::UnsupportedAlgorithm(-7))));
}

#[test]
fn test_claims_roundtrip_with_nested_containers() {
    let mut deep = BTreeMap::new();
    deep.insert(
        2,
        ClaimValue::Array(vec![
            ClaimValue::Integer(-7),
            ClaimValue::Text("deep".to_string()),
            ClaimValue::Map(BTreeMap::from([(5, ClaimValue::Bytes(vec![1, 2, 3]))])),
        ]),
    );

    let claims = Claims::new()
        .with_registered_claims(base_registered_claims())
        .with_custom_string(100, "custom-string")
        .with_custom_binary(101, b"custom-binary".to_vec())
        .with_custom_int(102, -12345)
        .with_custom_map(103, deep)
        .with_custom_array(
            104,
            vec![
                ClaimValue::Array(vec![ClaimValue::Integer(1), ClaimValue::Integer(2)]),
                ClaimValue::Map(BTreeMap::from([(0, ClaimValue::Text("x".to_string()))])),
            ],
        );

    let bytes = claims.to_cbor().unwrap();
    let parsed = Claims::from_cbor(&bytes).unwrap();
    assert_eq!(parsed, claims);
}

#[test]
fn test_registered_claim_with_wrong_variant_rejected() {
    let mut enc = CborEncoder::new();
    enc.begin_map(1).unwrap();
    enc.push_int(1).unwrap();
    enc.push_int(42).unwrap();
    enc.end_map().unwrap();
    let bytes = enc.finish().unwrap();

    assert!(matches!(
        Claims::from_cbor(&bytes),
        Err(Error::InvalidClaimValue(_))
    ));
}

#[test]
fn test_negative_time_claim_rejected() {
    let mut enc = CborEncoder::new();
    enc.begin_map(1).unwrap();
    enc.push_int(4).unwrap();
    enc.push_int(-30).unwrap();
    enc.end_map().unwrap();
    let bytes = enc.finish().unwrap();

    assert!(matches!(
        Claims::from_cbor(&bytes),
        Err(Error::InvalidClaimValue(_))
    ));
}

#[test]
fn test_extended_cat_claims_roundtrip() {
    use crate::cat_claims::{
        catalpn, catdpop, catgeoalt, catgeocoord, catgeoiso3166, catif, catifdata, catpor,
        cattpk,
    };

    let key = test_key();
    let mut headers = BTreeMap::new();
    headers.insert("x-session", "required");

    let claims = Claims::new()
        .with_registered_claims(base_registered_claims())
        .with_catnip(vec!["192.0.2.10", "198.51.100.0/24"])
        .with_catv(1)
        .with_custom_claim(cat_keys::CATPOR, catpor::create(25))
        .with_custom_array(cat_keys::CATALPN, catalpn::create(vec!["h2", "http/1.1"]))
        .with_custom_claim(cat_keys::CATH, cath::create(headers))
        .with_custom_array(
            cat_keys::CATGEOISO3166,
            catgeoiso3166::create(vec!["US", "CA"]),
        )
        .with_custom_claim(
            cat_keys::CATGEOCOORD,
            catgeocoord::with_radius(40.7128, -74.0060, 5_000),
        )
        .with_custom_claim(cat_keys::CATGEOALT, catgeoalt::range(0, 3_000))
        .with_custom_claim(cat_keys::CATTPK, cattpk::create(vec![0xab; 32]))
        .with_custom_claim(cat_keys::CATDPOP, catdpop::required())
        .with_custom_claim(
            cat_keys::CATIF,
            catif::create(BTreeMap::from([(0, ClaimValue::Integer(200))])),
        )
        .with_custom_claim(
            cat_keys::CATIFDATA,
            catifdata::create(BTreeMap::from([(0, ClaimValue::Text("role".to_string()))])),
        )
        .with_custom_claim(
            cat_keys::CATR,
            catr::create(catr::cookie_renewal(
                3600,
                Some(1_700_003_000),
                Some("session"),
                Some(vec!["Secure", "HttpOnly"]),
            )),
        );

    let token = TokenBuilder::new()
        .algorithm(Algorithm::HmacSha256)
        .key_id(KeyId::string(KID))
        .claims(claims.clone())
        .sign(&key)
        .expect("failed to sign token");

    let bytes = token.to_bytes().unwrap();
    let decoded = Token::from_bytes(&bytes).unwrap();
    decoded.verify(&key).unwrap();
    assert_eq!(decoded.claims, claims);
}

#[test]
fn test_catr_renewal_parameter_shapes() {
    let automatic = catr::automatic_renewal(600, None);
    assert_eq!(automatic.get(&0), Some(&ClaimValue::Integer(0)));
    assert_eq!(automatic.get(&1), Some(&ClaimValue::Integer(600)));
    assert!(!automatic.contains_key(&2));

    let header = catr::header_renewal(600, Some(1_700_000_500), Some("x-renew"), None);
    assert_eq!(header.get(&0), Some(&ClaimValue::Integer(2)));
    assert_eq!(header.get(&4), Some(&ClaimValue::Text("x-renew".to_string())));

    let redirect = catr::redirect_renewal(600, None, Some(307));
    assert_eq!(redirect.get(&7), Some(&ClaimValue::Integer(307)));
}

// --- CBOR codec properties ---

#[test]
fn test_integer_width_minimality() {
    let cases: [(u64, usize); 10] = [
        (0, 1),
        (23, 1),
        (24, 2),
        (255, 2),
        (256, 3),
        (65_535, 3),
        (65_536, 5),
        (u32::MAX as u64, 5),
        (u32::MAX as u64 + 1, 9),
        (u64::MAX, 9),
    ];

    for (value, expected_len) in cases {
        let mut enc = CborEncoder::new();
        enc.push_uint(value).unwrap();
        let bytes = enc.finish().unwrap();
        assert_eq!(bytes.len(), expected_len, "width for {value}");

        let mut dec = CborDecoder::new(&bytes);
        assert_eq!(dec.read_u64().unwrap(), value);
    }
}

#[test]
fn test_negative_integer_roundtrip() {
    let cases: [(i64, usize); 7] = [
        (-1, 1),
        (-24, 1),
        (-25, 2),
        (-256, 2),
        (-257, 3),
        (-65_537, 5),
        (i64::MIN, 9),
    ];

    for (value, expected_len) in cases {
        let mut enc = CborEncoder::new();
        enc.push_int(value).unwrap();
        let bytes = enc.finish().unwrap();
        assert_eq!(bytes.len(), expected_len, "width for {value}");

        let mut dec = CborDecoder::new(&bytes);
        assert_eq!(dec.read_i64().unwrap(), value);
    }
}

#[test]
fn test_typed_integer_reads() {
    let mut enc = CborEncoder::new();
    enc.push_int(-5).unwrap();
    let negative = enc.finish().unwrap();
    assert!(matches!(
        CborDecoder::new(&negative).read_u64(),
        Err(Error::NegativeValueInUnsignedType)
    ));

    let mut enc = CborEncoder::new();
    enc.push_uint(u64::MAX).unwrap();
    let huge = enc.finish().unwrap();
    assert!(matches!(
        CborDecoder::new(&huge).read_i64(),
        Err(Error::CborValueOutOfRange)
    ));
}

#[test]
fn test_indefinite_length_claims_map() {
    let mut enc = CborEncoder::new();
    enc.begin_map_indefinite().unwrap();
    enc.push_int(1).unwrap();
    enc.push_text("eyevinn").unwrap();
    enc.push_int(4).unwrap();
    enc.push_int(1_700_000_120).unwrap();
    enc.push_break().unwrap();
    let bytes = enc.finish().unwrap();

    let claims = Claims::from_cbor(&bytes).unwrap();
    assert_eq!(claims.registered.iss.as_deref(), Some("eyevinn"));
    assert_eq!(claims.registered.exp, Some(1_700_000_120));
}

#[test]
fn test_indefinite_length_string_chunks() {
    let mut enc = CborEncoder::new();
    enc.begin_text_indefinite().unwrap();
    enc.push_text("stream").unwrap();
    enc.push_text("ing").unwrap();
    enc.push_break().unwrap();
    let bytes = enc.finish().unwrap();

    let mut dec = CborDecoder::new(&bytes);
    assert_eq!(dec.read_text().unwrap(), "streaming");

    let mut enc = CborEncoder::new();
    enc.begin_bytes_indefinite().unwrap();
    enc.push_bytes(&[1, 2]).unwrap();
    enc.push_bytes(&[3]).unwrap();
    enc.push_break().unwrap();
    let bytes = enc.finish().unwrap();

    let mut dec = CborDecoder::new(&bytes);
    assert_eq!(dec.read_bytes().unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_indefinite_array_of_claim_values() {
    let mut enc = CborEncoder::new();
    enc.begin_map(1).unwrap();
    enc.push_int(313).unwrap();
    enc.begin_array_indefinite().unwrap();
    enc.push_text("GET").unwrap();
    enc.push_text("HEAD").unwrap();
    enc.push_break().unwrap();
    enc.end_map().unwrap();
    let bytes = enc.finish().unwrap();

    let claims = Claims::from_cbor(&bytes).unwrap();
    let methods = claims.get_custom_claim(313).and_then(ClaimValue::as_array);
    assert_eq!(methods.map(|m| m.len()), Some(2));
}

#[test]
fn test_encoder_balance_checks() {
    let mut enc = CborEncoder::new();
    enc.begin_array(2).unwrap();
    enc.push_int(1).unwrap();
    assert!(matches!(enc.end_array(), Err(Error::UnbalancedContainers)));

    let mut enc = CborEncoder::new();
    enc.begin_array(2).unwrap();
    enc.push_int(1).unwrap();
    assert!(matches!(enc.finish(), Err(Error::UnbalancedContainers)));

    let mut enc = CborEncoder::new();
    assert!(matches!(enc.push_break(), Err(Error::InvalidBreak)));

    let mut enc = CborEncoder::new();
    enc.begin_array(1).unwrap();
    enc.push_int(1).unwrap();
    assert!(matches!(enc.push_int(2), Err(Error::UnbalancedContainers)));
}

#[test]
fn test_push_raw_embeds_encoded_items() {
    let claims = Claims::new().with_registered_claims(base_registered_claims());
    let payload = claims.to_cbor().unwrap();

    let mut enc = CborEncoder::new();
    enc.begin_array(2).unwrap();
    enc.push_raw(&payload).unwrap();
    enc.push_int(1).unwrap();
    enc.end_array().unwrap();
    let bytes = enc.finish().unwrap();

    let mut dec = CborDecoder::new(&bytes);
    assert_eq!(dec.read_array_header().unwrap(), Some(2));
    let start = dec.position();
    dec.skip().unwrap();
    assert_eq!(&bytes[start..dec.position()], payload.as_slice());
    assert_eq!(dec.read_i64().unwrap(), 1);
}

#[test]
fn test_decoder_skip_and_cursor() {
    let mut enc = CborEncoder::new();
    enc.begin_array(3).unwrap();
    enc.push_int(7).unwrap();
    enc.begin_map(1).unwrap();
    enc.push_int(1).unwrap();
    enc.push_text("x").unwrap();
    enc.end_map().unwrap();
    enc.push_bytes(&[1, 2, 3]).unwrap();
    enc.end_array().unwrap();
    let bytes = enc.finish().unwrap();

    let mut dec = CborDecoder::new(&bytes);
    assert_eq!(dec.position(), 0);
    dec.skip().unwrap();
    assert_eq!(dec.remaining(), 0);
    assert!(matches!(dec.peek_major_type(), Err(Error::EndOfBuffer)));
}

#[test]
fn test_end_of_buffer() {
    let mut dec = CborDecoder::new(&[]);
    assert!(matches!(dec.read_u64(), Err(Error::EndOfBuffer)));

    // A truncated text string fails the same way.
    let mut enc = CborEncoder::new();
    enc.push_text("hello").unwrap();
    let bytes = enc.finish().unwrap();
    let mut dec = CborDecoder::new(&bytes[..3]);
    assert!(dec.read_text().is_err());
}

#[test]
fn test_float_widths() {
    let mut enc = CborEncoder::new();
    enc.push_f16(1.5).unwrap();
    let bytes = enc.finish().unwrap();
    assert_eq!(bytes.len(), 3);
    assert_eq!(CborDecoder::new(&bytes).read_float().unwrap(), 1.5);

    let mut enc = CborEncoder::new();
    enc.push_f32(0.25).unwrap();
    let bytes = enc.finish().unwrap();
    assert_eq!(bytes.len(), 5);
    assert_eq!(CborDecoder::new(&bytes).read_float().unwrap(), 0.25);

    let mut enc = CborEncoder::new();
    enc.push_f64(1.1).unwrap();
    let bytes = enc.finish().unwrap();
    assert_eq!(bytes.len(), 9);
    assert_eq!(CborDecoder::new(&bytes).read_float().unwrap(), 1.1);
}

#[test]
fn test_simple_values() {
    let mut enc = CborEncoder::new();
    enc.push_bool(false).unwrap();
    enc.push_bool(true).unwrap();
    enc.push_null().unwrap();
    enc.push_undefined().unwrap();
    let bytes = enc.finish().unwrap();
    assert_eq!(bytes, vec![0xf4, 0xf5, 0xf6, 0xf7]);

    let mut dec = CborDecoder::new(&bytes);
    assert!(!dec.read_bool().unwrap());
    assert!(dec.read_bool().unwrap());
    dec.read_null().unwrap();
    dec.read_undefined().unwrap();
}

#[test]
fn test_peek_operations() {
    let mut enc = CborEncoder::new();
    enc.push_tag(61).unwrap();
    enc.push_tag(17).unwrap();
    enc.begin_array(0).unwrap();
    enc.end_array().unwrap();
    let bytes = enc.finish().unwrap();

    let mut dec = CborDecoder::new(&bytes);
    assert_eq!(dec.peek_major_type().unwrap(), crate::cbor::MajorType::Tag);
    assert_eq!(dec.read_tag().unwrap(), 61);
    assert_eq!(dec.read_tag().unwrap(), 17);
    assert_eq!(dec.peek_major_type().unwrap(), crate::cbor::MajorType::Array);
    assert_eq!(dec.peek_additional_info().unwrap(), 0);
    assert_eq!(dec.read_array_header().unwrap(), Some(0));
}

// --- utilities ---

#[test]
fn test_base64url_roundtrip() {
    let data: Vec<u8> = (0..=255).collect();
    let encoded = encode_base64url(&data).unwrap();
    assert!(encoded
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
    assert_eq!(decode_base64url(&encoded).unwrap(), data);

    assert!(matches!(
        decode_base64url("not+base64url/"),
        Err(Error::InvalidBase64)
    ));
}

#[test]
fn test_hex_roundtrip() {
    assert_eq!(encode_hex(&[0xde, 0xad, 0xbe, 0xef]).unwrap(), "deadbeef");
    assert_eq!(decode_hex("DEADbeef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
    assert!(matches!(decode_hex("xyz"), Err(Error::InvalidHex)));
}

// --- URI parsing ---

#[test]
fn test_uri_parse_components() {
    let uri =
        UriComponents::parse("https://api.example.com:8443/v1/segments/a.tar.gz?x=1").unwrap();

    assert_eq!(uri.scheme, "https");
    assert_eq!(uri.host, "api.example.com");
    assert_eq!(uri.port, Some(8443));
    assert_eq!(uri.path, "/v1/segments/a.tar.gz");
    assert_eq!(uri.query, "x=1");
    assert_eq!(uri.parent_path, "/v1/segments/");
    assert_eq!(uri.filename, "a.tar.gz");
    assert_eq!(uri.stem, "a.tar");
    assert_eq!(uri.extension, "gz");
}

#[test]
fn test_uri_parse_edge_cases() {
    let root = UriComponents::parse("https://example.com/").unwrap();
    assert_eq!(root.path, "/");
    assert_eq!(root.parent_path, "/");
    assert_eq!(root.filename, "");
    assert_eq!(root.stem, "");
    assert_eq!(root.extension, "");
    assert_eq!(root.port, Some(443));

    let dotfile = UriComponents::parse("https://example.com/dir/.profile").unwrap();
    assert_eq!(dotfile.filename, ".profile");
    assert_eq!(dotfile.stem, ".profile");
    assert_eq!(dotfile.extension, "");

    let trailing_dot = UriComponents::parse("https://example.com/dir/archive.").unwrap();
    assert_eq!(trailing_dot.stem, "archive.");
    assert_eq!(trailing_dot.extension, "");

    let no_query = UriComponents::parse("https://example.com/a/b.mp4").unwrap();
    assert_eq!(no_query.query, "");
    assert_eq!(no_query.extension, "mp4");

    assert!(matches!(
        UriComponents::parse("not-a-uri"),
        Err(Error::InvalidUri(_))
    ));
}

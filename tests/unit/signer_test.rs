// Signature generation and verification across all four algorithms
//
// - Golden MD5 / HMAC-SHA256 values for the merchant scenario
// - Sign/verify round trip for every algorithm
// - Any altered byte of the canonical string or signature is a mismatch

#[path = "../helpers/mod.rs"]
mod helpers;

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine};
use helpers::*;
use paybridge::core::AppError;
use paybridge::signing::{
    canonicalize, sign, verify, CanonicalOptions, CanonicalString, RsaPrivateKey, RsaPublicKey,
    SignatureAlgorithm, SigningKey, VerificationOutcome, VerifyingKey,
};
use proptest::prelude::*;

const MAC_ALGORITHMS: [SignatureAlgorithm; 2] =
    [SignatureAlgorithm::Md5, SignatureAlgorithm::HmacSha256];
const RSA_ALGORITHMS: [SignatureAlgorithm; 2] = [SignatureAlgorithm::Rsa, SignatureAlgorithm::Rsa2];

fn scenario(total_fee: &str) -> CanonicalString {
    let params = HashMap::from([
        ("appid", "wx1"),
        ("out_trade_no", "1000"),
        ("total_fee", total_fee),
    ]);
    canonicalize(&params, &CanonicalOptions::plain().with_secret(WXPAY_KEY))
}

fn secret_key() -> SigningKey {
    SigningKey::SharedSecret(WXPAY_KEY.to_string())
}

fn secret_verifier() -> VerifyingKey {
    VerifyingKey::SharedSecret(WXPAY_KEY.to_string())
}

fn rsa_signing_key() -> SigningKey {
    SigningKey::RsaPrivate(RsaPrivateKey::from_raw(&merchant_keys().private_pem).unwrap())
}

fn rsa_verifying_key() -> VerifyingKey {
    VerifyingKey::RsaPublic(RsaPublicKey::from_raw(&merchant_keys().public_pem).unwrap())
}

fn flip_byte(text: &str, index: usize) -> String {
    let mut bytes = text.as_bytes().to_vec();
    bytes[index] ^= 0x01;
    String::from_utf8(bytes).unwrap()
}

fn swap_hex_char(signature: &str, index: usize) -> String {
    signature
        .char_indices()
        .map(|(i, c)| match (i == index, c) {
            (true, 'A') => 'B',
            (true, _) => 'A',
            (false, c) => c,
        })
        .collect()
}

#[test]
fn test_md5_scenario_golden_value() {
    let canonical = scenario("1");
    assert_eq!(
        canonical.as_str(),
        "appid=wx1&out_trade_no=1000&total_fee=1&key=testkey123456789"
    );

    let signature = sign(&canonical, SignatureAlgorithm::Md5, &secret_key()).unwrap();
    assert_eq!(signature.as_str(), "40181DB2EB8BA649C1D847C5BEEC2D45");

    assert_eq!(
        verify(&canonical, signature.as_str(), SignatureAlgorithm::Md5, &secret_verifier()),
        VerificationOutcome::Valid
    );
    assert_eq!(
        verify(&scenario("2"), signature.as_str(), SignatureAlgorithm::Md5, &secret_verifier()),
        VerificationOutcome::SignatureMismatch
    );
}

#[test]
fn test_hmac_sha256_scenario_golden_value() {
    let signature = sign(&scenario("1"), SignatureAlgorithm::HmacSha256, &secret_key()).unwrap();
    assert_eq!(
        signature.as_str(),
        "43AADB4BCC70D6937FAD487E371B6A09CE976D27C877ACAC0A72EE7CA0BF583B"
    );
}

#[test]
fn test_lower_case_mac_is_rejected() {
    let canonical = scenario("1");
    let signature = sign(&canonical, SignatureAlgorithm::Md5, &secret_key()).unwrap();
    assert_eq!(
        verify(
            &canonical,
            &signature.as_str().to_lowercase(),
            SignatureAlgorithm::Md5,
            &secret_verifier()
        ),
        VerificationOutcome::SignatureMismatch
    );
}

#[test]
fn test_blank_signature_is_malformed_payload() {
    assert_eq!(
        verify(&scenario("1"), "  ", SignatureAlgorithm::Md5, &secret_verifier()),
        VerificationOutcome::MalformedPayload
    );
}

#[test]
fn test_key_family_mismatch() {
    let err = sign(&scenario("1"), SignatureAlgorithm::Rsa2, &secret_key()).unwrap_err();
    assert!(matches!(err, AppError::KeyMaterial { .. }));

    assert_eq!(
        verify(&scenario("1"), "AAAA", SignatureAlgorithm::Md5, &rsa_verifying_key()),
        VerificationOutcome::MalformedKey
    );
}

#[test]
fn test_rsa_digest_is_part_of_the_algorithm() {
    let canonical = CanonicalString::from_raw("a=1&b=2");
    let signature = sign(&canonical, SignatureAlgorithm::Rsa2, &rsa_signing_key()).unwrap();
    assert_eq!(
        verify(&canonical, signature.as_str(), SignatureAlgorithm::Rsa, &rsa_verifying_key()),
        VerificationOutcome::SignatureMismatch
    );
}

#[test]
fn test_undecodable_rsa_signature_is_mismatch() {
    let canonical = CanonicalString::from_raw("a=1");
    assert_eq!(
        verify(&canonical, "%%%not-base64%%%", SignatureAlgorithm::Rsa2, &rsa_verifying_key()),
        VerificationOutcome::SignatureMismatch
    );
}

#[test]
fn test_rsa_signature_from_other_key_is_mismatch() {
    let canonical = CanonicalString::from_raw("a=1");
    let other = SigningKey::RsaPrivate(RsaPrivateKey::from_raw(&gateway_keys().private_pem).unwrap());
    let signature = sign(&canonical, SignatureAlgorithm::Rsa2, &other).unwrap();
    assert_eq!(
        verify(&canonical, signature.as_str(), SignatureAlgorithm::Rsa2, &rsa_verifying_key()),
        VerificationOutcome::SignatureMismatch
    );
}

proptest! {
    #[test]
    fn test_mac_round_trip_and_tamper(
        content in "[ -~]{1,64}",
        index in any::<prop::sample::Index>(),
        secret in "[a-zA-Z0-9]{8,32}",
    ) {
        let canonical = CanonicalString::from_raw(format!("{}&key={}", content, secret));
        let key = SigningKey::SharedSecret(secret.clone());
        let verifier = VerifyingKey::SharedSecret(secret);

        for algorithm in MAC_ALGORITHMS {
            let signature = sign(&canonical, algorithm, &key).unwrap();
            prop_assert_eq!(
                verify(&canonical, signature.as_str(), algorithm, &verifier),
                VerificationOutcome::Valid
            );

            let altered = CanonicalString::from_raw(
                flip_byte(canonical.as_str(), index.index(canonical.as_str().len())),
            );
            prop_assert_eq!(
                verify(&altered, signature.as_str(), algorithm, &verifier),
                VerificationOutcome::SignatureMismatch
            );

            let forged = swap_hex_char(signature.as_str(), index.index(signature.as_str().len()));
            prop_assert_eq!(
                verify(&canonical, &forged, algorithm, &verifier),
                VerificationOutcome::SignatureMismatch
            );
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn test_rsa_round_trip_and_tamper(
        content in "[ -~]{1,128}",
        index in any::<prop::sample::Index>(),
    ) {
        let canonical = CanonicalString::from_raw(content);
        let key = rsa_signing_key();
        let verifier = rsa_verifying_key();

        for algorithm in RSA_ALGORITHMS {
            let signature = sign(&canonical, algorithm, &key).unwrap();
            prop_assert_eq!(
                verify(&canonical, signature.as_str(), algorithm, &verifier),
                VerificationOutcome::Valid
            );

            let altered = CanonicalString::from_raw(
                flip_byte(canonical.as_str(), index.index(canonical.as_str().len())),
            );
            prop_assert_eq!(
                verify(&altered, signature.as_str(), algorithm, &verifier),
                VerificationOutcome::SignatureMismatch
            );

            let mut raw = STANDARD.decode(signature.as_str()).unwrap();
            let at = index.index(raw.len());
            raw[at] ^= 0x01;
            prop_assert_eq!(
                verify(&canonical, &STANDARD.encode(raw), algorithm, &verifier),
                VerificationOutcome::SignatureMismatch
            );
        }
    }
}

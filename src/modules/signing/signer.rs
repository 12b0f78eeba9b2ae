use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use openssl::hash::MessageDigest;
use openssl::sign::{Signer, Verifier};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::algorithm::SignatureAlgorithm;
use super::canonical::CanonicalString;
use super::keys::{RsaPrivateKey, RsaPublicKey};
use crate::core::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Encoded signature: upper-case hex for MAC algorithms, base64 for RSA
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature(String);

impl Signature {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key used to produce signatures
#[derive(Clone)]
pub enum SigningKey {
    SharedSecret(String),
    RsaPrivate(RsaPrivateKey),
}

/// Key used to check signatures
#[derive(Clone)]
pub enum VerifyingKey {
    SharedSecret(String),
    RsaPublic(RsaPublicKey),
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningKey::SharedSecret(_) => f.write_str("SigningKey::SharedSecret(redacted)"),
            SigningKey::RsaPrivate(key) => write!(f, "SigningKey::RsaPrivate({:?})", key),
        }
    }
}

impl fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyingKey::SharedSecret(_) => f.write_str("VerifyingKey::SharedSecret(redacted)"),
            VerifyingKey::RsaPublic(key) => write!(f, "VerifyingKey::RsaPublic({:?})", key),
        }
    }
}

/// Result of checking a signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    Valid,
    SignatureMismatch,
    /// Key does not fit the algorithm or could not be used
    MalformedKey,
    /// Signature missing or blank
    MalformedPayload,
}

impl VerificationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationOutcome::Valid)
    }

    /// Collapse into a `Result`, naming what was being verified
    pub fn into_result(self, subject: &str) -> Result<()> {
        match self {
            VerificationOutcome::Valid => Ok(()),
            VerificationOutcome::SignatureMismatch => Err(AppError::signature(format!(
                "{} signature does not match",
                subject
            ))),
            VerificationOutcome::MalformedKey => Err(AppError::signature(format!(
                "{} could not be verified: key unusable for algorithm",
                subject
            ))),
            VerificationOutcome::MalformedPayload => Err(AppError::signature(format!(
                "{} carries no usable signature",
                subject
            ))),
        }
    }
}

/// Sign a canonical string.
///
/// MAC algorithms expect the secret suffix to already be part of `canonical`.
pub fn sign(
    canonical: &CanonicalString,
    algorithm: SignatureAlgorithm,
    key: &SigningKey,
) -> Result<Signature> {
    match (algorithm, key) {
        (SignatureAlgorithm::Md5 | SignatureAlgorithm::HmacSha256, SigningKey::SharedSecret(secret)) => {
            mac_hex(canonical, algorithm, secret).map(Signature)
        }
        (SignatureAlgorithm::Rsa | SignatureAlgorithm::Rsa2, SigningKey::RsaPrivate(private_key)) => {
            let mut signer = Signer::new(rsa_digest(algorithm), private_key.pkey())
                .map_err(|e| AppError::key_material(format!("cannot sign with key: {}", e), ""))?;
            signer
                .update(canonical.as_bytes())
                .map_err(|e| AppError::internal(format!("RSA sign update failed: {}", e)))?;
            let signature = signer
                .sign_to_vec()
                .map_err(|e| AppError::key_material(format!("RSA signing failed: {}", e), ""))?;
            Ok(Signature(BASE64.encode(signature)))
        }
        (algorithm, _) => Err(AppError::key_material(
            format!("{} cannot be signed with the configured key type", algorithm),
            "",
        )),
    }
}

/// Verify `signature` against a canonical string
pub fn verify(
    canonical: &CanonicalString,
    signature: &str,
    algorithm: SignatureAlgorithm,
    key: &VerifyingKey,
) -> VerificationOutcome {
    if signature.trim().is_empty() {
        return VerificationOutcome::MalformedPayload;
    }

    match (algorithm, key) {
        (SignatureAlgorithm::Md5 | SignatureAlgorithm::HmacSha256, VerifyingKey::SharedSecret(secret)) => {
            let expected = match mac_hex(canonical, algorithm, secret) {
                Ok(expected) => expected,
                Err(_) => return VerificationOutcome::MalformedKey,
            };
            if bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
                VerificationOutcome::Valid
            } else {
                VerificationOutcome::SignatureMismatch
            }
        }
        (SignatureAlgorithm::Rsa | SignatureAlgorithm::Rsa2, VerifyingKey::RsaPublic(public_key)) => {
            // Undecodable signatures cannot match anything
            let Ok(raw_signature) = BASE64.decode(signature.trim()) else {
                return VerificationOutcome::SignatureMismatch;
            };
            let Ok(mut verifier) = Verifier::new(rsa_digest(algorithm), public_key.pkey()) else {
                return VerificationOutcome::MalformedKey;
            };
            if verifier.update(canonical.as_bytes()).is_err() {
                return VerificationOutcome::MalformedKey;
            }
            match verifier.verify(&raw_signature) {
                Ok(true) => VerificationOutcome::Valid,
                Ok(false) | Err(_) => VerificationOutcome::SignatureMismatch,
            }
        }
        _ => VerificationOutcome::MalformedKey,
    }
}

fn mac_hex(canonical: &CanonicalString, algorithm: SignatureAlgorithm, secret: &str) -> Result<String> {
    let digest = match algorithm {
        SignatureAlgorithm::Md5 => Md5::digest(canonical.as_bytes()).to_vec(),
        SignatureAlgorithm::HmacSha256 => {
            let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
                .map_err(|e| AppError::key_material(format!("invalid HMAC key: {}", e), ""))?;
            mac.update(canonical.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
        other => return Err(AppError::UnsupportedAlgorithm(format!("{} is not a MAC", other))),
    };
    Ok(hex::encode_upper(digest))
}

fn rsa_digest(algorithm: SignatureAlgorithm) -> MessageDigest {
    match algorithm {
        SignatureAlgorithm::Rsa => MessageDigest::sha1(),
        _ => MessageDigest::sha256(),
    }
}

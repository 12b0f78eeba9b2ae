//! Canonical signing protocol shared by both gateways.

pub mod algorithm;
pub mod canonical;
pub mod keys;
pub mod signer;

pub use algorithm::{AlgorithmFamily, SignatureAlgorithm};
pub use canonical::{canonicalize, CanonicalOptions, CanonicalString, SIGN_FIELD, SIGN_TYPE_FIELD};
pub use keys::{normalize, parse, KeyHandle, KeyKind, RsaPrivateKey, RsaPublicKey};
pub use signer::{sign, verify, Signature, SigningKey, VerificationOutcome, VerifyingKey};

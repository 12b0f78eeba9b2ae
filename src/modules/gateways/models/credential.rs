use crate::core::{AppError, Result};
use crate::modules::signing::{
    sign, verify, AlgorithmFamily, CanonicalString, RsaPrivateKey, RsaPublicKey, Signature,
    SignatureAlgorithm, SigningKey, VerificationOutcome, VerifyingKey,
};

/// Merchant identity plus the key material used to sign and verify.
///
/// Immutable once built; every key has already been parsed, so a
/// credential can be shared read-only across concurrent calls.
#[derive(Debug, Clone)]
pub struct GatewayCredential {
    merchant_id: String,
    algorithm: SignatureAlgorithm,
    signing_key: SigningKey,
    verifying_key: Option<VerifyingKey>,
}

impl GatewayCredential {
    /// Shared-secret credential; the secret both signs and verifies
    pub fn shared_secret(
        merchant_id: impl Into<String>,
        secret: impl Into<String>,
        algorithm: SignatureAlgorithm,
    ) -> Result<Self> {
        let merchant_id = non_empty(merchant_id.into(), "merchant id")?;
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(AppError::key_material("shared secret is empty", ""));
        }
        require_family(algorithm, AlgorithmFamily::SharedSecret)?;

        Ok(Self {
            merchant_id,
            algorithm,
            signing_key: SigningKey::SharedSecret(secret.clone()),
            verifying_key: Some(VerifyingKey::SharedSecret(secret)),
        })
    }

    /// RSA credential; without a counterparty key nothing can be verified
    pub fn rsa(
        merchant_id: impl Into<String>,
        algorithm: SignatureAlgorithm,
        private_key: RsaPrivateKey,
        counterparty_key: Option<RsaPublicKey>,
    ) -> Result<Self> {
        let merchant_id = non_empty(merchant_id.into(), "app id")?;
        require_family(algorithm, AlgorithmFamily::Asymmetric)?;

        Ok(Self {
            merchant_id,
            algorithm,
            signing_key: SigningKey::RsaPrivate(private_key),
            verifying_key: counterparty_key.map(VerifyingKey::RsaPublic),
        })
    }

    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// Shared secret for the `&key=` canonical suffix, if this is a MAC credential
    pub fn secret(&self) -> Option<&str> {
        match &self.signing_key {
            SigningKey::SharedSecret(secret) => Some(secret.as_str()),
            SigningKey::RsaPrivate(_) => None,
        }
    }

    pub fn can_verify(&self) -> bool {
        self.verifying_key.is_some()
    }

    pub fn sign(&self, canonical: &CanonicalString) -> Result<Signature> {
        sign(canonical, self.algorithm, &self.signing_key)
    }

    /// Verify with an explicit algorithm (notifications may name their own)
    pub fn verify_with(
        &self,
        canonical: &CanonicalString,
        signature: &str,
        algorithm: SignatureAlgorithm,
    ) -> VerificationOutcome {
        match &self.verifying_key {
            Some(key) => verify(canonical, signature, algorithm, key),
            None => VerificationOutcome::MalformedKey,
        }
    }

    pub fn verify(&self, canonical: &CanonicalString, signature: &str) -> VerificationOutcome {
        self.verify_with(canonical, signature, self.algorithm)
    }
}

fn non_empty(value: String, what: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Err(AppError::configuration(format!("{} is not configured", what)));
    }
    Ok(value)
}

fn require_family(algorithm: SignatureAlgorithm, family: AlgorithmFamily) -> Result<()> {
    if algorithm.family() != family {
        return Err(AppError::UnsupportedAlgorithm(format!(
            "{} cannot be used with a {:?} credential",
            algorithm, family
        )));
    }
    Ok(())
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::AppError;

/// Signature algorithms understood by the two gateways
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    /// MD5 over the canonical string (secret appended), upper-case hex
    #[serde(rename = "MD5")]
    Md5,
    /// HMAC-SHA256 keyed with the shared secret, upper-case hex
    #[serde(rename = "HMAC-SHA256")]
    HmacSha256,
    /// SHA1withRSA, PKCS#1 v1.5, base64
    #[serde(rename = "RSA")]
    Rsa,
    /// SHA256withRSA, PKCS#1 v1.5, base64
    #[serde(rename = "RSA2")]
    Rsa2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmFamily {
    SharedSecret,
    Asymmetric,
}

impl SignatureAlgorithm {
    /// Wire tag sent in `sign_type`
    pub fn tag(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Md5 => "MD5",
            SignatureAlgorithm::HmacSha256 => "HMAC-SHA256",
            SignatureAlgorithm::Rsa => "RSA",
            SignatureAlgorithm::Rsa2 => "RSA2",
        }
    }

    pub fn family(&self) -> AlgorithmFamily {
        match self {
            SignatureAlgorithm::Md5 | SignatureAlgorithm::HmacSha256 => {
                AlgorithmFamily::SharedSecret
            }
            SignatureAlgorithm::Rsa | SignatureAlgorithm::Rsa2 => AlgorithmFamily::Asymmetric,
        }
    }

    /// Parse a tag and require it to belong to `family`
    pub fn parse_in_family(tag: &str, family: AlgorithmFamily) -> Result<Self, AppError> {
        let algorithm: SignatureAlgorithm = tag.parse()?;
        if algorithm.family() != family {
            return Err(AppError::UnsupportedAlgorithm(format!(
                "{} is not valid for a {:?} gateway",
                tag, family
            )));
        }
        Ok(algorithm)
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "MD5" => Ok(SignatureAlgorithm::Md5),
            "HMAC-SHA256" => Ok(SignatureAlgorithm::HmacSha256),
            "RSA" => Ok(SignatureAlgorithm::Rsa),
            "RSA2" => Ok(SignatureAlgorithm::Rsa2),
            other => Err(AppError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

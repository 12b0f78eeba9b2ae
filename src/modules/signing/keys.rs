//! Key material loading.
//!
//! Gateway consoles hand out RSA keys as bare base64 with the PEM armor
//! and line breaks stripped. [`normalize`] rebuilds a proper PEM block and
//! [`parse`] turns it into an openssl key handle.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use openssl::pkey::{Id, PKey, Private, Public};
use openssl::rsa::Rsa;

use crate::core::{AppError, Result};

const PEM_LINE_WIDTH: usize = 64;
const ARMOR_DASHES: &str = "-----";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// SubjectPublicKeyInfo (`PUBLIC KEY`)
    Public,
    /// PKCS#1 (`RSA PRIVATE KEY`)
    RsaPrivate,
}

impl KeyKind {
    pub fn label(&self) -> &'static str {
        match self {
            KeyKind::Public => "PUBLIC KEY",
            KeyKind::RsaPrivate => "RSA PRIVATE KEY",
        }
    }

    fn header(&self) -> String {
        format!("-----BEGIN {}-----", self.label())
    }

    fn footer(&self) -> String {
        format!("-----END {}-----", self.label())
    }
}

/// RSA private key used to sign outbound requests
#[derive(Clone)]
pub struct RsaPrivateKey(PKey<Private>);

/// Counterparty RSA public key used to verify responses and notifications
#[derive(Clone)]
pub struct RsaPublicKey(PKey<Public>);

/// Parsed key of either kind
#[derive(Debug, Clone)]
pub enum KeyHandle {
    Private(RsaPrivateKey),
    Public(RsaPublicKey),
}

impl RsaPrivateKey {
    /// Normalize and parse raw (possibly armor-less) private key text
    pub fn from_raw(raw: &str) -> Result<Self> {
        let pem = normalize(raw, KeyKind::RsaPrivate);
        parse_private(&pem, raw)
    }

    pub(crate) fn pkey(&self) -> &PKey<Private> {
        &self.0
    }

    pub fn bits(&self) -> u32 {
        self.0.bits()
    }
}

impl RsaPublicKey {
    /// Normalize and parse raw (possibly armor-less) public key text
    pub fn from_raw(raw: &str) -> Result<Self> {
        let pem = normalize(raw, KeyKind::Public);
        parse_public(&pem, raw)
    }

    pub(crate) fn pkey(&self) -> &PKey<Public> {
        &self.0
    }

    pub fn bits(&self) -> u32 {
        self.0.bits()
    }
}

impl fmt::Debug for RsaPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RsaPrivateKey({} bits, redacted)", self.bits())
    }
}

impl fmt::Debug for RsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RsaPublicKey({} bits)", self.bits())
    }
}

impl KeyHandle {
    pub fn kind(&self) -> KeyKind {
        match self {
            KeyHandle::Private(_) => KeyKind::RsaPrivate,
            KeyHandle::Public(_) => KeyKind::Public,
        }
    }
}

/// Rebuild a PEM block for `kind` from raw key text.
///
/// Any existing armor lines and all whitespace are stripped, the base64
/// payload is re-wrapped at 64 columns and the header/footer for `kind` is
/// attached. Empty input yields empty output, which [`parse`] rejects.
pub fn normalize(raw: &str, kind: KeyKind) -> Vec<u8> {
    let body = strip_armor(raw);
    if body.is_empty() {
        return Vec::new();
    }

    let mut pem = kind.header();
    pem.push('\n');
    let chars: Vec<char> = body.chars().collect();
    for line in chars.chunks(PEM_LINE_WIDTH) {
        pem.extend(line.iter());
        pem.push('\n');
    }
    pem.push_str(&kind.footer());
    pem.into_bytes()
}

/// Decode a PEM block and parse the inner RSA structure
pub fn parse(pem: &[u8], kind: KeyKind) -> Result<KeyHandle> {
    let raw = String::from_utf8_lossy(pem);
    match kind {
        KeyKind::RsaPrivate => parse_private(pem, &raw).map(KeyHandle::Private),
        KeyKind::Public => parse_public(pem, &raw).map(KeyHandle::Public),
    }
}

fn parse_private(pem: &[u8], raw: &str) -> Result<RsaPrivateKey> {
    let der = decode_pem(pem, KeyKind::RsaPrivate, raw)?;

    // PKCS#1 first; consoles that export PKCS#8 bodies still get a usable key
    let pkey = match Rsa::private_key_from_der(&der) {
        Ok(rsa) => PKey::from_rsa(rsa)
            .map_err(|e| AppError::key_material(format!("invalid RSA private key: {}", e), raw))?,
        Err(pkcs1_err) => PKey::private_key_from_pkcs8(&der).map_err(|_| {
            AppError::key_material(
                format!("private key is not PKCS#1 RSA: {}", pkcs1_err),
                raw,
            )
        })?,
    };

    if pkey.id() != Id::RSA {
        return Err(AppError::key_material("private key is not an RSA key", raw));
    }
    Ok(RsaPrivateKey(pkey))
}

fn parse_public(pem: &[u8], raw: &str) -> Result<RsaPublicKey> {
    let der = decode_pem(pem, KeyKind::Public, raw)?;
    let pkey = PKey::public_key_from_der(&der).map_err(|e| {
        AppError::key_material(format!("public key is not SubjectPublicKeyInfo: {}", e), raw)
    })?;

    if pkey.id() != Id::RSA {
        return Err(AppError::key_material("public key is not an RSA key", raw));
    }
    Ok(RsaPublicKey(pkey))
}

fn decode_pem(pem: &[u8], kind: KeyKind, raw: &str) -> Result<Vec<u8>> {
    let text = std::str::from_utf8(pem)
        .map_err(|_| AppError::key_material("PEM text is not UTF-8", raw))?;

    let header = kind.header();
    let footer = kind.footer();
    let start = text
        .find(&header)
        .map(|i| i + header.len())
        .ok_or_else(|| AppError::key_material(format!("no {} PEM block", kind.label()), raw))?;
    let end = text[start..]
        .find(&footer)
        .map(|i| start + i)
        .ok_or_else(|| AppError::key_material(format!("unterminated {} PEM block", kind.label()), raw))?;

    let body: String = text[start..end]
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if body.is_empty() {
        return Err(AppError::key_material(
            format!("empty {} PEM block", kind.label()),
            raw,
        ));
    }

    BASE64
        .decode(body.as_bytes())
        .map_err(|e| AppError::key_material(format!("PEM body is not base64: {}", e), raw))
}

fn strip_armor(raw: &str) -> String {
    let mut body = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(open) = rest.find(ARMOR_DASHES) {
        body.push_str(&rest[..open]);
        let label = &rest[open + ARMOR_DASHES.len()..];
        match label.find(ARMOR_DASHES) {
            Some(close) => rest = &label[close + ARMOR_DASHES.len()..],
            None => {
                rest = "";
                break;
            }
        }
    }
    body.push_str(rest);
    body.retain(|c| !c.is_whitespace());
    body
}

use std::fmt;

/// Reserved field carrying the signature on both gateways
pub const SIGN_FIELD: &str = "sign";

/// Field carrying the algorithm tag on both gateways
pub const SIGN_TYPE_FIELD: &str = "sign_type";

/// Controls which keys are dropped and whether a shared-secret suffix is appended
#[derive(Debug, Clone, Copy)]
pub struct CanonicalOptions<'a> {
    /// Keys never emitted, matched case-insensitively
    pub excluded: &'a [&'a str],
    /// Raw shared secret appended as `&key=<secret>` for MAC signing
    pub secret_suffix: Option<&'a str>,
}

impl<'a> CanonicalOptions<'a> {
    /// Exclude only the signature field, no suffix
    pub const fn plain() -> Self {
        Self {
            excluded: &[SIGN_FIELD],
            secret_suffix: None,
        }
    }

    pub const fn excluding(excluded: &'a [&'a str]) -> Self {
        Self {
            excluded,
            secret_suffix: None,
        }
    }

    pub const fn with_secret(mut self, secret: &'a str) -> Self {
        self.secret_suffix = Some(secret);
        self
    }

    fn is_excluded(&self, key: &str) -> bool {
        self.excluded.iter().any(|ex| ex.eq_ignore_ascii_case(key))
    }
}

impl Default for CanonicalOptions<'_> {
    fn default() -> Self {
        Self::plain()
    }
}

/// Exact byte input handed to a signature algorithm
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalString(String);

impl CanonicalString {
    /// Wrap bytes that already are the signed content (e.g. a raw JSON node)
    pub fn from_raw(content: impl Into<String>) -> Self {
        Self(content.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serialize a parameter set into its canonical `k=v&k=v` form.
///
/// Keys are sorted by byte value, values are trimmed, and pairs whose
/// trimmed value is empty are skipped along with every excluded key.
/// Works with any map (or pair iterator) whose keys are unique.
pub fn canonicalize<I, K, V>(params: I, options: &CanonicalOptions<'_>) -> CanonicalString
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut entries: Vec<(K, V)> = params
        .into_iter()
        .filter(|(k, v)| !options.is_excluded(k.as_ref()) && !v.as_ref().trim().is_empty())
        .collect();
    entries.sort_by(|a, b| a.0.as_ref().as_bytes().cmp(b.0.as_ref().as_bytes()));

    let mut buf = String::new();
    for (key, value) in &entries {
        if !buf.is_empty() {
            buf.push('&');
        }
        buf.push_str(key.as_ref());
        buf.push('=');
        buf.push_str(value.as_ref().trim());
    }

    if let Some(secret) = options.secret_suffix {
        buf.push_str("&key=");
        buf.push_str(secret);
    }

    CanonicalString(buf)
}

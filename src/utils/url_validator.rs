//! Link validation for the issuance path
//!
//! Only absolute `http`/`https` URLs with a host are accepted.

use std::fmt;

use url::Url;

use crate::errors::KeygateError;

/// Schemes refused outright, before any other check.
const BLOCKED_SCHEMES: &[&str] = &["javascript", "data", "file", "vbscript", "about", "blob"];

#[derive(Debug, PartialEq, Eq)]
pub enum UrlValidationError {
    Empty,
    Malformed(String),
    BlockedScheme(String),
    UnsupportedScheme(String),
    MissingHost,
}

impl fmt::Display for UrlValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty link"),
            Self::Malformed(reason) => write!(f, "malformed link: {}", reason),
            Self::BlockedScheme(scheme) => write!(f, "blocked scheme {}:", scheme),
            Self::UnsupportedScheme(scheme) => {
                write!(f, "unsupported scheme {}: (http or https only)", scheme)
            }
            Self::MissingHost => f.write_str("link has no host"),
        }
    }
}

impl std::error::Error for UrlValidationError {}

impl From<UrlValidationError> for KeygateError {
    fn from(err: UrlValidationError) -> Self {
        KeygateError::validation(validation_error_message(&err))
    }
}

/// Parse and check a link supplied by an issuer. Surrounding whitespace is
/// ignored.
pub fn validate_url(link: &str) -> Result<Url, UrlValidationError> {
    let link = link.trim();
    if link.is_empty() {
        return Err(UrlValidationError::Empty);
    }

    let parsed = Url::parse(link).map_err(|e| UrlValidationError::Malformed(e.to_string()))?;

    // `Url` lowercases the scheme
    let scheme = parsed.scheme();
    if BLOCKED_SCHEMES.contains(&scheme) {
        return Err(UrlValidationError::BlockedScheme(scheme.to_string()));
    }
    if scheme != "http" && scheme != "https" {
        return Err(UrlValidationError::UnsupportedScheme(scheme.to_string()));
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(parsed),
        _ => Err(UrlValidationError::MissingHost),
    }
}

/// Client-facing message for a rejected link.
pub fn validation_error_message(error: &UrlValidationError) -> &'static str {
    match error {
        UrlValidationError::Empty => "Link é obrigatório",
        UrlValidationError::UnsupportedScheme(_) => "Link deve começar com http:// ou https://",
        UrlValidationError::BlockedScheme(_) => "Protocolo do link não permitido",
        UrlValidationError::MissingHost | UrlValidationError::Malformed(_) => "Link inválido",
    }
}

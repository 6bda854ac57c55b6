//! Validation of post-login return paths
//!
//! When a guard sends an anonymous user to the login view it remembers the
//! original destination. That value later comes back through the callback URL,
//! so it is untrusted input and must be a plain same-origin path before the
//! client navigates to it.

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

static PATH_TRAVERSAL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.\.").expect("path traversal pattern is valid"));

// scheme prefix or protocol-relative `//host`
static PROTOCOL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:[a-z][a-z0-9+.-]*:)|(?:/{2,})").expect("protocol pattern is valid")
});

// control characters, encoded line breaks, backslashes and invisible spacing
static SUSPICIOUS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[\x00-\x1F\x7F-\x9F]|%(?:00|0[aAdD]|09|5c)|\\|[\u{200E}\u{200F}\u{2060}-\u{2064}\u{2000}-\u{200A}]")
        .expect("suspicious pattern is valid")
});

const DANGEROUS_PROTOCOLS: &[&str] = &["javascript:", "vbscript:", "data:", "file:", "ftp:"];

/// Longest return path accepted
pub const MAX_RETURN_PATH_LEN: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RedirectError {
    #[error("return path must be a relative path starting with '/'")]
    NotRelative,
    #[error("return path exceeds the maximum length")]
    TooLong,
    #[error("return path contains a disallowed pattern")]
    Suspicious,
}

/// Validate a post-login return path, returning it unchanged if it is safe
///
/// # Errors
///
/// Returns an error if the path is absolute or protocol-relative, too long,
/// or contains traversal, control characters or encoded variants of those.
pub fn validate_return_path(return_path: &str) -> Result<String, RedirectError> {
    debug!("Validating return path: {return_path}");

    if return_path.len() > MAX_RETURN_PATH_LEN {
        warn!(
            "Excessively long return path: {} characters",
            return_path.len()
        );
        return Err(RedirectError::TooLong);
    }

    if !is_relative_path(return_path) {
        warn!("Rejected non-relative return path: {return_path}");
        return Err(RedirectError::NotRelative);
    }

    for decoded in decoded_variants(return_path) {
        check_patterns(return_path, &decoded)?;
    }

    Ok(return_path.to_string())
}

/// Like [`validate_return_path`] but falls back to `fallback` on rejection
#[must_use]
pub fn sanitize_return_path(return_path: Option<&str>, fallback: &str) -> String {
    return_path
        .and_then(|path| validate_return_path(path).ok())
        .unwrap_or_else(|| fallback.to_string())
}

fn is_relative_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains(':')
}

fn check_patterns(original: &str, candidate: &str) -> Result<(), RedirectError> {
    if PATH_TRAVERSAL_PATTERN.is_match(candidate) {
        warn!("Path traversal in return path: {original} -> {candidate}");
        return Err(RedirectError::Suspicious);
    }

    if PROTOCOL_PATTERN.is_match(candidate) {
        warn!("Protocol injection in return path: {original} -> {candidate}");
        return Err(RedirectError::Suspicious);
    }

    if SUSPICIOUS_PATTERN.is_match(candidate) {
        warn!("Suspicious pattern in return path: {original} -> {candidate}");
        return Err(RedirectError::Suspicious);
    }

    let lower = candidate.to_lowercase();
    if DANGEROUS_PROTOCOLS.iter().any(|p| lower.contains(p)) {
        warn!("Dangerous protocol in return path: {lower}");
        return Err(RedirectError::Suspicious);
    }

    // user@host style domain confusion
    if candidate.contains('@') {
        warn!("'@' in return path: {candidate}");
        return Err(RedirectError::Suspicious);
    }

    Ok(())
}

/// Original path plus single and double URL-decoded forms when they differ
fn decoded_variants(path: &str) -> Vec<String> {
    let mut variants = Vec::with_capacity(3);
    variants.push(path.to_string());

    if let Ok(decoded) = urlencoding::decode(path) {
        let decoded = decoded.into_owned();
        if decoded != path {
            if let Ok(double_decoded) = urlencoding::decode(&decoded) {
                let double_decoded = double_decoded.into_owned();
                if double_decoded != decoded {
                    variants.push(double_decoded);
                }
            }
            variants.push(decoded);
        }
    }

    variants
}

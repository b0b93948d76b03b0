//! Identifier resolution against the origin base.
//!
//! An identifier is one opaque path segment. It is resolved relative to the
//! base the way a browser resolves `new URL(id, base)`, but only after the
//! segment has been checked so the result cannot leave the base directory.

use url::Url;

use crate::origin::OriginError;

/// Check that an identifier is a plain, non-escaping path segment.
pub fn validate_identifier(identifier: &str) -> Result<(), OriginError> {
    let reject = || OriginError::InvalidIdentifier(identifier.to_string());

    if identifier.is_empty() || identifier == "." || identifier == ".." {
        return Err(reject());
    }

    // '%' is refused because the URL parser treats "%2e%2e" as a dot segment.
    let forbidden = |c: char| matches!(c, '/' | '\\' | '?' | '#' | '%' | ':') || c.is_control();
    if identifier.chars().any(forbidden) {
        return Err(reject());
    }

    Ok(())
}

/// Directory part of the base path, up to and including the last '/'.
fn base_directory(base: &Url) -> &str {
    let path = base.path();
    match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "/",
    }
}

/// Resolve an identifier into an absolute upstream address.
pub fn resolve(base: &Url, identifier: &str) -> Result<Url, OriginError> {
    validate_identifier(identifier)?;

    let resolved = base
        .join(identifier)
        .map_err(|_| OriginError::InvalidIdentifier(identifier.to_string()))?;

    let same_origin = resolved.origin() == base.origin();
    let inside_base = resolved.path().starts_with(base_directory(base));
    if !same_origin || !inside_base {
        return Err(OriginError::InvalidIdentifier(identifier.to_string()));
    }

    Ok(resolved)
}

//! Sanity checks for registry entries before they are probed.

use anyhow::{Result, anyhow};
use url::Url;

use super::types::{CheckKind, Target};

/// Validates a target based on its check kind
pub fn validate_target(target: &Target) -> Result<()> {
    if target.name.trim().is_empty() {
        return Err(anyhow!("Target name must not be empty"));
    }

    match target.check_kind {
        CheckKind::Http => validate_http_address(&target.address),
        CheckKind::Ping => validate_ping_address(&target.address),
    }
}

/// Validate HTTP/HTTPS address
fn validate_http_address(address: &str) -> Result<()> {
    let url = Url::parse(address).map_err(|e| anyhow!("Invalid URL {}: {}", address, e))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(anyhow!("Invalid scheme for HTTP target: {}", other)),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(anyhow!("HTTP target has no host: {}", address));
    }

    Ok(())
}

/// Validate ping address, a bare host name or IP
pub(crate) fn validate_ping_address(address: &str) -> Result<()> {
    if address.is_empty() {
        return Err(anyhow!("Ping target must not be empty"));
    }

    if address.contains("://") || address.contains('/') {
        return Err(anyhow!("Ping target must be a host, not a URL: {}", address));
    }

    // Leading dashes would be read as ping flags
    if address.starts_with('-') || address.chars().any(char::is_whitespace) {
        return Err(anyhow!("Invalid ping host: {:?}", address));
    }

    Ok(())
}

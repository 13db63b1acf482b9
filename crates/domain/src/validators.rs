use crate::config::ConfigError;
use std::net::Ipv6Addr;

/// Default port appended to resolver addresses given without one.
pub const DEFAULT_DNS_PORT: u16 = 53;

/// Appends the root separator to a domain name if it is missing.
pub fn normalize_domain(domain: &str) -> Result<String, ConfigError> {
    let trimmed = domain.trim();
    if trimmed.is_empty() || trimmed == "." {
        return Err(ConfigError::InvalidDomain(domain.to_string()));
    }
    if trimmed.len() > 254 {
        return Err(ConfigError::InvalidDomain(domain.to_string()));
    }
    if trimmed.ends_with('.') {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}."))
    }
}

/// Appends `:53` to a resolver address that has no port.
///
/// Bare IPv6 addresses are bracketed first, so `::1` becomes `[::1]:53`.
pub fn normalize_resolver(resolver: &str) -> Result<String, ConfigError> {
    let resolver = resolver.trim();
    if resolver.is_empty() {
        return Err(ConfigError::InvalidEndpoint(resolver.to_string()));
    }

    if let Some(rest) = resolver.strip_prefix('[') {
        return match rest.split_once(']') {
            Some((_, "")) => Ok(format!("{resolver}:{DEFAULT_DNS_PORT}")),
            Some((_, port)) if port.starts_with(':') && port.len() > 1 => Ok(resolver.to_string()),
            _ => Err(ConfigError::InvalidEndpoint(resolver.to_string())),
        };
    }

    if resolver.parse::<Ipv6Addr>().is_ok() {
        return Ok(format!("[{resolver}]:{DEFAULT_DNS_PORT}"));
    }

    match resolver.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
            Ok(resolver.to_string())
        }
        Some(_) => Err(ConfigError::InvalidEndpoint(resolver.to_string())),
        None => Ok(format!("{resolver}:{DEFAULT_DNS_PORT}")),
    }
}

pub fn validate_doh_url(url: &str) -> Result<(), ConfigError> {
    if url.len() > 2048 {
        return Err(ConfigError::InvalidEndpoint(url.to_string()));
    }
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| ConfigError::InvalidEndpoint(url.to_string()))?;
    if rest.is_empty() || rest.starts_with('/') {
        return Err(ConfigError::InvalidEndpoint(url.to_string()));
    }
    Ok(())
}
